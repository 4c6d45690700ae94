use crate::errors::{CompilerError, Result};
use crate::theme::Theme;
use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// CSS declarations produced by a rule handler, in emission order.
pub type PropertyMap = IndexMap<String, String>;

/// Generation capability attached to a rule.
///
/// The matcher resolves a utility to a rule and hands the captures to
/// this interface; it never looks inside. Closures of the matching
/// shape implement it directly.
pub trait RuleHandler: Send + Sync {
    fn generate(&self, captures: &CaptureGroups, theme: &Theme) -> PropertyMap;
}

impl<F> RuleHandler for F
where
    F: Fn(&CaptureGroups, &Theme) -> PropertyMap + Send + Sync,
{
    fn generate(&self, captures: &CaptureGroups, theme: &Theme) -> PropertyMap {
        self(captures, theme)
    }
}

/// Owned capture groups from an anchored pattern match.
///
/// Group 0 is the full utility string; groups that did not participate
/// in the match are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureGroups {
    groups: Vec<Option<String>>,
}

impl CaptureGroups {
    fn from_match(caps: &regex::Captures<'_>) -> Self {
        Self {
            groups: caps
                .iter()
                .map(|g| g.map(|m| m.as_str().to_string()))
                .collect(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.groups.get(index).and_then(|g| g.as_deref())
    }

    /// The fully matched utility string (group 0).
    pub fn full(&self) -> &str {
        self.groups
            .first()
            .and_then(|g| g.as_deref())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Pattern supplied at registration: a literal utility name or a regex
/// source. Normalized into one compiled, anchored representation by
/// [`Matcher::add_rule`] so nothing downstream branches on the original
/// form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RulePattern {
    Literal(String),
    Regex(String),
}

/// A matching unit as supplied by the registry layer.
pub struct Rule {
    pattern: RulePattern,
    handler: Arc<dyn RuleHandler>,
    priority: i32,
    layer: String,
    name: Option<String>,
}

impl Rule {
    /// Rule matching a regex pattern. The source may be unanchored;
    /// anchors are added at registration.
    pub fn regex(source: impl Into<String>, handler: impl RuleHandler + 'static) -> Self {
        Self {
            pattern: RulePattern::Regex(source.into()),
            handler: Arc::new(handler),
            priority: 0,
            layer: "utilities".to_string(),
            name: None,
        }
    }

    /// Rule matching one exact utility name.
    pub fn literal(text: impl Into<String>, handler: impl RuleHandler + 'static) -> Self {
        Self {
            pattern: RulePattern::Literal(text.into()),
            handler: Arc::new(handler),
            priority: 0,
            layer: "utilities".to_string(),
            name: None,
        }
    }

    /// Higher priority wins; default 0.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = layer.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A registered rule in its normalized form: compiled anchored
/// pattern plus the derived literal prefix used for index bucketing.
pub struct CompiledRule {
    name: String,
    source: String,
    pattern: Regex,
    prefix: String,
    priority: i32,
    layer: String,
    handler: Arc<dyn RuleHandler>,
}

impl CompiledRule {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pattern source as registered, before anchoring.
    pub fn pattern_source(&self) -> &str {
        &self.source
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn layer(&self) -> &str {
        &self.layer
    }

    /// Run the attached handler for a set of captures.
    pub fn generate(&self, captures: &CaptureGroups, theme: &Theme) -> PropertyMap {
        self.handler.generate(captures, theme)
    }
}

impl fmt::Debug for CompiledRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRule")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("prefix", &self.prefix)
            .field("priority", &self.priority)
            .field("layer", &self.layer)
            .finish()
    }
}

/// Resolved rule plus its capture groups for one base-utility string.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub rule: Arc<CompiledRule>,
    pub captures: CaptureGroups,
}

/// Priority-ordered rule matching with prefix-bucketed scanning.
///
/// Owns the registered rules (by name, last write wins) and two
/// derived indexes: a priority-sorted list and a prefix-to-rules map.
/// Both are rebuilt lazily behind a dirty flag, so bulk registration
/// costs one rebuild. Match outcomes, including misses, are cached per
/// utility string until the rule set changes.
pub struct Matcher {
    rules: IndexMap<String, Arc<CompiledRule>>,
    sorted: Vec<Arc<CompiledRule>>,
    prefix_index: HashMap<String, Vec<Arc<CompiledRule>>>,
    indexes_dirty: bool,
    match_cache: HashMap<String, Option<MatchResult>>,
    strict_names: bool,
}

impl Matcher {
    pub fn new() -> Self {
        Self::with_strict_names(false)
    }

    /// In strict mode, registering a second rule under the same
    /// explicit name is an error instead of a silent replacement.
    pub fn with_strict_names(strict_names: bool) -> Self {
        Self {
            rules: IndexMap::new(),
            sorted: Vec::new(),
            prefix_index: HashMap::new(),
            indexes_dirty: true,
            match_cache: HashMap::new(),
            strict_names,
        }
    }

    /// Compile and register one rule.
    ///
    /// The pattern is anchored (`^...$`) so partial matches never
    /// succeed. A missing name is derived from the pattern source.
    pub fn add_rule(&mut self, rule: Rule) -> Result<()> {
        let source = match &rule.pattern {
            RulePattern::Literal(text) => regex::escape(text),
            RulePattern::Regex(src) => src.clone(),
        };
        let pattern = Regex::new(&anchor(&source))?;

        let explicit = rule.name.is_some();
        let name = rule.name.unwrap_or_else(|| derive_name(&source));
        if explicit && self.strict_names && self.rules.contains_key(&name) {
            return Err(CompilerError::DuplicateRule { name });
        }

        let prefix = literal_prefix(source.trim_start_matches('^'));
        let compiled = Arc::new(CompiledRule {
            name: name.clone(),
            source,
            pattern,
            prefix,
            priority: rule.priority,
            layer: rule.layer,
            handler: rule.handler,
        });

        self.rules.insert(name, compiled);
        self.invalidate();
        Ok(())
    }

    pub fn add_rules(&mut self, rules: impl IntoIterator<Item = Rule>) -> Result<()> {
        for rule in rules {
            self.add_rule(rule)?;
        }
        Ok(())
    }

    /// Remove a rule by name; returns whether a removal occurred.
    pub fn remove_rule(&mut self, name: &str) -> bool {
        let removed = self.rules.shift_remove(name).is_some();
        if removed {
            self.invalidate();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.rules.clear();
        self.invalidate();
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<CompiledRule>> {
        self.rules.get(name)
    }

    /// Resolve a base-utility string to its best-matching rule.
    ///
    /// Scans the utility's prefix bucket when one exists, otherwise
    /// the full priority-sorted list; the first rule whose anchored
    /// pattern matches wins. Among equal priorities, registration
    /// order decides (the sort is stable). A miss is not an error: it
    /// means "not a recognized utility", and both hits and misses are
    /// cached so repeats are O(1).
    pub fn resolve(&mut self, utility: &str) -> Option<MatchResult> {
        if let Some(cached) = self.match_cache.get(utility) {
            return cached.clone();
        }

        self.ensure_indexes();

        let prefix = literal_prefix(utility);
        let result = {
            let bucket = if prefix.is_empty() {
                None
            } else {
                self.prefix_index.get(&prefix)
            };
            let scan: &[Arc<CompiledRule>] = bucket.map(Vec::as_slice).unwrap_or(&self.sorted);
            scan.iter().find_map(|rule| {
                rule.pattern.captures(utility).map(|caps| MatchResult {
                    rule: Arc::clone(rule),
                    captures: CaptureGroups::from_match(&caps),
                })
            })
        };

        self.match_cache.insert(utility.to_string(), result.clone());
        result
    }

    /// Resolve each utility independently; no batching beyond the
    /// per-item cache.
    pub fn resolve_many<'a>(
        &mut self,
        utilities: impl IntoIterator<Item = &'a str>,
    ) -> IndexMap<String, Option<MatchResult>> {
        utilities
            .into_iter()
            .map(|u| (u.to_string(), self.resolve(u)))
            .collect()
    }

    fn invalidate(&mut self) {
        self.indexes_dirty = true;
        self.match_cache.clear();
    }

    fn ensure_indexes(&mut self) {
        if !self.indexes_dirty {
            return;
        }

        self.sorted = self.rules.values().cloned().collect();
        // Stable sort: equal priorities keep registration order.
        self.sorted
            .sort_by_key(|rule| std::cmp::Reverse(rule.priority));

        self.prefix_index.clear();
        for rule in &self.sorted {
            // Rules without a literal prefix are reachable only via
            // the full-list fallback.
            if !rule.prefix.is_empty() {
                self.prefix_index
                    .entry(rule.prefix.clone())
                    .or_default()
                    .push(Arc::clone(rule));
            }
        }

        self.indexes_dirty = false;
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Anchor a pattern source to `^...$` unless already anchored.
fn anchor(source: &str) -> String {
    let mut anchored = String::with_capacity(source.len() + 2);
    if !source.starts_with('^') {
        anchored.push('^');
    }
    anchored.push_str(source);
    if !source.ends_with('$') {
        anchored.push('$');
    }
    anchored
}

/// Leading ASCII-alphabetic run, stopping at the first character that
/// is not a letter. Applied to both pattern sources (after `^`) and
/// utility strings so the two sides bucket identically.
fn literal_prefix(s: &str) -> String {
    s.chars().take_while(char::is_ascii_alphabetic).collect()
}

/// Auto-derive a rule name by stripping regex metacharacters from the
/// pattern source and truncating.
fn derive_name(source: &str) -> String {
    let mut name: String = source
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    name.truncate(32);
    if name.is_empty() {
        name.push_str("rule");
    }
    name
}
