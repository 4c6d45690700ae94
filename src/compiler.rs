use crate::cache::{CacheStats, StyleCache};
use crate::config::CompilerConfig;
use crate::errors::Result;
use crate::matcher::{Matcher, PropertyMap, Rule};
use crate::parser::{ClassParser, ParsedClass};
use crate::theme::Theme;
use indexmap::IndexMap;

/// Result of compiling one class-list string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutput {
    /// Concatenated CSS blocks, one per resolved token
    pub css: String,

    /// Number of tokens that produced CSS
    pub classes_compiled: usize,

    /// Tokens that matched no rule, in encounter order
    pub unresolved: Vec<String>,
}

/// The composition point of the pipeline.
///
/// Owns one parser, one matcher, one cache and the active theme; the
/// cache knows nothing about the other two. Compilation expands and
/// parses the input, consults the cache per token, and on a miss
/// resolves the base utility, runs the rule handler and caches the
/// rendered block under the raw token string.
pub struct StyleCompiler {
    parser: ClassParser,
    matcher: Matcher,
    cache: StyleCache,
    theme: Theme,
    unresolved: IndexMap<String, usize>,
}

impl StyleCompiler {
    pub fn new() -> Self {
        Self::with_config(CompilerConfig::default())
    }

    pub fn with_config(config: CompilerConfig) -> Self {
        let mut cache = StyleCache::with_options(config.cache);
        cache.set_theme_version(config.theme.version());

        Self {
            parser: ClassParser::new(),
            matcher: Matcher::with_strict_names(config.strict_rule_names),
            cache,
            theme: config.theme,
            unresolved: IndexMap::new(),
        }
    }

    pub fn add_rule(&mut self, rule: Rule) -> Result<()> {
        self.matcher.add_rule(rule)
    }

    pub fn add_rules(&mut self, rules: impl IntoIterator<Item = Rule>) -> Result<()> {
        self.matcher.add_rules(rules)
    }

    pub fn remove_rule(&mut self, name: &str) -> bool {
        self.matcher.remove_rule(name)
    }

    pub fn rule_count(&self) -> usize {
        self.matcher.len()
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Swap the active theme.
    ///
    /// Cached CSS stamped with the old theme version goes stale and is
    /// evicted lazily as reads touch it; nothing is swept here.
    pub fn set_theme(&mut self, theme: Theme) {
        self.cache.set_theme_version(theme.version());
        self.theme = theme;
    }

    /// Destructive theme replacement: wipes the cache eagerly instead
    /// of relying on lazy invalidation.
    pub fn replace_theme(&mut self, theme: Theme) {
        self.cache.clear_with_version(theme.version());
        self.theme = theme;
    }

    /// Compile a whitespace-separated class list into CSS.
    ///
    /// Unresolvable tokens contribute no CSS and are reported in the
    /// output rather than raised; producing diagnostics for them is
    /// the caller's business.
    pub fn compile(&mut self, text: &str) -> CompileOutput {
        let parsed = self.parser.parse_classes(text);

        let mut css = String::new();
        let mut classes_compiled = 0;
        let mut unresolved = Vec::new();

        for token in &parsed {
            match self.compile_parsed(token) {
                Some(block) => {
                    css.push_str(&block);
                    classes_compiled += 1;
                }
                None => {
                    *self.unresolved.entry(token.original.clone()).or_insert(0) += 1;
                    unresolved.push(token.original.clone());
                }
            }
        }

        CompileOutput {
            css,
            classes_compiled,
            unresolved,
        }
    }

    /// Compile a single token; `None` means no rule matched.
    pub fn compile_class(&mut self, token: &str) -> Option<String> {
        let parsed = self.parser.parse(token.trim());
        let result = self.compile_parsed(&parsed);
        if result.is_none() {
            *self.unresolved.entry(parsed.original).or_insert(0) += 1;
        }
        result
    }

    fn compile_parsed(&mut self, parsed: &ParsedClass) -> Option<String> {
        if let Some(css) = self.cache.get(&parsed.original) {
            return Some(css);
        }

        let resolved = self.matcher.resolve(&parsed.base)?;
        let properties = resolved.rule.generate(&resolved.captures, &self.theme);
        let css = render_block(&parsed.original, &properties, parsed.important);
        self.cache.set(&parsed.original, css.clone());
        Some(css)
    }

    /// Tokens seen so far that matched no rule, with occurrence counts.
    pub fn unresolved_tokens(&self) -> impl Iterator<Item = (&str, usize)> {
        self.unresolved.iter().map(|(token, count)| (token.as_str(), *count))
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop cached CSS and unresolved-token bookkeeping; rules and
    /// theme stay.
    pub fn reset(&mut self) {
        self.cache.clear();
        self.unresolved.clear();
    }
}

impl Default for StyleCompiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Render one rule block for a token.
fn render_block(token: &str, properties: &PropertyMap, important: bool) -> String {
    let mut block = String::new();
    block.push('.');
    block.push_str(&escape_class_name(token));
    block.push_str(" {\n");
    for (property, value) in properties {
        block.push_str("  ");
        block.push_str(property);
        block.push_str(": ");
        block.push_str(value);
        if important {
            block.push_str(" !important");
        }
        block.push_str(";\n");
    }
    block.push_str("}\n");
    block
}

/// Escape a class token for use in a CSS selector.
pub fn escape_class_name(token: &str) -> String {
    let mut escaped = String::with_capacity(token.len());
    for c in token.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            escaped.push(c);
        } else {
            escaped.push('\\');
            escaped.push(c);
        }
    }
    escaped
}

/// Strip comments and collapse whitespace in generated CSS.
pub fn minify_css(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut last_emitted = '\0';
    let mut chars = css.chars().peekable();

    let boundary = |c: char| matches!(c, '{' | '}' | ';' | ':' | ',' | '\0');

    while let Some(c) = chars.next() {
        if c == '/' && chars.peek() == Some(&'*') {
            chars.next();
            let mut prev = '\0';
            for c in chars.by_ref() {
                if prev == '*' && c == '/' {
                    break;
                }
                prev = c;
            }
            continue;
        }

        if c.is_whitespace() {
            while matches!(chars.peek(), Some(n) if n.is_whitespace()) {
                chars.next();
            }
            if let Some(&next) = chars.peek() {
                if !boundary(last_emitted) && !boundary(next) {
                    out.push(' ');
                    last_emitted = ' ';
                }
            }
            continue;
        }

        out.push(c);
        last_emitted = c;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::CaptureGroups;

    fn padding_rule() -> Rule {
        Rule::regex(r"^p-(\d+)$", |caps: &CaptureGroups, theme: &Theme| {
            let key = caps.get(1).unwrap_or_default();
            let value = theme
                .spacing(key)
                .map(str::to_string)
                .unwrap_or_else(|| format!("{}px", key));
            let mut map = PropertyMap::new();
            map.insert("padding".to_string(), value);
            map
        })
        .with_name("padding")
    }

    #[test]
    fn test_compile_resolved_token() {
        let mut compiler = StyleCompiler::new();
        compiler.add_rule(padding_rule()).unwrap();

        let output = compiler.compile("p-4");
        assert_eq!(output.classes_compiled, 1);
        assert!(output.unresolved.is_empty());
        assert_eq!(output.css, ".p-4 {\n  padding: 1rem;\n}\n");
    }

    #[test]
    fn test_important_token_appends_marker() {
        let mut compiler = StyleCompiler::new();
        compiler.add_rule(padding_rule()).unwrap();

        let output = compiler.compile("!p-4");
        assert!(output.css.contains("padding: 1rem !important;"));
        assert!(output.css.starts_with(".\\!p-4 "));
    }

    #[test]
    fn test_variant_token_gets_escaped_selector() {
        let mut compiler = StyleCompiler::new();
        compiler.add_rule(padding_rule()).unwrap();

        let output = compiler.compile("hover:p-4");
        assert!(output.css.starts_with(".hover\\:p-4 "));
        assert_eq!(output.classes_compiled, 1);
    }

    #[test]
    fn test_unresolved_tokens_are_reported_not_raised() {
        let mut compiler = StyleCompiler::new();
        compiler.add_rule(padding_rule()).unwrap();

        let output = compiler.compile("p-4 unknown-thing p-4 unknown-thing");
        assert_eq!(output.classes_compiled, 3);
        assert_eq!(output.unresolved, vec!["unknown-thing", "unknown-thing"]);

        let counted: Vec<(&str, usize)> = compiler.unresolved_tokens().collect();
        assert_eq!(counted, vec![("unknown-thing", 2)]);
    }

    #[test]
    fn test_repeat_compile_hits_cache() {
        let mut compiler = StyleCompiler::new();
        compiler.add_rule(padding_rule()).unwrap();

        let first = compiler.compile("p-4").css;
        let second = compiler.compile("p-4").css;
        assert_eq!(first, second);

        let stats = compiler.cache_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_theme_swap_invalidates_cached_css() {
        let mut compiler = StyleCompiler::new();
        compiler.add_rule(padding_rule()).unwrap();

        assert!(compiler.compile("p-4").css.contains("padding: 1rem;"));

        let mut theme = compiler.theme().clone();
        theme.spacing.insert("4".to_string(), "2rem".to_string());
        compiler.set_theme(theme);

        assert!(compiler.compile("p-4").css.contains("padding: 2rem;"));
    }

    #[test]
    fn test_variant_group_input_compiles_per_member() {
        let mut compiler = StyleCompiler::new();
        compiler.add_rule(padding_rule()).unwrap();

        let output = compiler.compile("hover:(p-2 p-4)");
        assert_eq!(output.classes_compiled, 2);
        assert!(output.css.contains(".hover\\:p-2 "));
        assert!(output.css.contains(".hover\\:p-4 "));
    }

    #[test]
    fn test_escape_class_name() {
        assert_eq!(escape_class_name("p-4"), "p-4");
        assert_eq!(escape_class_name("hover:p-4"), "hover\\:p-4");
        assert_eq!(escape_class_name("w-[17px]"), "w-\\[17px\\]");
        assert_eq!(escape_class_name("bg-red-500/80"), "bg-red-500\\/80");
    }

    #[test]
    fn test_minify_css() {
        let css = "/* header */\n.p-4 {\n  padding: 1rem;\n}\n.m-2 {\n  margin: 0.5rem;\n}\n";
        let minified = minify_css(css);
        assert_eq!(minified, ".p-4{padding:1rem;}.m-2{margin:0.5rem;}");
    }

    #[test]
    fn test_minify_preserves_value_spaces() {
        let css = ".x { margin: calc(100% - 4px); }";
        assert_eq!(minify_css(css), ".x{margin:calc(100% - 4px);}");
    }
}
