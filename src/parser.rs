use regex::Regex;

/// Decomposition of a single utility token.
///
/// Produced by [`ClassParser::parse`]; immutable once built. `original`
/// is the verbatim input token, `base` is what remains after the
/// important/negative markers and the variant chain have been stripped
/// (including any arbitrary-value bracket and `/` modifier suffix).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedClass {
    /// Verbatim input token
    pub original: String,

    /// Leading `!` marker was present
    pub important: bool,

    /// Leading `-` marker was present
    pub negative: bool,

    /// Variant names in encounter order, outer to inner
    pub variants: Vec<String>,

    /// Base utility string used for rule matching
    pub base: String,
}

/// Parser for class-list text.
///
/// Decomposition is deterministic and side-effect free: a token that
/// cannot be fully decomposed keeps the ambiguous remainder in `base`
/// rather than producing an error. Whether that remainder means
/// anything is the matcher's call.
pub struct ClassParser {
    variant_segment: Regex,
}

impl ClassParser {
    pub fn new() -> Self {
        // Recognized variant shapes: the 2xl breakpoint, @container
        // tokens, data-/aria-attribute forms (optionally group-/peer-
        // scoped), and plain identifiers (covers hover, dark, md,
        // max-sm, group-hover, ...) with an optional bracket suffix
        // for arbitrary breakpoints like min-[700px].
        let variant_segment = Regex::new(
            r"^(?:2xl|@[a-zA-Z0-9][a-zA-Z0-9_-]*|(?:group-|peer-)?(?:data|aria)-\[[^\[\]]+\]|[a-zA-Z][a-zA-Z0-9_-]*(?:-\[[^\[\]]+\])?)$",
        )
        .expect("variant segment pattern is valid");
        Self { variant_segment }
    }

    /// Split class-list text into parsed tokens.
    ///
    /// Variant groups are expanded first, then the text is split on
    /// runs of whitespace. Order is preserved and repeated tokens are
    /// kept; deduplication belongs to later layers.
    pub fn parse_classes(&self, text: &str) -> Vec<ParsedClass> {
        let expanded = expand_variant_groups(text);
        expanded.split_whitespace().map(|t| self.parse(t)).collect()
    }

    /// Decompose one whitespace-free token.
    pub fn parse(&self, token: &str) -> ParsedClass {
        let mut rest = token;
        let mut important = false;
        let mut negative = false;

        if let Some(stripped) = rest.strip_prefix('!') {
            if !stripped.is_empty() {
                important = true;
                rest = stripped;
            }
        }

        // A leading dash is a negative marker only when it introduces a
        // utility name; bracketed or bare heads stay in the base.
        if rest.len() > 1 && rest.starts_with('-') && rest.as_bytes()[1].is_ascii_alphanumeric() {
            negative = true;
            rest = &rest[1..];
        }

        let mut variants = Vec::new();
        while let Some(colon) = top_level_colon(rest) {
            let segment = &rest[..colon];
            if !self.variant_segment.is_match(segment) {
                break;
            }
            variants.push(segment.to_string());
            rest = &rest[colon + 1..];
        }

        ParsedClass {
            original: token.to_string(),
            important,
            negative,
            variants,
            base: rest.to_string(),
        }
    }
}

impl Default for ClassParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Index of the first `:` outside any bracket pair, if any.
///
/// Keeps `w-[length:10px]` from being mistaken for a variant chain.
fn top_level_colon(s: &str) -> Option<usize> {
    let mut bracket = 0usize;
    for (i, b) in s.bytes().enumerate() {
        match b {
            b'[' => bracket += 1,
            b']' => bracket = bracket.saturating_sub(1),
            b':' if bracket == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Recursively rewrite `variant:(a b)` shorthand into flat tokens.
///
/// The full variant chain before the group distributes over every
/// member, and nested groups unwrap depth-first, so
/// `hover:(focus:(bg-red))` becomes `hover:focus:bg-red`. Parentheses
/// inside arbitrary-value brackets (`w-[calc(100%-4px)]`) are not
/// group syntax and pass through untouched, as does anything
/// unbalanced.
pub fn expand_variant_groups(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i].is_ascii_whitespace() {
            out.push(bytes[i] as char);
            i += 1;
            continue;
        }

        // Scan one unit: whitespace terminates it only outside
        // brackets and parens, so a whole group reads as one unit.
        let start = i;
        let mut bracket = 0usize;
        let mut paren = 0usize;
        while i < bytes.len() {
            match bytes[i] {
                b'[' => bracket += 1,
                b']' => bracket = bracket.saturating_sub(1),
                b'(' if bracket == 0 => paren += 1,
                b')' if bracket == 0 => paren = paren.saturating_sub(1),
                b if b.is_ascii_whitespace() && bracket == 0 && paren == 0 => break,
                _ => {}
            }
            i += 1;
        }
        expand_unit(&text[start..i], &mut out);
    }

    out
}

fn expand_unit(unit: &str, out: &mut String) {
    let Some(open) = group_open(unit) else {
        out.push_str(unit);
        return;
    };

    let prefix = &unit[..open];
    let body_start = open + 2;
    let Some(close) = matching_paren(&unit[body_start..]) else {
        out.push_str(unit);
        return;
    };

    // Anything after the closing paren makes this not a group.
    if body_start + close + 1 != unit.len() {
        out.push_str(unit);
        return;
    }

    let inner = expand_variant_groups(&unit[body_start..body_start + close]);
    let mut first = true;
    for token in inner.split_whitespace() {
        if !first {
            out.push(' ');
        }
        first = false;
        out.push_str(prefix);
        out.push(':');
        out.push_str(token);
    }
}

/// Byte index of the `:` in the first top-level `:(` of `unit`, when
/// preceded by a non-empty variant chain.
fn group_open(unit: &str) -> Option<usize> {
    let bytes = unit.as_bytes();
    let mut bracket = 0usize;
    for i in 0..bytes.len() {
        match bytes[i] {
            b'[' => bracket += 1,
            b']' => bracket = bracket.saturating_sub(1),
            b':' if bracket == 0 && i > 0 && bytes.get(i + 1) == Some(&b'(') => {
                return Some(i);
            }
            _ => {}
        }
    }
    None
}

/// Index of the `)` closing an already-opened paren, relative to `s`.
fn matching_paren(s: &str) -> Option<usize> {
    let mut bracket = 0usize;
    let mut depth = 1usize;
    for (i, b) in s.bytes().enumerate() {
        match b {
            b'[' => bracket += 1,
            b']' => bracket = bracket.saturating_sub(1),
            b'(' if bracket == 0 => depth += 1,
            b')' if bracket == 0 => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
