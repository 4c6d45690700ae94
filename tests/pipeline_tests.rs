//! Pipeline behavior across the parser, matcher and cache working
//! together through the public API.

use utility_compiler::{
    CacheOptions, CaptureGroups, ClassParser, CompilerConfig, Matcher, PropertyMap, Rule,
    StyleCache, StyleCompiler, Theme,
};

fn padding_rule() -> Rule {
    Rule::regex(r"^p-(\d+)$", |caps: &CaptureGroups, _theme: &Theme| {
        let mut map = PropertyMap::new();
        map.insert(
            "padding".to_string(),
            format!("{}px", caps.get(1).unwrap_or_default()),
        );
        map
    })
    .with_name("padding")
}

#[test]
fn test_end_to_end_scenario() {
    // One rule registered; three tokens in, two matches and one miss.
    let parser = ClassParser::new();
    let mut matcher = Matcher::new();
    matcher.add_rule(padding_rule()).unwrap();

    let parsed = parser.parse_classes("!p-4 hover:p-8 unknown-thing");
    assert_eq!(parsed.len(), 3);

    assert!(parsed[0].important);
    assert_eq!(parsed[0].base, "p-4");
    let first = matcher.resolve(&parsed[0].base).unwrap();
    assert_eq!(first.rule.name(), "padding");
    assert_eq!(first.captures.get(1), Some("4"));

    assert_eq!(parsed[1].variants, vec!["hover"]);
    assert_eq!(parsed[1].base, "p-8");
    let second = matcher.resolve(&parsed[1].base).unwrap();
    assert_eq!(second.captures.get(1), Some("8"));

    assert!(matcher.resolve(&parsed[2].base).is_none());
}

#[test]
fn test_parse_is_a_pure_function_of_the_string() {
    let parser = ClassParser::new();
    for token in ["-mt-4", "!hover:bg-red-500/80", "w-[17px]", "md:(a b)"] {
        let first = parser.parse_classes(token);
        let second = parser.parse_classes(token);
        assert_eq!(first, second);
        for parsed in &first {
            assert_eq!(parser.parse(&parsed.original), *parsed);
        }
    }
}

#[test]
fn test_expansion_feeds_matching() {
    let parser = ClassParser::new();
    let mut matcher = Matcher::new();
    matcher.add_rule(padding_rule()).unwrap();

    let parsed = parser.parse_classes("hover:(p-1 p-2)");
    assert_eq!(parsed.len(), 2);
    for token in &parsed {
        assert_eq!(token.variants, vec!["hover"]);
        assert!(matcher.resolve(&token.base).is_some());
    }
}

#[test]
fn test_priority_beats_registration_order() {
    for flipped in [false, true] {
        let mut matcher = Matcher::new();
        let low = Rule::regex(r"^p-(\d+)$", |_: &CaptureGroups, _: &Theme| PropertyMap::new())
            .with_name("low")
            .with_priority(1);
        let high = Rule::regex(r"^p-(\d+)$", |_: &CaptureGroups, _: &Theme| PropertyMap::new())
            .with_name("high")
            .with_priority(10);
        if flipped {
            matcher.add_rules([high, low]).unwrap();
        } else {
            matcher.add_rules([low, high]).unwrap();
        }
        assert_eq!(matcher.resolve("p-4").unwrap().rule.name(), "high");
    }
}

#[test]
fn test_cache_lru_scenario() {
    let mut cache = StyleCache::with_options(CacheOptions {
        max_size: 3,
        ..CacheOptions::default()
    });
    cache.set("A", "a");
    cache.set("B", "b");
    cache.set("C", "c");
    assert!(cache.get("A").is_some());
    cache.set("D", "d");

    assert!(!cache.contains("B"));
    assert!(cache.contains("A"));
    assert!(cache.contains("C"));
    assert!(cache.contains("D"));
}

#[test]
fn test_theme_version_invalidation_scenario() {
    let mut cache = StyleCache::new();
    cache.set("k", "v");
    cache.set_theme_version("t2");

    // Never explicitly deleted, but reads under the new version miss.
    assert!(cache.get("k").is_none());
}

#[test]
fn test_no_match_is_stable_across_repeats() {
    let mut matcher = Matcher::new();
    matcher.add_rule(padding_rule()).unwrap();

    for _ in 0..3 {
        assert!(matcher.resolve("totally-unknown-utility").is_none());
    }
}

#[test]
fn test_compiler_memoizes_per_token() {
    let mut compiler = StyleCompiler::new();
    compiler.add_rule(padding_rule()).unwrap();

    compiler.compile("p-4 p-4 hover:p-4");
    let stats = compiler.cache_stats();
    // Three lookups: p-4 misses once then hits, hover:p-4 misses.
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.size, 2);
}

#[test]
fn test_compiler_with_disabled_cache_still_compiles() {
    let mut config = CompilerConfig::default();
    config.cache.enabled = false;

    let mut compiler = StyleCompiler::with_config(config);
    compiler.add_rule(padding_rule()).unwrap();

    let output = compiler.compile("p-4");
    assert_eq!(output.classes_compiled, 1);
    assert!(output.css.contains("padding: 4px;"));
    assert_eq!(compiler.cache_stats().size, 0);
}

#[test]
fn test_compiler_theme_replacement_is_eager() {
    let mut compiler = StyleCompiler::new();
    compiler.add_rule(Rule::regex(
        r"^bg-([a-z]+)$",
        |caps: &CaptureGroups, theme: &Theme| {
            let name = caps.get(1).unwrap_or_default();
            let mut map = PropertyMap::new();
            map.insert(
                "background-color".to_string(),
                theme.color(name).unwrap_or(name).to_string(),
            );
            map
        },
    ))
    .unwrap();

    let mut theme = Theme::empty();
    theme
        .colors
        .insert("brand".to_string(), "#111111".to_string());
    compiler.replace_theme(theme);
    assert!(compiler.compile("bg-brand").css.contains("#111111"));

    let mut theme = Theme::empty();
    theme
        .colors
        .insert("brand".to_string(), "#222222".to_string());
    compiler.replace_theme(theme);
    assert_eq!(compiler.cache_stats().size, 0);
    assert!(compiler.compile("bg-brand").css.contains("#222222"));
}
