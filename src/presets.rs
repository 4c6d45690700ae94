//! Built-in rule set registered by the CLI.
//!
//! Deliberately compact: enough coverage for real markup while every
//! matcher feature (prefix buckets, the empty-prefix fallback,
//! literals, priorities, capture-driven handlers) gets exercised.
//! Library users can skip these entirely and register their own.

use crate::matcher::{CaptureGroups, PropertyMap, Rule};
use crate::theme::Theme;

/// The default rules, ready for [`crate::Matcher::add_rules`].
pub fn default_rules() -> Vec<Rule> {
    let mut rules = vec![
        Rule::regex(r"^p-(\d+)$", |caps: &CaptureGroups, theme: &Theme| {
            one("padding", spacing_value(theme, caps.get(1).unwrap_or_default()))
        })
        .with_name("padding"),
        Rule::regex(r"^p([trblxy])-(\d+)$", |caps: &CaptureGroups, theme: &Theme| {
            sided(
                "padding",
                caps.get(1).unwrap_or_default(),
                spacing_value(theme, caps.get(2).unwrap_or_default()),
            )
        })
        .with_name("padding-side"),
        Rule::regex(r"^m-(\d+)$", |caps: &CaptureGroups, theme: &Theme| {
            one("margin", spacing_value(theme, caps.get(1).unwrap_or_default()))
        })
        .with_name("margin"),
        Rule::regex(r"^m([trblxy])-(\d+)$", |caps: &CaptureGroups, theme: &Theme| {
            sided(
                "margin",
                caps.get(1).unwrap_or_default(),
                spacing_value(theme, caps.get(2).unwrap_or_default()),
            )
        })
        .with_name("margin-side"),
        // Negative margins keep their own patterns: a leading dash has
        // no literal prefix, so these are found via the full-list
        // fallback, matching how a dashed utility string is looked up.
        Rule::regex(r"^-m-(\d+)$", |caps: &CaptureGroups, theme: &Theme| {
            one(
                "margin",
                negate(&spacing_value(theme, caps.get(1).unwrap_or_default())),
            )
        })
        .with_name("negative-margin"),
        Rule::regex(r"^-m([trblxy])-(\d+)$", |caps: &CaptureGroups, theme: &Theme| {
            sided(
                "margin",
                caps.get(1).unwrap_or_default(),
                negate(&spacing_value(theme, caps.get(2).unwrap_or_default())),
            )
        })
        .with_name("negative-margin-side"),
        Rule::regex(r"^w-(\d+)$", |caps: &CaptureGroups, theme: &Theme| {
            one("width", spacing_value(theme, caps.get(1).unwrap_or_default()))
        })
        .with_name("width"),
        Rule::regex(r"^h-(\d+)$", |caps: &CaptureGroups, theme: &Theme| {
            one("height", spacing_value(theme, caps.get(1).unwrap_or_default()))
        })
        .with_name("height"),
        Rule::regex(r"^w-\[(.+)\]$", |caps: &CaptureGroups, _theme: &Theme| {
            one("width", arbitrary_value(caps.get(1).unwrap_or_default()))
        })
        .with_name("width-arbitrary"),
        Rule::regex(r"^h-\[(.+)\]$", |caps: &CaptureGroups, _theme: &Theme| {
            one("height", arbitrary_value(caps.get(1).unwrap_or_default()))
        })
        .with_name("height-arbitrary"),
        Rule::literal("w-full", |_: &CaptureGroups, _: &Theme| one("width", "100%".into()))
            .with_name("width-full"),
        Rule::literal("h-full", |_: &CaptureGroups, _: &Theme| one("height", "100%".into()))
            .with_name("height-full"),
        Rule::regex(
            r"^bg-([a-z]+(?:-\d{2,3})?)(?:/(\d{1,3}))?$",
            |caps: &CaptureGroups, theme: &Theme| {
                one(
                    "background-color",
                    color_value(theme, caps.get(1).unwrap_or_default(), caps.get(2)),
                )
            },
        )
        .with_name("background-color"),
        Rule::regex(
            r"^text-([a-z]+(?:-\d{2,3})?)(?:/(\d{1,3}))?$",
            |caps: &CaptureGroups, theme: &Theme| {
                one(
                    "color",
                    color_value(theme, caps.get(1).unwrap_or_default(), caps.get(2)),
                )
            },
        )
        .with_name("text-color"),
        Rule::regex(r"^opacity-(\d+)$", |caps: &CaptureGroups, _theme: &Theme| {
            let percent: f64 = caps.get(1).unwrap_or("0").parse().unwrap_or(0.0);
            one("opacity", format!("{}", percent / 100.0))
        })
        .with_name("opacity"),
    ];

    // Display keywords. `hidden` carries a priority bump so user rule
    // sets layered on top of the presets can still register catch-all
    // patterns below it.
    for (token, value) in [
        ("block", "block"),
        ("inline-block", "inline-block"),
        ("inline", "inline"),
        ("flex", "flex"),
        ("grid", "grid"),
    ] {
        rules.push(
            Rule::literal(token, move |_: &CaptureGroups, _: &Theme| {
                one("display", value.into())
            })
            .with_name(format!("display-{}", token)),
        );
    }
    rules.push(
        Rule::literal("hidden", |_: &CaptureGroups, _: &Theme| {
            one("display", "none".into())
        })
        .with_name("display-hidden")
        .with_priority(10),
    );

    rules
}

fn one(property: &str, value: String) -> PropertyMap {
    let mut map = PropertyMap::new();
    map.insert(property.to_string(), value);
    map
}

fn sided(base: &str, side: &str, value: String) -> PropertyMap {
    let mut map = PropertyMap::new();
    match side {
        "t" => {
            map.insert(format!("{base}-top"), value);
        }
        "r" => {
            map.insert(format!("{base}-right"), value);
        }
        "b" => {
            map.insert(format!("{base}-bottom"), value);
        }
        "l" => {
            map.insert(format!("{base}-left"), value);
        }
        "x" => {
            map.insert(format!("{base}-left"), value.clone());
            map.insert(format!("{base}-right"), value);
        }
        "y" => {
            map.insert(format!("{base}-top"), value.clone());
            map.insert(format!("{base}-bottom"), value);
        }
        _ => {
            map.insert(base.to_string(), value);
        }
    }
    map
}

/// Theme spacing lookup with the numeric 0.25rem-per-step fallback.
fn spacing_value(theme: &Theme, key: &str) -> String {
    if let Some(value) = theme.spacing(key) {
        return value.to_string();
    }
    match key.parse::<f64>() {
        Ok(n) => format!("{}rem", n * 0.25),
        Err(_) => key.to_string(),
    }
}

fn negate(value: &str) -> String {
    if value == "0" {
        value.to_string()
    } else {
        format!("-{}", value)
    }
}

/// Theme color lookup, falling back to the raw name for CSS keywords
/// like `transparent`. An opacity modifier wraps the result in a
/// color-mix.
fn color_value(theme: &Theme, name: &str, opacity: Option<&str>) -> String {
    let color = theme
        .color(name)
        .map(str::to_string)
        .unwrap_or_else(|| name.to_string());
    match opacity {
        Some(percent) => format!("color-mix(in srgb, {} {}%, transparent)", color, percent),
        None => color,
    }
}

/// Unwrap an arbitrary value: underscores become spaces and a leading
/// type hint (`length:10px`) is dropped.
fn arbitrary_value(raw: &str) -> String {
    let raw = match raw.split_once(':') {
        Some((hint, rest)) if hint.chars().all(|c| c.is_ascii_alphabetic()) => rest,
        _ => raw,
    };
    raw.replace('_', " ")
}
