use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// Design-token scales consulted by rule handlers.
///
/// Handlers receive a shared reference to the active theme; they never
/// mutate it. Swapping themes goes through the compiler, which bumps
/// the cache's theme version with [`Theme::version`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    /// Color names to CSS color values
    pub colors: BTreeMap<String, String>,

    /// Spacing scale keys to CSS lengths
    pub spacing: BTreeMap<String, String>,

    /// Font family names to font stacks
    pub font_family: BTreeMap<String, Vec<String>>,
}

impl Default for Theme {
    fn default() -> Self {
        let mut colors = BTreeMap::new();
        for (name, value) in [
            ("white", "#ffffff"),
            ("black", "#000000"),
            ("red-500", "#ef4444"),
            ("blue-500", "#3b82f6"),
            ("green-500", "#22c55e"),
            ("gray-100", "#f3f4f6"),
            ("gray-900", "#111827"),
        ] {
            colors.insert(name.to_string(), value.to_string());
        }

        let mut spacing = BTreeMap::new();
        for (name, value) in [
            ("0", "0"),
            ("1", "0.25rem"),
            ("2", "0.5rem"),
            ("3", "0.75rem"),
            ("4", "1rem"),
            ("6", "1.5rem"),
            ("8", "2rem"),
            ("12", "3rem"),
            ("16", "4rem"),
        ] {
            spacing.insert(name.to_string(), value.to_string());
        }

        let mut font_family = BTreeMap::new();
        font_family.insert(
            "sans".to_string(),
            vec![
                "ui-sans-serif".to_string(),
                "system-ui".to_string(),
                "sans-serif".to_string(),
            ],
        );
        font_family.insert(
            "mono".to_string(),
            vec![
                "ui-monospace".to_string(),
                "SFMono-Regular".to_string(),
                "monospace".to_string(),
            ],
        );

        Self {
            colors,
            spacing,
            font_family,
        }
    }
}

impl Theme {
    /// Empty theme with no scales at all.
    pub fn empty() -> Self {
        Self {
            colors: BTreeMap::new(),
            spacing: BTreeMap::new(),
            font_family: BTreeMap::new(),
        }
    }

    pub fn color(&self, name: &str) -> Option<&str> {
        self.colors.get(name).map(String::as_str)
    }

    pub fn spacing(&self, name: &str) -> Option<&str> {
        self.spacing.get(name).map(String::as_str)
    }

    pub fn font_family(&self, name: &str) -> Option<&[String]> {
        self.font_family.get(name).map(Vec::as_slice)
    }

    /// Opaque fingerprint of the theme contents.
    ///
    /// Equal themes produce equal versions, and any scale edit changes
    /// the version. Used by the cache to invalidate memoized CSS
    /// without enumerating affected entries. BTreeMap iteration keeps
    /// the hash deterministic.
    pub fn version(&self) -> String {
        use std::collections::hash_map::DefaultHasher;

        let mut hasher = DefaultHasher::new();
        for (k, v) in &self.colors {
            k.hash(&mut hasher);
            v.hash(&mut hasher);
        }
        for (k, v) in &self.spacing {
            k.hash(&mut hasher);
            v.hash(&mut hasher);
        }
        for (k, v) in &self.font_family {
            k.hash(&mut hasher);
            v.hash(&mut hasher);
        }
        to_base62(hasher.finish())
    }
}

/// Convert a number to a base62 string
fn to_base62(mut num: u64) -> String {
    const CHARS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

    if num == 0 {
        return "0".to_string();
    }

    let mut result = Vec::new();
    while num > 0 {
        result.push(CHARS[(num % 62) as usize]);
        num /= 62;
    }

    result.reverse();
    String::from_utf8(result).expect("base62 output is ASCII")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_deterministic() {
        let a = Theme::default();
        let b = Theme::default();
        assert_eq!(a.version(), b.version());
    }

    #[test]
    fn test_version_changes_with_content() {
        let base = Theme::default();
        let mut edited = Theme::default();
        edited
            .colors
            .insert("brand".to_string(), "#0066cc".to_string());
        assert_ne!(base.version(), edited.version());
    }

    #[test]
    fn test_scale_lookups() {
        let theme = Theme::default();
        assert_eq!(theme.spacing("4"), Some("1rem"));
        assert_eq!(theme.color("red-500"), Some("#ef4444"));
        assert!(theme.color("does-not-exist").is_none());
    }

    #[test]
    fn test_base62() {
        assert_eq!(to_base62(0), "0");
        assert_eq!(to_base62(61), "z");
        assert_eq!(to_base62(62), "10");
        assert_eq!(to_base62(3843), "zz");
    }

    #[test]
    fn test_serde_round_trip() {
        let theme = Theme::default();
        let json = serde_json::to_string(&theme).unwrap();
        let back: Theme = serde_json::from_str(&json).unwrap();
        assert_eq!(theme, back);
        assert_eq!(theme.version(), back.version());
    }
}
