use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Theme version a fresh cache starts with.
pub const DEFAULT_THEME_VERSION: &str = "default";

/// Cache tuning knobs, deserializable from the config file.
///
/// A disabled cache and a zero capacity are both valid degenerate
/// configurations: every read misses and every write is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheOptions {
    /// Maximum number of entries
    pub max_size: usize,

    /// Entry time-to-live in milliseconds; `None` means unbounded
    pub ttl_ms: Option<u64>,

    /// Whether the cache participates at all
    pub enabled: bool,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            max_size: 1000,
            ttl_ms: None,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    stamped_at: Instant,
    theme_version: String,
}

/// Counter snapshot returned by [`StyleCache::stats`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    /// Percentage in `[0, 100]`; `0` before any operation
    pub hit_rate: f64,
    pub max_size: usize,
    /// Configured TTL in milliseconds, `-1` when unbounded
    pub ttl_ms: i64,
    pub theme_version: String,
}

/// Memoized CSS per raw class token, bounded by capacity and
/// optionally by age, invalidated en masse on theme changes.
///
/// The backing map's iteration order equals access recency: the entry
/// at index 0 is the least recently used, the tail is the most recent.
/// A hit re-inserts the entry at the tail; eviction always removes
/// index 0. Theme changes are lazy: [`StyleCache::set_theme_version`]
/// only records the new version, and stale entries are evicted the
/// next time a read touches them. This trades a little stale-memory
/// retention for never sweeping the whole map on a theme change;
/// [`StyleCache::cleanup`] is the explicit sweep for callers that want
/// the memory back now.
pub struct StyleCache {
    entries: IndexMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
    max_size: usize,
    ttl: Option<Duration>,
    enabled: bool,
    theme_version: String,
}

impl StyleCache {
    pub fn new() -> Self {
        Self::with_options(CacheOptions::default())
    }

    pub fn with_options(options: CacheOptions) -> Self {
        Self {
            entries: IndexMap::new(),
            hits: 0,
            misses: 0,
            max_size: options.max_size,
            ttl: options.ttl_ms.map(Duration::from_millis),
            enabled: options.enabled,
            theme_version: DEFAULT_THEME_VERSION.to_string(),
        }
    }

    /// Look up the CSS for a raw class token.
    ///
    /// A present entry stamped with an outdated theme version, or one
    /// older than the TTL, counts as a miss and is evicted on the
    /// spot. A hit bumps the entry to the most-recently-used position.
    pub fn get(&mut self, key: &str) -> Option<String> {
        if !self.enabled {
            self.misses += 1;
            return None;
        }

        let fresh = match self.entries.get(key) {
            None => {
                self.misses += 1;
                return None;
            }
            Some(entry) => self.is_fresh(entry),
        };

        if !fresh {
            self.entries.shift_remove(key);
            self.misses += 1;
            return None;
        }

        // Recency bump: remove and reinsert at the tail.
        let entry = self.entries.shift_remove(key).expect("entry just observed");
        let value = entry.value.clone();
        self.entries.insert(key.to_string(), entry);
        self.hits += 1;
        Some(value)
    }

    /// Store the CSS for a raw class token, stamped with the current
    /// time and theme version.
    ///
    /// An existing entry under the same key is removed first so the
    /// reinsertion refreshes recency. At capacity, the single oldest
    /// entry is evicted before the insert, so size never exceeds the
    /// bound.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        if !self.enabled || self.max_size == 0 {
            return;
        }

        if self.entries.shift_remove(key).is_none() && self.entries.len() >= self.max_size {
            self.entries.shift_remove_index(0);
        }

        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.into(),
                stamped_at: Instant::now(),
                theme_version: self.theme_version.clone(),
            },
        );
    }

    /// Whether a fresh entry exists for `key`.
    ///
    /// Freshness honors the theme version and TTL, but this probe
    /// neither evicts nor counts toward the hit/miss statistics.
    pub fn contains(&self, key: &str) -> bool {
        self.enabled
            && self
                .entries
                .get(key)
                .map_or(false, |entry| self.is_fresh(entry))
    }

    /// Record a new theme version without touching existing entries.
    ///
    /// Stale entries are caught lazily by `get`/`contains`, which
    /// compare stamped versions on every read.
    pub fn set_theme_version(&mut self, version: impl Into<String>) {
        let version = version.into();
        if version != self.theme_version {
            self.theme_version = version;
        }
    }

    /// Eager variant of a theme change: wipe all entries and counters
    /// and adopt the new version immediately.
    pub fn clear_with_version(&mut self, version: impl Into<String>) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
        self.theme_version = version.into();
    }

    /// Drop all entries; counters and version are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Explicit sweep removing every stale-version and expired entry.
    ///
    /// Never called automatically; returns how many entries were
    /// removed.
    pub fn cleanup(&mut self) -> usize {
        let before = self.entries.len();
        let version = self.theme_version.clone();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| {
            entry.theme_version == version
                && ttl.map_or(true, |limit| entry.stamped_at.elapsed() <= limit)
        });
        before - self.entries.len()
    }

    /// Repeated [`StyleCache::get`], sharing its semantics exactly.
    pub fn get_many(&mut self, keys: &[&str]) -> Vec<Option<String>> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    /// Repeated [`StyleCache::set`], sharing its semantics exactly.
    pub fn set_many<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>)
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in pairs {
            self.set(key.as_ref(), value);
        }
    }

    pub fn stats(&self) -> CacheStats {
        let total = self.hits + self.misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64 * 100.0
        };

        CacheStats {
            hits: self.hits,
            misses: self.misses,
            size: self.entries.len(),
            hit_rate,
            max_size: self.max_size,
            ttl_ms: self.ttl.map_or(-1, |t| t.as_millis() as i64),
            theme_version: self.theme_version.clone(),
        }
    }

    /// Number of entries in the backing map, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn theme_version(&self) -> &str {
        &self.theme_version
    }

    /// Snapshot iterator over fresh `(token, css)` pairs in recency
    /// order, oldest first. Stale and expired entries are filtered
    /// out, not evicted.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        let version = &self.theme_version;
        let ttl = self.ttl;
        self.entries
            .iter()
            .filter(move |(_, entry)| {
                entry.theme_version == *version
                    && ttl.map_or(true, |limit| entry.stamped_at.elapsed() <= limit)
            })
            .map(|(key, entry)| (key.as_str(), entry.value.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries().map(|(_, value)| value)
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        entry.theme_version == self.theme_version
            && self
                .ttl
                .map_or(true, |limit| entry.stamped_at.elapsed() <= limit)
    }

    /// Test hook: age an entry without sleeping.
    #[cfg(test)]
    fn backdate(&mut self, key: &str, by: Duration) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.stamped_at -= by;
        }
    }
}

impl Default for StyleCache {
    fn default() -> Self {
        Self::new()
    }
}
