use crate::cache::CacheStats;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata for the generated build report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Version of the report format
    pub version: String,

    /// Timestamp when the report was generated
    pub generated_at: DateTime<Utc>,

    /// Number of files processed
    pub files_processed: usize,

    /// Number of unique class tokens that produced CSS
    pub classes_compiled: usize,

    /// Number of unique tokens that matched no rule
    pub unresolved_count: usize,

    /// Compiler version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler_version: Option<String>,
}

/// Usage details for one class token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportClassInfo {
    /// Number of occurrences across all inputs
    pub count: usize,

    /// Files where this token was found (with line)
    pub files: Vec<String>,
}

/// Complete build report structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildReport {
    pub metadata: ReportMetadata,

    /// Map of class tokens to their usage information
    pub classes: IndexMap<String, ReportClassInfo>,

    /// Tokens that matched no rule, for upstream diagnostics
    pub unresolved: Vec<String>,

    /// Cache counters at the end of the build
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheStats>,

    /// Output size statistics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<ReportStatistics>,
}

/// Statistics about the build output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportStatistics {
    /// Total CSS size in bytes
    pub css_size_bytes: usize,

    /// CSS size after minification (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minified_size_bytes: Option<usize>,
}

impl BuildReport {
    pub fn new() -> Self {
        Self {
            metadata: ReportMetadata {
                version: "1.0.0".to_string(),
                generated_at: Utc::now(),
                files_processed: 0,
                classes_compiled: 0,
                unresolved_count: 0,
                compiler_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            },
            classes: IndexMap::new(),
            unresolved: Vec::new(),
            cache: None,
            statistics: None,
        }
    }

    /// Record one occurrence of a class token
    pub fn add_class(&mut self, token: String, location: String) {
        let entry = self.classes.entry(token).or_insert_with(|| ReportClassInfo {
            count: 0,
            files: Vec::new(),
        });
        entry.count += 1;
        if !entry.files.contains(&location) {
            entry.files.push(location);
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Default for BuildReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for assembling a report from build results
pub struct ReportBuilder {
    report: BuildReport,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self {
            report: BuildReport::new(),
        }
    }

    pub fn with_files_processed(mut self, count: usize) -> Self {
        self.report.metadata.files_processed = count;
        self
    }

    pub fn with_class_usage(mut self, usage: IndexMap<String, ReportClassInfo>) -> Self {
        self.report.metadata.classes_compiled = usage.len();
        self.report.classes = usage;
        self
    }

    pub fn with_unresolved(mut self, unresolved: Vec<String>) -> Self {
        self.report.metadata.unresolved_count = unresolved.len();
        self.report.unresolved = unresolved;
        self
    }

    pub fn with_cache_stats(mut self, stats: CacheStats) -> Self {
        self.report.cache = Some(stats);
        self
    }

    pub fn build(mut self, css_size: usize, minified_size: Option<usize>) -> BuildReport {
        self.report.statistics = Some(ReportStatistics {
            css_size_bytes: css_size,
            minified_size_bytes: minified_size,
        });
        self.report
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}
