use crate::errors::{CompilerError, Result};
use rayon::prelude::*;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Limits applied while collecting input files
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Maximum file size in bytes (default: 10MB)
    pub max_file_size: u64,
    /// Allow symbolic links
    pub allow_symlinks: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            allow_symlinks: false,
        }
    }
}

/// One class-list string found in a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedClass {
    /// The attribute value, a whitespace-separated class list
    pub value: String,
    pub file: String,
    pub line: usize,
}

fn class_attr_regex() -> &'static Regex {
    static CLASS_ATTR: OnceLock<Regex> = OnceLock::new();
    CLASS_ATTR.get_or_init(|| {
        Regex::new(r#"class(?:Name)?\s*=\s*["']([^"']*)["']"#)
            .expect("class attribute pattern is valid")
    })
}

/// Collect files matching the given patterns.
///
/// Oversized files and disallowed symlinks are skipped with a warning
/// on stderr rather than failing the whole collection; directories and
/// excluded paths are skipped silently. Returns `(path, size)` pairs
/// with duplicates removed.
pub fn collect_files(
    patterns: &[String],
    exclude: &[String],
    options: &ScanOptions,
) -> Result<Vec<(PathBuf, u64)>> {
    let mut files = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let mut skipped = 0usize;

    for pattern in patterns {
        for entry in glob::glob(pattern)? {
            let path = entry?;

            if should_exclude(&path, exclude)? || path.is_dir() {
                continue;
            }

            if let Err(e) = validate_input_file(&path, options) {
                eprintln!("Warning: Skipping file - {}", e);
                skipped += 1;
                continue;
            }

            let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            if seen.insert(path.clone()) {
                files.push((path, size));
            }
        }
    }

    if skipped > 0 {
        eprintln!("Skipped {} files due to scan constraints", skipped);
    }

    Ok(files)
}

fn should_exclude(path: &Path, exclude: &[String]) -> Result<bool> {
    for pattern in exclude {
        let pattern = glob::Pattern::new(pattern)?;
        if pattern.matches_path(path) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn validate_input_file(path: &Path, options: &ScanOptions) -> Result<()> {
    if !options.allow_symlinks && path.is_symlink() {
        return Err(CompilerError::SecurityError(format!(
            "Symbolic link not allowed: {}",
            path.display()
        )));
    }

    let metadata = fs::metadata(path).map_err(|e| {
        CompilerError::SecurityError(format!(
            "Cannot read file metadata for '{}': {}",
            path.display(),
            e
        ))
    })?;

    if metadata.len() > options.max_file_size {
        return Err(CompilerError::SecurityError(format!(
            "File '{}' exceeds maximum size limit ({} MB > {} MB)",
            path.display(),
            metadata.len() / (1024 * 1024),
            options.max_file_size / (1024 * 1024)
        )));
    }

    Ok(())
}

/// Pull `class="..."` / `className='...'` attribute values out of one
/// file's content, with 1-based line positions.
pub fn scan_content(content: &str, file: &str) -> Vec<ScannedClass> {
    class_attr_regex()
        .captures_iter(content)
        .filter_map(|caps| {
            let m = caps.get(1)?;
            let value = m.as_str().trim();
            if value.is_empty() {
                return None;
            }
            let line = content[..m.start()].matches('\n').count() + 1;
            Some(ScannedClass {
                value: value.to_string(),
                file: file.to_string(),
                line,
            })
        })
        .collect()
}

/// Scan files in parallel, preserving the input file order.
pub fn scan_files(files: &[PathBuf], jobs: Option<usize>) -> Result<Vec<ScannedClass>> {
    if let Some(num_jobs) = jobs {
        let _ = rayon::ThreadPoolBuilder::new()
            .num_threads(num_jobs)
            .build_global();
    }

    let per_file: std::result::Result<Vec<Vec<ScannedClass>>, CompilerError> = files
        .par_iter()
        .map(|path| {
            if let Ok(metadata) = fs::metadata(path) {
                if metadata.len() == 0 {
                    return Ok(Vec::new());
                }
            }
            let content = fs::read_to_string(path)?;
            Ok(scan_content(&content, &path.display().to_string()))
        })
        .collect();

    Ok(per_file?.into_iter().flatten().collect())
}
