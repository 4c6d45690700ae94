pub mod args;
pub mod cache;
pub mod compiler;
pub mod config;
pub mod errors;
pub mod matcher;
pub mod parser;
pub mod presets;
pub mod report;
pub mod scanner;
pub mod theme;

pub use args::{BuildArgs, Cli, Commands, PipeArgs};
pub use cache::{CacheOptions, CacheStats, StyleCache};
pub use compiler::{escape_class_name, minify_css, CompileOutput, StyleCompiler};
pub use config::CompilerConfig;
pub use errors::{CompilerError, Result};
pub use matcher::{
    CaptureGroups, CompiledRule, MatchResult, Matcher, PropertyMap, Rule, RuleHandler, RulePattern,
};
pub use parser::{expand_variant_groups, ClassParser, ParsedClass};
pub use presets::default_rules;
pub use report::{BuildReport, ReportBuilder, ReportClassInfo};
pub use scanner::{collect_files, scan_content, scan_files, ScanOptions, ScannedClass};
pub use theme::Theme;

use indexmap::IndexMap;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Performance statistics for one build
#[derive(Debug, Clone)]
pub struct BuildStats {
    pub total_duration: Duration,
    pub scan_duration: Duration,
    pub compile_duration: Duration,
    pub files_per_second: f64,
    pub bytes_processed: u64,
}

/// Result of the build process
#[derive(Debug)]
pub struct BuildResult {
    pub css_content: String,
    pub report: serde_json::Value,
    pub total_classes: usize,
    pub total_files_processed: usize,
    pub stats: BuildStats,
}

/// Main build entry point: scan, compile, report.
pub fn build(args: &BuildArgs) -> Result<BuildResult> {
    let start_time = Instant::now();

    args.validate().map_err(CompilerError::InvalidInput)?;

    let config = match &args.config {
        Some(path) => CompilerConfig::from_file(path)?,
        None => CompilerConfig::default(),
    };

    let files = scanner::collect_files(&args.input, &args.exclude, &ScanOptions::default())?;
    if files.is_empty() {
        return Err(CompilerError::NoFilesFound);
    }

    if args.verbose {
        eprintln!("Starting utility CSS build...");
        eprintln!("Input patterns: {:?}", args.input);
        eprintln!("Output CSS: {}", args.output_css.display());
        eprintln!("Found {} files to scan", files.len());
    }

    let progress_bar = if !args.verbose {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({msg})")
                .unwrap()
                .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        pb.set_message("Scanning sources...");
        Some(pb)
    } else {
        None
    };

    // Scan all files for class attributes
    let scan_start = Instant::now();
    let file_paths: Vec<PathBuf> = files.iter().map(|(path, _)| path.clone()).collect();
    let bytes_processed: u64 = files.iter().map(|(_, size)| *size).sum();
    let scanned = scanner::scan_files(&file_paths, args.jobs)?;
    let scan_duration = scan_start.elapsed();

    if let Some(pb) = &progress_bar {
        pb.set_position(files.len() as u64);
        pb.set_message("Compiling classes...");
    }

    // Tokenize every attribute value once, tracking usage per token.
    let class_parser = ClassParser::new();
    let mut usage: IndexMap<String, ReportClassInfo> = IndexMap::new();
    for found in &scanned {
        let location = format!("{}:{}", found.file, found.line);
        for parsed in class_parser.parse_classes(&found.value) {
            let entry = usage
                .entry(parsed.original)
                .or_insert_with(|| ReportClassInfo {
                    count: 0,
                    files: Vec::new(),
                });
            entry.count += 1;
            if !entry.files.contains(&location) {
                entry.files.push(location.clone());
            }
        }
    }

    if args.verbose {
        eprintln!(
            "Found {} unique class tokens in {} attributes",
            usage.len(),
            scanned.len()
        );
    }

    // Compile each unique token exactly once.
    let compile_start = Instant::now();
    let mut compiler = StyleCompiler::with_config(config);
    compiler.add_rules(presets::default_rules())?;

    let mut body = String::new();
    let mut unresolved = Vec::new();
    let mut total_classes = 0usize;
    for token in usage.keys() {
        match compiler.compile_class(token) {
            Some(block) => {
                body.push_str(&block);
                total_classes += 1;
            }
            None => unresolved.push(token.clone()),
        }
    }
    let compile_duration = compile_start.elapsed();

    usage.retain(|token, _| !unresolved.contains(token));

    let css_size = body.len();
    let minified_size = if args.minify {
        let minified = minify_css(&body);
        let size = minified.len();
        body = minified;
        Some(size)
    } else {
        None
    };
    let css_content = format!("{}{}", css_header(), body);

    let report = ReportBuilder::new()
        .with_files_processed(files.len())
        .with_class_usage(usage)
        .with_unresolved(unresolved.clone())
        .with_cache_stats(compiler.cache_stats())
        .build(css_size, minified_size)
        .to_json();

    let mut stats = BuildStats {
        total_duration: start_time.elapsed(),
        scan_duration,
        compile_duration,
        files_per_second: 0.0,
        bytes_processed,
    };
    stats.files_per_second = files.len() as f64 / stats.total_duration.as_secs_f64().max(1e-9);

    let result = BuildResult {
        css_content,
        report,
        total_classes,
        total_files_processed: files.len(),
        stats: stats.clone(),
    };

    if let Some(pb) = progress_bar {
        pb.finish_with_message(format!("✓ Complete ({:.1} files/sec)", stats.files_per_second));
    }

    if !args.dry_run {
        write_output_files(args, &result)?;
    }

    if args.verbose {
        eprintln!("\nBuild complete:");
        eprintln!("  - Processed {} files", result.total_files_processed);
        eprintln!("  - Compiled {} unique class tokens", result.total_classes);
        if !unresolved.is_empty() {
            eprintln!("  - {} tokens matched no rule:", unresolved.len());
            for token in &unresolved {
                eprintln!("      {}", token);
            }
        }
        eprintln!("\nPerformance:");
        eprintln!("  - Total time: {:.2}s", stats.total_duration.as_secs_f64());
        eprintln!("  - Scan: {:.2}s", stats.scan_duration.as_secs_f64());
        eprintln!("  - Compile: {:.2}s", stats.compile_duration.as_secs_f64());
        eprintln!("  - Processing rate: {:.1} files/sec", stats.files_per_second);
        eprintln!(
            "  - Data processed: {:.2} MB",
            stats.bytes_processed as f64 / (1024.0 * 1024.0)
        );
    }

    Ok(result)
}

/// Handle the pipe command - read a class list from stdin, write CSS
/// to stdout.
pub async fn pipe(args: &PipeArgs) -> Result<()> {
    use tokio::io::{self, AsyncReadExt, AsyncWriteExt};

    let mut input = String::new();
    let mut stdin = io::stdin();
    stdin
        .read_to_string(&mut input)
        .await
        .map_err(|e| CompilerError::InvalidInput(format!("Failed to read from stdin: {}", e)))?;

    if input.trim().is_empty() {
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => CompilerConfig::from_file(path)?,
        None => CompilerConfig::default(),
    };

    let mut compiler = StyleCompiler::with_config(config);
    compiler.add_rules(presets::default_rules())?;

    let output = compiler.compile(&input);
    for (token, _count) in compiler.unresolved_tokens() {
        eprintln!("Warning: no rule matched '{}'", token);
    }

    let css = if args.minify {
        minify_css(&output.css)
    } else {
        output.css
    };

    let mut stdout = io::stdout();
    stdout
        .write_all(css.as_bytes())
        .await
        .map_err(|e| CompilerError::OutputError {
            path: "stdout".to_string(),
            message: e.to_string(),
        })?;
    stdout.flush().await.map_err(|e| CompilerError::OutputError {
        path: "stdout".to_string(),
        message: e.to_string(),
    })?;

    Ok(())
}

fn css_header() -> String {
    format!(
        "/* Generated by utility-compiler-cli v{} at {} */\n",
        env!("CARGO_PKG_VERSION"),
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )
}

/// Write the build results to output files with atomic writes
fn write_output_files(args: &BuildArgs, result: &BuildResult) -> Result<()> {
    if let Some(parent) = args.output_css.parent() {
        fs::create_dir_all(parent)?;
    }

    write_atomic(&args.output_css, &result.css_content).map_err(|e| {
        CompilerError::OutputError {
            path: args.output_css.display().to_string(),
            message: e.to_string(),
        }
    })?;

    if let Some(report_path) = &args.output_report {
        if let Some(parent) = report_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = if args.minify {
            serde_json::to_string(&result.report)?
        } else {
            serde_json::to_string_pretty(&result.report)?
        };
        write_atomic(report_path, &content).map_err(|e| CompilerError::OutputError {
            path: report_path.display().to_string(),
            message: e.to_string(),
        })?;
    }

    Ok(())
}

/// Write a file by way of a temp file and rename, so readers never see
/// a half-written output.
fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    use std::io::Write;

    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;
    fs::rename(&temp_path, path)
}
