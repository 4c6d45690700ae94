use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Utility CSS Compiler CLI - compiles utility class tokens found in markup into CSS
#[derive(Parser, Debug)]
#[command(name = "utility-compiler-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan source files for class attributes and compile them to CSS
    Build(BuildArgs),
    /// Read a class list from stdin and write CSS to stdout
    Pipe(PipeArgs),
}

/// Arguments for the build command
#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    /// Input file patterns (glob patterns supported)
    #[arg(
        short = 'i',
        long = "input",
        value_name = "PATTERN",
        required = true,
        num_args = 1..,
        help = "Input file patterns to scan for class attributes"
    )]
    pub input: Vec<String>,

    /// Output CSS file path
    #[arg(
        short = 'o',
        long = "output-css",
        value_name = "PATH",
        required = true,
        help = "Path where the generated CSS file will be written"
    )]
    pub output_css: PathBuf,

    /// Output build report path (JSON)
    #[arg(
        short = 'r',
        long = "output-report",
        value_name = "PATH",
        help = "Path where the JSON build report will be written"
    )]
    pub output_report: Option<PathBuf>,

    /// Configuration file path (YAML or JSON)
    #[arg(
        short = 'c',
        long = "config",
        value_name = "PATH",
        help = "Path to configuration file (YAML or JSON format)"
    )]
    pub config: Option<PathBuf>,

    /// Enable CSS minification
    #[arg(
        long = "minify",
        default_value_t = false,
        help = "Enable minification of the output CSS"
    )]
    pub minify: bool,

    /// Verbose output
    #[arg(
        short = 'v',
        long = "verbose",
        default_value_t = false,
        help = "Enable verbose output"
    )]
    pub verbose: bool,

    /// Number of parallel threads to use
    #[arg(
        short = 'j',
        long = "jobs",
        value_name = "NUM",
        help = "Number of parallel threads to use (defaults to number of CPU cores)"
    )]
    pub jobs: Option<usize>,

    /// Exclude patterns (glob patterns to exclude)
    #[arg(
        short = 'e',
        long = "exclude",
        value_name = "PATTERN",
        num_args = 0..,
        help = "Patterns to exclude from scanning"
    )]
    pub exclude: Vec<String>,

    /// Dry run (don't write output files)
    #[arg(
        long = "dry-run",
        default_value_t = false,
        help = "Perform the build but don't write output files"
    )]
    pub dry_run: bool,
}

/// Arguments for the pipe command
#[derive(Parser, Debug, Clone)]
pub struct PipeArgs {
    /// Enable CSS minification
    #[arg(
        long = "minify",
        default_value_t = false,
        help = "Enable minification of the output CSS"
    )]
    pub minify: bool,

    /// Configuration file path (YAML or JSON)
    #[arg(
        short = 'c',
        long = "config",
        value_name = "PATH",
        help = "Path to configuration file (YAML or JSON format)"
    )]
    pub config: Option<PathBuf>,
}

impl BuildArgs {
    /// Validate that the arguments are consistent
    pub fn validate(&self) -> Result<(), String> {
        if self.input.is_empty() {
            return Err("At least one input pattern must be provided".to_string());
        }

        if let Some(report) = &self.output_report {
            if report == &self.output_css {
                return Err("Output CSS and report paths must be different".to_string());
            }
        }

        if let Some(jobs) = self.jobs {
            if jobs == 0 {
                return Err("Number of jobs must be at least 1".to_string());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> BuildArgs {
        BuildArgs {
            input: vec!["src/**/*.html".to_string()],
            output_css: PathBuf::from("out.css"),
            output_report: Some(PathBuf::from("report.json")),
            config: None,
            minify: false,
            verbose: false,
            jobs: None,
            exclude: vec![],
            dry_run: false,
        }
    }

    #[test]
    fn test_valid_args() {
        assert!(args().validate().is_ok());
    }

    #[test]
    fn test_conflicting_output_paths() {
        let mut args = args();
        args.output_report = Some(args.output_css.clone());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_zero_jobs_rejected() {
        let mut args = args();
        args.jobs = Some(0);
        assert!(args.validate().is_err());
    }
}
