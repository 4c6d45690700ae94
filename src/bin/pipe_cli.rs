//! Utility CSS compiler CLI with build and pipe modes
//!
//! 1. build - scan source files for class attributes, compile them and
//!    write CSS plus a JSON build report
//! 2. pipe - read a class list from stdin, write CSS to stdout

use anyhow::{Context, Result};
use clap::Parser;
use utility_compiler::{build, pipe, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build(args) => {
            let result = build(&args).context("Build failed")?;
            if args.dry_run {
                eprintln!(
                    "Dry run: {} classes compiled from {} files, nothing written",
                    result.total_classes, result.total_files_processed
                );
            }
            Ok(())
        }
        Commands::Pipe(args) => pipe(&args).await.context("Pipe failed"),
    }
}
