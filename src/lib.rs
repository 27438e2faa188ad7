//! dupfind - concurrent duplicate file finder
//!
//! Walks a directory tree, hashes every regular file with BLAKE3 and groups
//! paths by digest. The default fan-out strategy runs one task per
//! directory and per file while capping how many files are open at once.

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod generator;
pub mod logging;
pub mod output;
pub mod scanner;

use std::io::Write;
use std::time::Instant;

use anyhow::{Context, Result};

use crate::cli::{Cli, Commands, GenerateArgs, OutputFormat, ScanArgs};
use crate::config::Config;
use crate::duplicates::DuplicateFinder;
use crate::error::ExitCode;
use crate::generator::{GenerateReport, LetterStream};
use crate::output::{JsonOutput, TextOutput};

/// Run the command described by `cli`.
///
/// Logging is initialised here; the caller owns the process exit.
///
/// # Errors
///
/// Returns any error that ended the command before it could report.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    let start = Instant::now();

    let code = match &cli.command {
        Commands::Scan(args) => {
            let mut config =
                Config::load(cli.config.as_deref()).context("could not load configuration")?;
            args.apply_to(&mut config);
            run_scan(args, &config.normalized())?
        }
        Commands::Generate(args) => {
            run_generate(args)?;
            ExitCode::Success
        }
    };

    log::info!("Total time it took: {:.2?}", start.elapsed());
    Ok(code)
}

fn run_scan(args: &ScanArgs, config: &Config) -> Result<ExitCode> {
    log::debug!("Effective configuration: {config:?}");
    let finder = DuplicateFinder::new(config.finder_config());
    let (groups, summary) = finder.find_duplicates(&args.root)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match args.output {
        OutputFormat::Text => TextOutput::new(&groups, &summary).write_to(&mut out)?,
        OutputFormat::Json => JsonOutput::new(&groups, &summary).write_to(&mut out)?,
    }
    out.flush()?;

    Ok(ExitCode::Success)
}

fn run_generate(args: &GenerateArgs) -> Result<GenerateReport> {
    let mut letters = match args.seed {
        Some(seed) => LetterStream::new(seed),
        None => LetterStream::from_clock(),
    };
    let report = generator::generate(&args.dir, args.count, args.length, &mut letters)
        .with_context(|| format!("could not generate files in {}", args.dir.display()))?;
    if report.skipped > 0 {
        log::warn!(
            "{} of {} file(s) could not be created in {}",
            report.skipped,
            args.count,
            args.dir.display()
        );
    }
    Ok(report)
}
