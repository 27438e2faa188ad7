//! Logging setup on top of the `log` facade and the `env_logger` backend.
//!
//! The level comes from, in order:
//!
//! 1. the `RUST_LOG` environment variable, when set;
//! 2. `--quiet` (errors only) or `-v` / `-vv` (debug / trace);
//! 3. info otherwise.
//!
//! Logs go to stderr so the report on stdout stays machine-readable.
//!
//! ```rust,no_run
//! use dupfind::logging::init_logging;
//!
//! init_logging(1, false);
//! log::debug!("visible with -v");
//! ```

use std::env;
use std::io::Write;

use env_logger::{Builder, Target};
use log::LevelFilter;

/// Initialize the global logger from the CLI verbosity flags.
///
/// # Panics
///
/// Panics if a logger has already been installed in this process.
pub fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = Builder::new();
    builder.target(Target::Stderr);

    let from_env = env::var("RUST_LOG").is_ok();
    if from_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet));
    }
    configure_format(&mut builder, verbose);
    builder.init();

    if from_env {
        log::debug!("Log level taken from RUST_LOG");
    } else {
        log::debug!("Log level: {}", current_level_name());
    }
}

fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Thread names matter once tasks fan out, so they are shown from -v up.
fn configure_format(builder: &mut Builder, verbose: u8) {
    builder.format(move |buf, record| {
        let level = record.level();
        let style = buf.default_level_style(level);
        if verbose == 0 {
            return writeln!(buf, "{style}{level:<5}{style:#} {}", record.args());
        }
        writeln!(
            buf,
            "{} {style}{level:<5}{style:#} [{}] {}",
            buf.timestamp_millis(),
            std::thread::current().name().unwrap_or("main"),
            record.args()
        )
    });
}

/// Name of the maximum enabled level.
pub fn current_level_name() -> &'static str {
    match log::max_level() {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    }
}
