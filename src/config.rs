//! Layered configuration.
//!
//! Values are merged in this order, later layers winning:
//!
//! 1. built-in defaults ([`Config::default`]);
//! 2. a TOML file, either given with `--config` or `config.toml` in the
//!    platform configuration directory;
//! 3. `DUPFIND_*` environment variables, e.g. `DUPFIND_IO_LIMIT=8`.
//!
//! Command-line flags are applied on top by the caller.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::duplicates::{FinderConfig, Strategy};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "DUPFIND_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Traversal strategy
    pub strategy: Strategy,
    /// Maximum concurrent IO operations
    pub io_limit: usize,
    /// Size of the task pool (fan-out and multi-walker)
    pub threads: usize,
    /// Hashing threads (pipeline and multi-walker)
    pub workers: usize,
    /// Hash read buffer in bytes
    pub buffer_size: usize,
    /// Memory-map files of at least this many bytes; unset streams everything
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mmap_threshold: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        let finder = FinderConfig::default();
        Self {
            strategy: finder.strategy,
            io_limit: finder.io_limit,
            threads: finder.threads,
            workers: finder.workers,
            buffer_size: finder.buffer_size,
            mmap_threshold: finder.mmap_threshold,
        }
    }
}

impl Config {
    /// Load configuration from `path` (or the default location) and the
    /// environment.
    ///
    /// A missing default file is not an error. A file given explicitly must
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns a figment error if a layer cannot be read or a value has the
    /// wrong type.
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        let figment = match path {
            Some(path) => {
                if !path.is_file() {
                    return Err(figment::Error::from(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                Self::figment(Some(path.to_path_buf()))
            }
            None => Self::figment(Self::config_path()),
        };
        let config: Self = figment.extract()?;
        Ok(config.normalized())
    }

    fn figment(file: Option<PathBuf>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = file {
            log::debug!("Reading configuration from {}", file.display());
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Default platform-specific configuration file.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dupfind").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Clamp zero counts to one.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.io_limit = self.io_limit.max(1);
        self.threads = self.threads.max(1);
        self.workers = self.workers.max(1);
        self.buffer_size = self.buffer_size.max(1);
        self
    }

    /// Finder settings for this configuration.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_strategy(self.strategy)
            .with_io_limit(self.io_limit)
            .with_threads(self.threads)
            .with_workers(self.workers)
            .with_buffer_size(self.buffer_size)
            .with_mmap_threshold(self.mmap_threshold)
    }
}
