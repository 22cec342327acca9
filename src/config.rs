//! Layered application configuration.
//!
//! Settings are merged from, lowest to highest precedence:
//!
//! 1. Built-in defaults
//! 2. A TOML file (`--config PATH`, else `<config dir>/dedupe/config.toml` if present)
//! 3. Environment variables prefixed `DEDUPE_` (e.g. `DEDUPE_MIN_SIZE=4096`)
//! 4. Command-line flags
//!
//! # Example file
//!
//! ```toml
//! min_size = 1024
//! prefix_bytes = 512
//! io_threads = 8
//! use_cache = true
//! cache_path = "/var/tmp/dedupe.db"
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cache::HashCache;
use crate::cli::Cli;
use crate::duplicates::FinderConfig;
use crate::scanner::{WalkerConfig, DEFAULT_PREFIX_BYTES};

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "DEDUPE_";

/// Invalid or unreadable configuration. Always fatal, raised before scanning.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Prefix length must be at least one byte.
    #[error("Invalid prefix length: {0} (must be at least 1)")]
    InvalidPrefixLength(usize),

    /// At least one I/O thread is required.
    #[error("Invalid I/O thread count: {0} (must be at least 1)")]
    InvalidIoThreads(usize),

    /// An explicitly requested configuration file does not exist.
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// The configuration could not be parsed or merged.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] figment::Error),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Files smaller than this many bytes are ignored.
    pub min_size: u64,
    /// Leading bytes compared by the prefix stage.
    pub prefix_bytes: usize,
    /// Worker threads for prefix reads and hashing.
    pub io_threads: usize,
    /// Skip hidden files and directories.
    pub skip_hidden: bool,
    /// Use the metadata store.
    pub use_cache: bool,
    /// Metadata store location; the platform cache directory if unset.
    pub cache_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_size: 0,
            prefix_bytes: DEFAULT_PREFIX_BYTES,
            io_threads: 4,
            skip_hidden: false,
            use_cache: true,
            cache_path: None,
        }
    }
}

impl Config {
    /// Load configuration from defaults, file and environment.
    ///
    /// With `explicit` set, that file must exist. Otherwise the platform
    /// default file is used if present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is missing or malformed.
    ///
    /// Values are not validated here; CLI flags may still override them.
    /// Call [`validate`](Self::validate) on the final configuration.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::FileNotFound(path.to_path_buf()));
                }
                log::debug!("Loading configuration from {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
            None => {
                if let Some(path) = Self::default_path().filter(|p| p.is_file()) {
                    log::debug!("Loading configuration from {}", path.display());
                    figment = figment.merge(Toml::file(path));
                }
            }
        }

        let config: Self = figment.merge(Env::prefixed(ENV_PREFIX)).extract()?;
        Ok(config)
    }

    /// Default configuration file location.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dedupe").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply command-line flags on top of the loaded configuration.
    #[must_use]
    pub fn with_cli_overrides(mut self, cli: &Cli) -> Self {
        if let Some(min_size) = cli.min_size {
            self.min_size = min_size;
        }
        if let Some(prefix_bytes) = cli.prefix_bytes {
            self.prefix_bytes = prefix_bytes;
        }
        if let Some(io_threads) = cli.io_threads {
            self.io_threads = io_threads;
        }
        if cli.skip_hidden {
            self.skip_hidden = true;
        }
        if let Some(ref db) = cli.db {
            self.cache_path = Some(db.clone());
        }
        if cli.no_db {
            self.use_cache = false;
        }
        self
    }

    /// Reject values the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a zero prefix length or thread count.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.finder_config().validate()
    }

    /// Metadata store location, if the store is enabled.
    #[must_use]
    pub fn resolved_cache_path(&self) -> Option<PathBuf> {
        if !self.use_cache {
            return None;
        }
        self.cache_path.clone().or_else(HashCache::default_path)
    }

    /// Pipeline settings derived from this configuration.
    ///
    /// The store, shutdown flag and progress callback are attached by the caller.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_min_size(self.min_size)
            .with_prefix_bytes(self.prefix_bytes)
            .with_io_threads(self.io_threads)
            .with_walker_config(WalkerConfig {
                skip_hidden: self.skip_hidden,
            })
    }
}
