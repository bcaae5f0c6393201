use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{SearchError, SearchResult};

/// One search request: what to look for and where, demonstrating Rust's
/// strong typing compared to .NET's optional configuration pattern.
///
/// # Configuration Locations
///
/// A request can be pre-filled from YAML files, in order of precedence:
/// 1. Custom config file specified via `--config` flag
/// 2. Local `.textseek.yaml` in the current directory
/// 3. Global `$HOME/.config/textseek/config.yaml`
///
/// # Configuration Format
///
/// ```yaml
/// # Substring to look for (no regex)
/// term: "timeout"
///
/// # Glob patterns selecting candidate files
/// patterns:
///   - "*.log"
///   - "*.txt"
///
/// # Directory to search in (empty = current directory)
/// directory: "/var/log/myapp"
///
/// # Descend into subdirectories
/// recursive: true
///
/// # Match case exactly
/// case_sensitive: false
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "info"
/// ```
///
/// # CLI Integration
///
/// Command-line arguments take precedence over config file values; the
/// merging behavior is defined in the `merge_with_cli` method.
///
/// # Rust vs .NET Configuration
///
/// .NET's IConfiguration pattern leaves every property nullable at runtime;
/// the serde defaults below give every field a concrete value at
/// deserialization time, so downstream code never checks for null.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// The substring to search for (plain containment, no regex)
    #[serde(default)]
    pub term: String,

    /// Glob patterns selecting candidate files, in priority order
    #[serde(default = "default_patterns")]
    pub patterns: Vec<String>,

    /// Directory to search in; empty means the current working directory
    #[serde(default)]
    pub directory: PathBuf,

    /// Whether to descend into subdirectories
    #[serde(default)]
    pub recursive: bool,

    /// Whether the term must match case exactly
    #[serde(default)]
    pub case_sensitive: bool,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_patterns() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl SearchRequest {
    /// Loads request defaults from the standard config locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads request defaults, preferring an explicit config file
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        // Default config locations, lowest precedence first
        let config_files = [
            // Global config
            dirs::config_dir().map(|p| p.join("textseek/config.yaml")),
            // Local config
            Some(PathBuf::from(".textseek.yaml")),
        ];

        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // An explicit path must exist; let the builder report it if not
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path));
        }

        builder.build()?.try_deserialize()
    }

    /// Merges CLI arguments with configuration file values
    pub fn merge_with_cli(mut self, cli_request: SearchRequest) -> Self {
        // CLI values take precedence over config file values
        if !cli_request.term.is_empty() {
            self.term = cli_request.term;
        }
        if cli_request.patterns != default_patterns() {
            self.patterns = cli_request.patterns;
        }
        if !cli_request.directory.as_os_str().is_empty() {
            self.directory = cli_request.directory;
        }
        if cli_request.recursive {
            self.recursive = true;
        }
        if cli_request.case_sensitive {
            self.case_sensitive = true;
        }
        if cli_request.log_level != default_log_level() {
            self.log_level = cli_request.log_level;
        }
        self
    }

    /// Checks the invariants callers must establish before running a search
    pub fn validate(&self) -> SearchResult<()> {
        if self.term.is_empty() {
            return Err(SearchError::config_error("search term must not be empty"));
        }
        if self.patterns.is_empty() {
            return Err(SearchError::config_error(
                "at least one file pattern is required",
            ));
        }
        Ok(())
    }
}
