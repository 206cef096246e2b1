//! Run configuration.
//!
//! Settings for a sort run are read from a TOML file. The `[sort]` section
//! tunes the engine and the run, the `[filters]` section lists entries the
//! sorter must leave alone:
//! - Exact name matching
//! - Glob pattern matching
//! - File extension matching
//! - Regex matching on the entry name
//! - Include (whitelist) rules that override exclude rules
//!
//! The category table itself is fixed and cannot be configured.
//!
//! # Configuration File Format
//!
//! ```toml
//! [sort]
//! collision = "suffix"   # or "overwrite"
//! max_depth = 64
//! rename_root = true
//! root_name = "SORTED"
//!
//! [filters]
//! include_hidden = true
//!
//! [filters.exclude]
//! filenames = [".DS_Store", "Thumbs.db"]
//! patterns = ["*.part"]
//! extensions = ["crdownload"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```

use crate::sorter::{CollisionPolicy, SortOptions};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur during configuration loading and filtering.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    InvalidRegexPattern {
        /// The regex pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(
                    f,
                    "Invalid glob pattern '{}': expected *.ext or dir/**",
                    pattern
                )
            }
            ConfigError::InvalidRegexPattern { pattern, reason } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, reason)
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration for a sort run.
///
/// Deserialized from TOML. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sort: SortSettings,
    #[serde(default)]
    pub filters: FilterRules,
}

/// Engine and run settings from the `[sort]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortSettings {
    /// How to resolve two entries normalizing to the same name.
    #[serde(default)]
    pub collision: CollisionPolicy,

    /// Maximum directory depth below the target that is sorted.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Whether the target directory is renamed once sorting finishes.
    #[serde(default = "default_rename_root")]
    pub rename_root: bool,

    /// New name for the target directory.
    #[serde(default = "default_root_name")]
    pub root_name: String,
}

fn default_max_depth() -> usize {
    SortOptions::default().max_depth
}

fn default_rename_root() -> bool {
    true
}

fn default_root_name() -> String {
    "SORTED".to_string()
}

impl Default for SortSettings {
    fn default() -> Self {
        Self {
            collision: CollisionPolicy::default(),
            max_depth: default_max_depth(),
            rename_root: default_rename_root(),
            root_name: default_root_name(),
        }
    }
}

impl SortSettings {
    /// Builds the engine options for a run.
    pub fn options(&self, dry_run: bool) -> SortOptions {
        SortOptions {
            collision: self.collision,
            max_depth: self.max_depth,
            dry_run,
        }
    }
}

/// Entry filter rules from the `[filters]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether entries starting with "." are sorted. Defaults to true.
    #[serde(default = "default_include_hidden")]
    pub include_hidden: bool,

    /// Rules for excluding entries.
    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Rules for including entries (whitelist, overrides exclude rules).
    #[serde(default)]
    pub include: IncludeRules,
}

fn default_include_hidden() -> bool {
    true
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            include_hidden: default_include_hidden(),
            exclude: ExcludeRules::default(),
            include: IncludeRules::default(),
        }
    }
}

/// Rules for excluding entries from sorting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact names to exclude (e.g., ".DS_Store", "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns to exclude (e.g., "*.tmp", "**/node_modules").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// File extensions to exclude (e.g., "bak", "tmp", "part").
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the entry name.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Rules for including entries, overriding exclude rules (whitelist).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    /// Glob patterns that override exclude rules.
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl Config {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.dirsortrc.toml` in the current directory
    /// 3. Look for `~/.config/dirsort/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// or if any file found is invalid.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".dirsortrc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("dirsort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if file does not exist.
    /// Returns `ConfigError::ConfigInvalid` if TOML parsing or validation fails.
    /// Returns `ConfigError::IoError` if file cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        let config: Self =
            toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that parse but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let name = &self.sort.root_name;
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(ConfigError::ConfigInvalid(format!(
                "root_name '{}' must be a plain folder name",
                name
            )));
        }
        Ok(())
    }

    /// Compile the filter rules into matchers.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.filters)
    }
}

/// Filter rules compiled into matchers.
///
/// Glob and regex patterns are parsed once here instead of on every entry.
#[derive(Debug)]
pub struct CompiledFilters {
    include_hidden: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl CompiledFilters {
    /// Create compiled filters from filter rules.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex patterns are invalid.
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = Self::compile_globs(&rules.exclude.patterns)?;
        let include_patterns = Self::compile_globs(&rules.include.patterns)?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            include_hidden: rules.include_hidden,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
            include_patterns,
        })
    }

    fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
        patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect()
    }

    /// Check if an entry should be sorted (not excluded).
    ///
    /// Checks are performed in this order, with early termination:
    /// 1. Include patterns (whitelist) - if matched, always include
    /// 2. Hidden entry filter - if hidden and disabled, exclude
    /// 3. Exact name match - if matched, exclude
    /// 4. Extension match - if matched, exclude
    /// 5. Glob pattern match - if matched, exclude
    /// 6. Regex match on the name - if matched, exclude
    /// 7. Default: include
    pub fn should_include(&self, path: &Path) -> bool {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.matches_any(&self.include_patterns, path) {
            return true;
        }

        if !self.include_hidden && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        if self.matches_any(&self.exclude_patterns, path) {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }

    fn matches_any(&self, patterns: &[Pattern], path: &Path) -> bool {
        patterns.iter().any(|pattern| pattern.matches_path(path))
    }
}
