//! Tool configuration loaded from TOML.
//!
//! Every setting has a default, so running without any configuration file
//! behaves exactly like the built-in tool: threshold 1000, three-digit rename
//! indices, no history journal, and nothing excluded from listings.
//!
//! # Configuration File Format
//!
//! ```toml
//! [blur]
//! default_threshold = 1000.0
//!
//! [rename]
//! pad_width = 3
//!
//! [history]
//! enabled = false
//!
//! [exclude]
//! filenames = ["Thumbs.db", ".DS_Store"]
//! patterns = ["*.tmp"]
//! regex = []
//! ```

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = ".dataset-tools.toml";

/// Threshold used by the blur filter when the caller does not supply one.
pub const DEFAULT_BLUR_THRESHOLD: f64 = 1000.0;

/// Minimum number of digits in a rename index.
pub const DEFAULT_PAD_WIDTH: usize = 3;

/// Errors that can occur during configuration loading and compilation.
#[derive(thiserror::Error, Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure, or an out-of-range value.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidGlobPattern { pattern: String, reason: String },
    /// Invalid regex pattern provided.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// Root of the TOML configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub blur: BlurSettings,
    #[serde(default)]
    pub rename: RenameSettings,
    #[serde(default)]
    pub history: HistorySettings,
    #[serde(default)]
    pub exclude: ExcludeRules,
}

/// `[blur]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlurSettings {
    /// Threshold applied when none is given on the command line.
    #[serde(default = "default_threshold")]
    pub default_threshold: f64,
}

fn default_threshold() -> f64 {
    DEFAULT_BLUR_THRESHOLD
}

impl Default for BlurSettings {
    fn default() -> Self {
        Self {
            default_threshold: DEFAULT_BLUR_THRESHOLD,
        }
    }
}

/// `[rename]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameSettings {
    /// Minimum digits of the zero-padded index.
    #[serde(default = "default_pad_width")]
    pub pad_width: usize,
}

fn default_pad_width() -> usize {
    DEFAULT_PAD_WIDTH
}

impl Default for RenameSettings {
    fn default() -> Self {
        Self {
            pad_width: DEFAULT_PAD_WIDTH,
        }
    }
}

/// `[history]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistorySettings {
    /// Record renames and moves in `.dataset-tools-history.json` inside the
    /// operated directory so they can be undone. Off unless asked for, since
    /// the journal is an extra file in the dataset.
    #[serde(default)]
    pub enabled: bool,
}

/// `[exclude]` section: files matching any rule are left out of every listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames (e.g. "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,
    /// Glob patterns matched against the filename (e.g. "*.tmp").
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Regex patterns matched against the filename.
    #[serde(default)]
    pub regex: Vec<String>,
}

impl ToolsConfig {
    /// Load configuration, falling back to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, if provided
    /// 2. `.dataset-tools.toml` in the current directory
    /// 3. `~/.config/dataset-tools/config.toml`
    /// 4. built-in defaults
    ///
    /// # Errors
    ///
    /// Returns an error if a file is found (or explicitly given) but cannot be
    /// read, parsed or validated.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("dataset-tools")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        tracing::debug!(path = %path.display(), "loaded configuration file");
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.rename.pad_width == 0 {
            return Err(ConfigError::ConfigInvalid(
                "rename.pad_width must be at least 1".to_string(),
            ));
        }
        if !self.blur.default_threshold.is_finite() {
            return Err(ConfigError::ConfigInvalid(
                "blur.default_threshold must be a finite number".to_string(),
            ));
        }
        Ok(())
    }

    /// Compile the exclude rules into matchers.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex pattern is invalid.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.exclude)
    }
}

/// Pre-compiled exclude rules.
///
/// The default value excludes nothing.
#[derive(Debug, Clone, Default)]
pub struct CompiledFilters {
    filenames: HashSet<String>,
    patterns: Vec<Pattern>,
    regexes: Vec<Regex>,
}

impl CompiledFilters {
    fn new(rules: &ExcludeRules) -> Result<Self, ConfigError> {
        let patterns = rules
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|e| ConfigError::InvalidGlobPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let regexes = rules
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
            filenames: rules.filenames.iter().cloned().collect(),
            patterns,
            regexes,
        })
    }

    /// Returns true if the file named `file_name` should be processed.
    pub fn should_include(&self, file_name: &str) -> bool {
        if self.filenames.contains(file_name) {
            return false;
        }
        if self.patterns.iter().any(|p| p.matches(file_name)) {
            return false;
        }
        !self.regexes.iter().any(|r| r.is_match(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ToolsConfig::default();
        assert_eq!(config.blur.default_threshold, 1000.0);
        assert_eq!(config.rename.pad_width, 3);
        assert!(!config.history.enabled);
        assert!(config.exclude.filenames.is_empty());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = ToolsConfig::from_toml("").unwrap();
        assert_eq!(config.blur.default_threshold, DEFAULT_BLUR_THRESHOLD);
        assert_eq!(config.rename.pad_width, DEFAULT_PAD_WIDTH);
    }

    #[test]
    fn test_partial_toml() {
        let config = ToolsConfig::from_toml(
            r#"
            [blur]
            default_threshold = 250.5

            [history]
            enabled = true
            "#,
        )
        .unwrap();
        assert_eq!(config.blur.default_threshold, 250.5);
        assert!(config.history.enabled);
        assert_eq!(config.rename.pad_width, 3);
    }

    #[test]
    fn test_zero_pad_width_rejected() {
        let result = ToolsConfig::from_toml("[rename]\npad_width = 0\n");
        assert!(matches!(result, Err(ConfigError::ConfigInvalid(_))));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let result = ToolsConfig::from_toml("[blur\ndefault_threshold = ");
        assert!(matches!(result, Err(ConfigError::ConfigInvalid(_))));
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = ToolsConfig::load(Some(Path::new("/non/existent/config.toml")));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[rename]\npad_width = 5\n").unwrap();

        let config = ToolsConfig::load(Some(&path)).unwrap();
        assert_eq!(config.rename.pad_width, 5);
    }

    #[test]
    fn test_default_filters_include_everything() {
        let filters = CompiledFilters::default();
        assert!(filters.should_include(".hidden"));
        assert!(filters.should_include("photo.png"));
    }

    #[test]
    fn test_exclude_rules() {
        let config = ToolsConfig {
            exclude: ExcludeRules {
                filenames: vec!["Thumbs.db".to_string()],
                patterns: vec!["*.tmp".to_string()],
                regex: vec![r"^draft_".to_string()],
            },
            ..Default::default()
        };
        let filters = config.compile_filters().unwrap();

        assert!(!filters.should_include("Thumbs.db"));
        assert!(!filters.should_include("upload.tmp"));
        assert!(!filters.should_include("draft_cat.png"));
        assert!(filters.should_include("cat.png"));
    }

    #[test]
    fn test_invalid_patterns_rejected() {
        let bad_glob = ToolsConfig {
            exclude: ExcludeRules {
                patterns: vec!["[invalid".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            bad_glob.compile_filters(),
            Err(ConfigError::InvalidGlobPattern { .. })
        ));

        let bad_regex = ToolsConfig {
            exclude: ExcludeRules {
                regex: vec!["[invalid(".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            bad_regex.compile_filters(),
            Err(ConfigError::InvalidRegexPattern { .. })
        ));
    }
}
