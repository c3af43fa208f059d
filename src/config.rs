//! Run configuration and source filtering rules.
//!
//! Configuration is optional TOML. Filters only narrow the set of files that
//! are considered; they never add media extensions.
//!
//! # Configuration File Format
//!
//! ```toml
//! [filters]
//! enable_hidden_files = false
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db"]
//! patterns = ["**/@eaDir/**"]
//! extensions = ["gif"]
//! regex = ['^IMG_\d+_edited\.']
//!
//! [filters.include]
//! patterns = []
//!
//! [run]
//! isolate_failures = false
//! ```
//!
//! Glob patterns are matched against the path relative to the source
//! directory; regexes against the bare file name.

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".mediatidy.toml";

/// Errors raised while loading or compiling configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Invalid configuration in {}: {reason}", path.display())]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },

    #[error("IO error reading configuration {}: {reason}", path.display())]
    IoError { path: PathBuf, reason: String },
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizerConfig {
    #[serde(default)]
    pub filters: FilterRules,

    #[serde(default)]
    pub run: RunSettings,
}

/// Behaviour switches for a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSettings {
    /// Turn per-file fatal errors into per-file error outcomes instead of
    /// aborting the run.
    #[serde(default)]
    pub isolate_failures: bool,
}

/// Which source files are considered at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRules {
    /// Consider dot-files (e.g. `._IMG_0001.JPG` resource forks). Defaults to false.
    #[serde(default)]
    pub enable_hidden_files: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Whitelist that overrides every exclude rule.
    #[serde(default)]
    pub include: IncludeRules,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    #[serde(default)]
    pub filenames: Vec<String>,

    #[serde(default)]
    pub patterns: Vec<String>,

    #[serde(default)]
    pub extensions: Vec<String>,

    #[serde(default)]
    pub regex: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl OrganizerConfig {
    /// Loads configuration with fallback to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, when given (it must exist)
    /// 2. `.mediatidy.toml` in the current directory
    /// 3. `~/.config/mediatidy/config.toml`
    /// 4. built-in defaults
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
                .join("mediatidy")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        log::debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Loads configuration from a specific TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        log::debug!("Loaded configuration from {}", path.display());
        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

impl FilterRules {
    /// Validates and pre-compiles every pattern.
    pub fn compile(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(self)
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).map_err(|_| ConfigError::InvalidGlobPattern(p.clone())))
        .collect()
}

/// Pre-compiled filter rules.
#[derive(Debug)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
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
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns: compile_globs(&rules.exclude.patterns)?,
            exclude_regexes,
            include_patterns: compile_globs(&rules.include.patterns)?,
        })
    }

    /// Filters that let every file through, hidden files included.
    pub fn allow_all() -> Self {
        Self {
            enable_hidden_files: true,
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
            include_patterns: Vec::new(),
        }
    }

    /// True when `relative_path` is a dot-file dropped only because hidden
    /// files are disabled.
    pub fn skips_as_hidden(&self, relative_path: &Path) -> bool {
        !self.enable_hidden_files
            && relative_path
                .file_name()
                .is_some_and(|n| n.to_string_lossy().starts_with('.'))
            && !self
                .include_patterns
                .iter()
                .any(|p| p.matches_path(relative_path))
    }

    /// Decides whether a file (path relative to the source root) is considered.
    ///
    /// Include patterns win outright; otherwise the file is dropped by the
    /// first matching rule among hidden-file, filename, extension, glob, regex.
    pub fn should_include(&self, relative_path: &Path) -> bool {
        if self
            .include_patterns
            .iter()
            .any(|p| p.matches_path(relative_path))
        {
            return true;
        }

        let file_name = relative_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = relative_path.extension()
            && self
                .exclude_extensions
                .contains(&ext.to_string_lossy().to_lowercase())
        {
            return false;
        }

        if self
            .exclude_patterns
            .iter()
            .any(|p| p.matches_path(relative_path))
        {
            return false;
        }

        !self.exclude_regexes.iter().any(|r| r.is_match(&file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn rules_with(exclude: ExcludeRules) -> FilterRules {
        FilterRules {
            enable_hidden_files: true,
            exclude,
            include: IncludeRules::default(),
        }
    }

    #[test]
    fn test_defaults() {
        let config = OrganizerConfig::default();
        assert!(!config.filters.enable_hidden_files);
        assert!(!config.run.isolate_failures);
    }

    #[test]
    fn test_hidden_files_excluded_by_default() {
        let compiled = FilterRules::default().compile().unwrap();
        assert!(!compiled.should_include(Path::new("._IMG_0001.JPG")));
        assert!(!compiled.should_include(Path::new("trip/.thumb.jpg")));
        assert!(compiled.should_include(Path::new("trip/IMG_0001.JPG")));
    }

    #[test]
    fn test_allow_all() {
        let compiled = CompiledFilters::allow_all();
        assert!(compiled.should_include(Path::new(".hidden.jpg")));
        assert!(!compiled.skips_as_hidden(Path::new(".hidden.jpg")));
    }

    #[test]
    fn test_exclude_filenames_and_extensions() {
        let compiled = rules_with(ExcludeRules {
            filenames: vec!["Thumbs.db".to_string()],
            extensions: vec![".GIF".to_string(), "bmp".to_string()],
            ..Default::default()
        })
        .compile()
        .unwrap();

        assert!(!compiled.should_include(Path::new("a/Thumbs.db")));
        assert!(!compiled.should_include(Path::new("anim.gif")));
        assert!(!compiled.should_include(Path::new("scan.BMP")));
        assert!(compiled.should_include(Path::new("photo.jpg")));
    }

    #[test]
    fn test_exclude_glob_matches_relative_path() {
        let compiled = rules_with(ExcludeRules {
            patterns: vec!["**/@eaDir/**".to_string()],
            ..Default::default()
        })
        .compile()
        .unwrap();

        assert!(!compiled.should_include(Path::new("@eaDir/a.jpg")));
        assert!(!compiled.should_include(Path::new("2019/@eaDir/a.jpg")));
        assert!(compiled.should_include(Path::new("2019/my@eaDir/a.jpg")));
    }

    #[test]
    fn test_exclude_regex_matches_file_name() {
        let compiled = rules_with(ExcludeRules {
            regex: vec![r"^IMG_\d+_edited\.".to_string()],
            ..Default::default()
        })
        .compile()
        .unwrap();

        assert!(!compiled.should_include(Path::new("x/IMG_0042_edited.jpg")));
        assert!(compiled.should_include(Path::new("x/IMG_0042.jpg")));
    }

    #[test]
    fn test_include_overrides_exclude() {
        let rules = FilterRules {
            enable_hidden_files: false,
            exclude: ExcludeRules {
                extensions: vec!["png".to_string()],
                ..Default::default()
            },
            include: IncludeRules {
                patterns: vec!["keep/*".to_string()],
            },
        };
        let compiled = rules.compile().unwrap();

        assert!(compiled.should_include(Path::new("keep/.a.png")));
        assert!(!compiled.should_include(Path::new("other/a.png")));
        assert!(!compiled.skips_as_hidden(Path::new("keep/.a.png")));
        assert!(compiled.skips_as_hidden(Path::new("other/.a.png")));
        assert!(!compiled.skips_as_hidden(Path::new("other/a.png")));
    }

    #[test]
    fn test_invalid_patterns_are_rejected() {
        let bad_regex = rules_with(ExcludeRules {
            regex: vec!["[invalid(".to_string()],
            ..Default::default()
        });
        assert!(matches!(
            bad_regex.compile(),
            Err(ConfigError::InvalidRegexPattern { .. })
        ));

        let bad_glob = rules_with(ExcludeRules {
            patterns: vec!["[unclosed".to_string()],
            ..Default::default()
        });
        assert!(matches!(
            bad_glob.compile(),
            Err(ConfigError::InvalidGlobPattern(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[filters]
enable_hidden_files = true

[filters.exclude]
filenames = ["Thumbs.db"]

[run]
isolate_failures = true
"#,
        )
        .unwrap();

        let config = OrganizerConfig::load(Some(&path)).unwrap();
        assert!(config.filters.enable_hidden_files);
        assert_eq!(config.filters.exclude.filenames, vec!["Thumbs.db"]);
        assert!(config.run.isolate_failures);
    }

    #[test]
    fn test_load_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[run]\nisolate_failures = true\n").unwrap();

        let config = OrganizerConfig::load(Some(&path)).unwrap();
        assert!(!config.filters.enable_hidden_files);
        assert!(config.run.isolate_failures);
    }

    #[test]
    fn test_load_missing_and_invalid_files() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.toml");
        assert!(matches!(
            OrganizerConfig::load(Some(&missing)),
            Err(ConfigError::ConfigNotFound(_))
        ));

        let broken = temp_dir.path().join("broken.toml");
        fs::write(&broken, "[filters\nenable_hidden_files = ").unwrap();
        assert!(matches!(
            OrganizerConfig::load(Some(&broken)),
            Err(ConfigError::ConfigInvalid { .. })
        ));
    }
}
