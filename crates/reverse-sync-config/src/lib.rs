use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid case pattern {pattern:?}: {source}")]
    PatternError {
        pattern: String,
        source: glob::PatternError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Root directory searched by batch verification.
    pub cases_path: PathBuf,
    /// Glob matched against case directory names.
    #[serde(default = "default_case_pattern")]
    pub case_pattern: String,
    /// Write the patched markup and diff next to each case.
    #[serde(default)]
    pub write_artifacts: bool,
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_case_pattern() -> String {
    "*".to_string()
}

fn default_parallel() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cases_path: PathBuf::from("tests/testcases"),
            case_pattern: default_case_pattern(),
            write_artifacts: false,
            parallel: default_parallel(),
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the loaded cases path
        config.cases_path = Self::expand_path(&config.cases_path).unwrap_or(config.cases_path);

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/reverse-sync");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Keeps the directories whose name matches `case_pattern`.
    pub fn select_cases(&self, dirs: Vec<PathBuf>) -> Result<Vec<PathBuf>, ConfigError> {
        let pattern =
            glob::Pattern::new(&self.case_pattern).map_err(|source| ConfigError::PatternError {
                pattern: self.case_pattern.clone(),
                source,
            })?;
        Ok(dirs
            .into_iter()
            .filter(|dir| {
                dir.file_name()
                    .is_some_and(|name| pattern.matches(&name.to_string_lossy()))
            })
            .collect())
    }

    pub fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
