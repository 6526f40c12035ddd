//! Core configuration loaded from TOML.
//!
//! # Responsibility
//! - Describe storage, logging and import settings in one typed document.
//! - Fill every omitted key with its default.
//!
//! # Invariants
//! - A missing config file is not an error; defaults apply.
//! - Paths left unset here are resolved by the front-end.

use crate::import::remote::DEFAULT_IMPORT_URL;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_IMPORT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: Option<PathBuf>,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse {
                path: Some(path),
                message,
            } => write!(f, "invalid config `{}`: {message}", path.display()),
            Self::Parse {
                path: None,
                message,
            } => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub import: ImportConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite file. Unset means `<data dir>/todo.sqlite3`.
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `trace|debug|info|warn|error`. Unset means `default_log_level()`.
    pub level: Option<String>,
    /// Absolute log directory. Unset means `<data dir>/logs`.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub enabled: bool,
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: DEFAULT_IMPORT_URL.to_string(),
            timeout_secs: DEFAULT_IMPORT_TIMEOUT_SECS,
        }
    }
}

impl ImportConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CoreConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse {
            path: None,
            message: err.to_string(),
        })
    }

    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        toml::from_str(&content).map_err(|err| ConfigError::Parse {
            path: Some(path.to_path_buf()),
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig};
    use crate::import::remote::DEFAULT_IMPORT_URL;
    use std::path::PathBuf;

    #[test]
    fn empty_document_yields_defaults() {
        let config = CoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert!(config.import.enabled);
        assert_eq!(config.import.url, DEFAULT_IMPORT_URL);
        assert_eq!(config.import.timeout_secs, 10);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = CoreConfig::from_toml_str(
            r#"
            [storage]
            db_path = "/tmp/todo.sqlite3"

            [import]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(
            config.storage.db_path,
            Some(PathBuf::from("/tmp/todo.sqlite3"))
        );
        assert!(!config.import.enabled);
        assert_eq!(config.import.url, DEFAULT_IMPORT_URL);
        assert!(config.logging.level.is_none());
    }

    #[test]
    fn malformed_document_is_parse_error() {
        let err = CoreConfig::from_toml_str("[import\nenabled = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { path: None, .. }));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CoreConfig::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, CoreConfig::default());
    }
}
