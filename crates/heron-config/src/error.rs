//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

/// Why a configuration could not be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file passed to [`ConfigLoader::with_file`](crate::ConfigLoader::with_file)
    /// does not exist.
    #[error("no configuration file at {}", path.display())]
    FileNotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("cannot read {}", path.display())]
    Read {
        /// The unreadable path.
        path: PathBuf,
        /// The I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Malformed TOML, or a key `HeronConfig` does not know.
    #[error("bad TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Malformed JSON, or a key `HeronConfig` does not know.
    #[error("bad JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// The format is neither TOML nor JSON.
    #[error("configuration format '{format}' is not supported (use toml or json)")]
    UnsupportedFormat {
        /// The extension or format name given.
        format: String,
    },

    /// A value parsed but makes no sense, like a log filter with an unknown
    /// level.
    #[error("{field}: {reason}")]
    InvalidValue {
        /// Dotted path of the setting, e.g. `logging.level`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An override variable has an unknown key or an unparseable value.
    #[error("environment override {var}: {reason}")]
    Env {
        /// The variable name.
        var: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// Creates an invalid value error for the setting at `field`.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn env(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Env {
            var: var.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_culprit() {
        let err = ConfigError::file_not_found("/etc/heron/heron.toml");
        assert_eq!(err.to_string(), "no configuration file at /etc/heron/heron.toml");

        let err = ConfigError::invalid_value("logging.level", "unknown level");
        assert_eq!(err.to_string(), "logging.level: unknown level");

        let err = ConfigError::env("HERON__BINDING__DISABLE_VALIDATION", "expected boolean");
        assert!(err.to_string().contains("HERON__BINDING__DISABLE_VALIDATION"));

        let err = ConfigError::unsupported_format("yaml");
        assert!(err.to_string().contains("'yaml'"));
    }

    #[test]
    fn test_read_error_keeps_source() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ConfigError::read("heron.toml", io);
        assert!(err.source().is_some());
    }
}
