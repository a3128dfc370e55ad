//! Configuration types.
//!
//! [`HeronConfig`] is the root; [`BindingConfig`] holds the dispatcher
//! switches and `logging` reuses the telemetry crate's [`LogConfig`].

use heron_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

/// Request binding switches applied to a dispatcher.
///
/// # Example
///
/// ```
/// use heron_config::BindingConfig;
///
/// let config = BindingConfig::default();
/// assert!(!config.disable_validation);
/// assert!(!config.reject_ambiguous_body);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields, default)]
pub struct BindingConfig {
    /// Skip record validation entirely.
    pub disable_validation: bool,

    /// Fail a request whose body field cannot be bound from its content
    /// type, instead of logging a warning and leaving the field empty.
    pub reject_ambiguous_body: bool,
}

/// Complete Heron configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use heron_config::HeronConfig;
///
/// let config = HeronConfig::default();
/// assert_eq!(config.logging.level, "info");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct HeronConfig {
    /// Binding configuration.
    #[serde(default)]
    pub binding: BindingConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LogConfig,
}

impl HeronConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use heron_config::{BindingConfig, HeronConfig};
    ///
    /// let config = HeronConfig::builder()
    ///     .binding(BindingConfig {
    ///         reject_ambiguous_body: true,
    ///         ..Default::default()
    ///     })
    ///     .build();
    ///
    /// assert!(config.binding.reject_ambiguous_body);
    /// ```
    #[must_use]
    pub fn builder() -> HeronConfigBuilder {
        HeronConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the log filter does not parse.
    pub fn validate(&self) -> Result<(), crate::ConfigError> {
        self.logging
            .validate()
            .map_err(|e| crate::ConfigError::invalid_value("logging.level", e.to_string()))
    }

    /// Create a development configuration preset.
    ///
    /// Pretty debug logs, and ambiguous body bindings fail loudly.
    ///
    /// # Example
    ///
    /// ```
    /// use heron_config::HeronConfig;
    ///
    /// let config = HeronConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// assert!(config.binding.reject_ambiguous_body);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        Self {
            binding: BindingConfig {
                disable_validation: false,
                reject_ambiguous_body: true,
            },
            logging: LogConfig::development(),
        }
    }

    /// Create a production configuration preset.
    ///
    /// JSON info logs; ambiguous body bindings are skipped with a warning.
    #[must_use]
    pub fn production() -> Self {
        Self {
            binding: BindingConfig::default(),
            logging: LogConfig::production(),
        }
    }
}

/// Builder for [`HeronConfig`].
#[derive(Debug, Default)]
pub struct HeronConfigBuilder {
    binding: Option<BindingConfig>,
    logging: Option<LogConfig>,
}

impl HeronConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the binding configuration.
    #[must_use]
    pub fn binding(mut self, binding: BindingConfig) -> Self {
        self.binding = Some(binding);
        self
    }

    /// Set the logging configuration.
    #[must_use]
    pub fn logging(mut self, logging: LogConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Build the configuration.
    ///
    /// Any unset sections will use their default values.
    #[must_use]
    pub fn build(self) -> HeronConfig {
        HeronConfig {
            binding: self.binding.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<HeronConfig, crate::ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
