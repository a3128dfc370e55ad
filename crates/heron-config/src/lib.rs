//! Typed configuration for Heron.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict parsing (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! [`HeronConfig`] has two sections: [`BindingConfig`] for the dispatcher
//! and a [`LogConfig`](heron_telemetry::LogConfig) for logging.
//!
//! # Example
//!
//! ```no_run
//! use heron_config::ConfigLoader;
//!
//! # fn main() -> Result<(), heron_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("heron.toml")?
//!     .with_env_prefix("HERON")
//!     .load()?;
//!
//! println!("validation disabled: {}", config.binding.disable_validation);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [binding]
//! disable_validation = false
//! reject_ambiguous_body = true
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `HERON__BINDING__DISABLE_VALIDATION=true`
//! - `HERON__BINDING__REJECT_AMBIGUOUS_BODY=false`
//! - `HERON__LOGGING__LEVEL=debug`
//! - `HERON__LOGGING__FORMAT=pretty`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;

pub use config::{BindingConfig, HeronConfig, HeronConfigBuilder};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
