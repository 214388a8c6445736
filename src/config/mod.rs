//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! SiteConfig::default()
//!     → loader.rs (optional TOML file)
//!     → cli.rs (flags, falling back to environment variables)
//!     → validation.rs (semantic checks)
//!     → SiteConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; content changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::CliArgs;
pub use loader::{load_config, load_with_cli, ConfigError};
pub use schema::{
    ContentConfig, ListenerConfig, LogFormat, LoggingConfig, MetricsConfig, PathConvention,
    SiteConfig, TimeoutConfig, TlsConfig,
};
