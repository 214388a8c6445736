//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Reject a deployment without a metrics token
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SiteConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::SiteConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a fully merged configuration.
pub fn validate_config(config: &SiteConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.metrics.token.is_empty() {
        errors.push(ValidationError::new(
            "metrics.token",
            "can't run without metrics token",
        ));
    }
    if !config.metrics.path.starts_with('/') {
        errors.push(ValidationError::new("metrics.path", "must start with '/'"));
    }
    if config.site.host.is_empty() {
        errors.push(ValidationError::new("site.host", "must not be empty"));
    }

    let prefix = &config.site.static_prefix;
    if !prefix.starts_with('/') || !prefix.ends_with('/') {
        errors.push(ValidationError::new(
            "site.static_prefix",
            format!("{prefix:?} must start and end with '/'"),
        ));
    }

    if config.timeouts.header_read_secs == 0 {
        errors.push(ValidationError::new("timeouts.header_read_secs", "must be > 0"));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("{:?} is not a socket address", config.listener.bind_address),
        ));
    }

    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.is_empty() || tls.key_path.is_empty() {
            errors.push(ValidationError::new(
                "listener.tls",
                "cert_path and key_path must both be set",
            ));
        }
        if config.listener.redirect_address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::new(
                "listener.redirect_address",
                format!(
                    "{:?} is not a socket address",
                    config.listener.redirect_address
                ),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
