//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate endpoint URLs and value ranges (intervals > 0, multiplier >= 1)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RuntimeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::{ConfirmationConfig, HealthCheckConfig, RuntimeConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a full runtime configuration.
pub fn validate_config(config: &RuntimeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.endpoints.is_empty() {
        errors.push(ValidationError::new("endpoints", "at least one endpoint is required"));
    }
    for (i, endpoint) in config.endpoints.iter().enumerate() {
        if let Err(message) = validate_endpoint(endpoint) {
            errors.push(ValidationError::new(format!("endpoints[{i}]"), message));
        }
    }

    errors.extend(validate_health_check(&config.health_check));
    errors.extend(validate_confirmation(&config.confirmation));

    let cache = &config.cache;
    for (field, value) in [
        ("cache.account_info_ms", cache.account_info_ms),
        ("cache.balance_ms", cache.balance_ms),
        ("cache.metadata_ms", cache.metadata_ms),
        ("cache.config_record_ms", cache.config_record_ms),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than 0"));
        }
    }

    if config.blockchain.rpc_timeout_ms == 0 {
        errors.push(ValidationError::new("blockchain.rpc_timeout_ms", "must be greater than 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate health monitor settings on their own.
pub fn validate_health_check(health: &HealthCheckConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if health.interval_ms == 0 {
        errors.push(ValidationError::new("health_check.interval_ms", "must be greater than 0"));
    }
    if health.timeout_ms == 0 {
        errors.push(ValidationError::new("health_check.timeout_ms", "must be greater than 0"));
    }
    if health.max_consecutive_errors == 0 {
        errors.push(ValidationError::new(
            "health_check.max_consecutive_errors",
            "must be at least 1",
        ));
    }
    if health.latency_threshold_ms == 0 {
        errors.push(ValidationError::new(
            "health_check.latency_threshold_ms",
            "must be greater than 0",
        ));
    }

    errors
}

/// Validate confirmation polling settings on their own.
///
/// Also used when callers override options per call.
pub fn validate_confirmation(config: &ConfirmationConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.interval_ms == 0 {
        errors.push(ValidationError::new("confirmation.interval_ms", "must be greater than 0"));
    }
    if !config.backoff_multiplier.is_finite() || config.backoff_multiplier < 1.0 {
        errors.push(ValidationError::new(
            "confirmation.backoff_multiplier",
            "must be a finite number >= 1.0",
        ));
    }
    if let Some(max) = config.max_interval_ms {
        if max < config.interval_ms {
            errors.push(ValidationError::new(
                "confirmation.max_interval_ms",
                "must not be smaller than interval_ms",
            ));
        }
    }

    errors
}

fn validate_endpoint(endpoint: &str) -> Result<(), String> {
    let url = url::Url::parse(endpoint).map_err(|e| format!("invalid URL '{endpoint}': {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported scheme '{other}' (expected http or https)")),
    }
}
