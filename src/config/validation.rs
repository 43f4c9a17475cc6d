//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0)
//! - Reject middleware entries that can never succeed
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: LoaderConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;

use crate::config::schema::{LoaderConfig, ParamConfig};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
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

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &LoaderConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.transport.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("transport.connect_timeout_secs", "must be greater than 0"));
    }
    if config.transport.request_timeout_secs == Some(0) {
        errors.push(ValidationError::new("transport.request_timeout_secs", "must be greater than 0"));
    }
    if config.transport.user_agent.trim().is_empty() {
        errors.push(ValidationError::new("transport.user_agent", "must not be empty"));
    }
    if !LOG_LEVELS.contains(&config.observability.log_level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }

    for (i, param) in config.params.iter().enumerate() {
        let field = format!("params[{}]", i);
        match param {
            ParamConfig::Headers { values } if values.is_empty() => {
                errors.push(ValidationError::new(field, "headers param without values"));
            }
            ParamConfig::Headers { values } => {
                for (name, _) in values.iter().filter(|(_, v)| v.is_empty()) {
                    errors.push(ValidationError::new(
                        field.clone(),
                        format!("header '{}' has an empty value list", name),
                    ));
                }
            }
            ParamConfig::Size { expected: None, max: None } => {
                errors.push(ValidationError::new(field, "size param needs `expected` or `max`"));
            }
            ParamConfig::Size {
                expected: Some(expected),
                max: Some(max),
            } if expected > max => {
                errors.push(ValidationError::new(
                    field,
                    format!("expected size {} exceeds max {}", expected, max),
                ));
            }
            _ => {}
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
