//! Filter delegating to an external validation capability

use super::Filter;
use crate::core::{Event, LoggerError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Validation capability applied to the event message
pub trait Validator: Send + Sync {
    fn is_valid(&self, value: &str) -> bool;
}

impl<F> Validator for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_valid(&self, value: &str) -> bool {
        self(value)
    }
}

/// Options accepted by [`ValidatorFilter`]: the name of a registered validator
#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorFilterConfig {
    pub validator: serde_json::Value,
}

/// Accepts events whose message passes the validator
#[derive(Clone)]
pub struct ValidatorFilter {
    validator: Arc<dyn Validator>,
}

impl ValidatorFilter {
    pub fn new(validator: Arc<dyn Validator>) -> Self {
        Self { validator }
    }

    /// Resolve the configured validator against the named validators
    pub fn from_config(
        config: ValidatorFilterConfig,
        validators: &HashMap<String, Arc<dyn Validator>>,
    ) -> Result<Self> {
        match &config.validator {
            serde_json::Value::String(name) => match validators.get(name) {
                Some(validator) => Ok(Self::new(Arc::clone(validator))),
                None => Err(LoggerError::invalid_argument(format!(
                    "Parameter \"{}\" is invalid; no validator is registered under that name",
                    name
                ))),
            },
            other => Err(LoggerError::invalid_argument(format!(
                "Parameter of type {} is invalid; must name a registered validator",
                crate::core::FieldValue::from(other.clone()).type_label()
            ))),
        }
    }

    pub fn from_options(
        options: &serde_json::Value,
        validators: &HashMap<String, Arc<dyn Validator>>,
    ) -> Result<Self> {
        let config = ValidatorFilterConfig::deserialize(options)
            .map_err(|e| LoggerError::invalid_options("validator filter", e))?;
        Self::from_config(config, validators)
    }
}

impl fmt::Debug for ValidatorFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorFilter").finish_non_exhaustive()
    }
}

impl Filter for ValidatorFilter {
    fn filter(&self, event: &Event) -> bool {
        self.validator.is_valid(&event.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Severity;
    use serde_json::json;

    fn digits() -> Arc<dyn Validator> {
        Arc::new(|value: &str| !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()))
    }

    #[test]
    fn test_delegates_to_validator() {
        let filter = ValidatorFilter::new(digits());
        assert!(filter.filter(&Event::new(Severity::Info, "123")));
        assert!(!filter.filter(&Event::new(Severity::Info, "abc")));
    }

    #[test]
    fn test_named_validator_resolution() {
        let mut validators = HashMap::new();
        validators.insert("digits".to_string(), digits());

        let filter = ValidatorFilter::from_options(&json!({"validator": "digits"}), &validators)
            .expect("registered validator");
        assert!(filter.filter(&Event::new(Severity::Info, "42")));

        let err = ValidatorFilter::from_options(&json!({"validator": "alpha"}), &validators)
            .err()
            .expect("unknown validator");
        assert!(err.is_invalid_argument());

        let err = ValidatorFilter::from_options(&json!({"validator": 5}), &validators)
            .err()
            .expect("non-string validator");
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("integer"));
    }

    #[test]
    fn test_debug_output() {
        let filter = ValidatorFilter::new(digits());
        assert_eq!(format!("{:?}", filter), "ValidatorFilter { .. }");
    }
}
