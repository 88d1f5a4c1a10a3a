//! Configuration validation.

use std::collections::HashSet;

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Turn the first error into a [`ConfigError`], if any.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(err) => Err(ConfigError::InvalidValue {
                field: err.path,
                message: err.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
///
/// Checks the shape of the file only. Band ordering and selector syntax are
/// enforced when the layering plan is built.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_layering(config, &mut result);
        Self::validate_probe(config, &mut result);
        Self::validate_remediation(config, &mut result);
        Self::validate_browser(config, &mut result);

        result
    }

    fn validate_layering(config: &Config, result: &mut ValidationResult) {
        let layering = &config.layering;

        if layering.stride <= 0 {
            result.add_error(ValidationError::new(
                "layering.stride",
                "stride must be greater than 0",
            ));
        } else if layering.stride < 100 {
            result.add_warning(ValidationWarning::new(
                "layering.stride",
                "stride is very low (<100), bands with many elements will overflow",
            ));
        }

        let mut names = HashSet::new();
        for (i, band) in layering.bands.iter().enumerate() {
            if band.name.trim().is_empty() {
                result.add_error(ValidationError::new(
                    format!("layering.bands[{}].name", i),
                    "band name cannot be empty",
                ));
            }
            if !names.insert(band.name.as_str()) {
                result.add_error(ValidationError::new(
                    format!("layering.bands[{}].name", i),
                    format!("duplicate band name '{}'", band.name),
                ));
            }
        }

        for (i, rule) in layering.rules.iter().enumerate() {
            if rule.selector.trim().is_empty() {
                result.add_error(ValidationError::new(
                    format!("layering.rules[{}].selector", i),
                    "selector cannot be empty",
                ));
            }
            if !names.contains(rule.band.as_str()) {
                result.add_error(ValidationError::new(
                    format!("layering.rules[{}].band", i),
                    format!("unknown band '{}'", rule.band),
                ));
            }
        }

        if layering.rules.is_empty() {
            result.add_warning(ValidationWarning::new(
                "layering.rules",
                "no rules configured, every element lands in the lowest band",
            ));
        }
    }

    fn validate_probe(config: &Config, result: &mut ValidationResult) {
        if config.probe.settle_timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "probe.settle_timeout_ms",
                "settle timeout must be greater than 0",
            ));
        }

        if config.probe.settle_timeout_ms > 60_000 {
            result.add_warning(ValidationWarning::new(
                "probe.settle_timeout_ms",
                "settle timeout is very long (>60s)",
            ));
        }
    }

    fn validate_remediation(config: &Config, result: &mut ValidationResult) {
        let remediation = &config.remediation;

        if remediation.panel_id.trim().is_empty() {
            result.add_error(ValidationError::new(
                "remediation.panel_id",
                "panel id cannot be empty",
            ));
        }

        for (path, value) in [
            ("remediation.anchor_top", remediation.anchor_top),
            ("remediation.anchor_right", remediation.anchor_right),
            ("remediation.gap", remediation.gap),
        ] {
            if !value.is_finite() || value < 0.0 {
                result.add_error(ValidationError::new(path, "must be a non-negative number"));
            }
        }
    }

    fn validate_browser(config: &Config, result: &mut ValidationResult) {
        let browser = &config.browser;

        if browser.debug_port == 0 {
            result.add_error(ValidationError::new("browser.debug_port", "Port cannot be 0"));
        }

        if browser.viewport_width == 0 || browser.viewport_height == 0 {
            result.add_error(ValidationError::new(
                "browser.viewport",
                "viewport dimensions must be greater than 0",
            ));
        }

        if browser.navigation_timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "browser.navigation_timeout_ms",
                "navigation timeout must be greater than 0",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
