//! Field-level validation with errors and advisory warnings
//!
//! # Example
//!
//! ```rust
//! use droidspec_core::validation::Validator;
//!
//! let result = Validator::new()
//!     .warn_if("signingConfigRef", true, "release build uses debug signing")
//!     .validate();
//!
//! assert!(result.is_valid());
//! assert_eq!(result.warnings().len(), 1);
//! ```

use crate::error::{Error, ErrorCode, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field that failed validation
    pub field: String,
    /// Error message
    pub message: String,
    /// Machine-readable code
    pub code: String,
    /// Expected value (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// Actual value (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
    warnings: Vec<ValidationError>,
}

impl ValidationResult {
    /// Create a new empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get all errors
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Get all warnings
    pub fn warnings(&self) -> &[ValidationError] {
        &self.warnings
    }

    /// Add a warning
    pub fn add_warning(&mut self, warning: ValidationError) {
        self.warnings.push(warning);
    }

    /// Turn every warning into an error (strict mode)
    #[must_use]
    pub fn promote_warnings(mut self) -> Self {
        self.errors.append(&mut self.warnings);
        self
    }

    /// Convert to Result type
    pub fn to_result(self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            let messages: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
            Err(Error::new(
                ErrorCode::ValidationError,
                format!("Validation failed: {}", messages.join("; ")),
            ))
        }
    }
}

/// Fluent validator builder
pub struct Validator {
    result: ValidationResult,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// Create a new validator
    pub fn new() -> Self {
        Self {
            result: ValidationResult::new(),
        }
    }

    /// Warn when a value does not match a regex pattern
    #[must_use]
    pub fn warn_unless_matches(
        mut self,
        field: &str,
        value: &str,
        pattern: &Regex,
        description: &str,
    ) -> Self {
        if !pattern.is_match(value) {
            self.result.add_warning(ValidationError {
                field: field.to_string(),
                message: format!("Should match {description}"),
                code: "PATTERN".to_string(),
                expected: Some(description.to_string()),
                actual: Some(value.to_string()),
            });
        }
        self
    }

    /// Add a warning (non-blocking)
    #[must_use]
    pub fn warn_if(mut self, field: &str, condition: bool, message: &str) -> Self {
        if condition {
            self.result.add_warning(ValidationError {
                field: field.to_string(),
                message: message.to_string(),
                code: "WARNING".to_string(),
                expected: None,
                actual: None,
            });
        }
        self
    }

    /// Complete validation and return result
    pub fn validate(self) -> ValidationResult {
        self.result
    }
}
