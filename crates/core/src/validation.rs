//! Non-fatal validation with collected errors and warnings
//!
//! Validation never aborts: every check appends to a [`ValidationResult`]
//! and the caller decides what to do with it.
//!
//! # Example
//!
//! ```rust
//! use droidconf_core::validation::Validator;
//!
//! let result = Validator::new()
//!     .required("applicationId", "com.example.app")
//!     .reverse_domain("applicationId", "com.example.app")
//!     .range("minSdk", 21, 1, 35)
//!     .validate();
//!
//! assert!(result.is_valid());
//! ```

use crate::error::{Error, ErrorCode, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Java/Kotlin package style identifier with at least two segments
static REVERSE_DOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]*(\.[A-Za-z][A-Za-z0-9_]*)+$").expect("valid regex")
});

/// Validation error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field that failed validation
    pub field: String,
    /// Error message
    pub message: String,
    /// Error code
    pub code: String,
    /// Expected value (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// Actual value (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    /// Source line (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl ValidationError {
    /// Create an error with just a field, code and message
    pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code: code.into(),
            expected: None,
            actual: None,
            line: None,
        }
    }

    /// Attach the expected value
    pub fn expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    /// Attach the actual value
    pub fn actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }

    /// Attach a source line
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)?;
        if let Some(line) = self.line {
            write!(f, " (line {})", line)?;
        }
        Ok(())
    }
}

/// Validation result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
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

    /// True when there are neither errors nor warnings
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// Get all errors
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Get all warnings
    pub fn warnings(&self) -> &[ValidationError] {
        &self.warnings
    }

    /// Add an error
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Add a warning
    pub fn add_warning(&mut self, warning: ValidationError) {
        self.warnings.push(warning);
    }

    /// Whether any error carries the given code
    pub fn has_error(&self, code: &str) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    /// Whether any warning carries the given code
    pub fn has_warning(&self, code: &str) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }

    /// Merge another result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Move warnings with the given code into the error list
    pub fn escalate(&mut self, code: &str) {
        let (escalated, kept): (Vec<_>, Vec<_>) =
            self.warnings.drain(..).partition(|w| w.code == code);
        self.warnings = kept;
        self.errors.extend(escalated);
    }

    /// Move every warning into the error list (strict mode)
    pub fn escalate_all(&mut self) {
        self.errors.append(&mut self.warnings);
    }

    /// Convert to Result type
    pub fn to_result(self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            let messages: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
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

    /// Validate that a field is not empty
    pub fn required(mut self, field: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.result.add_error(
                ValidationError::new(field, "REQUIRED", "Field is required")
                    .expected("non-empty value")
                    .actual("empty"),
            );
        }
        self
    }

    /// Validate that an optional field is present
    pub fn present<T>(mut self, field: &str, value: Option<&T>) -> Self {
        if value.is_none() {
            self.result.add_error(
                ValidationError::new(field, "REQUIRED", "Field is required").actual("missing"),
            );
        }
        self
    }

    /// Validate a reverse-domain identifier such as `com.example.app`
    pub fn reverse_domain(mut self, field: &str, value: &str) -> Self {
        if !value.trim().is_empty() && !is_reverse_domain(value) {
            self.result.add_error(
                ValidationError::new(field, "REVERSE_DOMAIN", "Must be a reverse-domain identifier")
                    .expected("segments like com.example.app")
                    .actual(value),
            );
        }
        self
    }

    /// Validate that a value is in a list of allowed values
    pub fn one_of(mut self, field: &str, value: &str, allowed: &[&str]) -> Self {
        if !allowed.contains(&value) {
            self.result.add_error(
                ValidationError::new(
                    field,
                    "ONE_OF",
                    format!("Must be one of: {}", allowed.join(", ")),
                )
                .expected(allowed.join(", "))
                .actual(value),
            );
        }
        self
    }

    /// Validate a numeric range
    pub fn range<T: PartialOrd + std::fmt::Display>(
        mut self,
        field: &str,
        value: T,
        min: T,
        max: T,
    ) -> Self {
        if value < min || value > max {
            self.result.add_error(
                ValidationError::new(field, "RANGE", format!("Must be between {} and {}", min, max))
                    .expected(format!("{} - {}", min, max))
                    .actual(value.to_string()),
            );
        }
        self
    }

    /// Add a warning (non-blocking)
    pub fn warn_if(mut self, field: &str, code: &str, condition: bool, message: &str) -> Self {
        if condition {
            self.result.add_warning(ValidationError::new(field, code, message));
        }
        self
    }

    /// Record a prepared error
    pub fn error(mut self, error: ValidationError) -> Self {
        self.result.add_error(error);
        self
    }

    /// Record a prepared warning
    pub fn warning(mut self, warning: ValidationError) -> Self {
        self.result.add_warning(warning);
        self
    }

    /// Complete validation and return result
    pub fn validate(self) -> ValidationResult {
        self.result
    }
}

/// Check a reverse-domain identifier without building a report
pub fn is_reverse_domain(value: &str) -> bool {
    REVERSE_DOMAIN.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_validation() {
        let result = Validator::new().required("namespace", "").validate();
        assert!(!result.is_valid());
        assert_eq!(result.errors()[0].code, "REQUIRED");
    }

    #[test]
    fn test_present_validation() {
        let missing: Option<&i64> = None;
        let result = Validator::new().present("minSdk", missing).validate();
        assert!(result.has_error("REQUIRED"));
    }

    #[test]
    fn test_reverse_domain_validation() {
        let ok = Validator::new()
            .reverse_domain("applicationId", "com.example.short_video_fe")
            .validate();
        assert!(ok.is_valid());

        for bad in ["example", "com..example", "1com.example", "com.example-app"] {
            let result = Validator::new().reverse_domain("applicationId", bad).validate();
            assert!(result.has_error("REVERSE_DOMAIN"), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_reverse_domain_skips_empty() {
        // Emptiness is reported by `required`, not twice.
        let result = Validator::new()
            .required("namespace", "")
            .reverse_domain("namespace", "")
            .validate();
        assert_eq!(result.errors().len(), 1);
    }

    #[test]
    fn test_one_of_validation() {
        let result = Validator::new()
            .one_of("format", "yaml", &["json", "kts"])
            .validate();
        assert!(!result.is_valid());
        assert_eq!(result.errors()[0].code, "ONE_OF");
    }

    #[test]
    fn test_range_validation() {
        let result = Validator::new().range("versionCode", 0, 1, 2_100_000_000).validate();
        assert!(!result.is_valid());
        assert_eq!(result.errors()[0].code, "RANGE");
    }

    #[test]
    fn test_warnings_do_not_fail() {
        let result = Validator::new()
            .warn_if("multiDexEnabled", "REDUNDANT", true, "not needed")
            .validate();
        assert!(result.is_valid());
        assert!(!result.is_clean());
    }

    #[test]
    fn test_escalate_single_code() {
        let mut result = Validator::new()
            .warn_if("a", "ONE", true, "first")
            .warn_if("b", "TWO", true, "second")
            .validate();
        result.escalate("ONE");
        assert!(result.has_error("ONE"));
        assert!(result.has_warning("TWO"));
        assert_eq!(result.warnings().len(), 1);
    }

    #[test]
    fn test_escalate_all() {
        let mut result = Validator::new().warn_if("a", "ONE", true, "first").validate();
        result.escalate_all();
        assert!(!result.is_valid());
        assert!(result.warnings().is_empty());
    }

    #[test]
    fn test_display_includes_line() {
        let err = ValidationError::new("plugins", "DUPLICATE_PLUGIN", "duplicate").at_line(4);
        assert_eq!(err.to_string(), "plugins: duplicate (line 4)");
    }

    #[test]
    fn test_chained_validation() {
        let result = Validator::new()
            .required("namespace", "com.example.app")
            .reverse_domain("namespace", "com.example.app")
            .range("minSdk", 21, 1, 35)
            .validate();
        assert!(result.is_valid());
    }

    mod properties {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn dotted_identifiers_are_reverse_domain(
                segments in prop::collection::vec("[a-z][a-z0-9_]{0,8}", 2..6),
            ) {
                prop_assert!(is_reverse_domain(&segments.join(".")));
            }

            #[test]
            fn single_segments_are_not_reverse_domain(segment in "[a-z][a-z0-9_]{0,12}") {
                prop_assert!(!is_reverse_domain(&segment));
            }

            #[test]
            fn escalate_all_leaves_no_warnings(count in 0usize..8) {
                let mut result = ValidationResult::new();
                for i in 0..count {
                    result.add_warning(ValidationError::new(format!("f{i}"), "W", "warn"));
                }
                result.escalate_all();
                prop_assert!(result.warnings().is_empty());
                prop_assert_eq!(result.errors().len(), count);
            }
        }
    }
}
