//! Validation report rendering

use crate::output::{format_count, Status};
use droidconf_core::validation::{ValidationError, ValidationResult};

/// One finding as a single line, e.g.
/// `flutter.source: not set [MISSING_FLUTTER_SOURCE] (line 50)`
pub fn format_finding(finding: &ValidationError) -> String {
    let mut line = format!("{}: {} [{}]", finding.field, finding.message, finding.code);
    if let Some(at) = finding.line {
        line.push_str(&format!(" (line {})", at));
    }
    match (&finding.expected, &finding.actual) {
        (Some(expected), Some(actual)) => {
            line.push_str(&format!("\n    expected {}, found {}", expected, actual));
        }
        (Some(expected), None) => line.push_str(&format!("\n    expected {}", expected)),
        _ => {}
    }
    line
}

/// `2 errors, 1 warning`
pub fn summary(report: &ValidationResult) -> String {
    format!(
        "{}, {}",
        format_count(report.errors().len(), "error", "errors"),
        format_count(report.warnings().len(), "warning", "warnings")
    )
}

/// Print every finding; warnings are skipped when `quiet`
pub fn print_report(report: &ValidationResult, quiet: bool) {
    for error in report.errors() {
        Status::error(&format_finding(error));
    }
    if !quiet {
        for warning in report.warnings() {
            Status::warning(&format_finding(warning));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_finding() {
        let finding = ValidationError::new("android.defaultConfig.minSdk", "SDK_ORDER", "minSdk must not exceed targetSdk")
            .expected("<= 34")
            .actual("35")
            .at_line(31);
        assert_eq!(
            format_finding(&finding),
            "android.defaultConfig.minSdk: minSdk must not exceed targetSdk [SDK_ORDER] (line 31)\n    expected <= 34, found 35"
        );
    }

    #[test]
    fn test_format_finding_minimal() {
        let finding = ValidationError::new("flutter.source", "MISSING_FLUTTER_SOURCE", "not set");
        assert_eq!(format_finding(&finding), "flutter.source: not set [MISSING_FLUTTER_SOURCE]");
    }

    #[test]
    fn test_summary() {
        let mut report = ValidationResult::new();
        report.add_warning(ValidationError::new("a", "W", "warn"));
        assert_eq!(summary(&report), "0 errors, 1 warning");
    }
}
