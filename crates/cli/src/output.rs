//! Terminal output utilities
//!
//! Status lines go to stderr; stdout is reserved for command output such as
//! the emitted configuration.

use owo_colors::OwoColorize;

/// Force colors on or off, overriding terminal detection
pub fn set_colors(enabled: bool) {
    owo_colors::set_override(enabled);
}

/// Status message helpers
pub struct Status;

impl Status {
    /// Print a success message
    pub fn success(message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print an info message
    pub fn info(message: &str) {
        eprintln!("{} {}", "ℹ".blue(), message);
    }
}

/// Format a duration for display
pub fn format_duration(duration: std::time::Duration) -> String {
    let micros = duration.as_micros();
    if micros < 1000 {
        format!("{}µs", micros)
    } else if micros < 1_000_000 {
        format!("{:.1}ms", micros as f64 / 1000.0)
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}

/// Format a count with singular/plural
pub fn format_count(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_format_duration_micros() {
        assert_eq!(format_duration(Duration::from_micros(250)), "250µs");
    }

    #[test]
    fn test_format_duration_millis() {
        assert_eq!(format_duration(Duration::from_micros(1500)), "1.5ms");
    }

    #[test]
    fn test_format_duration_secs() {
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.50s");
    }

    #[test]
    fn test_format_count_singular() {
        assert_eq!(format_count(1, "warning", "warnings"), "1 warning");
    }

    #[test]
    fn test_format_count_plural() {
        assert_eq!(format_count(0, "error", "errors"), "0 errors");
    }
}
