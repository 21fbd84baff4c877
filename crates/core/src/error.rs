//! Coded errors for the droidconf pipeline and CLI
//!
//! Every error carries an [`ErrorCode`] whose thousands digit selects the
//! process exit code, plus optional context and a recovery suggestion.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error codes, grouped by thousands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Internal = 1001,

    IoError = 2000,
    FileNotFound = 2001,
    PermissionDenied = 2002,

    ConfigError = 3000,
    ConfigNotFound = 3001,
    ConfigParseError = 3002,
    InvalidConfigValue = 3004,

    ParseError = 4000,
    UnbalancedBlock = 4001,
    DuplicateKey = 4002,
    MalformedCoordinate = 4003,

    MissingSymbol = 5001,
    SymbolTypeMismatch = 5002,

    ValidationError = 6000,
}

impl ErrorCode {
    /// Numeric code
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// CLI exit code for errors of this kind
    pub fn exit_code(&self) -> i32 {
        match self.code() / 1000 {
            3 => exit_codes::CONFIG_ERROR,
            4 => exit_codes::PARSE_ERROR,
            5 => exit_codes::RESOLUTION_ERROR,
            6 => exit_codes::VALIDATION_ERROR,
            _ => exit_codes::FAILURE,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

/// Error with a code, context and an optional suggestion
#[derive(Error, Debug)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    /// Where the error happened, e.g. the file being read
    pub context: Option<String>,
    /// What the user can do about it
    pub suggestion: Option<String>,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ctx) = &self.context {
            write!(f, "\n  Context: {}", ctx)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  Suggestion: {}", suggestion)?;
        }
        Ok(())
    }
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            suggestion: None,
            source: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    pub fn config_not_found(path: impl AsRef<std::path::Path>) -> Self {
        Self::new(
            ErrorCode::ConfigNotFound,
            format!("Configuration file not found: {}", path.as_ref().display()),
        )
        .with_suggestion("Create a droidconf.toml file or use --config to specify a path")
    }

    pub fn invalid_config_value(key: &str, reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidConfigValue,
            format!("Invalid value for `{}`: {}", key, reason.into()),
        )
    }

    pub fn missing_symbol(symbol: &str) -> Self {
        Self::new(
            ErrorCode::MissingSymbol,
            format!("Version symbol not defined: {}", symbol),
        )
        .with_suggestion(format!(
            "Pass -D {}=<value>, add it to [versions] in droidconf.toml, or point --versions at local.properties",
            symbol
        ))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Exit codes for CLI commands
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const FAILURE: i32 = 1;
    pub const VALIDATION_ERROR: i32 = 2;
    pub const CONFIG_ERROR: i32 = 3;
    pub const PARSE_ERROR: i32 = 6;
    pub const RESOLUTION_ERROR: i32 = 7;
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorCode::PermissionDenied,
            _ => ErrorCode::IoError,
        };
        Error::new(code, err.to_string()).with_source(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::new(ErrorCode::Internal, format!("JSON error: {}", err)).with_source(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::new(ErrorCode::ConfigParseError, format!("TOML parse error: {}", err))
            .with_source(err)
    }
}

/// Attach context to a failed [`Result`]
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::FileNotFound.to_string(), "E2001");
        assert_eq!(ErrorCode::MissingSymbol.to_string(), "E5001");
    }

    #[test]
    fn test_error_code_exit_code() {
        assert_eq!(ErrorCode::UnbalancedBlock.exit_code(), exit_codes::PARSE_ERROR);
        assert_eq!(ErrorCode::MissingSymbol.exit_code(), exit_codes::RESOLUTION_ERROR);
        assert_eq!(ErrorCode::ConfigParseError.exit_code(), exit_codes::CONFIG_ERROR);
        assert_eq!(ErrorCode::ValidationError.exit_code(), exit_codes::VALIDATION_ERROR);
        assert_eq!(ErrorCode::IoError.exit_code(), exit_codes::FAILURE);
    }

    #[test]
    fn test_io_error_conversion() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.code, ErrorCode::FileNotFound);
        assert!(err.source.is_some());
    }

    #[test]
    fn test_context_is_attached() {
        let result: Result<()> = Err(Error::config("bad"));
        let err = result.context("While loading droidconf.toml").unwrap_err();
        assert_eq!(err.context.as_deref(), Some("While loading droidconf.toml"));
        assert!(err.to_string().contains("Context: While loading droidconf.toml"));
    }

    #[test]
    fn test_missing_symbol_suggests_define() {
        let err = Error::missing_symbol("flutter.versionCode");
        assert!(err.suggestion.unwrap().contains("-D flutter.versionCode"));
    }
}
