//! Pipeline errors
//!
//! Only two kinds abort the pipeline: a malformed descriptor and an
//! unresolvable symbol. Invariant violations are reported through
//! [`crate::validate::ValidationReport`] instead.

use droidconf_core::error::{Error, ErrorCode};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GradleError>;

/// Malformed descriptor text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: unexpected character `{ch}`")]
    UnexpectedChar { line: usize, ch: char },

    #[error("line {line}: unterminated string literal")]
    UnterminatedString { line: usize },

    #[error("line {line}: invalid escape sequence `{escape}`")]
    InvalidEscape { line: usize, escape: String },

    #[error("line {line}: unterminated block comment")]
    UnterminatedComment { line: usize },

    #[error("line {line}: integer literal `{text}` is out of range")]
    IntegerOverflow { line: usize, text: String },

    #[error("line {line} in `{block}`: expected {expected}, found {found}")]
    UnexpectedToken {
        line: usize,
        block: String,
        expected: String,
        found: String,
    },

    #[error("line {line}: block `{block}` is never closed")]
    UnclosedBlock { line: usize, block: String },

    #[error("line {line}: closing brace without a matching block")]
    UnmatchedClose { line: usize },

    #[error("line {line} in `{block}`: `{key}` is already set on line {first}")]
    DuplicateKey {
        line: usize,
        block: String,
        key: String,
        first: usize,
    },

    #[error("line {line} in `{block}`: malformed dependency coordinate `{coordinate}`: {reason}")]
    MalformedCoordinate {
        line: usize,
        block: String,
        coordinate: String,
        reason: String,
    },

    #[error("line {line} in `{block}`: invalid value for `{key}`: {reason}")]
    InvalidValue {
        line: usize,
        block: String,
        key: String,
        reason: String,
    },
}

impl ParseError {
    /// Line the error was detected on (1-based)
    pub fn line(&self) -> usize {
        match self {
            Self::UnexpectedChar { line, .. }
            | Self::UnterminatedString { line }
            | Self::InvalidEscape { line, .. }
            | Self::UnterminatedComment { line }
            | Self::IntegerOverflow { line, .. }
            | Self::UnexpectedToken { line, .. }
            | Self::UnclosedBlock { line, .. }
            | Self::UnmatchedClose { line }
            | Self::DuplicateKey { line, .. }
            | Self::MalformedCoordinate { line, .. }
            | Self::InvalidValue { line, .. } => *line,
        }
    }

    /// Dotted path of the enclosing block, when known
    pub fn block(&self) -> Option<&str> {
        match self {
            Self::UnexpectedToken { block, .. }
            | Self::UnclosedBlock { block, .. }
            | Self::DuplicateKey { block, .. }
            | Self::MalformedCoordinate { block, .. }
            | Self::InvalidValue { block, .. } => Some(block),
            _ => None,
        }
    }

    fn code(&self) -> ErrorCode {
        match self {
            Self::UnclosedBlock { .. } | Self::UnmatchedClose { .. } => ErrorCode::UnbalancedBlock,
            Self::DuplicateKey { .. } => ErrorCode::DuplicateKey,
            Self::MalformedCoordinate { .. } => ErrorCode::MalformedCoordinate,
            _ => ErrorCode::ParseError,
        }
    }
}

/// A symbolic reference that the injected version source cannot satisfy
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("`{field}` references `{symbol}`, which the version source does not define")]
    MissingSymbol { field: String, symbol: String },

    #[error("`{field}` references `{symbol}`, which resolved to non-integer `{value}`")]
    NotAnInteger {
        field: String,
        symbol: String,
        value: String,
    },
}

impl ResolutionError {
    /// The unresolved symbol
    pub fn symbol(&self) -> &str {
        match self {
            Self::MissingSymbol { symbol, .. } | Self::NotAnInteger { symbol, .. } => symbol,
        }
    }
}

/// Any error that aborts the pipeline
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GradleError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("resolution error: {0}")]
    Resolution(#[from] ResolutionError),
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        let context = match err.block() {
            Some(block) => format!("line {} in block `{}`", err.line(), block),
            None => format!("line {}", err.line()),
        };
        Error::new(err.code(), err.to_string())
            .with_context(context)
            .with_source(err)
    }
}

impl From<ResolutionError> for Error {
    fn from(err: ResolutionError) -> Self {
        match &err {
            ResolutionError::MissingSymbol { field, symbol } => Error::missing_symbol(symbol)
                .with_context(format!("referenced by `{}`", field))
                .with_source(err.clone()),
            ResolutionError::NotAnInteger { field, .. } => {
                Error::new(ErrorCode::SymbolTypeMismatch, err.to_string())
                    .with_context(format!("`{}` requires an integer", field))
                    .with_source(err.clone())
            }
        }
    }
}

impl From<GradleError> for Error {
    fn from(err: GradleError) -> Self {
        match err {
            GradleError::Parse(e) => e.into(),
            GradleError::Resolution(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_maps_to_code() {
        let err: Error = ParseError::UnclosedBlock {
            line: 12,
            block: "android".to_string(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::UnbalancedBlock);
        assert_eq!(err.context.as_deref(), Some("line 12 in block `android`"));
    }

    #[test]
    fn test_resolution_error_names_symbol() {
        let err = ResolutionError::MissingSymbol {
            field: "minSdk".to_string(),
            symbol: "flutter.minSdkVersion".to_string(),
        };
        assert_eq!(err.symbol(), "flutter.minSdkVersion");

        let core: Error = err.into();
        assert_eq!(core.code, ErrorCode::MissingSymbol);
        assert!(core.message.contains("flutter.minSdkVersion"));
    }
}
