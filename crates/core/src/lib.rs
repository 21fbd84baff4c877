//! Core utilities for droidconf
//!
//! This crate provides shared functionality used by the resolver and the CLI:
//!
//! - **Error handling**: Coded errors with context and recovery suggestions
//! - **Validation**: A fluent validator collecting errors and warnings
//! - **Configuration**: TOML-based tool configuration with defaults
//!
//! # Example
//!
//! ```rust
//! use droidconf_core::validation::Validator;
//!
//! let report = Validator::new()
//!     .required("namespace", "com.example.app")
//!     .reverse_domain("namespace", "com.example.app")
//!     .validate();
//!
//! assert!(report.is_valid());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod validation;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, ConfigSchema};
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
    pub use crate::validation::{ValidationError, ValidationResult, Validator};
}
