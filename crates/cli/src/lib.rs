//! Terminal output helpers for droidconf
//!
//! - Status messages
//! - Validation report rendering

#![warn(missing_docs)]

pub mod output;
pub mod report;
