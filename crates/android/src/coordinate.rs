//! Maven module coordinates (`group:artifact[:version]`)

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

static SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("valid regex"));

/// Why a coordinate string was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinateError {
    #[error("coordinate is empty")]
    Empty,

    #[error("expected 2 or 3 `:`-separated parts, found {0}")]
    PartCount(usize),

    #[error("part {0} is empty")]
    EmptyPart(usize),

    #[error("`{0}` is not a valid group or artifact name")]
    InvalidName(String),

    #[error("missing group segment (`{0}` looks like a version)")]
    MissingGroup(String),
}

/// A parsed module coordinate
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub group: String,
    pub artifact: String,
    /// Absent when a platform/BoM manages the version
    pub version: Option<String>,
}

impl Coordinate {
    /// Parse `group:artifact` or `group:artifact:version`
    pub fn parse(text: &str) -> Result<Self, CoordinateError> {
        if text.trim().is_empty() {
            return Err(CoordinateError::Empty);
        }

        let parts: Vec<&str> = text.split(':').collect();
        if !(2..=3).contains(&parts.len()) {
            return Err(CoordinateError::PartCount(parts.len()));
        }
        if let Some(index) = parts.iter().position(|p| p.trim().is_empty()) {
            return Err(CoordinateError::EmptyPart(index + 1));
        }

        let group = parts[0];
        let artifact = parts[1];
        for name in [group, artifact] {
            if !SEGMENT.is_match(name) {
                return Err(CoordinateError::InvalidName(name.to_string()));
            }
        }
        if parts.len() == 2 && artifact.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(CoordinateError::MissingGroup(artifact.to_string()));
        }

        let version = match parts.get(2) {
            Some(v) if v.chars().any(char::is_whitespace) => {
                return Err(CoordinateError::InvalidName((*v).to_string()));
            }
            Some(v) => Some((*v).to_string()),
            None => None,
        };

        Ok(Self {
            group: group.to_string(),
            artifact: artifact.to_string(),
            version,
        })
    }

    /// The non-empty parts in order (two or three of them)
    pub fn parts(&self) -> Vec<&str> {
        let mut parts = vec![self.group.as_str(), self.artifact.as_str()];
        if let Some(version) = &self.version {
            parts.push(version);
        }
        parts
    }

    pub fn is_versioned(&self) -> bool {
        self.version.is_some()
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact)?;
        if let Some(version) = &self.version {
            write!(f, ":{}", version)?;
        }
        Ok(())
    }
}

impl FromStr for Coordinate {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Coordinate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
