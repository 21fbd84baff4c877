//! Signing-config names and the release fallback policy
//!
//! Only names are handled; credentials never enter the resolver.

use crate::descriptor::BuildType;
use serde::Serialize;
use std::collections::BTreeSet;

pub const DEBUG_SIGNING: &str = "debug";
pub const DEBUG_BUILD_TYPE: &str = "debug";
pub const RELEASE_BUILD_TYPE: &str = "release";

/// Names of signing configs defined outside the descriptor
pub trait SigningConfigRegistry {
    fn contains(&self, name: &str) -> bool;
}

impl<R: SigningConfigRegistry + ?Sized> SigningConfigRegistry for &R {
    fn contains(&self, name: &str) -> bool {
        (**self).contains(name)
    }
}

/// Set-backed registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SigningRegistry {
    names: BTreeSet<String>,
}

impl Default for SigningRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SigningRegistry {
    /// Registry holding the `debug` identity the Android plugin always creates
    pub fn new() -> Self {
        Self::empty().with(DEBUG_SIGNING)
    }

    pub fn empty() -> Self {
        Self {
            names: BTreeSet::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>) -> Self {
        self.names.insert(name.into());
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl SigningConfigRegistry for SigningRegistry {
    fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

impl<S: Into<String>> Extend<S> for SigningRegistry {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.names.extend(iter.into_iter().map(Into::into));
    }
}

/// How a build type obtained its signing identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SigningSource {
    /// `signingConfig = ...` in the build type
    Explicit,
    /// The debug build type signs with the debug identity unless told otherwise
    Default,
    /// Release without its own identity falls back to debug
    FallbackDebug,
    /// No identity; the artifact is unsigned
    Unsigned,
}

/// Effective signing identity of one build type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SigningAssignment {
    pub build_type: String,
    pub signing_config: Option<String>,
    pub source: SigningSource,
    /// Line of the build type declaration, absent for the implicit release type
    pub line: Option<usize>,
}

impl SigningAssignment {
    pub fn is_debug_signed(&self) -> bool {
        self.signing_config.as_deref() == Some(DEBUG_SIGNING)
    }
}

/// Compute effective signing for every build type
///
/// A release build type is always present in the result: when the
/// descriptor does not declare one, or declares one without a signing
/// config, it signs with the debug identity. `signingConfig = null`
/// leaves any build type unsigned.
pub fn assign(build_types: &[BuildType]) -> Vec<SigningAssignment> {
    let mut assignments: Vec<SigningAssignment> = build_types
        .iter()
        .map(|bt| {
            let (signing_config, source) = match (&bt.signing_config, bt.name.as_str()) {
                (Some(name), _) => (Some(name.clone()), SigningSource::Explicit),
                (None, _) if bt.unsigned => (None, SigningSource::Unsigned),
                (None, RELEASE_BUILD_TYPE) => {
                    (Some(DEBUG_SIGNING.to_string()), SigningSource::FallbackDebug)
                }
                (None, DEBUG_BUILD_TYPE) => (Some(DEBUG_SIGNING.to_string()), SigningSource::Default),
                (None, _) => (None, SigningSource::Unsigned),
            };
            SigningAssignment {
                build_type: bt.name.clone(),
                signing_config,
                source,
                line: Some(bt.line),
            }
        })
        .collect();

    if !assignments.iter().any(|a| a.build_type == RELEASE_BUILD_TYPE) {
        assignments.push(SigningAssignment {
            build_type: RELEASE_BUILD_TYPE.to_string(),
            signing_config: Some(DEBUG_SIGNING.to_string()),
            source: SigningSource::FallbackDebug,
            line: None,
        });
    }

    assignments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_type(name: &str, signing: Option<&str>) -> BuildType {
        BuildType {
            name: name.to_string(),
            signing_config: signing.map(String::from),
            unsigned: false,
            minify_enabled: None,
            shrink_resources: None,
            line: 1,
        }
    }

    #[test]
    fn test_registry_defaults_to_debug() {
        let registry = SigningRegistry::new();
        assert!(registry.contains("debug"));
        assert!(!registry.contains("release"));
        assert!(!SigningRegistry::empty().contains("debug"));
    }

    #[test]
    fn test_registry_extend() {
        let mut registry = SigningRegistry::new();
        registry.extend(["upload", "release"]);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["debug", "release", "upload"]);
    }

    #[test]
    fn test_explicit_debug_for_release() {
        let assignments = assign(&[build_type("release", Some("debug"))]);
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].source, SigningSource::Explicit);
        assert!(assignments[0].is_debug_signed());
    }

    #[test]
    fn test_release_without_identity_falls_back() {
        let assignments = assign(&[build_type("release", None)]);
        assert_eq!(assignments[0].source, SigningSource::FallbackDebug);
        assert_eq!(assignments[0].signing_config.as_deref(), Some("debug"));
    }

    #[test]
    fn test_null_signing_config_leaves_release_unsigned() {
        let release = BuildType {
            unsigned: true,
            ..build_type("release", None)
        };
        let assignments = assign(&[release]);
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].source, SigningSource::Unsigned);
        assert_eq!(assignments[0].signing_config, None);
        assert!(!assignments[0].is_debug_signed());
    }

    #[test]
    fn test_missing_release_is_added() {
        let assignments = assign(&[build_type("profile", None)]);
        assert_eq!(assignments.len(), 2);
        assert_eq!(assignments[0].source, SigningSource::Unsigned);
        assert_eq!(assignments[1].build_type, "release");
        assert_eq!(assignments[1].source, SigningSource::FallbackDebug);
        assert_eq!(assignments[1].line, None);
    }

    #[test]
    fn test_debug_build_type_default() {
        let assignments = assign(&[build_type("debug", None), build_type("release", Some("upload"))]);
        assert_eq!(assignments[0].source, SigningSource::Default);
        assert_eq!(assignments[1].signing_config.as_deref(), Some("upload"));
        assert!(!assignments[1].is_debug_signed());
    }
}
