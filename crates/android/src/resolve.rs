//! Resolution of symbolic version references

use crate::descriptor::{BuildDescriptor, VersionRef};
use crate::error::ResolutionError;
use crate::signing::{self, SigningAssignment, SigningSource};
use crate::version_source::{VersionSource, VersionValue};
use serde::Serialize;
use tracing::{debug, warn};

/// Concrete version values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedVersions {
    pub compile_sdk: Option<i64>,
    pub min_sdk: Option<i64>,
    pub target_sdk: Option<i64>,
    pub version_code: Option<i64>,
    pub version_name: Option<String>,
    pub ndk_version: Option<String>,
}

/// A symbol that was looked up, kept for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSymbol {
    pub field: String,
    pub symbol: String,
    pub value: VersionValue,
}

/// Descriptor with every deferred reference replaced by a concrete value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDescriptor {
    pub descriptor: BuildDescriptor,
    pub versions: ResolvedVersions,
    pub signing: Vec<SigningAssignment>,
    pub symbols: Vec<ResolvedSymbol>,
}

impl ResolvedDescriptor {
    pub fn signing_for(&self, build_type: &str) -> Option<&SigningAssignment> {
        self.signing.iter().find(|s| s.build_type == build_type)
    }
}

/// Replace symbolic references with values from `source`
///
/// Fails on the first referenced symbol (in field order: compileSdk,
/// minSdk, targetSdk, versionCode, versionName, ndkVersion) the source
/// cannot supply.
pub fn resolve_versions(
    descriptor: BuildDescriptor,
    source: &dyn VersionSource,
) -> Result<ResolvedDescriptor, ResolutionError> {
    let mut symbols = Vec::new();
    let mut resolver = FieldResolver {
        source,
        symbols: &mut symbols,
    };

    let versions = ResolvedVersions {
        compile_sdk: resolver.int("compileSdk", descriptor.compile_sdk.as_ref())?,
        min_sdk: resolver.int("minSdk", descriptor.min_sdk.as_ref())?,
        target_sdk: resolver.int("targetSdk", descriptor.target_sdk.as_ref())?,
        version_code: resolver.int("versionCode", descriptor.version_code.as_ref())?,
        version_name: resolver.text("versionName", descriptor.version_name.as_ref())?,
        ndk_version: resolver.text("ndkVersion", descriptor.ndk_version.as_ref())?,
    };

    let signing = signing::assign(&descriptor.build_types);
    for assignment in &signing {
        if assignment.source == SigningSource::FallbackDebug {
            warn!(
                build_type = %assignment.build_type,
                "No signing config for release build; falling back to the debug identity"
            );
        }
    }

    debug!(symbols = symbols.len(), "Resolved version references");

    Ok(ResolvedDescriptor {
        descriptor,
        versions,
        signing,
        symbols,
    })
}

struct FieldResolver<'a> {
    source: &'a dyn VersionSource,
    symbols: &'a mut Vec<ResolvedSymbol>,
}

impl FieldResolver<'_> {
    fn lookup(&mut self, field: &str, symbol: &str) -> Result<VersionValue, ResolutionError> {
        let value = self
            .source
            .lookup(symbol)
            .ok_or_else(|| ResolutionError::MissingSymbol {
                field: field.to_string(),
                symbol: symbol.to_string(),
            })?;
        debug!(field, symbol, value = %value, "Resolved symbol");
        self.symbols.push(ResolvedSymbol {
            field: field.to_string(),
            symbol: symbol.to_string(),
            value: value.clone(),
        });
        Ok(value)
    }

    fn int(&mut self, field: &str, reference: Option<&VersionRef>) -> Result<Option<i64>, ResolutionError> {
        match reference {
            None => Ok(None),
            Some(VersionRef::Int(n)) => Ok(Some(*n)),
            Some(VersionRef::Text(text)) => text
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| ResolutionError::NotAnInteger {
                    field: field.to_string(),
                    symbol: field.to_string(),
                    value: text.clone(),
                }),
            Some(VersionRef::Symbol(symbol)) => {
                let value = self.lookup(field, symbol)?;
                value
                    .as_int()
                    .map(Some)
                    .ok_or_else(|| ResolutionError::NotAnInteger {
                        field: field.to_string(),
                        symbol: symbol.clone(),
                        value: value.as_text(),
                    })
            }
        }
    }

    fn text(&mut self, field: &str, reference: Option<&VersionRef>) -> Result<Option<String>, ResolutionError> {
        match reference {
            None => Ok(None),
            Some(VersionRef::Int(n)) => Ok(Some(n.to_string())),
            Some(VersionRef::Text(text)) => Ok(Some(text.clone())),
            Some(VersionRef::Symbol(symbol)) => Ok(Some(self.lookup(field, symbol)?.as_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version_source::MapVersionSource;

    fn descriptor(text: &str) -> BuildDescriptor {
        BuildDescriptor::parse(text).unwrap()
    }

    #[test]
    fn test_resolves_quoted_symbol_to_integer() {
        let d = descriptor(
            "android {\n defaultConfig {\n  applicationId = \"com.example.app\"\n  minSdk = \"flutter.minSdkVersion\"\n }\n}",
        );
        let source = MapVersionSource::new().with("flutter.minSdkVersion", 21);
        let resolved = resolve_versions(d, &source).unwrap();
        assert_eq!(resolved.versions.min_sdk, Some(21));
        assert_eq!(resolved.symbols.len(), 1);
    }

    #[test]
    fn test_missing_symbol_fails() {
        let d = descriptor("android {\n compileSdk = flutter.compileSdkVersion\n}");
        let err = resolve_versions(d, &MapVersionSource::new()).unwrap_err();
        assert_eq!(
            err,
            ResolutionError::MissingSymbol {
                field: "compileSdk".into(),
                symbol: "flutter.compileSdkVersion".into()
            }
        );
    }

    #[test]
    fn test_non_integer_value_fails() {
        let d = descriptor("android {\n defaultConfig {\n  versionCode = flutter.versionCode\n }\n}");
        let source = MapVersionSource::new().with("flutter.versionCode", "one");
        let err = resolve_versions(d, &source).unwrap_err();
        assert!(matches!(err, ResolutionError::NotAnInteger { ref value, .. } if value == "one"));
    }

    #[test]
    fn test_text_fields_accept_numbers() {
        let d = descriptor(
            "android {\n ndkVersion = flutter.ndkVersion\n defaultConfig {\n  versionName = flutter.versionName\n }\n}",
        );
        let source = MapVersionSource::new()
            .with("flutter.ndkVersion", "27.0.12077973")
            .with("flutter.versionName", 2);
        let resolved = resolve_versions(d, &source).unwrap();
        assert_eq!(resolved.versions.ndk_version.as_deref(), Some("27.0.12077973"));
        assert_eq!(resolved.versions.version_name.as_deref(), Some("2"));
    }

    #[test]
    fn test_literals_need_no_source() {
        let d = descriptor("android {\n compileSdk = 35\n defaultConfig {\n  versionName = \"1.0\"\n }\n}");
        let resolved = resolve_versions(d, &MapVersionSource::new()).unwrap();
        assert_eq!(resolved.versions.compile_sdk, Some(35));
        assert!(resolved.symbols.is_empty());
    }

    #[test]
    fn test_release_signing_is_always_assigned() {
        let d = descriptor("android {\n}");
        let resolved = resolve_versions(d, &MapVersionSource::new()).unwrap();
        let release = resolved.signing_for("release").unwrap();
        assert_eq!(release.source, SigningSource::FallbackDebug);
    }
}
