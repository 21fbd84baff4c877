//! Android Gradle build-descriptor resolver
//!
//! Reads a `build.gradle.kts` application descriptor and runs it through a
//! single-pass pipeline:
//!
//! - [`parse`]: text to a typed [`BuildDescriptor`]
//! - [`resolve_versions`]: symbolic versions (`flutter.minSdkVersion`) to
//!   concrete values from an injected [`VersionSource`]
//! - [`validate`]: invariant checks collected into a report, never fatal
//! - [`emit`]: an ordered, language-agnostic [`NormalizedConfig`]
//!
//! ```rust
//! use droidconf_android::{emit, parse, resolve_versions, MapVersionSource};
//!
//! let descriptor = parse(r#"
//! android {
//!     defaultConfig {
//!         applicationId = "com.example.app"
//!         minSdk = "flutter.minSdkVersion"
//!     }
//! }
//! "#).unwrap();
//!
//! let source = MapVersionSource::new().with("flutter.minSdkVersion", 21);
//! let resolved = resolve_versions(descriptor, &source).unwrap();
//! let config = emit(&resolved);
//!
//! assert_eq!(config.get("android.defaultConfig.minSdk").and_then(|v| v.as_int()), Some(21));
//! ```

pub mod ast;
pub mod coordinate;
pub mod descriptor;
pub mod emit;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod pipeline;
pub mod render;
pub mod resolve;
pub mod signing;
pub mod validate;
pub mod version_source;

pub use coordinate::Coordinate;
pub use descriptor::BuildDescriptor;
pub use emit::{emit, ConfigTable, ConfigValue, NormalizedConfig};
pub use error::{GradleError, ParseError, ResolutionError, Result};
pub use pipeline::{Resolution, Resolver};
pub use resolve::{resolve_versions, ResolvedDescriptor};
pub use signing::{SigningConfigRegistry, SigningRegistry};
pub use validate::{validate, validate_with, ValidationOptions, ValidationReport};
pub use version_source::{MapVersionSource, VersionSource, VersionValue};

/// Parse descriptor text
pub fn parse(text: &str) -> std::result::Result<BuildDescriptor, ParseError> {
    BuildDescriptor::parse(text)
}
