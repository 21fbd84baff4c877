//! `parse → resolve → validate → emit` with injected collaborators

use crate::descriptor::BuildDescriptor;
use crate::emit::{self, NormalizedConfig};
use crate::error::{ParseError, ResolutionError, Result};
use crate::resolve::{self, ResolvedDescriptor};
use crate::signing::SigningConfigRegistry;
use crate::validate::{self, ValidationOptions, ValidationReport};
use crate::version_source::VersionSource;
use droidconf_telemetry::timed_span;
use tracing::info;

/// Output of a full pipeline run
#[derive(Debug, Clone)]
pub struct Resolution {
    pub resolved: ResolvedDescriptor,
    pub report: ValidationReport,
    pub config: NormalizedConfig,
}

impl Resolution {
    /// No violations (warnings allowed)
    pub fn is_valid(&self) -> bool {
        self.report.is_valid()
    }
}

/// Resolver bound to a version source and a signing registry
///
/// ```rust
/// use droidconf_android::{MapVersionSource, Resolver, SigningRegistry};
///
/// let resolver = Resolver::new(
///     MapVersionSource::new().with("flutter.minSdkVersion", 21),
///     SigningRegistry::new(),
/// );
/// let resolution = resolver
///     .run("android {\n defaultConfig {\n  minSdk = flutter.minSdkVersion\n }\n}")
///     .unwrap();
/// assert_eq!(resolution.resolved.versions.min_sdk, Some(21));
/// ```
pub struct Resolver<V, R> {
    versions: V,
    registry: R,
    options: ValidationOptions,
}

impl<V: VersionSource, R: SigningConfigRegistry> Resolver<V, R> {
    pub fn new(versions: V, registry: R) -> Self {
        Self {
            versions,
            registry,
            options: ValidationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ValidationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    pub fn parse(&self, text: &str) -> std::result::Result<BuildDescriptor, ParseError> {
        timed_span!("parse", bytes = text.len());
        BuildDescriptor::parse(text)
    }

    pub fn resolve(&self, descriptor: BuildDescriptor) -> std::result::Result<ResolvedDescriptor, ResolutionError> {
        timed_span!("resolve");
        resolve::resolve_versions(descriptor, &self.versions)
    }

    pub fn validate(&self, resolved: &ResolvedDescriptor) -> ValidationReport {
        timed_span!("validate");
        validate::validate_with(resolved, &self.registry, &self.options)
    }

    pub fn emit(&self, resolved: &ResolvedDescriptor) -> NormalizedConfig {
        timed_span!("emit");
        emit::emit(resolved)
    }

    /// Run every stage; only parse and resolution failures abort
    pub fn run(&self, text: &str) -> Result<Resolution> {
        let descriptor = self.parse(text)?;
        let resolved = self.resolve(descriptor)?;
        let report = self.validate(&resolved);
        let config = self.emit(&resolved);

        info!(
            plugins = resolved.descriptor.plugins.len(),
            dependencies = resolved.descriptor.dependencies.len(),
            errors = report.errors().len(),
            warnings = report.warnings().len(),
            "Descriptor resolved"
        );

        Ok(Resolution {
            resolved,
            report,
            config,
        })
    }
}
