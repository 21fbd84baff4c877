//! Invariant checks over a resolved descriptor
//!
//! Validation never fails. Violations are errors in the returned report,
//! advisories are warnings, and the caller decides whether to abort.

use crate::descriptor::{
    DependencyNotation, PluginEntry, ANDROID_APPLICATION_PLUGIN, FLUTTER_PLUGIN, KNOWN_SCOPES, KOTLIN_PLUGIN_IDS,
};
use crate::resolve::ResolvedDescriptor;
use crate::signing::{SigningConfigRegistry, SigningSource, RELEASE_BUILD_TYPE};
use droidconf_core::config::ValidationConfig;
use droidconf_core::validation::{ValidationError, ValidationResult, Validator};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Report returned by [`validate`]
pub type ValidationReport = ValidationResult;

/// Codes used in validation reports
pub mod codes {
    pub const REQUIRED: &str = "REQUIRED";
    pub const REVERSE_DOMAIN: &str = "REVERSE_DOMAIN";
    pub const DUPLICATE_PLUGIN: &str = "DUPLICATE_PLUGIN";
    pub const DISABLED_PLUGIN: &str = "DISABLED_PLUGIN";
    pub const MISSING_ANDROID_PLUGIN: &str = "MISSING_ANDROID_PLUGIN";
    pub const PLUGIN_ORDER: &str = "PLUGIN_ORDER";
    pub const SDK_ORDER: &str = "SDK_ORDER";
    pub const RANGE: &str = "RANGE";
    pub const MISSING_VERSION: &str = "MISSING_VERSION";
    pub const REDUNDANT_MULTIDEX: &str = "REDUNDANT_MULTIDEX";
    pub const JAVA_TARGET_MISMATCH: &str = "JAVA_TARGET_MISMATCH";
    pub const UNKNOWN_SIGNING_CONFIG: &str = "UNKNOWN_SIGNING_CONFIG";
    pub const DEBUG_SIGNED_RELEASE: &str = "DEBUG_SIGNED_RELEASE";
    pub const UNMANAGED_VERSION: &str = "UNMANAGED_VERSION";
    pub const PLATFORM_WITHOUT_VERSION: &str = "PLATFORM_WITHOUT_VERSION";
    pub const DUPLICATE_DEPENDENCY: &str = "DUPLICATE_DEPENDENCY";
    pub const UNKNOWN_SCOPE: &str = "UNKNOWN_SCOPE";
    pub const MISSING_FLUTTER_SOURCE: &str = "MISSING_FLUTTER_SOURCE";
    pub const UNKNOWN_KEY: &str = "UNKNOWN_KEY";
}

/// Knobs for [`validate_with`]
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    pub strict: bool,
    pub allow_debug_signed_release: bool,
    pub enforce_plugin_order: bool,
    pub max_version_code: i64,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        ValidationConfig::default().into()
    }
}

impl From<ValidationConfig> for ValidationOptions {
    fn from(config: ValidationConfig) -> Self {
        Self {
            strict: config.strict,
            allow_debug_signed_release: config.allow_debug_signed_release,
            enforce_plugin_order: config.enforce_plugin_order,
            max_version_code: config.max_version_code,
        }
    }
}

/// Validate with default options
pub fn validate(resolved: &ResolvedDescriptor, registry: &dyn SigningConfigRegistry) -> ValidationReport {
    validate_with(resolved, registry, &ValidationOptions::default())
}

/// Validate every invariant and collect the findings
pub fn validate_with(
    resolved: &ResolvedDescriptor,
    registry: &dyn SigningConfigRegistry,
    options: &ValidationOptions,
) -> ValidationReport {
    let mut report = ValidationReport::new();
    report.merge(check_plugins(resolved, options));
    report.merge(check_identity(resolved));
    report.merge(check_versions(resolved, options));
    report.merge(check_java(resolved));
    report.merge(check_signing(resolved, registry));
    report.merge(check_dependencies(resolved));
    report.merge(check_flutter(resolved));

    for unknown in &resolved.descriptor.unrecognized {
        report.add_warning(
            ValidationError::new(&unknown.path, codes::UNKNOWN_KEY, "Not interpreted by the resolver")
                .at_line(unknown.line),
        );
    }

    if !options.allow_debug_signed_release {
        report.escalate(codes::DEBUG_SIGNED_RELEASE);
    }
    if options.strict {
        report.escalate_all();
    }

    debug!(
        errors = report.errors().len(),
        warnings = report.warnings().len(),
        "Validation finished"
    );
    report
}

fn check_plugins(resolved: &ResolvedDescriptor, options: &ValidationOptions) -> ValidationReport {
    let plugins = &resolved.descriptor.plugins;
    let mut validator = Validator::new();
    let mut first_enabled: HashMap<&str, usize> = HashMap::new();
    let mut first_any: HashMap<&str, usize> = HashMap::new();

    for plugin in plugins {
        let earlier = if plugin.enabled {
            first_enabled.get(plugin.id.as_str())
        } else {
            None
        };
        if let Some(first) = earlier {
            validator = validator.error(
                ValidationError::new(
                    "plugins",
                    codes::DUPLICATE_PLUGIN,
                    format!("Plugin `{}` is already declared on line {}", plugin.id, first),
                )
                .actual(&plugin.id)
                .at_line(plugin.line),
            );
        } else if let Some(first) = first_any.get(plugin.id.as_str()) {
            // One of the two declarations is commented out
            validator = validator.warning(
                ValidationError::new(
                    "plugins",
                    codes::DUPLICATE_PLUGIN,
                    format!("Plugin `{}` also appears on line {}", plugin.id, first),
                )
                .actual(&plugin.id)
                .at_line(plugin.line),
            );
        }
        first_any.entry(plugin.id.as_str()).or_insert(plugin.line);
        if plugin.enabled {
            first_enabled.entry(plugin.id.as_str()).or_insert(plugin.line);
        }

        if !plugin.enabled {
            validator = validator.warning(
                ValidationError::new(
                    "plugins",
                    codes::DISABLED_PLUGIN,
                    format!("Plugin `{}` is declared but disabled", plugin.id),
                )
                .actual(&plugin.id)
                .at_line(plugin.line),
            );
        }
    }

    let enabled: Vec<&PluginEntry> = resolved.descriptor.enabled_plugins().collect();
    let android = position_of(&enabled, &[ANDROID_APPLICATION_PLUGIN]);
    validator = validator.warn_if(
        "plugins",
        codes::MISSING_ANDROID_PLUGIN,
        android.is_none(),
        "The com.android.application plugin is not applied",
    );

    if options.enforce_plugin_order {
        if let Some(flutter) = position_of(&enabled, &[FLUTTER_PLUGIN]) {
            let kotlin = position_of(&enabled, KOTLIN_PLUGIN_IDS);
            for (name, index) in [("Android", android), ("Kotlin", kotlin)] {
                if let Some(index) = index.filter(|&i| i > flutter) {
                    validator = validator.error(
                        ValidationError::new(
                            "plugins",
                            codes::PLUGIN_ORDER,
                            format!("The Flutter plugin must be applied after the {} plugin", name),
                        )
                        .expected(format!("{} before {}", enabled[index].id, FLUTTER_PLUGIN))
                        .at_line(enabled[flutter].line),
                    );
                }
            }
        }
    }

    validator.validate()
}

fn position_of(plugins: &[&PluginEntry], ids: &[&str]) -> Option<usize> {
    plugins.iter().position(|p| ids.contains(&p.id.as_str()))
}

fn check_identity(resolved: &ResolvedDescriptor) -> ValidationReport {
    let d = &resolved.descriptor;
    let mut validator = Validator::new();
    for (field, value) in [
        ("android.namespace", &d.namespace),
        ("android.defaultConfig.applicationId", &d.application_id),
    ] {
        validator = match value {
            Some(value) => validator.required(field, value).reverse_domain(field, value),
            None => validator.present(field, value.as_ref()),
        };
    }
    validator.validate()
}

fn check_versions(resolved: &ResolvedDescriptor, options: &ValidationOptions) -> ValidationReport {
    let v = &resolved.versions;
    let mut validator = Validator::new()
        .present("android.compileSdk", v.compile_sdk.as_ref())
        .present("android.defaultConfig.minSdk", v.min_sdk.as_ref())
        .present("android.defaultConfig.targetSdk", v.target_sdk.as_ref());

    for (field, value) in [
        ("android.compileSdk", v.compile_sdk),
        ("android.defaultConfig.minSdk", v.min_sdk),
        ("android.defaultConfig.targetSdk", v.target_sdk),
    ] {
        if let Some(level) = value {
            validator = validator.range(field, level, 1, 1000);
        }
    }

    if let (Some(min), Some(target)) = (v.min_sdk, v.target_sdk) {
        if min > target {
            validator = validator.error(
                ValidationError::new(
                    "android.defaultConfig.minSdk",
                    codes::SDK_ORDER,
                    "minSdk must not exceed targetSdk",
                )
                .expected(format!("<= {}", target))
                .actual(min.to_string()),
            );
        }
    }
    if let (Some(min), Some(compile)) = (v.min_sdk, v.compile_sdk) {
        if min > compile {
            validator = validator.error(
                ValidationError::new(
                    "android.defaultConfig.minSdk",
                    codes::SDK_ORDER,
                    "minSdk must not exceed compileSdk",
                )
                .expected(format!("<= {}", compile))
                .actual(min.to_string()),
            );
        }
    }
    if let (Some(target), Some(compile)) = (v.target_sdk, v.compile_sdk) {
        validator = validator.warn_if(
            "android.defaultConfig.targetSdk",
            codes::SDK_ORDER,
            target > compile,
            "targetSdk is higher than compileSdk",
        );
    }

    validator = match v.version_code {
        Some(code) => validator.range(
            "android.defaultConfig.versionCode",
            code,
            1,
            options.max_version_code,
        ),
        None => validator.warn_if(
            "android.defaultConfig.versionCode",
            codes::MISSING_VERSION,
            true,
            "versionCode is not set",
        ),
    };
    validator = match &v.version_name {
        Some(name) => validator.required("android.defaultConfig.versionName", name),
        None => validator.warn_if(
            "android.defaultConfig.versionName",
            codes::MISSING_VERSION,
            true,
            "versionName is not set",
        ),
    };

    // Native multidex from API 21 on
    validator
        .warn_if(
            "android.defaultConfig.multiDexEnabled",
            codes::REDUNDANT_MULTIDEX,
            resolved.descriptor.multi_dex_enabled == Some(true) && v.min_sdk.is_some_and(|m| m >= 21),
            "multiDexEnabled has no effect with minSdk 21 or higher",
        )
        .validate()
}

fn check_java(resolved: &ResolvedDescriptor) -> ValidationReport {
    let java = &resolved.descriptor.java;
    let mut validator = Validator::new();
    if let (Some(source), Some(target)) = (&java.source_compatibility, &java.target_compatibility) {
        validator = validator.warn_if(
            "android.compileOptions",
            codes::JAVA_TARGET_MISMATCH,
            source != target,
            "sourceCompatibility and targetCompatibility differ",
        );
    }
    if let (Some(jvm), Some(target)) = (&java.jvm_target, &java.target_compatibility) {
        validator = validator.warn_if(
            "android.kotlinOptions.jvmTarget",
            codes::JAVA_TARGET_MISMATCH,
            jvm != target,
            "Kotlin jvmTarget differs from Java targetCompatibility",
        );
    }
    validator.validate()
}

fn check_signing(resolved: &ResolvedDescriptor, registry: &dyn SigningConfigRegistry) -> ValidationReport {
    let declared = &resolved.descriptor.signing_configs;
    let mut validator = Validator::new();

    for assignment in &resolved.signing {
        let field = format!("android.buildTypes.{}.signingConfig", assignment.build_type);
        let Some(name) = &assignment.signing_config else {
            continue;
        };

        if !registry.contains(name) && !declared.contains(name) {
            let mut error = ValidationError::new(
                &field,
                codes::UNKNOWN_SIGNING_CONFIG,
                format!("Signing config `{}` is not defined", name),
            )
            .actual(name);
            if let Some(line) = assignment.line {
                error = error.at_line(line);
            }
            validator = validator.error(error);
        }

        if assignment.build_type == RELEASE_BUILD_TYPE && assignment.is_debug_signed() {
            let message = match assignment.source {
                SigningSource::FallbackDebug => {
                    "Release build has no signing config and falls back to the debug identity"
                }
                _ => "Release build is signed with the debug identity",
            };
            let mut warning = ValidationError::new(&field, codes::DEBUG_SIGNED_RELEASE, message)
                .expected("a release signing config")
                .actual(name);
            if let Some(line) = assignment.line {
                warning = warning.at_line(line);
            }
            validator = validator.warning(warning);
        }
    }

    validator.validate()
}

fn check_dependencies(resolved: &ResolvedDescriptor) -> ValidationReport {
    let d = &resolved.descriptor;
    let mut validator = Validator::new();
    let mut seen = HashSet::new();

    for dep in &d.dependencies {
        let field = format!("dependencies.{}", dep.scope);

        if !KNOWN_SCOPES.contains(&dep.scope.as_str()) {
            validator = validator.warning(
                ValidationError::new(&field, codes::UNKNOWN_SCOPE, format!("Unknown configuration `{}`", dep.scope))
                    .at_line(dep.line),
            );
        }

        match &dep.notation {
            DependencyNotation::Module { coordinate }
                if !coordinate.is_versioned() && !d.has_platform_for(&dep.scope) =>
            {
                validator = validator.error(
                    ValidationError::new(
                        &field,
                        codes::UNMANAGED_VERSION,
                        format!("`{}` has no version and no platform/BoM manages it", coordinate),
                    )
                    .expected("group:artifact:version")
                    .actual(coordinate.to_string())
                    .at_line(dep.line),
                );
            }
            DependencyNotation::Platform { coordinate } if !coordinate.is_versioned() => {
                validator = validator.warning(
                    ValidationError::new(
                        &field,
                        codes::PLATFORM_WITHOUT_VERSION,
                        format!("Platform `{}` does not pin a version", coordinate),
                    )
                    .at_line(dep.line),
                );
            }
            _ => {}
        }

        if !seen.insert((&dep.scope, &dep.notation)) {
            validator = validator.warning(
                ValidationError::new(&field, codes::DUPLICATE_DEPENDENCY, "Dependency is declared twice")
                    .at_line(dep.line),
            );
        }
    }

    validator.validate()
}

fn check_flutter(resolved: &ResolvedDescriptor) -> ValidationReport {
    let d = &resolved.descriptor;
    let uses_flutter = d.enabled_plugins().any(|p| p.id == FLUTTER_PLUGIN);
    let validator = match &d.flutter_source {
        Some(source) => Validator::new().required("flutter.source", source),
        None => Validator::new().warn_if(
            "flutter.source",
            codes::MISSING_FLUTTER_SOURCE,
            uses_flutter,
            "The Flutter plugin is applied but flutter.source is not set",
        ),
    };
    validator.validate()
}
