//! Configuration schema definitions
//!
//! Every section is optional; an empty file yields the defaults.

use serde::{Deserialize, Serialize};

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigSchema {
    #[serde(default)]
    pub versions: VersionsConfig,

    #[serde(default)]
    pub signing: SigningConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Where symbolic version references are resolved from
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VersionsConfig {
    /// Optional properties file (e.g. `local.properties`), relative to the config file
    #[serde(default)]
    pub properties: Option<String>,

    /// Inline symbols; nested tables are flattened with `.` separators,
    /// so `[versions.symbols.flutter] minSdkVersion = 21` defines
    /// `flutter.minSdkVersion`.
    #[serde(default)]
    pub symbols: toml::Table,
}

/// Signing-config names known to exist outside the descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningConfig {
    /// Additional signing-config names
    #[serde(default)]
    pub configs: Vec<String>,

    /// Register the `debug` identity the Android plugin always creates
    #[serde(default = "default_true")]
    pub implicit_debug: bool,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            configs: Vec::new(),
            implicit_debug: true,
        }
    }
}

/// Validation behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Treat every warning as an error
    #[serde(default)]
    pub strict: bool,

    /// Accept a release build signed with the debug identity (reported as a warning)
    #[serde(default = "default_true")]
    pub allow_debug_signed_release: bool,

    /// Require the Flutter plugin to be applied after the Android and Kotlin plugins
    #[serde(default = "default_true")]
    pub enforce_plugin_order: bool,

    /// Upper bound accepted for `versionCode`
    #[serde(default = "default_max_version_code")]
    pub max_version_code: i64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            strict: false,
            allow_debug_signed_release: true,
            enforce_plugin_order: true,
            max_version_code: default_max_version_code(),
        }
    }
}

/// Emission settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// `json` or `kts`
    #[serde(default = "default_format")]
    pub format: String,

    /// Pretty-print JSON output
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            pretty: true,
        }
    }
}

/// Output formats accepted by `output.format`
pub const OUTPUT_FORMATS: &[&str] = &["json", "kts"];

fn default_true() -> bool {
    true
}

fn default_format() -> String {
    "json".to_string()
}

fn default_max_version_code() -> i64 {
    // Google Play's ceiling for versionCode
    2_100_000_000
}
