//! Configuration file loading

use super::schema::{ConfigSchema, OUTPUT_FORMATS};
use crate::error::{Error, Result};
use crate::validation::{ValidationResult, Validator};
use std::path::{Path, PathBuf};

/// Configuration wrapper
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub schema: ConfigSchema,
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file path or use defaults
    ///
    /// An explicit path must exist; otherwise the standard locations are
    /// searched and defaults are used when none is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) if !p.exists() => return Err(Error::config_not_found(p)),
            Some(p) => Some(p.to_path_buf()),
            None => find_config_file(),
        };

        let schema = if let Some(ref p) = config_path {
            load_config_file(p)?
        } else {
            ConfigSchema::default()
        };

        Self {
            schema,
            path: config_path,
        }
        .checked()
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let schema: ConfigSchema = toml::from_str(content)?;
        Self { schema, path: None }.checked()
    }

    fn checked(self) -> Result<Self> {
        self.check()
            .to_result()
            .map_err(|e| Error::invalid_config_value("configuration", e.message))?;
        Ok(self)
    }

    /// Validate option values that serde cannot constrain
    pub fn check(&self) -> ValidationResult {
        Validator::new()
            .one_of("output.format", &self.schema.output.format, OUTPUT_FORMATS)
            .range(
                "validation.max_version_code",
                self.schema.validation.max_version_code,
                1,
                i64::from(i32::MAX),
            )
            .validate()
    }

    /// Resolve the versions properties file relative to the config file
    pub fn properties_path(&self) -> Option<PathBuf> {
        let relative = self.schema.versions.properties.as_ref()?;
        let base = self
            .path
            .as_ref()
            .and_then(|p| p.parent())
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Some(base.join(relative))
    }
}

/// Find configuration file in standard locations
fn find_config_file() -> Option<PathBuf> {
    let candidates = [
        ".droidconf.toml",
        "droidconf.toml",
        ".config/droidconf.toml",
    ];

    for candidate in candidates {
        if Path::new(candidate).exists() {
            return Some(PathBuf::from(candidate));
        }
    }

    dirs::config_dir()
        .map(|dir| dir.join("droidconf").join("config.toml"))
        .filter(|p| p.exists())
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &Path) -> Result<ConfigSchema> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    toml::from_str(&content).map_err(|e| {
        Error::from(e).with_context(format!("While parsing {}", path.display()))
    })
}
