//! Normalized configuration record
//!
//! [`emit`] turns a resolved descriptor into an ordered key/value tree with
//! concrete values only. Keys keep the Gradle DSL spelling so the record can
//! be rendered back to `build.gradle.kts` (see [`crate::render`]).

use crate::descriptor::DependencyNotation;
use crate::resolve::ResolvedDescriptor;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// A value in the normalized tree
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<ConfigValue>),
    Table(ConfigTable),
}

impl ConfigValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&ConfigTable> {
        match self {
            ConfigValue::Table(table) => Some(table),
            _ => None,
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Bool(b)
    }
}

impl From<i64> for ConfigValue {
    fn from(n: i64) -> Self {
        ConfigValue::Int(n)
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::Str(s)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::Str(s.to_string())
    }
}

impl From<ConfigTable> for ConfigValue {
    fn from(table: ConfigTable) -> Self {
        ConfigValue::Table(table)
    }
}

impl From<Vec<ConfigValue>> for ConfigValue {
    fn from(items: Vec<ConfigValue>) -> Self {
        ConfigValue::List(items)
    }
}

/// Insertion-ordered table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigTable {
    entries: Vec<(String, ConfigValue)>,
}

impl ConfigTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace, keeping the original position on replace
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert only when `value` is present
    pub fn with_opt<V: Into<ConfigValue>>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.insert(key, value);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Dotted lookup through nested tables, e.g. `android.defaultConfig.minSdk`
    pub fn get_path(&self, path: &str) -> Option<&ConfigValue> {
        let mut segments = path.split('.');
        let mut current = self.get(segments.next()?)?;
        for segment in segments {
            current = current.as_table()?.get(segment)?;
        }
        Some(current)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ConfigTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Canonical record handed to the build orchestrator
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct NormalizedConfig {
    root: ConfigTable,
}

impl NormalizedConfig {
    pub fn root(&self) -> &ConfigTable {
        &self.root
    }

    pub fn get(&self, path: &str) -> Option<&ConfigValue> {
        self.root.get_path(path)
    }

    pub fn to_json(&self, pretty: bool) -> droidconf_core::Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

/// Build the normalized record; pure
pub fn emit(resolved: &ResolvedDescriptor) -> NormalizedConfig {
    let d = &resolved.descriptor;
    let v = &resolved.versions;

    let plugins = d
        .plugins
        .iter()
        .map(|p| {
            ConfigTable::new()
                .with("id", p.id.as_str())
                .with("enabled", p.enabled)
                .into()
        })
        .collect::<Vec<ConfigValue>>();

    let mut android = ConfigTable::new()
        .with_opt("namespace", d.namespace.clone())
        .with_opt("compileSdk", v.compile_sdk)
        .with_opt("ndkVersion", v.ndk_version.clone());

    let compile_options = ConfigTable::new()
        .with_opt("sourceCompatibility", d.java.source_compatibility.clone())
        .with_opt("targetCompatibility", d.java.target_compatibility.clone());
    if !compile_options.is_empty() {
        android.insert("compileOptions", compile_options);
    }
    if let Some(jvm_target) = &d.java.jvm_target {
        android.insert("kotlinOptions", ConfigTable::new().with("jvmTarget", jvm_target.as_str()));
    }

    let default_config = ConfigTable::new()
        .with_opt("applicationId", d.application_id.clone())
        .with_opt("minSdk", v.min_sdk)
        .with_opt("targetSdk", v.target_sdk)
        .with_opt("versionCode", v.version_code)
        .with_opt("versionName", v.version_name.clone())
        .with_opt("multiDexEnabled", d.multi_dex_enabled);
    if !default_config.is_empty() {
        android.insert("defaultConfig", default_config);
    }

    if !d.signing_configs.is_empty() {
        let names = d.signing_configs.iter().map(|n| n.as_str().into()).collect::<Vec<ConfigValue>>();
        android.insert("signingConfigs", names);
    }

    let mut build_types = ConfigTable::new();
    for assignment in &resolved.signing {
        let declared = d.build_type(&assignment.build_type);
        let entry = ConfigTable::new()
            .with_opt("signingConfig", assignment.signing_config.clone())
            .with("debugSigned", assignment.is_debug_signed())
            .with_opt("minifyEnabled", declared.and_then(|b| b.minify_enabled))
            .with_opt("shrinkResources", declared.and_then(|b| b.shrink_resources));
        build_types.insert(assignment.build_type.as_str(), entry);
    }
    android.insert("buildTypes", build_types);

    let mut root = ConfigTable::new()
        .with("plugins", plugins)
        .with("android", android);

    if let Some(source) = &d.flutter_source {
        root.insert("flutter", ConfigTable::new().with("source", source.as_str()));
    }

    let dependencies = d
        .dependencies
        .iter()
        .map(|dep| {
            let entry = ConfigTable::new().with("scope", dep.scope.as_str());
            let entry = match &dep.notation {
                DependencyNotation::Module { coordinate } => entry
                    .with("type", "module")
                    .with("coordinate", coordinate.to_string()),
                DependencyNotation::Platform { coordinate } => entry
                    .with("type", "platform")
                    .with("coordinate", coordinate.to_string()),
                DependencyNotation::Project { path } => {
                    entry.with("type", "project").with("path", path.as_str())
                }
            };
            entry.into()
        })
        .collect::<Vec<ConfigValue>>();
    root.insert("dependencies", dependencies);

    NormalizedConfig { root }
}
