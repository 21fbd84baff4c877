//! Typed build descriptor extracted from the node tree

use crate::ast::{Expr, Node};
use crate::coordinate::Coordinate;
use crate::error::ParseError;
use crate::parser::parse_nodes;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

/// Commented-out plugin declaration, e.g. `// id("com.google.gms.google-services")`
static DISABLED_PLUGIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^id\s*\(?\s*["']([^"']+)["']\s*\)?$"#).expect("valid regex")
});

pub const ANDROID_APPLICATION_PLUGIN: &str = "com.android.application";
pub const FLUTTER_PLUGIN: &str = "dev.flutter.flutter-gradle-plugin";
pub const KOTLIN_PLUGIN_IDS: &[&str] = &["kotlin-android", "org.jetbrains.kotlin.android"];

/// Dependency configurations the Android Gradle plugin defines
pub const KNOWN_SCOPES: &[&str] = &[
    "implementation",
    "api",
    "compileOnly",
    "runtimeOnly",
    "testImplementation",
    "androidTestImplementation",
    "debugImplementation",
    "releaseImplementation",
    "kapt",
    "ksp",
    "annotationProcessor",
    "coreLibraryDesugaring",
];

/// Configurations whose classpath a platform in `implementation` or `api` does not reach
const PROCESSOR_SCOPES: &[&str] = &["kapt", "ksp", "annotationProcessor", "coreLibraryDesugaring"];

/// A version value that may still need resolving
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum VersionRef {
    Int(i64),
    Text(String),
    /// Named reference, e.g. `flutter.minSdkVersion`
    Symbol(String),
}

impl VersionRef {
    pub fn symbol(&self) -> Option<&str> {
        match self {
            VersionRef::Symbol(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginEntry {
    pub id: String,
    pub enabled: bool,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DependencyNotation {
    Module { coordinate: Coordinate },
    /// `platform(...)` / `enforcedPlatform(...)` bill of materials
    Platform { coordinate: Coordinate },
    Project { path: String },
}

impl DependencyNotation {
    pub fn coordinate(&self) -> Option<&Coordinate> {
        match self {
            Self::Module { coordinate } | Self::Platform { coordinate } => Some(coordinate),
            Self::Project { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyDeclaration {
    pub scope: String,
    pub notation: DependencyNotation,
    /// Trailing comment; never used for resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JavaOptions {
    pub source_compatibility: Option<String>,
    pub target_compatibility: Option<String>,
    pub jvm_target: Option<String>,
}

impl JavaOptions {
    pub fn is_empty(&self) -> bool {
        self.source_compatibility.is_none()
            && self.target_compatibility.is_none()
            && self.jvm_target.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildType {
    pub name: String,
    /// Signing-config name referenced by this build type
    pub signing_config: Option<String>,
    /// `signingConfig = null`
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub unsigned: bool,
    pub minify_enabled: Option<bool>,
    pub shrink_resources: Option<bool>,
    pub line: usize,
}

impl BuildType {
    fn new(name: String, line: usize) -> Self {
        Self {
            name,
            signing_config: None,
            unsigned: false,
            minify_enabled: None,
            shrink_resources: None,
            line,
        }
    }
}

/// A key or block the descriptor model does not know about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unrecognized {
    pub path: String,
    pub line: usize,
}

/// The whole build descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildDescriptor {
    pub plugins: Vec<PluginEntry>,
    pub namespace: Option<String>,
    pub compile_sdk: Option<VersionRef>,
    pub ndk_version: Option<VersionRef>,
    pub java: JavaOptions,
    pub application_id: Option<String>,
    pub min_sdk: Option<VersionRef>,
    pub target_sdk: Option<VersionRef>,
    pub version_code: Option<VersionRef>,
    pub version_name: Option<VersionRef>,
    pub multi_dex_enabled: Option<bool>,
    /// Signing configs declared in `signingConfigs { }`, names only
    pub signing_configs: Vec<String>,
    pub build_types: Vec<BuildType>,
    pub flutter_source: Option<String>,
    pub dependencies: Vec<DependencyDeclaration>,
    pub unrecognized: Vec<Unrecognized>,
}

impl BuildDescriptor {
    /// Parse descriptor text
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let nodes = parse_nodes(text)?;
        let mut descriptor = Self::default();
        Extractor {
            descriptor: &mut descriptor,
        }
        .root(&nodes)?;
        Ok(descriptor)
    }

    /// Enabled plugins in declaration order
    pub fn enabled_plugins(&self) -> impl Iterator<Item = &PluginEntry> {
        self.plugins.iter().filter(|p| p.enabled)
    }

    pub fn build_type(&self, name: &str) -> Option<&BuildType> {
        self.build_types.iter().find(|b| b.name == name)
    }

    /// Whether a platform/BoM declared in some configuration manages versions in `scope`
    ///
    /// A platform applies to its own configuration. One in `implementation`
    /// or `api` also reaches the other compile and runtime configurations,
    /// but not annotation processors or desugaring.
    pub fn has_platform_for(&self, scope: &str) -> bool {
        self.dependencies.iter().any(|d| {
            matches!(d.notation, DependencyNotation::Platform { .. })
                && (d.scope == scope
                    || (matches!(d.scope.as_str(), "implementation" | "api")
                        && !PROCESSOR_SCOPES.contains(&scope)))
        })
    }
}

/// A key/value setting: an assignment or a single-argument Groovy-style call
struct Setting<'n> {
    key: &'n str,
    value: &'n Expr,
    line: usize,
}

fn as_setting(node: &Node) -> Option<Setting<'_>> {
    match node {
        Node::Assign { key, value, line } => Some(Setting {
            key,
            value,
            line: *line,
        }),
        Node::Call {
            name, args, line, ..
        } if args.len() == 1 => Some(Setting {
            key: name,
            value: &args[0],
            line: *line,
        }),
        _ => None,
    }
}

/// First line each field was set on within one block
///
/// Aliases such as `minSdk`/`minSdkVersion` claim the same field.
struct Claims {
    block: String,
    lines: HashMap<&'static str, usize>,
}

impl Claims {
    fn new(block: impl Into<String>) -> Self {
        Self {
            block: block.into(),
            lines: HashMap::new(),
        }
    }

    fn claim(&mut self, field: &'static str, setting: &Setting<'_>) -> Result<(), ParseError> {
        match self.lines.get(field) {
            Some(&first) => Err(ParseError::DuplicateKey {
                line: setting.line,
                block: self.block.clone(),
                key: setting.key.to_string(),
                first,
            }),
            None => {
                self.lines.insert(field, setting.line);
                Ok(())
            }
        }
    }
}

/// Unrecognized-path label for a statement the model does not read
fn statement_path(block: &str, node: &Node) -> String {
    match node {
        Node::Script { .. } => format!("{}.<script>", block),
        _ => format!("{}.<statement>", block),
    }
}

struct Extractor<'d> {
    descriptor: &'d mut BuildDescriptor,
}

impl Extractor<'_> {
    fn unrecognized(&mut self, path: String, line: usize) {
        self.descriptor.unrecognized.push(Unrecognized { path, line });
    }

    fn root(&mut self, nodes: &[Node]) -> Result<(), ParseError> {
        for node in nodes {
            match node {
                Node::Block { name, body, .. } => match name.as_str() {
                    "plugins" => self.plugins(body),
                    "android" => self.android(body)?,
                    "flutter" => self.flutter(body)?,
                    "dependencies" => self.dependencies(body)?,
                    other => self.unrecognized(other.to_string(), node.line()),
                },
                Node::Comment { .. } => {}
                Node::Assign { key, line, .. } => self.unrecognized(key.clone(), *line),
                Node::Call { name, line, .. } => self.unrecognized(name.clone(), *line),
                Node::Script { line, .. } => self.unrecognized("<script>".to_string(), *line),
            }
        }
        Ok(())
    }

    fn plugins(&mut self, body: &[Node]) {
        for node in body {
            match node {
                Node::Call { name, args, line, .. } => {
                    let id = match (name.as_str(), args.first()) {
                        ("id", Some(Expr::Str(id))) => Some(id.clone()),
                        ("kotlin", Some(Expr::Str(module))) => {
                            Some(format!("org.jetbrains.kotlin.{}", module))
                        }
                        _ => None,
                    };
                    match id {
                        Some(id) => self.descriptor.plugins.push(PluginEntry {
                            id,
                            enabled: true,
                            line: *line,
                        }),
                        None => self.unrecognized(format!("plugins.{}", name), *line),
                    }
                }
                Node::Comment { text, line } => {
                    for comment_line in text.lines() {
                        if let Some(cap) = DISABLED_PLUGIN.captures(comment_line.trim()) {
                            self.descriptor.plugins.push(PluginEntry {
                                id: cap[1].to_string(),
                                enabled: false,
                                line: *line,
                            });
                        }
                    }
                }
                other => self.unrecognized(statement_path("plugins", other), other.line()),
            }
        }
    }

    fn android(&mut self, body: &[Node]) -> Result<(), ParseError> {
        const BLOCK: &str = "android";
        let mut claims = Claims::new(BLOCK);
        for node in body {
            if let Node::Block { name, body, .. } = node {
                match name.as_str() {
                    "defaultConfig" => self.default_config(body)?,
                    "compileOptions" => self.compile_options(body)?,
                    "kotlinOptions" => self.kotlin_options(body)?,
                    "buildTypes" => self.build_types(body)?,
                    "signingConfigs" => self.signing_configs(body)?,
                    other => self.unrecognized(format!("{}.{}", BLOCK, other), node.line()),
                }
                continue;
            }
            let Some(setting) = as_setting(node) else {
                if !matches!(node, Node::Comment { .. }) {
                    self.unrecognized(statement_path(BLOCK, node), node.line());
                }
                continue;
            };
            let d = &mut *self.descriptor;
            match setting.key {
                "namespace" => {
                    claims.claim("namespace", &setting)?;
                    d.namespace = Some(string_value(BLOCK, &setting)?);
                }
                "compileSdk" | "compileSdkVersion" => {
                    claims.claim("compileSdk", &setting)?;
                    d.compile_sdk = Some(int_ref(BLOCK, &setting)?);
                }
                "ndkVersion" => {
                    claims.claim("ndkVersion", &setting)?;
                    d.ndk_version = Some(text_ref(BLOCK, &setting)?);
                }
                other => {
                    let path = format!("{}.{}", BLOCK, other);
                    self.unrecognized(path, setting.line);
                }
            }
        }
        Ok(())
    }

    fn default_config(&mut self, body: &[Node]) -> Result<(), ParseError> {
        const BLOCK: &str = "android.defaultConfig";
        let mut claims = Claims::new(BLOCK);
        for setting in self.settings(BLOCK, body) {
            let d = &mut *self.descriptor;
            match setting.key {
                "applicationId" => {
                    claims.claim("applicationId", &setting)?;
                    d.application_id = Some(string_value(BLOCK, &setting)?);
                }
                "minSdk" | "minSdkVersion" => {
                    claims.claim("minSdk", &setting)?;
                    d.min_sdk = Some(int_ref(BLOCK, &setting)?);
                }
                "targetSdk" | "targetSdkVersion" => {
                    claims.claim("targetSdk", &setting)?;
                    d.target_sdk = Some(int_ref(BLOCK, &setting)?);
                }
                "versionCode" => {
                    claims.claim("versionCode", &setting)?;
                    d.version_code = Some(int_ref(BLOCK, &setting)?);
                }
                "versionName" => {
                    claims.claim("versionName", &setting)?;
                    d.version_name = Some(text_ref(BLOCK, &setting)?);
                }
                "multiDexEnabled" => {
                    claims.claim("multiDexEnabled", &setting)?;
                    d.multi_dex_enabled = Some(bool_value(BLOCK, &setting)?);
                }
                other => self.unrecognized(format!("{}.{}", BLOCK, other), setting.line),
            }
        }
        Ok(())
    }

    fn compile_options(&mut self, body: &[Node]) -> Result<(), ParseError> {
        const BLOCK: &str = "android.compileOptions";
        let mut claims = Claims::new(BLOCK);
        for setting in self.settings(BLOCK, body) {
            let java = &mut self.descriptor.java;
            match setting.key {
                "sourceCompatibility" => {
                    claims.claim("sourceCompatibility", &setting)?;
                    java.source_compatibility = Some(java_version(BLOCK, &setting)?);
                }
                "targetCompatibility" => {
                    claims.claim("targetCompatibility", &setting)?;
                    java.target_compatibility = Some(java_version(BLOCK, &setting)?);
                }
                other => self.unrecognized(format!("{}.{}", BLOCK, other), setting.line),
            }
        }
        Ok(())
    }

    fn kotlin_options(&mut self, body: &[Node]) -> Result<(), ParseError> {
        const BLOCK: &str = "android.kotlinOptions";
        let mut claims = Claims::new(BLOCK);
        for setting in self.settings(BLOCK, body) {
            match setting.key {
                "jvmTarget" => {
                    claims.claim("jvmTarget", &setting)?;
                    self.descriptor.java.jvm_target = Some(java_version(BLOCK, &setting)?);
                }
                other => self.unrecognized(format!("{}.{}", BLOCK, other), setting.line),
            }
        }
        Ok(())
    }

    fn build_types(&mut self, body: &[Node]) -> Result<(), ParseError> {
        const BLOCK: &str = "android.buildTypes";
        for node in body {
            let Some((name, inner, line)) = named_block(node) else {
                if !matches!(node, Node::Comment { .. }) {
                    self.unrecognized(statement_path(BLOCK, node), node.line());
                }
                continue;
            };

            let block = format!("{}.{}", BLOCK, name);
            let mut claims = Claims::new(block.as_str());
            let mut build_type = BuildType::new(name, line);
            for setting in self.settings(&block, inner) {
                match setting.key {
                    "signingConfig" => {
                        claims.claim("signingConfig", &setting)?;
                        build_type.signing_config = signing_ref(&block, &setting)?;
                        build_type.unsigned = build_type.signing_config.is_none();
                    }
                    "isMinifyEnabled" | "minifyEnabled" => {
                        claims.claim("minifyEnabled", &setting)?;
                        build_type.minify_enabled = Some(bool_value(&block, &setting)?);
                    }
                    "isShrinkResources" | "shrinkResources" => {
                        claims.claim("shrinkResources", &setting)?;
                        build_type.shrink_resources = Some(bool_value(&block, &setting)?);
                    }
                    other => self.unrecognized(format!("{}.{}", block, other), setting.line),
                }
            }

            // Repeated blocks for the same build type configure the same object
            let types = &mut self.descriptor.build_types;
            match types.iter_mut().find(|b| b.name == build_type.name) {
                Some(existing) => {
                    if build_type.signing_config.is_some() || build_type.unsigned {
                        existing.signing_config = build_type.signing_config;
                        existing.unsigned = build_type.unsigned;
                    }
                    existing.minify_enabled = build_type.minify_enabled.or(existing.minify_enabled);
                    existing.shrink_resources =
                        build_type.shrink_resources.or(existing.shrink_resources);
                }
                None => types.push(build_type),
            }
        }
        Ok(())
    }

    fn signing_configs(&mut self, body: &[Node]) -> Result<(), ParseError> {
        for node in body {
            // Credentials inside the block are deliberately not read.
            if let Some((name, _, _)) = named_block(node) {
                if !self.descriptor.signing_configs.contains(&name) {
                    self.descriptor.signing_configs.push(name);
                }
            } else if !matches!(node, Node::Comment { .. }) {
                self.unrecognized(statement_path("android.signingConfigs", node), node.line());
            }
        }
        Ok(())
    }

    fn flutter(&mut self, body: &[Node]) -> Result<(), ParseError> {
        const BLOCK: &str = "flutter";
        let mut claims = Claims::new(BLOCK);
        for setting in self.settings(BLOCK, body) {
            match setting.key {
                "source" => {
                    claims.claim("source", &setting)?;
                    self.descriptor.flutter_source = Some(string_value(BLOCK, &setting)?);
                }
                other => self.unrecognized(format!("{}.{}", BLOCK, other), setting.line),
            }
        }
        Ok(())
    }

    fn dependencies(&mut self, body: &[Node]) -> Result<(), ParseError> {
        const BLOCK: &str = "dependencies";
        for node in body {
            let (scope, args, annotation, line) = match node {
                Node::Call {
                    name,
                    args,
                    annotation,
                    line,
                } => (name, args, annotation.clone(), *line),
                // `implementation("...") { exclude(...) }`
                Node::Block {
                    name, args, line, ..
                } if !args.is_empty() => (name, args, None, *line),
                Node::Comment { .. } => continue,
                other => {
                    self.unrecognized(statement_path(BLOCK, other), other.line());
                    continue;
                }
            };

            let [arg] = args.as_slice() else {
                return Err(invalid(BLOCK, scope, line, "expected exactly one dependency notation"));
            };
            let notation = dependency_notation(BLOCK, scope, arg, line)?;
            self.descriptor.dependencies.push(DependencyDeclaration {
                scope: scope.clone(),
                notation,
                annotation,
                line,
            });
        }
        Ok(())
    }

    /// Settings of a leaf block; nested blocks are recorded as unrecognized
    fn settings<'n>(&mut self, block: &str, body: &'n [Node]) -> Vec<Setting<'n>> {
        let mut settings = Vec::new();
        for node in body {
            match as_setting(node) {
                Some(setting) => settings.push(setting),
                None => match node {
                    Node::Comment { .. } => {}
                    Node::Block { name, line, .. } => {
                        self.unrecognized(format!("{}.{}", block, name), *line);
                    }
                    other => self.unrecognized(statement_path(block, other), other.line()),
                },
            }
        }
        settings
    }
}

/// `name { }`, `create("name") { }` or `getByName("name") { }`
fn named_block(node: &Node) -> Option<(String, &[Node], usize)> {
    match node {
        Node::Block {
            name,
            args,
            body,
            line,
        } => match (name.as_str(), args.as_slice()) {
            ("create" | "getByName" | "register" | "maybeCreate", [Expr::Str(n)]) => {
                Some((n.clone(), body.as_slice(), *line))
            }
            (_, []) => Some((name.clone(), body.as_slice(), *line)),
            _ => None,
        },
        _ => None,
    }
}

fn invalid(block: &str, key: &str, line: usize, reason: impl Into<String>) -> ParseError {
    ParseError::InvalidValue {
        line,
        block: block.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn string_value(block: &str, setting: &Setting<'_>) -> Result<String, ParseError> {
    match setting.value {
        Expr::Str(s) => Ok(s.clone()),
        other => Err(invalid(
            block,
            setting.key,
            setting.line,
            format!("expected a string, found {}", other.kind()),
        )),
    }
}

fn bool_value(block: &str, setting: &Setting<'_>) -> Result<bool, ParseError> {
    match setting.value {
        Expr::Bool(b) => Ok(*b),
        other => Err(invalid(
            block,
            setting.key,
            setting.line,
            format!("expected true or false, found {}", other.kind()),
        )),
    }
}

/// Integer field: literal, numeric string, or symbolic reference
fn int_ref(block: &str, setting: &Setting<'_>) -> Result<VersionRef, ParseError> {
    match setting.value {
        Expr::Int(n) => Ok(VersionRef::Int(*n)),
        Expr::Str(s) if s.trim().is_empty() => {
            Err(invalid(block, setting.key, setting.line, "empty value"))
        }
        Expr::Str(s) => {
            let text = s.trim();
            match text.parse::<i64>() {
                Ok(n) => Ok(VersionRef::Int(n)),
                Err(_) if is_decimal(text) => {
                    Err(invalid(block, setting.key, setting.line, format!("integer `{}` is out of range", text)))
                }
                Err(_) => Ok(VersionRef::Symbol(text.to_string())),
            }
        }
        Expr::Path(path) => Ok(VersionRef::Symbol(path.join("."))),
        other => Err(invalid(
            block,
            setting.key,
            setting.line,
            format!("expected an integer or a version reference, found {}", other.kind()),
        )),
    }
}

fn is_decimal(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Text field: literal string or symbolic reference
fn text_ref(block: &str, setting: &Setting<'_>) -> Result<VersionRef, ParseError> {
    match setting.value {
        Expr::Str(s) => Ok(VersionRef::Text(s.clone())),
        Expr::Path(path) => Ok(VersionRef::Symbol(path.join("."))),
        other => Err(invalid(
            block,
            setting.key,
            setting.line,
            format!("expected a string or a version reference, found {}", other.kind()),
        )),
    }
}

/// `JavaVersion.VERSION_11`, `JavaVersion.VERSION_1_8.toString()` or `"11"`
fn java_version(block: &str, setting: &Setting<'_>) -> Result<String, ParseError> {
    let constant: &[String] = match setting.value {
        Expr::Str(s) => return Ok(s.clone()),
        Expr::Path(path) => path.as_slice(),
        Expr::Call { callee, args } if args.is_empty() && callee.last().is_some_and(|c| c == "toString") => {
            &callee[..callee.len() - 1]
        }
        _ => &[],
    };
    match constant {
        [class, name] if class == "JavaVersion" => match name.strip_prefix("VERSION_") {
            Some(version) => Ok(version.replace('_', ".")),
            None => Err(invalid(block, setting.key, setting.line, format!("unknown constant `{}`", name))),
        },
        _ => Err(invalid(
            block,
            setting.key,
            setting.line,
            format!("expected a JavaVersion constant, found `{}`", setting.value),
        )),
    }
}

/// `signingConfigs.getByName("x")` or Groovy `signingConfigs.x`
fn signing_ref(block: &str, setting: &Setting<'_>) -> Result<Option<String>, ParseError> {
    match setting.value {
        Expr::Call { callee, args } => match (callee.as_slice(), args.as_slice()) {
            ([configs, method], [Expr::Str(name)])
                if configs == "signingConfigs" && (method == "getByName" || method == "named") =>
            {
                Ok(Some(name.clone()))
            }
            _ => Err(invalid(block, setting.key, setting.line, format!("unsupported reference `{}`", setting.value))),
        },
        // Groovy: signingConfig signingConfigs.debug
        Expr::Path(path) => match path.as_slice() {
            [single] if single == "null" => Ok(None),
            [configs, name] if configs == "signingConfigs" => Ok(Some(name.clone())),
            _ => Err(invalid(block, setting.key, setting.line, format!("unsupported reference `{}`", setting.value))),
        },
        other => Err(invalid(
            block,
            setting.key,
            setting.line,
            format!("expected a signing-config reference, found {}", other.kind()),
        )),
    }
}

fn dependency_notation(
    block: &str,
    scope: &str,
    arg: &Expr,
    line: usize,
) -> Result<DependencyNotation, ParseError> {
    let coordinate = |text: &str| {
        Coordinate::parse(text).map_err(|e| ParseError::MalformedCoordinate {
            line,
            block: block.to_string(),
            coordinate: text.to_string(),
            reason: e.to_string(),
        })
    };

    if let Expr::Str(text) = arg {
        return Ok(DependencyNotation::Module {
            coordinate: coordinate(text)?,
        });
    }
    for callee in ["platform", "enforcedPlatform"] {
        if let Some(inner) = arg.call_arg(&[callee]) {
            return match inner {
                Expr::Str(text) => Ok(DependencyNotation::Platform {
                    coordinate: coordinate(text)?,
                }),
                other => Err(invalid(block, scope, line, format!("expected a coordinate string, found {}", other.kind()))),
            };
        }
    }
    if let Some(inner) = arg.call_arg(&["project"]) {
        return match inner {
            Expr::Str(path) if !path.is_empty() => Ok(DependencyNotation::Project { path: path.clone() }),
            _ => Err(invalid(block, scope, line, "expected a project path such as \":core\"")),
        };
    }
    Err(invalid(block, scope, line, format!("unsupported dependency notation `{}`", arg)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugins_with_disabled_entry() {
        let d = BuildDescriptor::parse(
            r#"plugins {
                id("com.android.application")
                kotlin("android")
                // id("com.google.gms.google-services")
                // Add the Google services Gradle plugin
            }"#,
        )
        .unwrap();
        let ids: Vec<(&str, bool)> = d.plugins.iter().map(|p| (p.id.as_str(), p.enabled)).collect();
        assert_eq!(
            ids,
            vec![
                ("com.android.application", true),
                ("org.jetbrains.kotlin.android", true),
                ("com.google.gms.google-services", false),
            ]
        );
    }

    #[test]
    fn test_symbolic_and_literal_versions() {
        let d = BuildDescriptor::parse(
            r#"android {
                compileSdk = 35
                ndkVersion = flutter.ndkVersion
                defaultConfig {
                    minSdk = "flutter.minSdkVersion"
                    targetSdk = "34"
                    versionName = "1.2.3"
                    versionCode = flutter.versionCode
                }
            }"#,
        )
        .unwrap();
        assert_eq!(d.compile_sdk, Some(VersionRef::Int(35)));
        assert_eq!(d.ndk_version, Some(VersionRef::Symbol("flutter.ndkVersion".into())));
        assert_eq!(d.min_sdk, Some(VersionRef::Symbol("flutter.minSdkVersion".into())));
        assert_eq!(d.target_sdk, Some(VersionRef::Int(34)));
        assert_eq!(d.version_name, Some(VersionRef::Text("1.2.3".into())));
        assert_eq!(d.version_code, Some(VersionRef::Symbol("flutter.versionCode".into())));
    }

    #[test]
    fn test_java_options() {
        let d = BuildDescriptor::parse(
            r#"android {
                compileOptions {
                    sourceCompatibility = JavaVersion.VERSION_1_8
                    targetCompatibility = JavaVersion.VERSION_11
                }
                kotlinOptions {
                    jvmTarget = JavaVersion.VERSION_11.toString()
                }
            }"#,
        )
        .unwrap();
        assert_eq!(d.java.source_compatibility.as_deref(), Some("1.8"));
        assert_eq!(d.java.target_compatibility.as_deref(), Some("11"));
        assert_eq!(d.java.jvm_target.as_deref(), Some("11"));
    }

    #[test]
    fn test_build_types_and_signing() {
        let d = BuildDescriptor::parse(
            r#"android {
                signingConfigs {
                    create("upload") {
                        storeFile = file("upload.jks")
                    }
                }
                buildTypes {
                    release {
                        signingConfig = signingConfigs.getByName("debug")
                        isMinifyEnabled = true
                    }
                    getByName("profile") {
                        signingConfig = signingConfigs.getByName("upload")
                    }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(d.signing_configs, vec!["upload".to_string()]);
        let release = d.build_type("release").unwrap();
        assert_eq!(release.signing_config.as_deref(), Some("debug"));
        assert_eq!(release.minify_enabled, Some(true));
        assert_eq!(
            d.build_type("profile").unwrap().signing_config.as_deref(),
            Some("upload")
        );
    }

    #[test]
    fn test_dependencies() {
        let d = BuildDescriptor::parse(
            r#"dependencies {
                implementation(platform("com.google.firebase:firebase-bom:34.4.0"))
                implementation("com.google.firebase:firebase-auth") // login
                testImplementation(project(":shared"))
            }"#,
        )
        .unwrap();
        assert_eq!(d.dependencies.len(), 3);
        assert!(matches!(d.dependencies[0].notation, DependencyNotation::Platform { .. }));
        assert_eq!(d.dependencies[1].annotation.as_deref(), Some("login"));
        assert_eq!(
            d.dependencies[2].notation,
            DependencyNotation::Project { path: ":shared".into() }
        );
        assert!(d.has_platform_for("implementation"));
        assert!(d.has_platform_for("testImplementation"));
    }

    #[test]
    fn test_missing_group_is_parse_error() {
        let err = BuildDescriptor::parse(
            "dependencies {\n    implementation(platform(\"firebase-bom:34.4.0\"))\n}",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedCoordinate { line: 2, ref coordinate, .. } if coordinate == "firebase-bom:34.4.0"
        ));
    }

    #[test]
    fn test_wrong_value_kind() {
        let err = BuildDescriptor::parse("android {\n namespace = 12\n}").unwrap_err();
        assert!(matches!(err, ParseError::InvalidValue { ref key, line: 2, .. } if key == "namespace"));
    }

    #[test]
    fn test_unrecognized_keys_are_kept() {
        let d = BuildDescriptor::parse("repositories {\n}\nandroid {\n lint {\n }\n}").unwrap();
        let paths: Vec<&str> = d.unrecognized.iter().map(|u| u.path.as_str()).collect();
        assert_eq!(paths, vec!["repositories", "android.lint"]);
    }

    #[test]
    fn test_alias_repeats_are_duplicates() {
        let err = BuildDescriptor::parse(
            "android {\n defaultConfig {\n  minSdk = 21\n  minSdkVersion = 23\n }\n}",
        )
        .unwrap_err();
        assert_eq!(
            err,
            ParseError::DuplicateKey {
                line: 4,
                block: "android.defaultConfig".into(),
                key: "minSdkVersion".into(),
                first: 3
            }
        );

        let err = BuildDescriptor::parse("android {\n compileSdkVersion 34\n compileSdk = 35\n}").unwrap_err();
        assert!(matches!(err, ParseError::DuplicateKey { line: 3, first: 2, ref key, .. } if key == "compileSdk"));
    }

    #[test]
    fn test_signing_config_null_marks_unsigned() {
        let d = BuildDescriptor::parse(
            "android {\n buildTypes {\n  release {\n   signingConfig = null\n  }\n  release {\n   isMinifyEnabled = true\n  }\n }\n}",
        )
        .unwrap();
        let release = d.build_type("release").unwrap();
        assert!(release.unsigned);
        assert_eq!(release.signing_config, None);
        assert_eq!(release.minify_enabled, Some(true));
    }

    #[test]
    fn test_out_of_range_numeric_string() {
        let err = BuildDescriptor::parse(
            "android {\n defaultConfig {\n  versionCode = \"99999999999999999999\"\n }\n}",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidValue { line: 3, ref key, ref reason, .. }
                if key == "versionCode" && reason.contains("out of range")
        ));
    }

    #[test]
    fn test_platform_scope() {
        let d = BuildDescriptor::parse(
            r#"dependencies {
                kapt(platform("com.example:processors-bom:1.0"))
                implementation(platform("com.google.firebase:firebase-bom:34.4.0"))
            }"#,
        )
        .unwrap();
        assert!(d.has_platform_for("kapt"));
        assert!(d.has_platform_for("debugImplementation"));
        assert!(!d.has_platform_for("ksp"));
        assert!(!d.has_platform_for("coreLibraryDesugaring"));
    }

    #[test]
    fn test_scripts_are_unrecognized() {
        let d = BuildDescriptor::parse(
            "import java.util.Properties\nandroid {\n val flavor = \"full\"\n namespace = \"com.example.app\"\n}",
        )
        .unwrap();
        let paths: Vec<(&str, usize)> = d.unrecognized.iter().map(|u| (u.path.as_str(), u.line)).collect();
        assert_eq!(paths, vec![("<script>", 1), ("android.<script>", 3)]);
        assert_eq!(d.namespace.as_deref(), Some("com.example.app"));
    }

    #[test]
    fn test_groovy_settings() {
        let d = BuildDescriptor::parse(
            "android {\n compileSdkVersion 34\n defaultConfig {\n  minSdkVersion 21\n }\n}",
        )
        .unwrap();
        assert_eq!(d.compile_sdk, Some(VersionRef::Int(34)));
        assert_eq!(d.min_sdk, Some(VersionRef::Int(21)));
    }

    #[test]
    fn test_groovy_path_arguments() {
        let d = BuildDescriptor::parse(
            "android {\n defaultConfig {\n  minSdkVersion flutter.minSdkVersion\n }\n buildTypes {\n  release {\n   signingConfig signingConfigs.debug\n  }\n }\n}",
        )
        .unwrap();
        assert_eq!(d.min_sdk, Some(VersionRef::Symbol("flutter.minSdkVersion".into())));
        assert_eq!(d.build_type("release").unwrap().signing_config.as_deref(), Some("debug"));
    }
}
