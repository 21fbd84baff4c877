//! Kotlin DSL rendering of a [`NormalizedConfig`]
//!
//! The output parses back into a descriptor that emits the same record, so
//! `emit -> to_gradle_kts -> parse -> emit` is a fixed point.

use crate::emit::{ConfigTable, ConfigValue, NormalizedConfig};
use once_cell::sync::Lazy;
use regex::Regex;

/// Values that can be written as a `JavaVersion.VERSION_x` constant
static JAVA_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)*$").expect("valid regex"));

const INDENT: &str = "    ";

struct KtsWriter {
    out: String,
    depth: usize,
}

impl KtsWriter {
    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with("{\n") && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    fn open(&mut self, header: &str) {
        self.line(&format!("{} {{", header));
        self.depth += 1;
    }

    fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.line("}");
    }

    fn assign(&mut self, key: &str, value: &ConfigValue) {
        if let Some(literal) = literal(value) {
            self.line(&format!("{} = {}", key, literal));
        }
    }
}

/// Kotlin string literal
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '$' => out.push_str("\\$"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn literal(value: &ConfigValue) -> Option<String> {
    match value {
        ConfigValue::Bool(b) => Some(b.to_string()),
        ConfigValue::Int(n) => Some(n.to_string()),
        ConfigValue::Str(s) => Some(quote(s)),
        ConfigValue::List(_) | ConfigValue::Table(_) => None,
    }
}

fn java_version(value: &str) -> String {
    if JAVA_VERSION.is_match(value) {
        format!("JavaVersion.VERSION_{}", value.replace('.', "_"))
    } else {
        quote(value)
    }
}

fn table<'a>(parent: &'a ConfigTable, key: &str) -> Option<&'a ConfigTable> {
    parent.get(key).and_then(ConfigValue::as_table)
}

fn list<'a>(parent: &'a ConfigTable, key: &str) -> &'a [ConfigValue] {
    parent.get(key).and_then(ConfigValue::as_list).unwrap_or_default()
}

fn text<'a>(parent: &'a ConfigTable, key: &str) -> Option<&'a str> {
    parent.get(key).and_then(ConfigValue::as_str)
}

impl NormalizedConfig {
    /// Render as `build.gradle.kts` text
    pub fn to_gradle_kts(&self) -> String {
        let root = self.root();
        let mut w = KtsWriter {
            out: String::new(),
            depth: 0,
        };

        w.open("plugins");
        for plugin in list(root, "plugins").iter().filter_map(ConfigValue::as_table) {
            let Some(id) = text(plugin, "id") else { continue };
            let enabled = plugin.get("enabled").and_then(ConfigValue::as_bool).unwrap_or(true);
            let call = format!("id({})", quote(id));
            if enabled {
                w.line(&call);
            } else {
                w.line(&format!("// {}", call));
            }
        }
        w.close();

        if let Some(android) = table(root, "android") {
            w.blank();
            render_android(&mut w, android);
        }

        if let Some(flutter) = table(root, "flutter") {
            w.blank();
            w.open("flutter");
            if let Some(source) = flutter.get("source") {
                w.assign("source", source);
            }
            w.close();
        }

        let dependencies = list(root, "dependencies");
        if !dependencies.is_empty() {
            w.blank();
            w.open("dependencies");
            for dep in dependencies.iter().filter_map(ConfigValue::as_table) {
                let Some(scope) = text(dep, "scope") else { continue };
                let notation = match text(dep, "type") {
                    Some("platform") => text(dep, "coordinate").map(|c| format!("platform({})", quote(c))),
                    Some("project") => text(dep, "path").map(|p| format!("project({})", quote(p))),
                    _ => text(dep, "coordinate").map(quote),
                };
                if let Some(notation) = notation {
                    w.line(&format!("{}({})", scope, notation));
                }
            }
            w.close();
        }

        w.out
    }
}

fn render_android(w: &mut KtsWriter, android: &ConfigTable) {
    w.open("android");
    for key in ["namespace", "compileSdk", "ndkVersion"] {
        if let Some(value) = android.get(key) {
            w.assign(key, value);
        }
    }

    if let Some(options) = table(android, "compileOptions") {
        w.blank();
        w.open("compileOptions");
        for (key, value) in options.iter() {
            if let Some(version) = value.as_str() {
                w.line(&format!("{} = {}", key, java_version(version)));
            }
        }
        w.close();
    }

    if let Some(jvm_target) = table(android, "kotlinOptions").and_then(|k| text(k, "jvmTarget")) {
        w.blank();
        w.open("kotlinOptions");
        w.line(&format!("jvmTarget = {}", quote(jvm_target)));
        w.close();
    }

    if let Some(default_config) = table(android, "defaultConfig") {
        w.blank();
        w.open("defaultConfig");
        for (key, value) in default_config.iter() {
            w.assign(key, value);
        }
        w.close();
    }

    let signing_configs = list(android, "signingConfigs");
    if !signing_configs.is_empty() {
        w.blank();
        w.open("signingConfigs");
        for name in signing_configs.iter().filter_map(ConfigValue::as_str) {
            w.open(&format!("create({})", quote(name)));
            w.close();
        }
        w.close();
    }

    if let Some(build_types) = table(android, "buildTypes") {
        w.blank();
        w.open("buildTypes");
        for (name, options) in build_types.iter() {
            let Some(options) = options.as_table() else { continue };
            w.open(&format!("getByName({})", quote(name)));
            match text(options, "signingConfig") {
                Some(signing) => {
                    w.line(&format!("signingConfig = signingConfigs.getByName({})", quote(signing)));
                }
                None => w.line("signingConfig = null"),
            }
            if let Some(minify) = options.get("minifyEnabled") {
                w.assign("isMinifyEnabled", minify);
            }
            if let Some(shrink) = options.get("shrinkResources") {
                w.assign("isShrinkResources", shrink);
            }
            w.close();
        }
        w.close();
    }
    w.close();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::BuildDescriptor;
    use crate::emit::emit;
    use crate::resolve::resolve_versions;
    use crate::version_source::MapVersionSource;

    fn pipeline(text: &str, source: &MapVersionSource) -> NormalizedConfig {
        let descriptor = BuildDescriptor::parse(text).unwrap();
        emit(&resolve_versions(descriptor, source).unwrap())
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote(r#"a"b\c$d"#), r#""a\"b\\c\$d""#);
    }

    #[test]
    fn test_java_version_constant() {
        assert_eq!(java_version("1.8"), "JavaVersion.VERSION_1_8");
        assert_eq!(java_version("17"), "JavaVersion.VERSION_17");
        assert_eq!(java_version("HIGHER"), "\"HIGHER\"");
    }

    #[test]
    fn test_render_layout() {
        let config = pipeline(
            r#"plugins {
                id("com.android.application")
                // id("com.google.gms.google-services")
            }
            android {
                namespace = "com.example.app"
                defaultConfig {
                    minSdk = 21
                }
            }"#,
            &MapVersionSource::new(),
        );
        let kts = config.to_gradle_kts();
        let expected = r#"plugins {
    id("com.android.application")
    // id("com.google.gms.google-services")
}

android {
    namespace = "com.example.app"

    defaultConfig {
        minSdk = 21
    }

    buildTypes {
        getByName("release") {
            signingConfig = signingConfigs.getByName("debug")
        }
    }
}
"#;
        assert_eq!(kts, expected);
    }

    #[test]
    fn test_unsigned_release_survives_rendering() {
        let text = "android {\n buildTypes {\n  release {\n   signingConfig = null\n  }\n }\n}";
        let first = pipeline(text, &MapVersionSource::new());
        let kts = first.to_gradle_kts();
        assert!(kts.contains("signingConfig = null"), "{}", kts);
        assert_eq!(pipeline(&kts, &MapVersionSource::new()), first);
    }

    #[test]
    fn test_render_is_a_fixed_point() {
        let text = r#"plugins {
            id("com.android.application")
            kotlin("android")
        }
        android {
            namespace = "com.example.app"
            compileSdk = flutter.compileSdkVersion
            compileOptions {
                sourceCompatibility = JavaVersion.VERSION_1_8
                targetCompatibility = JavaVersion.VERSION_1_8
            }
            kotlinOptions {
                jvmTarget = JavaVersion.VERSION_1_8.toString()
            }
            defaultConfig {
                versionName = "1.0 \"beta\""
                multiDexEnabled = true
            }
            signingConfigs {
                create("upload") {
                    storePassword = System.getenv("PASSWORD")
                }
            }
            buildTypes {
                debug {
                }
                release {
                    signingConfig = signingConfigs.getByName("upload")
                    isMinifyEnabled = true
                }
            }
        }
        flutter {
            source = "../.."
        }
        dependencies {
            implementation(enforcedPlatform("com.google.firebase:firebase-bom:34.4.0"))
            implementation("com.google.firebase:firebase-auth") // Auth
            implementation(project(":core"))
        }"#;
        let source = MapVersionSource::new().with("compileSdkVersion", 35);
        let first = pipeline(text, &source);
        let second = pipeline(&first.to_gradle_kts(), &MapVersionSource::new());
        assert_eq!(first, second);
    }
}
