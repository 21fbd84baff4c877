//! Injected source of symbolic version values
//!
//! The Flutter toolchain normally supplies `flutter.compileSdkVersion`,
//! `flutter.versionCode` and friends through a process-global extension
//! object. Here the mapping is passed in explicitly.

use droidconf_core::error::{Error, ResultExt};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// A concrete value supplied for a symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum VersionValue {
    Int(i64),
    Text(String),
}

impl VersionValue {
    /// Integer view; numeric text is accepted
    pub fn as_int(&self) -> Option<i64> {
        match self {
            VersionValue::Int(n) => Some(*n),
            VersionValue::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            VersionValue::Int(n) => n.to_string(),
            VersionValue::Text(s) => s.clone(),
        }
    }

    /// Interpret a raw properties/CLI value
    ///
    /// Only canonical decimals become integers; `"01"` stays text so a
    /// version name keeps its spelling. Integer fields still accept it
    /// through [`VersionValue::as_int`].
    pub fn parse(raw: &str) -> Self {
        let text = raw.trim();
        match text.parse::<i64>() {
            Ok(n) if n.to_string() == text => VersionValue::Int(n),
            _ => VersionValue::Text(text.to_string()),
        }
    }
}

impl fmt::Display for VersionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionValue::Int(n) => write!(f, "{}", n),
            VersionValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for VersionValue {
    fn from(n: i64) -> Self {
        VersionValue::Int(n)
    }
}

impl From<i32> for VersionValue {
    fn from(n: i32) -> Self {
        VersionValue::Int(i64::from(n))
    }
}

impl From<&str> for VersionValue {
    fn from(s: &str) -> Self {
        VersionValue::Text(s.to_string())
    }
}

/// Maps symbolic names to concrete values
pub trait VersionSource {
    /// Look up a symbol such as `flutter.minSdkVersion`
    fn lookup(&self, symbol: &str) -> Option<VersionValue>;
}

impl<S: VersionSource + ?Sized> VersionSource for &S {
    fn lookup(&self, symbol: &str) -> Option<VersionValue> {
        (**self).lookup(symbol)
    }
}

/// In-memory version source
///
/// Lookups try the full symbol first, then its last segment, so both
/// `{flutter.minSdkVersion: 21}` and `{minSdkVersion: 21}` satisfy
/// `flutter.minSdkVersion`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MapVersionSource {
    values: BTreeMap<String, VersionValue>,
}

impl MapVersionSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, symbol: impl Into<String>, value: impl Into<VersionValue>) -> Self {
        self.insert(symbol, value);
        self
    }

    pub fn insert(&mut self, symbol: impl Into<String>, value: impl Into<VersionValue>) {
        self.values.insert(symbol.into(), value.into());
    }

    /// Add every entry of `other`, overriding existing symbols
    pub fn merge(&mut self, other: MapVersionSource) {
        self.values.extend(other.values);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VersionValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Parse Java-properties text such as `local.properties`
    ///
    /// ```text
    /// flutter.versionCode=3
    /// flutter.versionName=1.0.2
    /// sdk.dir=C\:\\Android\\sdk
    /// ```
    pub fn from_properties(text: &str) -> Self {
        let mut source = Self::new();
        for raw in text.lines() {
            let line = raw.trim_start();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let (key, value) = split_property(line);
            if !key.is_empty() {
                source.insert(key, VersionValue::parse(&value));
            }
        }
        source
    }

    /// Flatten a TOML table; nested tables join keys with `.`
    pub fn from_toml_table(table: &toml::Table) -> droidconf_core::Result<Self> {
        let mut source = Self::new();
        flatten_toml(&mut source, "", table)?;
        Ok(source)
    }

    /// Load from a `.toml` file or a properties file
    pub fn load(path: &Path) -> droidconf_core::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(Error::from)
            .context(format!("While reading version source {}", path.display()))?;

        if path.extension().is_some_and(|ext| ext == "toml") {
            let table: toml::Table = toml::from_str(&content)?;
            Self::from_toml_table(&table).context(format!("In {}", path.display()))
        } else {
            Ok(Self::from_properties(&content))
        }
    }
}

impl VersionSource for MapVersionSource {
    fn lookup(&self, symbol: &str) -> Option<VersionValue> {
        if let Some(value) = self.values.get(symbol) {
            return Some(value.clone());
        }
        let (_, bare) = symbol.rsplit_once('.')?;
        self.values.get(bare).cloned()
    }
}

impl<K: Into<String>, V: Into<VersionValue>> FromIterator<(K, V)> for MapVersionSource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut source = Self::new();
        for (k, v) in iter {
            source.insert(k, v);
        }
        source
    }
}

/// Split `key=value`, `key:value` or `key value`, unescaping backslashes
fn split_property(line: &str) -> (String, String) {
    let mut key = String::new();
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    key.push(escaped);
                }
            }
            '=' | ':' => break,
            c if c.is_whitespace() => {
                // Separator may still follow the whitespace
                let rest: String = chars.collect();
                let rest = rest.trim_start();
                let rest = rest
                    .strip_prefix('=')
                    .or_else(|| rest.strip_prefix(':'))
                    .unwrap_or(rest);
                return (key, unescape(rest.trim_start()));
            }
            c => key.push(c),
        }
    }
    let rest: String = chars.collect();
    (key, unescape(rest.trim_start()))
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn flatten_toml(source: &mut MapVersionSource, prefix: &str, table: &toml::Table) -> droidconf_core::Result<()> {
    for (key, value) in table {
        let symbol = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            toml::Value::Integer(n) => source.insert(symbol, *n),
            toml::Value::String(s) => source.insert(symbol, VersionValue::Text(s.clone())),
            toml::Value::Float(f) => source.insert(symbol, VersionValue::Text(f.to_string())),
            toml::Value::Table(inner) => flatten_toml(source, &symbol, inner)?,
            other => {
                return Err(Error::invalid_config_value(
                    &symbol,
                    format!("expected an integer, string or table, found {}", other.type_str()),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use droidconf_core::ErrorCode;

    #[test]
    fn test_lookup_full_then_bare() {
        let source = MapVersionSource::new()
            .with("flutter.minSdkVersion", 21)
            .with("compileSdkVersion", 35);

        assert_eq!(source.lookup("flutter.minSdkVersion"), Some(VersionValue::Int(21)));
        assert_eq!(source.lookup("flutter.compileSdkVersion"), Some(VersionValue::Int(35)));
        assert_eq!(source.lookup("flutter.targetSdkVersion"), None);
        assert_eq!(source.lookup("minSdkVersion"), None);
    }

    #[test]
    fn test_from_properties() {
        let source = MapVersionSource::from_properties(
            "# generated\nsdk.dir=C\\:\\\\Android\\\\sdk\nflutter.versionCode=3\nflutter.versionName = 1.0.2\n\n! also a comment\n",
        );
        assert_eq!(source.len(), 3);
        assert_eq!(source.lookup("flutter.versionCode"), Some(VersionValue::Int(3)));
        assert_eq!(
            source.lookup("flutter.versionName"),
            Some(VersionValue::Text("1.0.2".into()))
        );
        assert_eq!(
            source.lookup("sdk.dir"),
            Some(VersionValue::Text("C:\\Android\\sdk".into()))
        );
    }

    #[test]
    fn test_from_toml_table_flattens() {
        let table: toml::Table = toml::from_str(
            r#"
            "flutter.ndkVersion" = "27.0.12077973"
            [flutter]
            minSdkVersion = 21
            "#,
        )
        .unwrap();
        let source = MapVersionSource::from_toml_table(&table).unwrap();
        assert_eq!(source.lookup("flutter.minSdkVersion"), Some(VersionValue::Int(21)));
        assert_eq!(
            source.lookup("flutter.ndkVersion"),
            Some(VersionValue::Text("27.0.12077973".into()))
        );
    }

    #[test]
    fn test_from_toml_rejects_arrays() {
        let table: toml::Table = toml::from_str("versions = [1, 2]").unwrap();
        let err = MapVersionSource::from_toml_table(&table).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfigValue);
    }

    #[test]
    fn test_load_properties_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.properties");
        std::fs::write(&path, "flutter.versionCode=7\n").unwrap();

        let source = MapVersionSource::load(&path).unwrap();
        assert_eq!(source.lookup("flutter.versionCode"), Some(VersionValue::Int(7)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = MapVersionSource::load(Path::new("/nonexistent/local.properties")).unwrap_err();
        assert_eq!(err.code, ErrorCode::FileNotFound);
        assert!(err.context.is_some());
    }

    #[test]
    fn test_parse_keeps_non_canonical_numbers_as_text() {
        assert_eq!(VersionValue::parse("35"), VersionValue::Int(35));
        assert_eq!(VersionValue::parse(" -2 "), VersionValue::Int(-2));
        assert_eq!(VersionValue::parse("01"), VersionValue::Text("01".into()));
        assert_eq!(VersionValue::parse("+5"), VersionValue::Text("+5".into()));
        assert_eq!(VersionValue::parse("01").as_int(), Some(1));

        let source = MapVersionSource::from_properties("flutter.versionName=01\n");
        assert_eq!(source.lookup("flutter.versionName").map(|v| v.as_text()), Some("01".to_string()));
    }

    #[test]
    fn test_value_views() {
        assert_eq!(VersionValue::Text(" 21 ".into()).as_int(), Some(21));
        assert_eq!(VersionValue::Text("1.0.0".into()).as_int(), None);
        assert_eq!(VersionValue::Int(3).as_text(), "3");
    }
}
