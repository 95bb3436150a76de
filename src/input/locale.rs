//! Locale data input definitions

use std::collections::{
    BTreeMap,
    BTreeSet,
    HashMap,
};
use std::path::{
    Path,
    PathBuf,
};

use serde_json::Value;
use thiserror::Error;

use crate::config::{
    LocaleSource,
    Options,
};
use crate::diagnostics::Location;
use crate::types::SourceRange;

/// Separator used when flattening nested locale files.
pub const KEY_SEPARATOR: &str = ".";

/// A locale file that cannot be used.
#[derive(Error, Debug)]
pub enum LocaleLoadError {
    /// The file could not be read.
    #[error("Failed to read locale \"{locale}\" from {}: {source}", .path.display())]
    Io {
        /// Locale name.
        locale: String,
        /// Resolved file path.
        path: PathBuf,
        /// Cause.
        #[source]
        source: std::io::Error,
    },

    /// The file is not JSON.
    #[error("Failed to parse locale \"{locale}\" from {}: {source}", .path.display())]
    Parse {
        /// Locale name.
        locale: String,
        /// Resolved file path.
        path: PathBuf,
        /// Cause.
        #[source]
        source: serde_json::Error,
    },

    /// The top-level JSON value is not an object.
    #[error("Locale \"{locale}\" in {} must be a JSON object", .path.display())]
    NotAnObject {
        /// Locale name.
        locale: String,
        /// Resolved file path.
        path: PathBuf,
    },
}

/// A locale file the strings were read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleFile {
    /// Path used in diagnostics.
    pub path: String,

    /// Key to source range mapping, used to point at unused keys.
    pub key_ranges: HashMap<String, SourceRange>,
}

/// Strings of one locale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleData {
    /// Flattened key map (e.g., "common.hello" -> "Hello").
    pub strings: HashMap<String, String>,

    /// Present when the strings came from a file.
    pub file: Option<LocaleFile>,
}

impl LocaleData {
    /// Strings given in the options.
    #[must_use]
    pub const fn inline(strings: HashMap<String, String>) -> Self {
        Self { strings, file: None }
    }
}

/// Locale name → strings. Loaded once per build and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleTable {
    /// Sorted by locale name.
    locales: BTreeMap<String, LocaleData>,
}

impl LocaleTable {
    /// Table over already loaded locales.
    #[must_use]
    pub const fn new(locales: BTreeMap<String, LocaleData>) -> Self {
        Self { locales }
    }

    /// Resolve every configured locale, reading file-backed ones from disk.
    ///
    /// # Errors
    /// Returns the first locale that fails to load.
    pub fn load(options: &Options) -> Result<Self, LocaleLoadError> {
        let mut locales = BTreeMap::new();
        for (name, source) in &options.locales {
            let data = match source {
                LocaleSource::Inline(strings) => LocaleData::inline(
                    strings.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                ),
                LocaleSource::Path(path) => load_locale_file(name, path)?,
            };
            tracing::debug!(locale = %name, keys = data.strings.len(), "Loaded locale");
            locales.insert(name.clone(), data);
        }
        Ok(Self { locales })
    }

    /// Locale names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.locales.keys().map(String::as_str)
    }

    /// Number of locales.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locales.len()
    }

    /// No locale configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locales.is_empty()
    }

    /// Data of one locale.
    #[must_use]
    pub fn locale(&self, locale: &str) -> Option<&LocaleData> {
        self.locales.get(locale)
    }

    /// Translation of `key` in `locale`, if the locale defines it.
    #[must_use]
    pub fn get(&self, locale: &str, key: &str) -> Option<&str> {
        self.locales.get(locale)?.strings.get(key).map(String::as_str)
    }

    /// Translation of `key` in `locale`, falling back to the key itself.
    ///
    /// A key defined as the empty string resolves to the empty string.
    #[must_use]
    pub fn resolve<'a>(&'a self, locale: &str, key: &'a str) -> &'a str {
        self.get(locale, key).unwrap_or(key)
    }

    /// Locales that do not define `key`, in name order.
    #[must_use]
    pub fn missing_locales(&self, key: &str) -> Vec<String> {
        self.locales
            .iter()
            .filter(|(_, data)| !data.strings.contains_key(key))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Every key defined by at least one locale.
    #[must_use]
    pub fn all_keys(&self) -> BTreeSet<String> {
        self.locales.values().flat_map(|data| data.strings.keys().cloned()).collect()
    }

    /// Where `key` is defined, taken from the first file-backed locale that has it.
    #[must_use]
    pub fn key_definition(&self, key: &str) -> Option<Location> {
        self.locales.values().find_map(|data| {
            let file = data.file.as_ref()?;
            let range = file.key_ranges.get(key)?;
            Some(Location::new(file.path.clone(), range.start))
        })
    }
}

/// Flatten nested JSON object into dot-separated key map.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use localize_assets::input::locale::flatten_json;
///
/// let json = json!({
///     "common": {
///         "hello": "Hello",
///         "goodbye": "Goodbye"
///     }
/// });
///
/// let flattened = flatten_json(&json, ".", None);
/// assert_eq!(flattened.get("common.hello"), Some(&"Hello".to_string()));
/// assert_eq!(flattened.get("common.goodbye"), Some(&"Goodbye".to_string()));
/// ```
#[must_use]
pub fn flatten_json(
    json: &Value,
    separator: &str,
    prefix: Option<&str>,
) -> HashMap<String, String> {
    let mut result = HashMap::new();
    flatten_json_value(json, separator, prefix, &mut result);
    result
}

/// Recursive step of [`flatten_json`].
fn flatten_json_value(
    json: &Value,
    separator: &str,
    prefix: Option<&str>,
    result: &mut HashMap<String, String>,
) {
    match json {
        Value::Object(map) => {
            for (key, value) in map {
                let full_key =
                    prefix.map_or_else(|| key.clone(), |p| format!("{p}{separator}{key}"));
                flatten_json_value(value, separator, Some(&full_key), result);
            }
        }
        Value::Array(arr) => {
            for (index, value) in arr.iter().enumerate() {
                let full_key =
                    prefix.map_or_else(|| format!("[{index}]"), |p| format!("{p}[{index}]"));
                flatten_json_value(value, separator, Some(&full_key), result);
            }
        }
        Value::String(s) => {
            if let Some(key) = prefix {
                result.insert(key.to_string(), s.clone());
            }
        }
        _ => {
            if let Some(key) = prefix {
                result.insert(key.to_string(), json.to_string());
            }
        }
    }
}

/// Extract key source ranges from JSON text using tree-sitter.
#[must_use]
pub fn extract_key_ranges(json_text: &str, separator: &str) -> HashMap<String, SourceRange> {
    let mut key_ranges = HashMap::new();

    let mut parser = tree_sitter::Parser::new();
    let Ok(()) = parser.set_language(&tree_sitter_json::LANGUAGE.into()) else {
        tracing::warn!("Failed to set tree-sitter-json language");
        return key_ranges;
    };

    let Some(tree) = parser.parse(json_text, None) else {
        tracing::warn!("Failed to parse JSON with tree-sitter");
        return key_ranges;
    };

    extract_keys_from_node(tree.root_node(), json_text.as_bytes(), separator, None, &mut key_ranges);

    key_ranges
}

/// Recursive step of [`extract_key_ranges`].
fn extract_keys_from_node(
    node: tree_sitter::Node<'_>,
    source: &[u8],
    separator: &str,
    prefix: Option<&str>,
    key_ranges: &mut HashMap<String, SourceRange>,
) {
    match node.kind() {
        "document" | "object" => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                extract_keys_from_node(child, source, separator, prefix, key_ranges);
            }
        }
        "array" => {
            let mut cursor = node.walk();
            let elements =
                node.named_children(&mut cursor).filter(|child| child.kind() != "comment");
            for (index, child) in elements.enumerate() {
                let full_key =
                    prefix.map_or_else(|| format!("[{index}]"), |p| format!("{p}[{index}]"));
                key_ranges.insert(full_key.clone(), SourceRange::from_node(&child));
                if matches!(child.kind(), "object" | "array") {
                    extract_keys_from_node(child, source, separator, Some(&full_key), key_ranges);
                }
            }
        }
        "pair" => {
            let Some(key_node) = node.child_by_field_name("key") else {
                return;
            };
            let Ok(key_text) = key_node.utf8_text(source) else {
                tracing::warn!("Failed to get key text from node");
                return;
            };
            let key = key_text.trim_matches('"');
            let full_key =
                prefix.map_or_else(|| key.to_string(), |p| format!("{p}{separator}{key}"));

            key_ranges.insert(full_key.clone(), SourceRange::from_node(&key_node));

            if let Some(value_node) = node.child_by_field_name("value")
                && matches!(value_node.kind(), "object" | "array")
            {
                extract_keys_from_node(value_node, source, separator, Some(&full_key), key_ranges);
            }
        }
        _ => {}
    }
}

/// Load one locale file.
///
/// # Errors
/// Returns error if file read or JSON parse fails, or the root is not an object.
pub fn load_locale_file(locale: &str, file_path: &Path) -> Result<LocaleData, LocaleLoadError> {
    let content = std::fs::read_to_string(file_path).map_err(|source| LocaleLoadError::Io {
        locale: locale.to_string(),
        path: file_path.to_path_buf(),
        source,
    })?;

    let json: Value = serde_json::from_str(&content).map_err(|source| LocaleLoadError::Parse {
        locale: locale.to_string(),
        path: file_path.to_path_buf(),
        source,
    })?;

    if !json.is_object() {
        return Err(LocaleLoadError::NotAnObject {
            locale: locale.to_string(),
            path: file_path.to_path_buf(),
        });
    }

    Ok(LocaleData {
        strings: flatten_json(&json, KEY_SEPARATOR, None),
        file: Some(LocaleFile {
            path: file_path.to_string_lossy().to_string(),
            key_ranges: extract_key_ranges(&content, KEY_SEPARATOR),
        }),
    })
}
