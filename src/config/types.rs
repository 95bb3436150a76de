use std::collections::{
    BTreeMap,
    HashSet,
};
use std::path::PathBuf;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

/// Marker that output path templates must contain.
pub const LOCALE_MARKER: &str = "[locale]";

/// Identifier recognized as the localization call when none is configured.
pub const DEFAULT_FUNCTION_NAME: &str = "__";

/// One invalid option.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "sourceMapsForLocales[0]")
    pub field_path: String,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    /// Error for `field_path`.
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

/// Options that cannot be used.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Every problem found by validation.
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    /// Options file could not be read.
    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// Options file is not valid options JSON.
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Numbered list, one error per line.
fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Where the strings of one locale come from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum LocaleSource {
    /// Strings given directly in the options.
    Inline(BTreeMap<String, String>),
    /// Path to a JSON file holding the strings.
    Path(PathBuf),
}

/// Plugin options.
///
/// Unknown fields are rejected so that typos surface before any compilation
/// work starts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Options {
    /// Locale name to its strings. Order of names is the emission order.
    pub locales: BTreeMap<String, LocaleSource>,

    /// Callee recognized as the localization function.
    #[serde(default = "default_function_name")]
    pub function_name: String,

    /// A missing key aborts the build instead of producing a warning.
    #[serde(default)]
    pub throw_on_missing: bool,

    /// Restricts source-map generation to these locales.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_maps_for_locales: Option<Vec<String>>,

    /// Report keys no call references when the build ends.
    #[serde(default)]
    pub warn_on_unused_string: bool,
}

/// [`DEFAULT_FUNCTION_NAME`] as an owned string.
fn default_function_name() -> String {
    DEFAULT_FUNCTION_NAME.to_string()
}

impl Default for Options {
    fn default() -> Self {
        Self {
            locales: BTreeMap::new(),
            function_name: default_function_name(),
            throw_on_missing: false,
            source_maps_for_locales: None,
            warn_on_unused_string: false,
        }
    }
}

impl Options {
    /// # Errors
    /// - No locale configured
    /// - Invalid locale name or empty locale path
    /// - `functionName` is not an identifier or member chain
    /// - `sourceMapsForLocales` names an unknown locale or repeats one
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.locales.is_empty() {
            errors.push(ValidationError::new(
                "locales",
                "At least one locale is required. Example: {\"en\": \"./locales/en.json\"}",
            ));
        }

        for (name, source) in &self.locales {
            if name.is_empty() || name.contains(['/', '\\']) {
                errors.push(ValidationError::new(
                    format!("locales.{name}"),
                    format!("Invalid locale name '{name}': it must be non-empty and usable in a file name"),
                ));
            }
            if let LocaleSource::Path(path) = source
                && path.as_os_str().is_empty()
            {
                errors.push(ValidationError::new(
                    format!("locales.{name}"),
                    "The path cannot be empty. Specify a JSON file or an inline mapping",
                ));
            }
        }

        if !is_callee_name(&self.function_name) {
            errors.push(ValidationError::new(
                "functionName",
                format!(
                    "'{}' is not a valid identifier. Example: \"__\" or \"i18n.t\"",
                    self.function_name
                ),
            ));
        }

        if let Some(source_map_locales) = &self.source_maps_for_locales {
            let mut seen = HashSet::new();
            for (index, locale) in source_map_locales.iter().enumerate() {
                if !self.locales.contains_key(locale) {
                    errors.push(ValidationError::new(
                        format!("sourceMapsForLocales[{index}]"),
                        format!("Unknown locale '{locale}'. It must be one of the configured locales"),
                    ));
                } else if !seen.insert(locale) {
                    errors.push(ValidationError::new(
                        format!("sourceMapsForLocales[{index}]"),
                        format!("Locale '{locale}' is listed more than once"),
                    ));
                }
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Locale names in a stable order.
    #[must_use]
    pub fn locale_names(&self) -> Vec<String> {
        self.locales.keys().cloned().collect()
    }

    /// Whether `locale` receives a source map.
    #[must_use]
    pub fn wants_source_map(&self, locale: &str) -> bool {
        self.source_maps_for_locales
            .as_ref()
            .is_none_or(|locales| locales.iter().any(|l| l == locale))
    }
}

/// `name` or a dotted member chain such as `i18n.t`.
fn is_callee_name(name: &str) -> bool {
    !name.is_empty() && name.split('.').all(is_identifier)
}

/// A plain JavaScript identifier.
fn is_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    chars.next().is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// The host's output path templates.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputOptions {
    /// Template of entry chunk files.
    pub filename: String,
    /// Template of non-entry chunk files.
    pub chunk_filename: String,
}

impl OutputOptions {
    /// Output options from two templates.
    #[must_use]
    pub fn new(filename: impl Into<String>, chunk_filename: impl Into<String>) -> Self {
        Self { filename: filename.into(), chunk_filename: chunk_filename.into() }
    }

    /// Both templates must contain [`LOCALE_MARKER`].
    ///
    /// # Errors
    /// Returns the templates missing the marker.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<_> = [("output.filename", &self.filename), ("output.chunkFilename", &self.chunk_filename)]
            .into_iter()
            .filter(|(_, template)| !template.contains(LOCALE_MARKER))
            .map(|(field, template)| {
                ValidationError::new(field, format!("'{template}' must include {LOCALE_MARKER}"))
            })
            .collect();

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
