//! Build diagnostics surfaced to the host.
//!
//! Warnings never stop a build: they are accumulated on the per-build context
//! and handed to the host, which decides how to present them.

use std::fmt;

use serde::{
    Deserialize,
    Serialize,
};

use crate::types::SourcePosition;

/// Prefix carried by every message so that host output can be attributed.
pub const MESSAGE_PREFIX: &str = "[localize-assets]";

/// What a diagnostic is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// A key referenced in code is absent from one or more locales.
    MissingLocalization,
    /// A call to the localization function that is not `fn("literal")`.
    ConfusingUsage,
    /// A key defined in locale data that no call site referenced.
    UnusedKey,
    /// An output path hashes pre-localization content.
    ContentHash,
}

/// A file plus a position inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Path as the host reported it.
    pub file: String,
    /// Zero-based line.
    pub line: u32,
    /// Zero-based column.
    pub character: u32,
}

impl Location {
    /// Location of `position` inside `file`.
    #[must_use]
    pub fn new(file: impl Into<String>, position: SourcePosition) -> Self {
        Self { file: file.into(), line: position.line, character: position.character }
    }

    /// The position without the file.
    #[must_use]
    pub const fn position(&self) -> SourcePosition {
        SourcePosition { line: self.line, character: self.character }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.position())
    }
}

/// A warning emitted during a build. Fatal problems are
/// [`LocalizeError`](crate::LocalizeError)s instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// What the warning is about.
    pub kind: DiagnosticKind,
    /// Prefixed, human readable text.
    pub message: String,
    /// The string key involved, if any.
    pub key: Option<String>,
    /// Where the problem was found.
    pub location: Option<Location>,
}

impl Diagnostic {
    /// `key` used at `location` is absent from `locales`.
    #[must_use]
    pub fn missing_localization(key: &str, location: &Location, locales: &[String]) -> Self {
        Self {
            kind: DiagnosticKind::MissingLocalization,
            message: missing_localization_message(key, location, locales),
            key: Some(key.to_string()),
            location: Some(location.clone()),
        }
    }

    /// A call at `location` that cannot be localized.
    #[must_use]
    pub fn confusing_usage(function_name: &str, location: &Location) -> Self {
        Self {
            kind: DiagnosticKind::ConfusingUsage,
            message: format!(
                "{MESSAGE_PREFIX} Ignoring confusing usage of localization function \"{function_name}\" in {location}"
            ),
            key: None,
            location: Some(location.clone()),
        }
    }

    /// `defined_at` points at the key inside a locale file, when the locale
    /// data came from one.
    #[must_use]
    pub fn unused_key(key: &str, defined_at: Option<Location>) -> Self {
        let message = defined_at.as_ref().map_or_else(
            || format!("{MESSAGE_PREFIX} Unused string key \"{key}\""),
            |at| format!("{MESSAGE_PREFIX} Unused string key \"{key}\" defined in {at}"),
        );
        Self {
            kind: DiagnosticKind::UnusedKey,
            message,
            key: Some(key.to_string()),
            location: defined_at,
        }
    }

    /// `path` uses a content hash in a multi-locale build.
    #[must_use]
    pub fn content_hash(path: &str) -> Self {
        Self {
            kind: DiagnosticKind::ContentHash,
            message: format!(
                "{MESSAGE_PREFIX} Output path \"{path}\" contains [contenthash]; the hash is computed before localization and is identical for every locale"
            ),
            key: None,
            location: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Shared by the warning and by the fatal error raised under `throwOnMissing`.
#[must_use]
pub fn missing_localization_message(key: &str, location: &Location, locales: &[String]) -> String {
    format!(
        "{MESSAGE_PREFIX} Missing localization for key \"{key}\" used in {location} from locales: {}",
        locales.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    fn location() -> Location {
        Location::new("src/app.js", SourcePosition { line: 2, character: 8 })
    }

    #[rstest]
    fn missing_localization_names_key_location_and_locales() {
        let diagnostic = Diagnostic::missing_localization(
            "greeting",
            &location(),
            &["de".to_string(), "fr".to_string()],
        );

        assert_that!(
            diagnostic.message,
            eq("[localize-assets] Missing localization for key \"greeting\" used in src/app.js:3:8 from locales: de, fr")
        );
        assert_that!(diagnostic.key, some(eq("greeting")));
    }

    #[rstest]
    fn confusing_usage_names_function_and_location() {
        let diagnostic = Diagnostic::confusing_usage("__", &location());

        assert_that!(diagnostic.message, contains_substring("\"__\" in src/app.js:3:8"));
        assert_that!(diagnostic.kind, eq(DiagnosticKind::ConfusingUsage));
    }

    #[rstest]
    #[case::without_definition(None, "[localize-assets] Unused string key \"b\"")]
    #[case::with_definition(
        Some(Location::new("locales/en.json", SourcePosition { line: 1, character: 2 })),
        "[localize-assets] Unused string key \"b\" defined in locales/en.json:2:2"
    )]
    fn unused_key_message(#[case] defined_at: Option<Location>, #[case] expected: &str) {
        let diagnostic = Diagnostic::unused_key("b", defined_at);

        assert_that!(diagnostic.to_string(), eq(expected));
    }
}
