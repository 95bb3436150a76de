//! Output path interpolation.
//!
//! The host asks for every output path it builds from the `filename` and
//! `chunkFilename` templates. `[locale]` becomes the literal locale in a
//! single-locale build and [`FILENAME_PLACEHOLDER`] otherwise; the asset
//! localizer swaps the placeholder for each locale once the code is final.

use std::sync::LazyLock;

use regex::Regex;
use serde::{
    Deserialize,
    Serialize,
};

use crate::config::LOCALE_MARKER;
use crate::placeholder::FILENAME_PLACEHOLDER;

/// `[contenthash]` and `[contenthash:N]`, any case.
static CONTENT_HASH_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)\[contenthash(?::(\d+))?\]")
        .map_err(|e| tracing::error!("Failed to compile content hash pattern: {e}"))
        .ok()
});

/// What `[locale]` is replaced with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocaleReplacement {
    /// The only configured locale.
    Literal(String),
    /// [`FILENAME_PLACEHOLDER`], resolved per locale after optimization.
    Placeholder,
}

impl LocaleReplacement {
    /// `Literal` when exactly one locale is configured.
    #[must_use]
    pub fn for_locales(locale_names: &[String]) -> Self {
        match locale_names {
            [single] => Self::Literal(single.clone()),
            _ => Self::Placeholder,
        }
    }

    /// The text that replaces `[locale]`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Literal(locale) => locale,
            Self::Placeholder => FILENAME_PLACEHOLDER,
        }
    }
}

/// A `[contenthash]` or `[contenthash:N]` token in an interpolated path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentHashToken {
    /// Byte offset of `[`.
    pub start: usize,
    /// Byte offset past `]`.
    pub end: usize,
    /// `N` of `[contenthash:N]`.
    pub length: Option<usize>,
}

/// Recorded on the asset info the first time a path with a content hash is
/// interpolated for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentHashUsage {
    /// The interpolated path.
    pub file_path: String,
    /// Tokens found in it.
    pub tokens: Vec<ContentHashToken>,
}

/// Every content hash token in `path`, case-insensitive.
#[must_use]
pub fn find_content_hashes(path: &str) -> Vec<ContentHashToken> {
    let Some(pattern) = CONTENT_HASH_PATTERN.as_ref() else {
        return Vec::new();
    };

    pattern
        .captures_iter(path)
        .filter_map(|captures| {
            let whole = captures.get(0)?;
            let length = captures.get(1).and_then(|m| m.as_str().parse().ok());
            Some(ContentHashToken { start: whole.start(), end: whole.end(), length })
        })
        .collect()
}

/// Interpolates `[locale]` in output paths for one compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameInterpolator {
    /// Substitution for every `[locale]`.
    replacement: LocaleReplacement,
}

impl FilenameInterpolator {
    /// Interpolator substituting `replacement`.
    #[must_use]
    pub const fn new(replacement: LocaleReplacement) -> Self {
        Self { replacement }
    }

    /// What `[locale]` becomes.
    #[must_use]
    pub const fn replacement(&self) -> &LocaleReplacement {
        &self.replacement
    }

    /// Replace every `[locale]` in `path`.
    ///
    /// When `content_hash` is given and still empty, it receives the
    /// [`ContentHashUsage`] of the interpolated path if that path carries a
    /// content hash.
    #[must_use]
    pub fn interpolate(
        &self,
        path: &str,
        content_hash: Option<&mut Option<ContentHashUsage>>,
    ) -> String {
        let interpolated = path.replace(LOCALE_MARKER, self.replacement.as_str());

        if let Some(slot) = content_hash
            && slot.is_none()
        {
            let tokens = find_content_hashes(&interpolated);
            if !tokens.is_empty() {
                tracing::debug!(path = %interpolated, "Output path hashes pre-localization content");
                *slot = Some(ContentHashUsage { file_path: interpolated.clone(), tokens });
            }
        }

        interpolated
    }
}

/// Replace every filename placeholder in `name` with `locale`.
#[must_use]
pub fn localize_name(name: &str, locale: &str) -> String {
    name.replace(FILENAME_PLACEHOLDER, locale)
}
