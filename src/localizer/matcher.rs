//! Asset name classification.

use globset::{
    Glob,
    GlobSet,
    GlobSetBuilder,
};

/// Code whose text is rewritten per locale.
const CODE_PATTERNS: &[&str] = &["*.js", "*.mjs", "*.cjs"];

/// Source maps emitted as their own files.
const SOURCE_MAP_PATTERNS: &[&str] = &["*.map"];

/// Asset patterns that failed to compile.
#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    /// One glob is invalid.
    #[error("Invalid asset pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The glob.
        pattern: String,
        /// Cause.
        #[source]
        source: globset::Error,
    },

    /// The globs could not be combined.
    #[error("Failed to build glob set: {0}")]
    GlobSetBuild(#[from] globset::Error),
}

/// How an asset is localized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// Rewritten per locale.
    Code,
    /// Copied only for locales that want maps.
    SourceMap,
    /// Copied for every locale.
    Other,
}

/// Sorts asset names into [`AssetKind`]s.
#[derive(Debug, Clone)]
pub struct AssetMatcher {
    /// [`CODE_PATTERNS`].
    code_set: GlobSet,
    /// [`SOURCE_MAP_PATTERNS`].
    source_map_set: GlobSet,
}

impl AssetMatcher {
    /// Compile the built-in patterns.
    ///
    /// # Errors
    /// Returns an error if a pattern is invalid.
    pub fn new() -> Result<Self, MatcherError> {
        Ok(Self {
            code_set: Self::build_glob_set(CODE_PATTERNS)?,
            source_map_set: Self::build_glob_set(SOURCE_MAP_PATTERNS)?,
        })
    }

    /// One set matching any of `patterns`.
    fn build_glob_set(patterns: &[&str]) -> Result<GlobSet, MatcherError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|source| MatcherError::InvalidPattern {
                pattern: (*pattern).to_string(),
                source,
            })?;
            builder.add(glob);
        }
        Ok(builder.build()?)
    }

    /// Kind of `asset_name`; code wins over source map.
    #[must_use]
    pub fn classify(&self, asset_name: &str) -> AssetKind {
        if self.code_set.is_match(asset_name) {
            AssetKind::Code
        } else if self.source_map_set.is_match(asset_name) {
            AssetKind::SourceMap
        } else {
            AssetKind::Other
        }
    }
}
