//! Fatal errors. Any of these aborts the build.

use thiserror::Error;

use crate::config::ConfigError;
use crate::diagnostics::{
    Location,
    missing_localization_message,
};
use crate::edit::EditError;
use crate::input::locale::LocaleLoadError;
use crate::localizer::MatcherError;
use crate::source_map::SourceMapError;
use crate::syntax::AnalyzerError;

/// Error that aborts a build.
#[derive(Error, Debug)]
pub enum LocalizeError {
    /// Options rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A locale file could not be loaded.
    #[error(transparent)]
    LocaleLoad(#[from] LocaleLoadError),

    /// Raised under `throwOnMissing`.
    #[error("{}", missing_localization_message(.key, .location, .locales))]
    MissingLocalization {
        /// The missing key.
        key: String,
        /// Locales without it.
        locales: Vec<String>,
        /// The call that uses it.
        location: Location,
    },

    /// Placeholder replacement or map realignment failed.
    #[error("Failed to localize asset \"{asset}\": {source}")]
    Edit {
        /// Asset being rewritten.
        asset: String,
        /// Cause.
        #[source]
        source: EditError,
    },

    /// A source map could not be read or written.
    #[error("Invalid source map for asset \"{asset}\": {source}")]
    SourceMap {
        /// Asset holding the map.
        asset: String,
        /// Cause.
        #[source]
        source: SourceMapError,
    },

    /// Code asset with binary content.
    #[error("Asset \"{0}\" is not valid UTF-8")]
    NonUtf8Asset(String),

    /// Host listed an asset it cannot return.
    #[error("Asset \"{0}\" was requested but does not exist")]
    MissingAsset(String),

    /// Asset classification patterns failed to build.
    #[error(transparent)]
    Matcher(#[from] MatcherError),

    /// Reference parser failure.
    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),

    /// File system error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
