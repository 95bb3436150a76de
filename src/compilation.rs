//! Per-build state and the host's view of emitted assets.

use std::collections::{
    BTreeMap,
    BTreeSet,
    HashSet,
};

use serde::{
    Deserialize,
    Serialize,
};
use serde_json::{
    Map,
    Value,
};

use crate::config::Options;
use crate::diagnostics::{
    Diagnostic,
    Location,
};
use crate::error::LocalizeError;
use crate::filename::{
    ContentHashUsage,
    FilenameInterpolator,
    LocaleReplacement,
};
use crate::input::locale::LocaleTable;
use crate::source_map::SourceMap;

/// Metadata attached to an asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetInfo {
    /// Set on every asset emitted by localization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,

    /// Content hashes found in the interpolated name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<ContentHashUsage>,

    /// Host metadata, preserved as is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Output path relative to the output directory.
    pub name: String,
    /// Raw bytes.
    pub content: Vec<u8>,
    /// A source map attached by the host rather than emitted as a file.
    pub map: Option<SourceMap>,
    /// Metadata.
    pub info: AssetInfo,
}

impl Asset {
    /// Asset without map or metadata.
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self { name: name.into(), content: content.into(), map: None, info: AssetInfo::default() }
    }

    /// Attach a source map.
    #[must_use]
    pub fn with_map(mut self, map: SourceMap) -> Self {
        self.map = Some(map);
        self
    }

    /// Replace the metadata.
    #[must_use]
    pub fn with_info(mut self, info: AssetInfo) -> Self {
        self.info = info;
        self
    }

    /// The content as text.
    ///
    /// # Errors
    /// Returns [`LocalizeError::NonUtf8Asset`] for binary content.
    pub fn text(&self) -> Result<&str, LocalizeError> {
        std::str::from_utf8(&self.content).map_err(|_| LocalizeError::NonUtf8Asset(self.name.clone()))
    }
}

/// The files a chunk is made of.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chunk {
    /// Chunk identifier.
    pub id: String,
    /// Main files, such as the chunk's code.
    pub files: BTreeSet<String>,
    /// Side files, such as source maps.
    pub auxiliary_files: BTreeSet<String>,
}

impl Chunk {
    /// Chunk without files.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), ..Self::default() }
    }

    /// Replace `old` with `new_names` in whichever file list holds it.
    pub fn retarget(&mut self, old: &str, new_names: &[String]) {
        for files in [&mut self.files, &mut self.auxiliary_files] {
            if files.remove(old) {
                files.extend(new_names.iter().cloned());
            }
        }
    }
}

/// Asset storage of the host bundler, as seen after optimization.
pub trait AssetHost {
    /// Every asset name, in any order.
    fn asset_names(&self) -> Vec<String>;

    /// The asset called `name`.
    fn asset(&self, name: &str) -> Option<&Asset>;

    /// Add or replace the asset under `asset.name`.
    fn emit_asset(&mut self, asset: Asset);

    /// Remove `name`, returning it.
    fn delete_asset(&mut self, name: &str) -> Option<Asset>;

    /// Point chunk file lists that mention `old` at `new_names` instead.
    fn retarget_chunks(&mut self, old: &str, new_names: &[String]);
}

/// In-memory [`AssetHost`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compilation {
    /// Assets by name.
    pub assets: BTreeMap<String, Asset>,
    /// Chunks in emission order.
    pub chunks: Vec<Chunk>,
}

impl Compilation {
    /// Empty compilation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AssetHost for Compilation {
    fn asset_names(&self) -> Vec<String> {
        self.assets.keys().cloned().collect()
    }

    fn asset(&self, name: &str) -> Option<&Asset> {
        self.assets.get(name)
    }

    fn emit_asset(&mut self, asset: Asset) {
        self.assets.insert(asset.name.clone(), asset);
    }

    fn delete_asset(&mut self, name: &str) -> Option<Asset> {
        self.assets.remove(name)
    }

    fn retarget_chunks(&mut self, old: &str, new_names: &[String]) {
        for chunk in &mut self.chunks {
            chunk.retarget(old, new_names);
        }
    }
}

/// State of one compilation. Created at every compilation start, so watch
/// rebuilds validate and track keys from scratch.
#[derive(Debug)]
pub struct BuildContext {
    /// Loaded locale data.
    locales: LocaleTable,
    /// `[locale]` substitution for this build.
    interpolator: FilenameInterpolator,
    /// Keys already checked for completeness.
    validated_keys: HashSet<String>,
    /// `None` unless unused keys are reported.
    unused_keys: Option<BTreeSet<String>>,
    /// The content hash warning was emitted.
    content_hash_reported: bool,
    /// Warnings not yet handed to the host.
    diagnostics: Vec<Diagnostic>,
}

impl BuildContext {
    /// Fresh state for a compilation over `locales`.
    #[must_use]
    pub fn new(options: &Options, locales: LocaleTable) -> Self {
        let locale_names: Vec<String> = locales.names().map(ToString::to_string).collect();
        let unused_keys = options.warn_on_unused_string.then(|| locales.all_keys());
        Self {
            interpolator: FilenameInterpolator::new(LocaleReplacement::for_locales(&locale_names)),
            locales,
            validated_keys: HashSet::new(),
            unused_keys,
            content_hash_reported: false,
            diagnostics: Vec::new(),
        }
    }

    /// Locale data of the build.
    #[must_use]
    pub const fn locales(&self) -> &LocaleTable {
        &self.locales
    }

    /// The locale of a single-locale build.
    #[must_use]
    pub fn single_locale(&self) -> Option<&str> {
        match self.interpolator.replacement() {
            LocaleReplacement::Literal(locale) => Some(locale),
            LocaleReplacement::Placeholder => None,
        }
    }

    /// Filename interpolator of the build.
    #[must_use]
    pub const fn interpolator(&self) -> &FilenameInterpolator {
        &self.interpolator
    }

    /// Interpolate an output path, recording content hash usage on `info`.
    ///
    /// A multi-locale build warns once per compilation about content hashes.
    pub fn interpolate_path(&mut self, path: &str, info: Option<&mut AssetInfo>) -> String {
        let interpolated =
            self.interpolator.interpolate(path, info.map(|info| &mut info.content_hash));

        if self.single_locale().is_none()
            && !self.content_hash_reported
            && !crate::filename::find_content_hashes(&interpolated).is_empty()
        {
            self.content_hash_reported = true;
            self.warn(Diagnostic::content_hash(&interpolated));
        }

        interpolated
    }

    /// Check `key` against every locale, once per compilation.
    ///
    /// # Errors
    /// Returns [`LocalizeError::MissingLocalization`] when `throw_on_missing`
    /// is set and a locale lacks the key. Without it a warning is recorded.
    pub fn validate_key(
        &mut self,
        key: &str,
        location: &Location,
        throw_on_missing: bool,
    ) -> Result<(), LocalizeError> {
        if !self.validated_keys.insert(key.to_string()) {
            return Ok(());
        }

        let missing = self.locales.missing_locales(key);
        if missing.is_empty() {
            return Ok(());
        }

        if throw_on_missing {
            return Err(LocalizeError::MissingLocalization {
                key: key.to_string(),
                locales: missing,
                location: location.clone(),
            });
        }
        self.warn(Diagnostic::missing_localization(key, location, &missing));
        Ok(())
    }

    /// `key` is referenced by some call or placeholder.
    pub fn mark_used(&mut self, key: &str) {
        if let Some(unused) = &mut self.unused_keys {
            unused.remove(key);
        }
    }

    /// Keys defined in locale data that nothing referenced so far.
    pub fn unused_keys(&self) -> impl Iterator<Item = &str> {
        self.unused_keys.iter().flatten().map(String::as_str)
    }

    /// Log and record a warning.
    pub fn warn(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(kind = ?diagnostic.kind, "{}", diagnostic.message);
        self.diagnostics.push(diagnostic);
    }

    /// Warnings recorded so far.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Drain the recorded warnings.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}
