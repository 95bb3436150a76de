//! The host interface.
//!
//! A bundler drives one [`LocalizeAssetsPlugin`] through its hooks:
//!
//! 1. [`LocalizeAssetsPlugin::start_compilation`] when a compilation starts
//!    (every watch rebuild included), which yields a fresh [`BuildContext`].
//! 2. [`LocalizeAssetsPlugin::interpolate_path`] for every output path.
//! 3. [`LocalizeAssetsPlugin::on_call`] for every call of the localization
//!    function seen by the parser.
//! 4. [`LocalizeAssetsPlugin::on_assets_finalized`] once, after minification.
//! 5. [`LocalizeAssetsPlugin::on_done`] at the end of the build.

use crate::compilation::{
    AssetHost,
    AssetInfo,
    BuildContext,
};
use crate::config::{
    ConfigError,
    Options,
    OutputOptions,
};
use crate::diagnostics::Diagnostic;
use crate::encoder::{
    CallReplacement,
    CallSite,
    encode_call,
};
use crate::error::LocalizeError;
use crate::input::locale::LocaleTable;
use crate::localizer::{
    LocalizedAsset,
    localize_assets,
};

/// Module types whose parser reports localization calls.
pub const PARSER_MODULE_TYPES: &[&str] = &["javascript/auto", "javascript/dynamic", "javascript/esm"];

/// The plugin: validated options plus every host hook.
#[derive(Debug, Clone)]
pub struct LocalizeAssetsPlugin {
    /// Validated at construction.
    options: Options,
}

impl LocalizeAssetsPlugin {
    /// Validate `options` once, before any compilation.
    ///
    /// # Errors
    /// Returns every problem found in `options`.
    pub fn new(options: Options) -> Result<Self, ConfigError> {
        options.validate().map_err(ConfigError::ValidationErrors)?;
        tracing::info!(
            locales = ?options.locale_names(),
            function_name = %options.function_name,
            "Localization plugin configured"
        );
        Ok(Self { options })
    }

    /// The validated options.
    #[must_use]
    pub const fn options(&self) -> &Options {
        &self.options
    }

    /// Whether the parser hook applies to `module_type`.
    #[must_use]
    pub fn handles_module_type(module_type: &str) -> bool {
        PARSER_MODULE_TYPES.contains(&module_type)
    }

    /// Check the output templates and load locale data for a new compilation.
    ///
    /// # Errors
    /// - `output` templates lack `[locale]`
    /// - A locale file cannot be read or parsed
    pub fn start_compilation(&self, output: &OutputOptions) -> Result<BuildContext, LocalizeError> {
        output.validate().map_err(ConfigError::ValidationErrors)?;
        let locales = LocaleTable::load(&self.options)?;
        Ok(BuildContext::new(&self.options, locales))
    }

    /// Asset-path hook.
    #[allow(clippy::unused_self)]
    pub fn interpolate_path(
        &self,
        context: &mut BuildContext,
        path: &str,
        info: Option<&mut AssetInfo>,
    ) -> String {
        context.interpolate_path(path, info)
    }

    /// Parser call hook.
    ///
    /// # Errors
    /// Returns [`LocalizeError::MissingLocalization`] under `throwOnMissing`.
    pub fn on_call(
        &self,
        context: &mut BuildContext,
        call: &CallSite,
    ) -> Result<Option<CallReplacement>, LocalizeError> {
        encode_call(context, &self.options, call)
    }

    /// After-optimization asset hook.
    ///
    /// # Errors
    /// See [`localize_assets`].
    pub fn on_assets_finalized<H>(
        &self,
        host: &mut H,
        context: &mut BuildContext,
    ) -> Result<Vec<LocalizedAsset>, LocalizeError>
    where
        H: AssetHost + ?Sized,
    {
        localize_assets(host, context, &self.options)
    }

    /// Report unused keys and hand every warning of the build to the host.
    pub fn on_done(&self, context: &mut BuildContext) -> Vec<Diagnostic> {
        if self.options.warn_on_unused_string {
            let unused: Vec<Diagnostic> = context
                .unused_keys()
                .map(|key| Diagnostic::unused_key(key, context.locales().key_definition(key)))
                .collect();
            for diagnostic in unused {
                context.warn(diagnostic);
            }
        }
        context.take_diagnostics()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use googletest::prelude::*;
    use rstest::*;

    use super::*;
    use crate::config::LocaleSource;
    use crate::diagnostics::{
        DiagnosticKind,
        Location,
    };
    use crate::encoder::CallArgument;
    use crate::types::SourcePosition;

    fn inline(pairs: &[(&str, &str)]) -> LocaleSource {
        LocaleSource::Inline(pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect())
    }

    #[fixture]
    fn options() -> Options {
        let mut locales = BTreeMap::new();
        locales.insert("en".to_string(), inline(&[("a", "A"), ("b", "B")]));
        locales.insert("fr".to_string(), inline(&[("a", "À"), ("b", "Bé")]));
        Options { locales, warn_on_unused_string: true, ..Options::default() }
    }

    fn output() -> OutputOptions {
        OutputOptions::new("[name].[locale].js", "[id].[locale].js")
    }

    fn literal_call(key: &str) -> CallSite {
        CallSite::new(
            vec![CallArgument::StringLiteral(key.to_string())],
            Location::new("src/index.js", SourcePosition { line: 0, character: 0 }),
        )
    }

    #[rstest]
    fn rejects_invalid_options() {
        let result = LocalizeAssetsPlugin::new(Options::default());

        assert!(matches!(result, Err(ConfigError::ValidationErrors(ref errors)) if errors.len() == 1));
    }

    #[rstest]
    fn output_template_without_locale_aborts(options: Options) {
        let plugin = LocalizeAssetsPlugin::new(options).unwrap();

        let result = plugin.start_compilation(&OutputOptions::new("[name].js", "[id].[locale].js"));

        assert!(matches!(
            result,
            Err(LocalizeError::Config(ConfigError::ValidationErrors(ref errors)))
                if errors.first().is_some_and(|e| e.field_path == "output.filename")
        ));
    }

    #[rstest]
    fn unused_keys_are_reported_at_done(options: Options) {
        let plugin = LocalizeAssetsPlugin::new(options).unwrap();
        let mut context = plugin.start_compilation(&output()).unwrap();

        plugin.on_call(&mut context, &literal_call("a")).unwrap();
        plugin.on_call(&mut context, &literal_call("a")).unwrap();
        let diagnostics = plugin.on_done(&mut context);

        assert_that!(
            diagnostics,
            elements_are![all![
                field!(Diagnostic.kind, eq(&DiagnosticKind::UnusedKey)),
                field!(Diagnostic.key, some(eq("b")))
            ]]
        );
    }

    #[rstest]
    fn every_compilation_starts_fresh(options: Options) {
        let plugin = LocalizeAssetsPlugin::new(options).unwrap();

        let mut first = plugin.start_compilation(&output()).unwrap();
        plugin.on_call(&mut first, &literal_call("a")).unwrap();
        plugin.on_call(&mut first, &literal_call("b")).unwrap();
        let second = plugin.start_compilation(&output()).unwrap();

        assert_that!(first.unused_keys().count(), eq(0));
        assert_that!(second.unused_keys().collect::<Vec<_>>(), elements_are![eq(&"a"), eq(&"b")]);
    }

    #[rstest]
    #[case::auto("javascript/auto", true)]
    #[case::dynamic("javascript/dynamic", true)]
    #[case::esm("javascript/esm", true)]
    #[case::json("json", false)]
    fn module_types(#[case] module_type: &str, #[case] expected: bool) {
        assert_eq!(LocalizeAssetsPlugin::handles_module_type(module_type), expected);
    }
}
