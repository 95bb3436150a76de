//! Reference parser host.
//!
//! Stands in for a bundler's parser: finds calls of the localization function
//! in a JavaScript or TypeScript module, hands each one to the plugin and
//! splices the replacements into the module text.

pub mod analyzer;

pub use analyzer::types::AnalyzerError;

use crate::compilation::BuildContext;
use crate::diagnostics::Location;
use crate::edit::SpanEditor;
use crate::encoder::CallSite;
use crate::error::LocalizeError;
use crate::input::source::SourceModule;
use crate::plugin::LocalizeAssetsPlugin;

/// A module after its localization calls were replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedModule {
    /// Path of the source module.
    pub path: String,
    /// Rewritten source.
    pub code: String,
    /// Number of calls replaced.
    pub replaced: usize,
}

/// Replace every valid localization call in `module`.
///
/// # Errors
/// - The module cannot be parsed
/// - A key is missing under `throwOnMissing`
pub fn transform_module(
    plugin: &LocalizeAssetsPlugin,
    context: &mut BuildContext,
    module: &SourceModule,
) -> Result<TransformedModule, LocalizeError> {
    let language = module.language.tree_sitter_language();
    let queries = analyzer::query_loader::load_queries(module.language);
    let calls = analyzer::extractor::analyze_localize_calls(
        &module.text,
        &language,
        queries,
        &plugin.options().function_name,
    )?;

    let edit_error =
        |source| LocalizeError::Edit { asset: module.path.clone(), source };

    let mut editor = SpanEditor::new(&module.text);
    for call in calls {
        let site = CallSite::new(call.arguments, Location::new(module.path.clone(), call.position));
        if let Some(replacement) = plugin.on_call(context, &site)? {
            editor
                .overwrite(call.start_byte, call.end_byte, replacement.expression)
                .map_err(edit_error)?;
        }
    }

    let replaced = editor.len();
    let code = editor.apply().map_err(edit_error)?.into_string();
    tracing::debug!(path = %module.path, replaced, "Transformed module");

    Ok(TransformedModule { path: module.path.clone(), code, replaced })
}
