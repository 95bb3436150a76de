//! Asset localization.
//!
//! Runs once per build after the host has minified everything. Each asset
//! whose name carries the filename placeholder is replaced by one asset per
//! locale. Code assets get their content placeholders swapped for
//! translations and their filename placeholders for the locale; other assets
//! are copied under the localized name.
//!
//! Every replacement is planned before the first asset is emitted, so a
//! failing asset leaves the host untouched.

mod escape;
mod matcher;

use std::collections::BTreeSet;

pub use self::escape::escape_literal;
pub use self::matcher::{
    AssetKind,
    AssetMatcher,
    MatcherError,
};
use crate::compilation::{
    Asset,
    AssetHost,
    AssetInfo,
    BuildContext,
};
use crate::config::Options;
use crate::edit::{
    EditError,
    EditedText,
    SpanEditor,
};
use crate::error::LocalizeError;
use crate::filename::localize_name;
use crate::placeholder::{
    FILENAME_PLACEHOLDER,
    PlaceholderLocation,
    locate_filename_placeholders,
    locate_placeholders,
};
use crate::source_map::SourceMap;

/// Current and legacy spelling of the map comment.
const SOURCE_MAPPING_URL_MARKERS: &[&str] = &["//# sourceMappingURL=", "//@ sourceMappingURL="];

/// One asset that was replaced by its localized variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedAsset {
    /// Name of the deleted original.
    pub original: String,
    /// Names of its variants, in locale order.
    pub emitted: Vec<String>,
}

/// Replace every placeholder-bearing asset of `host` with per-locale copies.
///
/// A single-locale build has nothing to do: its names and strings were
/// resolved while compiling. Keys whose placeholders were replaced no longer
/// count as unused.
///
/// # Errors
/// Returns an error for code assets that are not UTF-8, malformed source
/// maps and conflicting edits. The host is not modified in that case.
pub fn localize_assets<H>(
    host: &mut H,
    context: &mut BuildContext,
    options: &Options,
) -> Result<Vec<LocalizedAsset>, LocalizeError>
where
    H: AssetHost + ?Sized,
{
    if let Some(locale) = context.single_locale() {
        tracing::debug!(locale, "Single-locale build, skipping asset localization");
        return Ok(Vec::new());
    }

    let matcher = AssetMatcher::new()?;

    let mut names: Vec<String> =
        host.asset_names().into_iter().filter(|name| name.contains(FILENAME_PLACEHOLDER)).collect();
    names.sort();
    let present: BTreeSet<&str> = names.iter().map(String::as_str).collect();

    let (code, rest): (Vec<&String>, Vec<&String>) =
        names.iter().partition(|name| matcher.classify(name) == AssetKind::Code);

    let mut plans: Vec<(String, Vec<Asset>)> = Vec::new();
    let mut realigned_siblings = BTreeSet::new();
    let mut used_keys = BTreeSet::new();

    for name in code {
        let asset = host.asset(name).ok_or_else(|| LocalizeError::MissingAsset(name.clone()))?;
        let sibling_name = format!("{name}.map");
        let sibling =
            if present.contains(sibling_name.as_str()) { host.asset(&sibling_name) } else { None };

        let localized = localize_code_asset(asset, sibling, context, options)?;
        used_keys.extend(localized.keys);
        if let Some(sibling_variants) = localized.sibling_variants {
            plans.push((sibling_name.clone(), sibling_variants));
            realigned_siblings.insert(sibling_name);
        }
        plans.push((name.clone(), localized.variants));
    }

    for name in rest {
        if realigned_siblings.contains(name) {
            continue;
        }
        let asset = host.asset(name).ok_or_else(|| LocalizeError::MissingAsset(name.clone()))?;
        let restricted = matcher.classify(name) == AssetKind::SourceMap;
        plans.push((name.clone(), copy_asset(asset, context, options, restricted)));
    }

    for key in &used_keys {
        context.mark_used(key);
    }

    let mut localized = Vec::with_capacity(plans.len());
    for (original, variants) in plans {
        let emitted: Vec<String> = variants.iter().map(|asset| asset.name.clone()).collect();
        for variant in variants {
            host.emit_asset(variant);
        }
        host.retarget_chunks(&original, &emitted);
        host.delete_asset(&original);
        tracing::debug!(asset = %original, ?emitted, "Localized asset");
        localized.push(LocalizedAsset { original, emitted });
    }

    tracing::info!(assets = localized.len(), locales = context.locales().len(), "Localized assets");
    Ok(localized)
}

/// Planned output for one code asset.
struct LocalizedCode {
    /// One asset per locale.
    variants: Vec<Asset>,
    /// Realigned copies of a sibling `<name>.map` asset.
    sibling_variants: Option<Vec<Asset>>,
    /// Keys of every content placeholder found.
    keys: Vec<String>,
}

/// Plan every locale variant of a code asset.
fn localize_code_asset(
    asset: &Asset,
    sibling: Option<&Asset>,
    context: &BuildContext,
    options: &Options,
) -> Result<LocalizedCode, LocalizeError> {
    let text = asset.text()?;
    let placeholders = locate_placeholders(text);
    let filename_offsets = locate_filename_placeholders(text);
    let mapping_url = trailing_source_mapping_url(text);

    let sibling_map = sibling
        .map(|sibling| {
            SourceMap::from_slice(&sibling.content).map_err(|source| LocalizeError::SourceMap {
                asset: sibling.name.clone(),
                source,
            })
        })
        .transpose()?;

    tracing::debug!(
        asset = %asset.name,
        placeholders = placeholders.len(),
        filename_placeholders = filename_offsets.len(),
        "Localizing code asset"
    );

    let mut variants = Vec::new();
    let mut sibling_variants = sibling_map.as_ref().map(|_| Vec::new());

    for locale in context.locales().names() {
        let name = localize_name(&asset.name, locale);
        let wants_map = options.wants_source_map(locale);
        let removed_comment = if wants_map { None } else { mapping_url };

        let edited = rewrite_code(
            text,
            locale,
            &placeholders,
            &filename_offsets,
            removed_comment,
            context,
        )
        .map_err(|source| LocalizeError::Edit { asset: asset.name.clone(), source })?;

        let realign = |map: &SourceMap, map_asset: &str| {
            edited
                .realign(map, &name)
                .map_err(|source| LocalizeError::Edit { asset: map_asset.to_string(), source })
        };

        let map = if wants_map {
            if let (Some(sibling), Some(sibling_map), Some(sibling_variants)) =
                (sibling, &sibling_map, &mut sibling_variants)
            {
                let content = realign(sibling_map, &sibling.name)?.to_vec().map_err(|source| {
                    LocalizeError::SourceMap { asset: sibling.name.clone(), source }
                })?;
                sibling_variants.push(Asset {
                    name: localize_name(&sibling.name, locale),
                    content,
                    map: None,
                    info: localized_info(&sibling.info, locale),
                });
            }
            asset.map.as_ref().map(|map| realign(map, &asset.name)).transpose()?
        } else {
            None
        };

        variants.push(Asset {
            name,
            content: edited.into_string().into_bytes(),
            map,
            info: localized_info(&asset.info, locale),
        });
    }

    let keys = placeholders.into_iter().map(|placeholder| placeholder.string_key).collect();
    Ok(LocalizedCode { variants, sibling_variants, keys })
}

/// One locale's edit of a code asset. Spans inside `removed_comment` are
/// dropped with it.
fn rewrite_code<'a>(
    text: &'a str,
    locale: &str,
    placeholders: &[PlaceholderLocation],
    filename_offsets: &[usize],
    removed_comment: Option<(usize, usize)>,
    context: &BuildContext,
) -> Result<EditedText<'a>, EditError> {
    let removed = |start: usize| removed_comment.is_some_and(|(from, to)| start >= from && start < to);
    let mut editor = SpanEditor::new(text);

    for placeholder in placeholders.iter().filter(|p| !removed(p.start)) {
        let translation = context.locales().resolve(locale, &placeholder.string_key);
        editor.overwrite(placeholder.start, placeholder.end, escape_literal(translation))?;
    }

    for &offset in filename_offsets.iter().filter(|offset| !removed(**offset)) {
        editor.overwrite(offset, offset + FILENAME_PLACEHOLDER.len(), locale)?;
    }

    if let Some((start, end)) = removed_comment {
        editor.overwrite(start, end, "")?;
    }

    editor.apply()
}

/// Copies of a non-code asset. Source maps only go to locales that want one.
fn copy_asset(
    asset: &Asset,
    context: &BuildContext,
    options: &Options,
    restricted: bool,
) -> Vec<Asset> {
    context
        .locales()
        .names()
        .filter(|locale| !restricted || options.wants_source_map(locale))
        .map(|locale| Asset {
            name: localize_name(&asset.name, locale),
            content: asset.content.clone(),
            map: asset.map.clone(),
            info: localized_info(&asset.info, locale),
        })
        .collect()
}

/// `info` tagged with `locale`.
fn localized_info(info: &AssetInfo, locale: &str) -> AssetInfo {
    AssetInfo { locale: Some(locale.to_string()), ..info.clone() }
}

/// Byte range of a `sourceMappingURL` comment on the last non-blank line,
/// including the line break in front of it.
fn trailing_source_mapping_url(text: &str) -> Option<(usize, usize)> {
    let end = text.trim_end().len();
    let body = text.get(..end)?;
    let line_start = body.rfind('\n').map_or(0, |newline| newline + 1);
    let line = body.get(line_start..)?.trim_start();

    if !SOURCE_MAPPING_URL_MARKERS.iter().any(|marker| line.starts_with(marker)) {
        return None;
    }

    let start = line_start.saturating_sub(1);
    Some((start, end))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::collections::{
        BTreeMap,
        HashMap,
    };

    use googletest::prelude::*;
    use rstest::*;

    use super::*;
    use crate::compilation::{
        Chunk,
        Compilation,
    };
    use crate::config::LocaleSource;
    use crate::input::locale::{
        LocaleData,
        LocaleTable,
    };
    use crate::placeholder::encode_placeholder;
    use crate::source_map::decode_mappings;

    const MAIN: &str = "main.[locale:b64b2e3f].js";

    fn options(source_maps_for_locales: Option<&[&str]>) -> Options {
        let locales = ["de", "en", "fr"]
            .iter()
            .map(|l| ((*l).to_string(), LocaleSource::Inline(BTreeMap::new())))
            .collect();
        Options {
            locales,
            source_maps_for_locales: source_maps_for_locales
                .map(|locales| locales.iter().map(ToString::to_string).collect()),
            ..Options::default()
        }
    }

    fn context(options: &Options) -> BuildContext {
        let strings = |pairs: &[(&str, &str)]| -> HashMap<String, String> {
            pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
        };
        let table = LocaleTable::new(BTreeMap::from([
            ("de".to_string(), LocaleData::inline(strings(&[("hello", "Hallo")]))),
            (
                "en".to_string(),
                LocaleData::inline(strings(&[("hello", "Hello"), ("quote", "It's")])),
            ),
            (
                "fr".to_string(),
                LocaleData::inline(strings(&[("hello", "Bonjour"), ("quote", "C'est")])),
            ),
        ]));
        BuildContext::new(options, table)
    }

    fn text(compilation: &Compilation, name: &str) -> String {
        String::from_utf8(compilation.assets[name].content.clone()).unwrap()
    }

    fn code(body: &str) -> String {
        format!("console.log(\"{}\");{body}", encode_placeholder("hello"))
    }

    #[rstest]
    fn fans_out_code_assets_per_locale() {
        let options = options(None);
        let mut compilation = Compilation::new();
        compilation.emit_asset(Asset::new(
            MAIN,
            code(&format!(
                "x('{}');n.u=e=>e+\".{FILENAME_PLACEHOLDER}.js\";",
                encode_placeholder("quote")
            )),
        ));
        let mut chunk = Chunk::new("main");
        chunk.files.insert(MAIN.to_string());
        compilation.chunks.push(chunk);

        let localized = localize_assets(&mut compilation, &mut context(&options), &options).unwrap();

        assert_that!(
            localized,
            elements_are![all![
                field!(LocalizedAsset.original, eq(MAIN)),
                field!(
                    LocalizedAsset.emitted,
                    elements_are![eq("main.de.js"), eq("main.en.js"), eq("main.fr.js")]
                )
            ]]
        );
        assert_that!(
            compilation.asset_names(),
            elements_are![eq("main.de.js"), eq("main.en.js"), eq("main.fr.js")]
        );
        assert_that!(
            text(&compilation, "main.fr.js"),
            eq("console.log(\"Bonjour\");x('C\\'est');n.u=e=>e+\".fr.js\";")
        );
        // Missing key falls back to the key.
        assert_that!(
            text(&compilation, "main.de.js"),
            eq("console.log(\"Hallo\");x('quote');n.u=e=>e+\".de.js\";")
        );
        assert_that!(compilation.assets["main.en.js"].info.locale, some(eq("en")));
        assert_that!(
            compilation.chunks[0].files,
            elements_are![eq("main.de.js"), eq("main.en.js"), eq("main.fr.js")]
        );
    }

    #[rstest]
    fn translations_are_escaped_inside_folded_literals() {
        let options = options(None);
        let quote = encode_placeholder("quote");
        let mut compilation = Compilation::new();
        compilation.emit_asset(Asset::new(MAIN, format!("x='say \"{quote}';y=`${{a}}{quote}`;")));

        localize_assets(&mut compilation, &mut context(&options), &options).unwrap();

        assert_that!(text(&compilation, "main.en.js"), eq("x='say \"It\\'s';y=`${a}It\\'s`;"));
        assert_that!(text(&compilation, "main.fr.js"), eq("x='say \"C\\'est';y=`${a}C\\'est`;"));
    }

    #[rstest]
    fn replaced_keys_are_no_longer_unused() {
        let mut options = options(None);
        options.warn_on_unused_string = true;
        let mut context = context(&options);
        let mut compilation = Compilation::new();
        compilation.emit_asset(Asset::new(MAIN, code("")));

        localize_assets(&mut compilation, &mut context, &options).unwrap();

        let unused: Vec<&str> = context.unused_keys().collect();
        assert_that!(unused, elements_are![eq(&"quote")]);
    }

    #[rstest]
    fn assets_without_placeholder_are_left_alone() {
        let options = options(None);
        let mut compilation = Compilation::new();
        compilation.emit_asset(Asset::new("vendor.js", code("")));

        let localized = localize_assets(&mut compilation, &mut context(&options), &options).unwrap();

        assert_that!(localized, is_empty());
        assert_that!(compilation.asset_names(), elements_are![eq("vendor.js")]);
    }

    #[rstest]
    fn source_maps_follow_locale_restriction() {
        let options = options(Some(&["fr"]));
        let map = SourceMap::from_slice(
            br#"{"version":3,"sources":["src/main.js"],"names":[],"mappings":"AAAA,aAAa"}"#,
        )
        .unwrap();
        let mut compilation = Compilation::new();
        compilation.emit_asset(
            Asset::new(MAIN, format!("{}\n//# sourceMappingURL={MAIN}.map", code("")))
                .with_map(map),
        );
        compilation.emit_asset(Asset::new("style.[locale:b64b2e3f].css.map", "{}"));

        localize_assets(&mut compilation, &mut context(&options), &options).unwrap();

        let with_maps: Vec<_> = compilation
            .assets
            .values()
            .filter(|asset| asset.map.is_some())
            .map(|asset| asset.name.as_str())
            .collect();
        assert_that!(with_maps, elements_are![eq(&"main.fr.js")]);
        assert_that!(
            compilation.asset_names(),
            elements_are![
                eq("main.de.js"),
                eq("main.en.js"),
                eq("main.fr.js"),
                eq("style.fr.css.map")
            ]
        );
        assert_that!(text(&compilation, "main.de.js"), eq("console.log(\"Hallo\");"));
        assert_that!(
            text(&compilation, "main.fr.js"),
            ends_with("\n//# sourceMappingURL=main.fr.js.map")
        );
        let fr_map = compilation.assets["main.fr.js"].map.as_ref().unwrap();
        assert_that!(fr_map.file, some(eq("main.fr.js")));
        // The second token sits where the placeholder started.
        let columns: Vec<_> = decode_mappings(&fr_map.mappings)
            .unwrap()
            .into_iter()
            .map(|m| m.generated_column)
            .collect();
        assert_that!(columns, elements_are![eq(&0), eq(&13)]);
    }

    #[rstest]
    fn sibling_map_assets_are_realigned() {
        let options = options(Some(&["de", "fr"]));
        let mut compilation = Compilation::new();
        compilation.emit_asset(Asset::new(MAIN, code("f()")));
        compilation.emit_asset(Asset::new(
            format!("{MAIN}.map"),
            format!(
                r#"{{"version":3,"file":"{MAIN}","sources":["a.js"],"names":[],"mappings":"AAAA,gCAAgC"}}"#
            ),
        ));

        let localized = localize_assets(&mut compilation, &mut context(&options), &options).unwrap();

        assert_that!(localized.len(), eq(2));
        assert_that!(
            compilation.asset_names(),
            elements_are![
                eq("main.de.js"),
                eq("main.de.js.map"),
                eq("main.en.js"),
                eq("main.fr.js"),
                eq("main.fr.js.map")
            ]
        );
        let map = SourceMap::from_slice(&compilation.assets["main.de.js.map"].content).unwrap();
        assert_that!(map.file, some(eq("main.de.js")));
        let columns: Vec<_> =
            decode_mappings(&map.mappings).unwrap().into_iter().map(|m| m.generated_column).collect();
        assert_that!(columns, elements_are![eq(&0), eq(&21)]);
    }

    #[rstest]
    fn other_assets_are_copied_per_locale() {
        let options = options(Some(&["fr"]));
        let mut compilation = Compilation::new();
        compilation.emit_asset(Asset::new("logo.[locale:b64b2e3f].png", vec![0x89_u8, 0x50]));

        localize_assets(&mut compilation, &mut context(&options), &options).unwrap();

        assert_that!(
            compilation.asset_names(),
            elements_are![eq("logo.de.png"), eq("logo.en.png"), eq("logo.fr.png")]
        );
        assert_that!(compilation.assets["logo.de.png"].content, eq(&vec![0x89_u8, 0x50]));
    }

    #[rstest]
    fn failing_asset_leaves_host_untouched() {
        let options = options(None);
        let mut compilation = Compilation::new();
        compilation.emit_asset(Asset::new("a.[locale:b64b2e3f].png", vec![1_u8]));
        compilation.emit_asset(Asset::new(MAIN, vec![0xff_u8]));
        let before = compilation.clone();

        let result = localize_assets(&mut compilation, &mut context(&options), &options);

        assert!(matches!(result, Err(LocalizeError::NonUtf8Asset(_))));
        assert_that!(compilation, eq(&before));
    }

    #[rstest]
    fn single_locale_build_does_nothing() {
        let mut options = options(None);
        options.locales.retain(|locale, _| locale == "en");
        let table = LocaleTable::new(BTreeMap::from([(
            "en".to_string(),
            LocaleData::inline(HashMap::new()),
        )]));
        let mut context = BuildContext::new(&options, table);
        let mut compilation = Compilation::new();
        compilation.emit_asset(Asset::new("main.en.js", "x"));

        let localized = localize_assets(&mut compilation, &mut context, &options).unwrap();

        assert_that!(localized, is_empty());
    }

    #[rstest]
    #[case::trailing("a;\n//# sourceMappingURL=a.js.map", Some((2, 32)))]
    #[case::trailing_newline("a;\n//# sourceMappingURL=a.js.map\n", Some((2, 32)))]
    #[case::legacy_marker("a;\n//@ sourceMappingURL=a.js.map", Some((2, 32)))]
    #[case::only_line("//# sourceMappingURL=a.js.map", Some((0, 29)))]
    #[case::not_last("//# sourceMappingURL=a.js.map\na;", None)]
    #[case::absent("a;", None)]
    fn finds_trailing_source_mapping_url(
        #[case] text: &str,
        #[case] expected: Option<(usize, usize)>,
    ) {
        assert_that!(trailing_source_mapping_url(text), eq(expected));
    }
}
