//! Command line driver.
//!
//! `transform` runs the parser hook over source modules; `localize` runs the
//! asset hook over a build output directory on disk.

use std::collections::{
    HashMap,
    HashSet,
};
use std::convert::Infallible;
use std::ffi::OsStr;
use std::path::{
    Component,
    Path,
    PathBuf,
};

use futures::{
    StreamExt,
    TryStreamExt,
    stream,
};
use ignore::WalkBuilder;
use pico_args::Arguments;
use thiserror::Error;

use crate::compilation::{
    Asset,
    AssetHost,
    AssetInfo,
    Compilation,
};
use crate::config::{
    self,
    CONFIG_FILE_NAME,
    ConfigError,
    LOCALE_MARKER,
    Options,
    OutputOptions,
};
use crate::diagnostics::Diagnostic;
use crate::error::LocalizeError;
use crate::input::source::SourceModule;
use crate::placeholder::FILENAME_PLACEHOLDER;
use crate::plugin::LocalizeAssetsPlugin;
use crate::syntax;

/// Help text printed for `--help` and usage errors.
pub const USAGE: &str = "\
Usage:
  localize-assets transform [--config FILE] --out-dir DIR FILES...
  localize-assets localize [--config FILE] DIST_DIR

Options:
  --config FILE   Options file (default: ./.localize-assets.json)
  --out-dir DIR   Where transformed modules are written
  -h, --help      Print this help
";

/// Errors that end a command line run.
#[derive(Error, Debug)]
pub enum CliError {
    /// Bad command line.
    #[error("{0}\n\n{usage}", usage = USAGE)]
    Usage(String),

    /// Flag value that failed to parse.
    #[error(transparent)]
    Args(#[from] pico_args::Error),

    /// Unreadable or invalid options file.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No `--config` and no options file in the working directory.
    #[error("No options file at {}; pass --config", .0.display())]
    MissingConfig(PathBuf),

    /// Source file with an extension no parser handles.
    #[error("Unsupported source module: {}", .0.display())]
    UnsupportedModule(PathBuf),

    /// Source file that is not UTF-8.
    #[error("Source module {} is not valid UTF-8", .0.display())]
    NonUtf8Source(PathBuf),

    /// Fatal build error.
    #[error(transparent)]
    Localize(#[from] LocalizeError),

    /// Reading or writing `path` failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print [`USAGE`].
    Help,
    /// Replace localization calls in source modules.
    Transform {
        /// Options file, `.localize-assets.json` in the working directory when absent.
        config: Option<PathBuf>,
        /// Root of the written modules.
        out_dir: PathBuf,
        /// Modules to transform.
        files: Vec<PathBuf>,
    },
    /// Fan out every `[locale]` file of a build directory.
    Localize {
        /// Options file, `.localize-assets.json` in the working directory when absent.
        config: Option<PathBuf>,
        /// Build output directory, rewritten in place.
        dist_dir: PathBuf,
    },
}

/// Parse the process arguments.
///
/// # Errors
/// Returns [`CliError::Usage`] for unknown commands, unknown flags and missing
/// operands.
pub fn parse_args(mut args: Arguments) -> Result<Command, CliError> {
    if args.contains(["-h", "--help"]) {
        return Ok(Command::Help);
    }

    let subcommand = args.subcommand()?;
    let config =
        args.opt_value_from_os_str("--config", |value: &OsStr| Ok::<_, Infallible>(PathBuf::from(value)))?;

    match subcommand.as_deref() {
        Some("transform") => {
            let out_dir = args
                .value_from_os_str("--out-dir", |value: &OsStr| Ok::<_, Infallible>(PathBuf::from(value)))?;
            let files = operands(args)?;
            if files.is_empty() {
                return Err(CliError::Usage("transform needs at least one file".to_string()));
            }
            Ok(Command::Transform { config, out_dir, files })
        }
        Some("localize") => match operands(args)?.as_slice() {
            [dist_dir] => Ok(Command::Localize { config, dist_dir: dist_dir.clone() }),
            _ => Err(CliError::Usage("localize takes exactly one DIST_DIR".to_string())),
        },
        Some(other) => Err(CliError::Usage(format!("Unknown command '{other}'"))),
        None => Ok(Command::Help),
    }
}

/// Remaining free arguments. Leftover flags are usage errors.
fn operands(args: Arguments) -> Result<Vec<PathBuf>, CliError> {
    let rest = args.finish();
    if let Some(flag) = rest.iter().find(|arg| arg.to_string_lossy().starts_with('-')) {
        return Err(CliError::Usage(format!("Unknown option '{}'", flag.to_string_lossy())));
    }
    Ok(rest.into_iter().map(PathBuf::from).collect())
}

/// Run a parsed command and return the warnings of the build.
///
/// # Errors
/// Any fatal configuration, localization or I/O error.
pub async fn run(command: Command) -> Result<Vec<Diagnostic>, CliError> {
    match command {
        Command::Help => Ok(Vec::new()),
        Command::Transform { config, out_dir, files } => {
            transform(config.as_deref(), &out_dir, files).await
        }
        Command::Localize { config, dist_dir } => localize(config.as_deref(), &dist_dir).await,
    }
}

/// Output templates of command line builds.
fn cli_output() -> OutputOptions {
    OutputOptions::new("[name].[locale].js", "[id].[locale].js")
}

/// Load `config_path`, or the options file of the working directory.
fn load_options(config_path: Option<&Path>) -> Result<Options, CliError> {
    if let Some(path) = config_path {
        return Ok(config::load_from_file(path)?);
    }
    let root = std::env::current_dir()
        .map_err(|source| CliError::Io { path: PathBuf::from("."), source })?;
    config::load_from_root(&root)?.ok_or_else(|| CliError::MissingConfig(root.join(CONFIG_FILE_NAME)))
}

/// Transform `files` into `out_dir` as one compilation.
async fn transform(
    config_path: Option<&Path>,
    out_dir: &Path,
    files: Vec<PathBuf>,
) -> Result<Vec<Diagnostic>, CliError> {
    let plugin = LocalizeAssetsPlugin::new(load_options(config_path)?)?;
    let mut context = plugin.start_compilation(&cli_output())?;

    let mut sources = read_files(files).await?;
    sources.sort_by(|a, b| a.0.cmp(&b.0));

    let mut outputs = Vec::with_capacity(sources.len());
    for (path, content) in sources {
        let Ok(text) = String::from_utf8(content) else {
            return Err(CliError::NonUtf8Source(path));
        };
        let Some(module) = SourceModule::new(slash_path(&path), text) else {
            return Err(CliError::UnsupportedModule(path));
        };
        let transformed = syntax::transform_module(&plugin, &mut context, &module)?;
        outputs.push((output_path(out_dir, &path), transformed.code.into_bytes()));
    }

    tracing::info!(modules = outputs.len(), out_dir = %out_dir.display(), "Transformed modules");
    write_files(outputs).await?;
    Ok(plugin.on_done(&mut context))
}

/// Localize `dist_dir` in place, removing the originals.
async fn localize(config_path: Option<&Path>, dist_dir: &Path) -> Result<Vec<Diagnostic>, CliError> {
    let plugin = LocalizeAssetsPlugin::new(load_options(config_path)?)?;
    let mut context = plugin.start_compilation(&cli_output())?;

    let names: HashMap<PathBuf, String> = find_localizable_files(dist_dir).into_iter().collect();
    let mut loaded = read_files(names.keys().cloned().collect()).await?;
    loaded.sort_by(|a, b| a.0.cmp(&b.0));

    let mut compilation = Compilation::new();
    for (path, content) in loaded {
        let Some(relative) = names.get(&path) else {
            continue;
        };
        let mut info = AssetInfo::default();
        let name = plugin.interpolate_path(&mut context, relative, Some(&mut info));
        compilation.emit_asset(Asset::new(name, content).with_info(info));
    }

    let localized = plugin.on_assets_finalized(&mut compilation, &mut context)?;
    tracing::info!(assets = localized.len(), dist_dir = %dist_dir.display(), "Localized assets");

    let outputs: Vec<(PathBuf, Vec<u8>)> = compilation
        .assets
        .into_values()
        .map(|asset| (dist_dir.join(&asset.name), asset.content))
        .collect();
    let written: HashSet<PathBuf> = outputs.iter().map(|(path, _)| path.clone()).collect();
    write_files(outputs).await?;

    for path in names.into_keys().filter(|path| !written.contains(path)) {
        if let Err(source) = tokio::fs::remove_file(&path).await {
            return Err(CliError::Io { path, source });
        }
        tracing::debug!(path = %path.display(), "Removed original asset");
    }

    Ok(plugin.on_done(&mut context))
}

/// Files under `dist_dir` whose relative path carries a locale marker,
/// keyed by path.
fn find_localizable_files(dist_dir: &Path) -> Vec<(PathBuf, String)> {
    let mut found = Vec::new();

    for result in WalkBuilder::new(dist_dir)
        .hidden(false)
        .ignore(false)
        .parents(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .follow_links(false)
        .build()
    {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(?err, "Failed to read directory entry");
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let path = entry.path();
        let Ok(relative) = path.strip_prefix(dist_dir) else {
            continue;
        };
        let name = slash_path(relative);
        if name.contains(LOCALE_MARKER) || name.contains(FILENAME_PLACEHOLDER) {
            found.push((path.to_path_buf(), name));
        }
    }

    found
}

/// `path` with `/` separators, as asset names are written.
fn slash_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Where a transformed `source` lands under `out_dir`. Root and parent
/// components are dropped so output never escapes `out_dir`.
fn output_path(out_dir: &Path, source: &Path) -> PathBuf {
    let relative: PathBuf =
        source.components().filter(|component| matches!(component, Component::Normal(_))).collect();
    out_dir.join(relative)
}

/// Read every path concurrently.
async fn read_files(paths: Vec<PathBuf>) -> Result<Vec<(PathBuf, Vec<u8>)>, CliError> {
    stream::iter(paths)
        .map(|path| async move {
            match tokio::fs::read(&path).await {
                Ok(content) => Ok((path, content)),
                Err(source) => Err(CliError::Io { path, source }),
            }
        })
        .buffer_unordered(num_cpus::get())
        .try_collect()
        .await
}

/// Write every file concurrently, creating parent directories.
async fn write_files(files: Vec<(PathBuf, Vec<u8>)>) -> Result<(), CliError> {
    stream::iter(files)
        .map(|(path, content)| async move {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| CliError::Io { path: parent.to_path_buf(), source })?;
            }
            match tokio::fs::write(&path, content).await {
                Ok(()) => Ok(()),
                Err(source) => Err(CliError::Io { path, source }),
            }
        })
        .buffer_unordered(num_cpus::get())
        .try_collect::<Vec<()>>()
        .await?;
    Ok(())
}
