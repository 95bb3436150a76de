//! Options file loading.

use std::path::Path;

use super::{
    ConfigError,
    LocaleSource,
    Options,
};

/// Options file looked up in a project root.
pub const CONFIG_FILE_NAME: &str = ".localize-assets.json";

/// Load options from a JSON file.
///
/// Relative locale paths are resolved against the directory holding the file,
/// so the options behave the same regardless of the working directory.
///
/// # Errors
/// - File read error
/// - JSON parse error (including unknown fields)
pub fn load_from_file(config_path: &Path) -> Result<Options, ConfigError> {
    tracing::debug!("Loading options from: {:?}", config_path);

    let content = std::fs::read_to_string(config_path)?;
    let mut options: Options = serde_json::from_str(&content)?;

    if let Some(base_dir) = config_path.parent() {
        for source in options.locales.values_mut() {
            if let LocaleSource::Path(path) = source
                && path.is_relative()
            {
                *path = base_dir.join(&*path);
            }
        }
    }

    Ok(options)
}

/// Load [`CONFIG_FILE_NAME`] from `root`.
///
/// # Returns
/// - `Ok(Some(options))`: the file exists and parsed
/// - `Ok(None)`: no options file in `root`
///
/// # Errors
/// - File read error
/// - JSON parse error
pub fn load_from_root(root: &Path) -> Result<Option<Options>, ConfigError> {
    let config_path = root.join(CONFIG_FILE_NAME);

    if !config_path.exists() {
        tracing::debug!("Options file not found: {:?}", config_path);
        return Ok(None);
    }

    load_from_file(&config_path).map(Some)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    #[rstest]
    fn test_load_from_root_with_valid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_content = r#"{"locales": {"en": {"hi": "Hi"}}, "functionName": "t"}"#;
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), config_content).unwrap();

        let options = load_from_root(temp_dir.path()).unwrap().unwrap();

        assert_eq!(options.function_name, "t");
        assert_eq!(options.locale_names(), vec!["en".to_string()]);
    }

    #[rstest]
    fn test_load_from_root_no_config_file() {
        let temp_dir = TempDir::new().unwrap();

        let result = load_from_root(temp_dir.path());

        assert!(result.unwrap().is_none());
    }

    #[rstest]
    fn test_load_from_file_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("options.json");
        fs::write(&path, "invalid json").unwrap();

        let result = load_from_file(&path);

        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[rstest]
    fn test_load_from_file_missing_file() {
        let temp_dir = TempDir::new().unwrap();

        let result = load_from_file(&temp_dir.path().join("absent.json"));

        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }

    #[rstest]
    fn test_load_from_file_resolves_relative_locale_paths() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("options.json");
        fs::write(&path, r#"{"locales": {"en": "locales/en.json", "de": "/abs/de.json"}}"#)
            .unwrap();

        let options = load_from_file(&path).unwrap();

        assert_eq!(
            options.locales["en"],
            LocaleSource::Path(temp_dir.path().join("locales/en.json"))
        );
        assert_eq!(options.locales["de"], LocaleSource::Path(PathBuf::from("/abs/de.json")));
    }
}
