//! Plugin options and their validation.
/// Options file loader
mod loader;
/// Option types and validation
mod types;

pub use loader::{
    CONFIG_FILE_NAME,
    load_from_file,
    load_from_root,
};
pub use types::{
    ConfigError,
    DEFAULT_FUNCTION_NAME,
    LOCALE_MARKER,
    LocaleSource,
    Options,
    OutputOptions,
    ValidationError,
};
