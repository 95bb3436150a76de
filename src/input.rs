//! Build inputs: locale data and source modules.
pub mod locale;
pub mod source;
