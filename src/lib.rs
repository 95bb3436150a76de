//! localize-assets
//!
//! Build-time localization for JavaScript bundles. Calls of a localization
//! function are replaced by placeholders while modules are parsed, and every
//! finished asset is then copied once per locale with the placeholders swapped
//! for translations. Single-locale builds inline translations directly.

pub mod cli;
pub mod compilation;
pub mod config;
pub mod diagnostics;
pub mod edit;
pub mod encoder;
pub mod error;
pub mod filename;
pub mod input;
pub mod localizer;
pub mod placeholder;
pub mod plugin;
pub mod source_map;
pub mod syntax;
pub mod types;

pub use error::LocalizeError;
pub use plugin::LocalizeAssetsPlugin;
