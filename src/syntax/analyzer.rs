//! Tree-sitter analysis of source modules.
pub mod extractor;
pub mod query_loader;
pub mod types;
