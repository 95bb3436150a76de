//! Load Tree-sitter queries from files.

use std::sync::OnceLock;

use tree_sitter::Query;

use crate::input::source::ProgrammingLanguage;

/// A bundled query source.
struct QueryFile {
    /// Query text.
    content: &'static str,
    /// Name used in logs.
    name: &'static str,
}

/// Queries for JavaScript and JSX.
const JS_QUERIES: &[QueryFile] = &[QueryFile {
    content: include_str!("../../../queries/javascript/localize-call.scm"),
    name: "localize-call",
}];

/// Queries for TypeScript.
const TS_QUERIES: &[QueryFile] = &[QueryFile {
    content: include_str!("../../../queries/typescript/localize-call.scm"),
    name: "localize-call",
}];

/// Queries for TSX.
const TSX_QUERIES: &[QueryFile] = &[QueryFile {
    content: include_str!("../../../queries/tsx/localize-call.scm"),
    name: "localize-call",
}];

/// Compiled [`JS_QUERIES`].
static JS_QUERY_CACHE: OnceLock<Vec<Query>> = OnceLock::new();
/// Compiled [`TS_QUERIES`].
static TS_QUERY_CACHE: OnceLock<Vec<Query>> = OnceLock::new();
/// Compiled [`TSX_QUERIES`].
static TSX_QUERY_CACHE: OnceLock<Vec<Query>> = OnceLock::new();

/// Compile the queries of `language`, skipping any that fail.
fn parse_queries(language: ProgrammingLanguage) -> Vec<Query> {
    let tree_sitter_lang = language.tree_sitter_language();

    let query_files = match language {
        ProgrammingLanguage::JavaScript | ProgrammingLanguage::Jsx => JS_QUERIES,
        ProgrammingLanguage::TypeScript => TS_QUERIES,
        ProgrammingLanguage::Tsx => TSX_QUERIES,
    };

    query_files
        .iter()
        .filter_map(|qf| {
            Query::new(&tree_sitter_lang, qf.content)
                .map_err(|e| tracing::error!("Failed to parse {} query: {e:?}", qf.name))
                .ok()
        })
        .collect()
}

/// Loads cached queries for a language. Queries are parsed once per language.
#[must_use]
pub fn load_queries(language: ProgrammingLanguage) -> &'static [Query] {
    match language {
        ProgrammingLanguage::JavaScript | ProgrammingLanguage::Jsx => {
            JS_QUERY_CACHE.get_or_init(|| parse_queries(ProgrammingLanguage::JavaScript))
        }
        ProgrammingLanguage::TypeScript => {
            TS_QUERY_CACHE.get_or_init(|| parse_queries(ProgrammingLanguage::TypeScript))
        }
        ProgrammingLanguage::Tsx => {
            TSX_QUERY_CACHE.get_or_init(|| parse_queries(ProgrammingLanguage::Tsx))
        }
    }
}
