//! Source module input definitions.

use std::path::Path;

/// A source module handed to the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceModule {
    /// Module resource path, used in diagnostics.
    pub path: String,
    /// Full source text.
    pub text: String,
    /// Grammar picked from the extension.
    pub language: ProgrammingLanguage,
}

impl SourceModule {
    /// Returns `None` when the path does not name a supported language.
    #[must_use]
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Option<Self> {
        let path = path.into();
        let language = ProgrammingLanguage::from_path(&path)?;
        Some(Self { path, text: text.into(), language })
    }
}

/// Supported programming languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgrammingLanguage {
    /// `.js`, `.mjs`, `.cjs`.
    JavaScript,
    /// `.jsx`.
    Jsx,
    /// `.ts`, `.mts`, `.cts`.
    TypeScript,
    /// `.tsx`.
    Tsx,
}

impl ProgrammingLanguage {
    /// Infers the programming language from file extension.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        match Path::new(path).extension().and_then(|ext| ext.to_str()) {
            Some("tsx") => Some(Self::Tsx),
            Some("ts" | "mts" | "cts") => Some(Self::TypeScript),
            Some("jsx") => Some(Self::Jsx),
            Some("js" | "mjs" | "cjs") => Some(Self::JavaScript),
            _ => None,
        }
    }

    /// The tree-sitter grammar for this language.
    #[must_use]
    pub fn tree_sitter_language(&self) -> tree_sitter::Language {
        match self {
            Self::JavaScript | Self::Jsx => tree_sitter_javascript::LANGUAGE.into(),
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;

    #[rstest]
    #[case::tsx("file.tsx", Some(ProgrammingLanguage::Tsx))]
    #[case::ts("file.ts", Some(ProgrammingLanguage::TypeScript))]
    #[case::mts("file.mts", Some(ProgrammingLanguage::TypeScript))]
    #[case::jsx("file.jsx", Some(ProgrammingLanguage::Jsx))]
    #[case::js("file.js", Some(ProgrammingLanguage::JavaScript))]
    #[case::mjs("file.mjs", Some(ProgrammingLanguage::JavaScript))]
    #[case::multiple_dots("file.config.ts", Some(ProgrammingLanguage::TypeScript))]
    #[case::json("file.json", None)]
    #[case::no_ext("file", None)]
    #[case::unknown_ext("file.txt", None)]
    fn test_from_path(#[case] path: &str, #[case] expected: Option<ProgrammingLanguage>) {
        let lang = ProgrammingLanguage::from_path(path);
        assert_eq!(lang, expected);
    }

    #[rstest]
    fn source_module_rejects_unsupported_paths() {
        assert!(SourceModule::new("styles.css", "a{}").is_none());
        assert_eq!(
            SourceModule::new("src/app.ts", "x").map(|module| module.language),
            Some(ProgrammingLanguage::TypeScript)
        );
    }
}
