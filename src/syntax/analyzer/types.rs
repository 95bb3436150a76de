//! Types for the analyzer module

use std::str::FromStr;

use thiserror::Error;

use crate::encoder::CallArgument;
use crate::types::SourcePosition;

/// Capture names used by the localization call query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureName {
    /// The whole call (e.g., `__("key")`)
    Call,
    /// The callee (e.g., `__` or `i18n.t`)
    Callee,
    /// The parenthesized argument list
    Args,
}

impl CaptureName {
    /// Name as written in the query file.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Call => "localize.call",
            Self::Callee => "localize.callee",
            Self::Args => "localize.args",
        }
    }
}

/// Capture name not used by the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseCaptureNameError;

impl FromStr for CaptureName {
    type Err = ParseCaptureNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "localize.call" => Ok(Self::Call),
            "localize.callee" => Ok(Self::Callee),
            "localize.args" => Ok(Self::Args),
            _ => Err(ParseCaptureNameError),
        }
    }
}

/// A call of the localization function in a parsed module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizeCall {
    /// Arguments in source order.
    pub arguments: Vec<CallArgument>,
    /// First byte of the whole call expression.
    pub start_byte: usize,
    /// Byte past the call expression.
    pub end_byte: usize,
    /// Start of the call.
    pub position: SourcePosition,
}

/// Defines errors that may occur during the analysis process
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// Error when failing to set the language for the parser
    #[error("Failed to set language for parser: {0}")]
    LanguageSetup(#[from] tree_sitter::LanguageError),
    /// Error when failing to parse source code
    #[error("Failed to parse source code")]
    ParseFailed,
    /// Error when no usable query exists for a language
    #[error("Query execution failed: {0}")]
    QueryExecution(String),
}
