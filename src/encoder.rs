//! Replacement of localization calls while modules are parsed.

use serde_json::Value;

use crate::compilation::BuildContext;
use crate::config::Options;
use crate::diagnostics::{
    Diagnostic,
    Location,
};
use crate::error::LocalizeError;
use crate::placeholder::encode_placeholder;

/// An argument of a localization call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArgument {
    /// A string literal, escapes already decoded.
    StringLiteral(String),
    /// Any other expression, kept as source text for diagnostics.
    Expression(String),
}

/// A call of the localization function found by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    /// Arguments in source order.
    pub arguments: Vec<CallArgument>,
    /// Start of the call; the line is 0-based.
    pub location: Location,
}

impl CallSite {
    /// Call with `arguments` at `location`.
    #[must_use]
    pub const fn new(arguments: Vec<CallArgument>, location: Location) -> Self {
        Self { arguments, location }
    }

    /// The key of a `fn("literal")` call.
    #[must_use]
    pub fn string_key(&self) -> Option<&str> {
        match self.arguments.as_slice() {
            [CallArgument::StringLiteral(key)] => Some(key),
            _ => None,
        }
    }
}

/// What a valid call is replaced with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallReplacement {
    /// The string key of the call.
    pub key: String,
    /// A JavaScript string literal.
    pub expression: String,
}

/// Turn a call into its replacement.
///
/// Returns `None` and records a warning for calls that are not
/// `fn("literal")`; those stay as written.
///
/// # Errors
/// Returns [`LocalizeError::MissingLocalization`] under `throwOnMissing`.
pub fn encode_call(
    context: &mut BuildContext,
    options: &Options,
    call: &CallSite,
) -> Result<Option<CallReplacement>, LocalizeError> {
    let Some(key) = call.string_key() else {
        context.warn(Diagnostic::confusing_usage(&options.function_name, &call.location));
        return Ok(None);
    };

    context.validate_key(key, &call.location, options.throw_on_missing)?;
    context.mark_used(key);

    let value = match context.single_locale() {
        Some(locale) => context.locales().resolve(locale, key).to_string(),
        None => encode_placeholder(key),
    };

    Ok(Some(CallReplacement {
        key: key.to_string(),
        expression: Value::String(value).to_string(),
    }))
}
