//! Escaping translations for the string literal they land in.
//!
//! Minifiers fold adjacent literals and change quote characters, so the
//! delimiter around a placeholder cannot be known. Every delimiter is
//! escaped instead; `\'`, `\"`, `` \` `` and `\$` are valid in all three
//! literal kinds.

use serde_json::Value;

/// Escape `value` for the body of any JavaScript string or template literal.
#[must_use]
pub fn escape_literal(value: &str) -> String {
    let json = Value::String(value.to_string()).to_string();
    let body = json
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(&json);

    body.replace('\'', "\\'").replace('`', "\\`").replace("${", "\\${")
}
