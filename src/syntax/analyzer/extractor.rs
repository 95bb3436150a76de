//! Extracts calls of the localization function from a source file using Tree-sitter.

use std::iter::Peekable;
use std::str::Chars;
use std::string::ToString;

use tree_sitter::{
    Language,
    Node,
    Parser,
    Query,
    QueryCursor,
    StreamingIteratorMut,
};

use crate::encoder::CallArgument;
use crate::syntax::analyzer::types::{
    AnalyzerError,
    CaptureName,
    LocalizeCall,
};

/// Extracts text content from a tree-sitter node
fn extract_node_text(node: Node<'_>, source_bytes: &[u8]) -> Option<String> {
    node.utf8_text(source_bytes).ok().map(ToString::to_string)
}

/// Callee text with whitespace removed, so `i18n . t` matches `i18n.t`.
fn normalized_callee(node: Node<'_>, source_bytes: &[u8]) -> Option<String> {
    extract_node_text(node, source_bytes).map(|text| text.split_whitespace().collect())
}

/// Extracts calls of `function_name` in source order.
///
/// # Errors
/// Returns `AnalyzerError` if:
/// - No query is available for the language
/// - Language setup fails
/// - Source code parsing fails
pub fn analyze_localize_calls(
    source: &str,
    language: &Language,
    queries: &[Query],
    function_name: &str,
) -> Result<Vec<LocalizeCall>, AnalyzerError> {
    if queries.is_empty() {
        return Err(AnalyzerError::QueryExecution(
            "no localization call query for this language".to_string(),
        ));
    }

    let mut parser = Parser::new();
    parser.set_language(language).map_err(AnalyzerError::LanguageSetup)?;
    let tree = parser.parse(source, None).ok_or(AnalyzerError::ParseFailed)?;

    let source_bytes = source.as_bytes();
    let root_node = tree.root_node();
    let mut calls = Vec::new();

    for query in queries {
        let cap_names = query.capture_names();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(query, root_node, source_bytes);

        while let Some(match_) = matches.next_mut() {
            let mut call_node: Option<Node<'_>> = None;
            let mut callee: Option<String> = None;
            let mut args_node: Option<Node<'_>> = None;

            for capture in match_.captures {
                let Some(cap_name) = cap_names.get(capture.index as usize) else {
                    continue;
                };
                let Ok(capture_name) = cap_name.parse::<CaptureName>() else {
                    continue;
                };

                match capture_name {
                    CaptureName::Call => call_node = Some(capture.node),
                    CaptureName::Callee => callee = normalized_callee(capture.node, source_bytes),
                    CaptureName::Args => args_node = Some(capture.node),
                }
            }

            let (Some(call_node), Some(callee), Some(args_node)) = (call_node, callee, args_node)
            else {
                continue;
            };
            if callee != function_name {
                continue;
            }

            calls.push(LocalizeCall {
                arguments: call_arguments(args_node, source_bytes),
                start_byte: call_node.start_byte(),
                end_byte: call_node.end_byte(),
                position: call_node.start_position().into(),
            });
        }
    }

    calls.sort_by_key(|call| call.start_byte);
    Ok(calls)
}

/// Arguments of a call, string literals decoded.
fn call_arguments(args_node: Node<'_>, source_bytes: &[u8]) -> Vec<CallArgument> {
    let mut cursor = args_node.walk();
    args_node
        .named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .map(|child| {
            let text = extract_node_text(child, source_bytes).unwrap_or_default();
            if child.kind() == "string"
                && let Some(value) = unescape_string_literal(&text)
            {
                CallArgument::StringLiteral(value)
            } else {
                CallArgument::Expression(text)
            }
        })
        .collect()
}

/// Value of a quoted JavaScript string literal.
///
/// Lone surrogates become U+FFFD. Returns `None` for text that is not a
/// well-formed literal.
#[must_use]
pub fn unescape_string_literal(raw: &str) -> Option<String> {
    let quote = raw.chars().next().filter(|c| matches!(c, '"' | '\''))?;
    let body = raw.strip_prefix(quote)?.strip_suffix(quote)?;

    let mut units: Vec<u16> = Vec::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            push_char(&mut units, c);
            continue;
        }
        match chars.next()? {
            'n' => push_char(&mut units, '\n'),
            't' => push_char(&mut units, '\t'),
            'r' => push_char(&mut units, '\r'),
            'b' => push_char(&mut units, '\u{8}'),
            'f' => push_char(&mut units, '\u{c}'),
            'v' => push_char(&mut units, '\u{b}'),
            '0' if !chars.peek().is_some_and(char::is_ascii_digit) => units.push(0),
            'x' => units.push(read_hex(&mut chars, 2)?),
            'u' if chars.peek() == Some(&'{') => {
                chars.next();
                let mut digits = String::new();
                loop {
                    match chars.next()? {
                        '}' => break,
                        digit => digits.push(digit),
                    }
                }
                if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
                    return None;
                }
                let code = u32::from_str_radix(&digits, 16).ok()?;
                push_char(&mut units, char::from_u32(code)?);
            }
            'u' => units.push(read_hex(&mut chars, 4)?),
            // Line continuations.
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            other => push_char(&mut units, other),
        }
    }

    Some(String::from_utf16_lossy(&units))
}

/// Append `c` as UTF-16.
fn push_char(units: &mut Vec<u16>, c: char) {
    let mut buf = [0_u16; 2];
    units.extend_from_slice(c.encode_utf16(&mut buf));
}

/// Exactly `count` hex digits as one code unit.
fn read_hex(chars: &mut Peekable<Chars<'_>>, count: usize) -> Option<u16> {
    let digits: String = chars.by_ref().take(count).collect();
    if digits.len() != count || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(&digits, 16).ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;
    use crate::input::source::ProgrammingLanguage;
    use crate::syntax::analyzer::query_loader::load_queries;
    use crate::types::SourcePosition;

    fn analyze(source: &str, language: ProgrammingLanguage, function_name: &str) -> Vec<LocalizeCall> {
        analyze_localize_calls(
            source,
            &language.tree_sitter_language(),
            load_queries(language),
            function_name,
        )
        .unwrap()
    }

    fn literal(value: &str) -> CallArgument {
        CallArgument::StringLiteral(value.to_string())
    }

    #[rstest]
    fn finds_calls_with_positions() {
        let source = "const a = __(\"hello\");\nconsole.log(__('bye'));\n";

        let calls = analyze(source, ProgrammingLanguage::JavaScript, "__");

        assert_that!(
            calls,
            elements_are![
                all![
                    field!(LocalizeCall.arguments, elements_are![eq(&literal("hello"))]),
                    field!(LocalizeCall.start_byte, eq(&10)),
                    field!(LocalizeCall.end_byte, eq(&21)),
                    field!(LocalizeCall.position, eq(&SourcePosition { line: 0, character: 10 }))
                ],
                all![
                    field!(LocalizeCall.arguments, elements_are![eq(&literal("bye"))]),
                    field!(LocalizeCall.position, eq(&SourcePosition { line: 1, character: 12 }))
                ]
            ]
        );
    }

    #[rstest]
    fn other_functions_are_ignored() {
        let source = "t('a'); _('b'); obj.__('c'); __('d');";

        let calls = analyze(source, ProgrammingLanguage::JavaScript, "__");

        assert_that!(calls, len(eq(1)));
        assert_that!(calls[0].arguments, elements_are![eq(&literal("d"))]);
    }

    #[rstest]
    fn member_callee() {
        let source = "i18n.t('title'); t('other'); i18n .t('spaced');";

        let calls = analyze(source, ProgrammingLanguage::JavaScript, "i18n.t");

        assert_that!(calls, len(eq(2)));
    }

    #[rstest]
    fn non_literal_arguments_are_kept_as_expressions() {
        let source = "__(key); __(`tpl`); __('a', 'b'); __();";

        let calls = analyze(source, ProgrammingLanguage::JavaScript, "__");

        let arguments: Vec<_> = calls.into_iter().map(|call| call.arguments).collect();
        assert_that!(
            arguments,
            elements_are![
                elements_are![eq(&CallArgument::Expression("key".to_string()))],
                elements_are![eq(&CallArgument::Expression("`tpl`".to_string()))],
                elements_are![eq(&literal("a")), eq(&literal("b"))],
                is_empty()
            ]
        );
    }

    #[rstest]
    fn nested_calls_are_both_reported() {
        let source = "__(__('inner'))";

        let calls = analyze(source, ProgrammingLanguage::JavaScript, "__");

        assert_that!(calls, len(eq(2)));
        assert_that!(calls[0].start_byte, eq(0));
        assert_that!(calls[1].arguments, elements_are![eq(&literal("inner"))]);
    }

    #[rstest]
    #[case::typescript(ProgrammingLanguage::TypeScript, "const s: string = __('k') as string;")]
    #[case::tsx(ProgrammingLanguage::Tsx, "const el = <p title={__('k')}>{__('k')}</p>;")]
    #[case::jsx(ProgrammingLanguage::Jsx, "const el = <p>{__('k')}</p>;")]
    fn typed_and_jsx_sources(#[case] language: ProgrammingLanguage, #[case] source: &str) {
        let calls = analyze(source, language, "__");

        assert_that!(calls, not(is_empty()));
        assert!(calls.iter().all(|call| call.arguments == vec![literal("k")]));
    }

    #[rstest]
    fn missing_query_is_an_error() {
        let language = ProgrammingLanguage::JavaScript.tree_sitter_language();

        let result = analyze_localize_calls("__('a')", &language, &[], "__");

        assert!(matches!(result, Err(AnalyzerError::QueryExecution(_))));
    }

    #[rstest]
    #[case::plain("'hello'", Some("hello"))]
    #[case::double("\"say \\\"hi\\\"\"", Some("say \"hi\""))]
    #[case::newline("'a\\nb'", Some("a\nb"))]
    #[case::hex("'\\x41'", Some("A"))]
    #[case::unicode("'\\u00e9t\\u00e9'", Some("été"))]
    #[case::code_point("'\\u{1F600}'", Some("😀"))]
    #[case::surrogate_pair("'\\uD83D\\uDE00'", Some("😀"))]
    #[case::lone_surrogate("'\\uD83D'", Some("\u{FFFD}"))]
    #[case::null("'\\0'", Some("\0"))]
    #[case::identity("'\\q'", Some("q"))]
    #[case::line_continuation("'a\\\nb'", Some("ab"))]
    #[case::bad_hex("'\\xZZ'", None)]
    #[case::unterminated_code_point("'\\u{41'", None)]
    #[case::not_a_literal("`x`", None)]
    fn unescapes_literals(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_that!(unescape_string_literal(raw).as_deref(), eq(expected));
    }
}
