//! JavaScript minification over the Tree-sitter token stream.
//!
//! The source is parsed once; leaf tokens are re-joined with the least
//! whitespace that keeps the token boundaries and automatic semicolon
//! insertion intact. Comments are dropped except `/*!` license comments.

use crate::{FileUnit, Transform, TransformError};
use std::path::Path;
use tree_sitter::{Node, Parser};

/// Nodes copied verbatim as a single token
const ATOMIC_KINDS: &[&str] = &[
    "string",
    "template_string",
    "regex",
    "comment",
    "html_comment",
    "hash_bang_line",
];

/// After these tokens a line break never changes the parse
const BREAK_SAFE_AFTER: &[&str] = &[";", "{", "(", "[", ",", "=", ":", "?", "&&", "||", "=>"];

/// Before these tokens a line break never changes the parse
const BREAK_SAFE_BEFORE: &[&str] = &[";", "}", ")", "]", ",", ".", ":", "?"];

#[derive(Debug, Clone, Copy)]
struct Token<'s> {
    text: &'s str,
    start: usize,
    end: usize,
    comment: bool,
}

/// Minify a script, failing on syntax errors
pub fn minify_script(source: &str, path: &Path) -> Result<String, TransformError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_javascript::LANGUAGE.into())
        .map_err(|e| script_error(path, 0, 0, e.to_string()))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| script_error(path, 0, 0, "parser produced no tree".to_string()))?;
    let root = tree.root_node();

    if root.has_error() {
        let node = first_error(root).unwrap_or(root);
        let position = node.start_position();
        let message = if node.is_missing() {
            format!("missing `{}`", node.kind())
        } else {
            format!(
                "unexpected `{}`",
                source[node.byte_range()].chars().take(24).collect::<String>()
            )
        };
        return Err(script_error(
            path,
            position.row + 1,
            position.column + 1,
            message,
        ));
    }

    let mut tokens = Vec::new();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        collect_tokens(child, source, &mut tokens);
    }

    Ok(join_tokens(source, &tokens))
}

fn script_error(path: &Path, line: usize, column: usize, message: String) -> TransformError {
    TransformError::Script {
        path: path.to_path_buf(),
        line,
        column,
        message,
    }
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() || child.is_missing() {
            if let Some(found) = first_error(child) {
                return Some(found);
            }
        }
    }
    None
}

fn collect_tokens<'s>(node: Node<'_>, source: &'s str, out: &mut Vec<Token<'s>>) {
    let kind = node.kind();
    if node.child_count() == 0 || ATOMIC_KINDS.contains(&kind) {
        let range = node.byte_range();
        if range.is_empty() {
            return;
        }
        out.push(Token {
            text: &source[range.clone()],
            start: range.start,
            end: range.end,
            comment: kind == "comment" || kind == "html_comment",
        });
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_tokens(child, source, out);
    }
}

fn has_line_break(text: &str) -> bool {
    text.contains(['\n', '\r', '\u{2028}', '\u{2029}'])
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '$' | '\\' | '#') || !c.is_ascii()
}

fn needs_line_break(prev: &str, next: &str) -> bool {
    if prev.starts_with("#!") {
        return true;
    }
    !BREAK_SAFE_AFTER.contains(&prev) && !BREAK_SAFE_BEFORE.contains(&next)
}

fn needs_space(prev: &str, next: &str) -> bool {
    let (Some(a), Some(b)) = (prev.chars().last(), next.chars().next()) else {
        return false;
    };

    if is_word_char(a) && is_word_char(b) {
        return true;
    }
    // `1 .toFixed()` must not become a decimal point
    if prev.starts_with(|c: char| c.is_ascii_digit()) && b == '.' {
        return true;
    }
    matches!(
        (a, b),
        ('+', '+') | ('-', '-') | ('/', '/') | ('/', '*') | ('<', '!') | ('-', '>')
    )
}

fn join_tokens(source: &str, tokens: &[Token<'_>]) -> String {
    let mut out = String::with_capacity(source.len() / 2);
    let mut prev: Option<&str> = None;
    let mut last_end = 0;
    let mut gap = false;
    let mut gap_break = false;

    for token in tokens {
        let between = &source[last_end..token.start];
        if !between.is_empty() {
            gap = true;
            gap_break |= has_line_break(between);
        }
        last_end = token.end;

        if token.comment && !token.text.starts_with("/*!") {
            gap = true;
            gap_break |= has_line_break(token.text) || !token.text.starts_with("/*");
            continue;
        }

        if let Some(prev) = prev {
            if gap_break && needs_line_break(prev, token.text) {
                out.push('\n');
            } else if gap && needs_space(prev, token.text) {
                out.push(' ');
            }
        }
        out.push_str(token.text);

        if token.comment {
            // license comment keeps its own line
            out.push('\n');
            prev = None;
        } else {
            prev = Some(token.text);
        }
        gap = false;
        gap_break = false;
    }

    out
}

/// Pipeline step: script minification
#[derive(Debug, Clone, Default)]
pub struct ScriptMinify;

impl Transform for ScriptMinify {
    fn name(&self) -> &'static str {
        "js-minify"
    }

    fn apply(&self, unit: FileUnit) -> Result<FileUnit, TransformError> {
        tracing::debug!("Minifying script: {:?}", unit.origin);
        let code = minify_script(unit.text()?, &unit.origin)?;
        Ok(unit.with_text(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minify(source: &str) -> String {
        minify_script(source, Path::new("test.js")).unwrap()
    }

    #[test]
    fn test_strips_comments_and_whitespace() {
        let source = "function add(a, b) {\n  // sum\n  return a + b;\n}\n";
        assert_eq!(minify(source), "function add(a,b){return a+b;}");
    }

    #[test]
    fn test_keeps_asi_line_breaks() {
        assert_eq!(minify("let a = 1\nlet b = 2\n"), "let a=1\nlet b=2");
    }

    #[test]
    fn test_return_line_break_survives() {
        let out = minify("function f() {\n  return\n  42;\n}\n");
        assert!(out.contains("return\n42"));
    }

    #[test]
    fn test_literals_untouched() {
        let out = minify("var s = \"a  b // c\";\nvar t = `x  ${ s }`;\nvar r = /a  b/g;\n");
        assert!(out.contains("\"a  b // c\""));
        assert!(out.contains("`x  ${ s }`"));
        assert!(out.contains("/a  b/g"));
    }

    #[test]
    fn test_operator_boundaries() {
        assert_eq!(minify("x = a + +b;"), "x=a+ +b;");
        assert_eq!(minify("y = a - -b;"), "y=a- -b;");
        assert_eq!(minify("z = 1 .toString();"), "z=1 .toString();");
    }

    #[test]
    fn test_license_comment_kept() {
        let out = minify("/*! (c) vendor */\nvar x = 1;\n/* drop */\n");
        assert_eq!(out, "/*! (c) vendor */\nvar x=1;");
    }

    #[test]
    fn test_block_comment_between_words() {
        assert_eq!(minify("var/* c */x = 1;"), "var x=1;");
    }

    #[test]
    fn test_syntax_error() {
        let err = minify_script("function (", Path::new("src/js/bad.js")).unwrap_err();
        match err {
            TransformError::Script { path, line, .. } => {
                assert_eq!(path, Path::new("src/js/bad.js"));
                assert_eq!(line, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_script() {
        assert_eq!(minify(""), "");
        assert_eq!(minify("// only a comment\n"), "");
    }
}
