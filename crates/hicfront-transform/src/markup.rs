//! HTML include directives.
//!
//! `@@include('partials/head.html')` is replaced by the content of the named
//! file, resolved relative to the file containing the directive. An optional
//! JSON object, `@@include('card.html', {"title": "News"})`, provides variables
//! that replace `@@title` inside the included file and everything it includes.

use crate::{FileUnit, Transform, TransformError};
use regex::Regex;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Deepest include chain accepted before giving up
const MAX_DEPTH: usize = 32;

type Context = Map<String, Value>;

/// Expands include directives for a configurable trigger token
#[derive(Debug, Clone)]
pub struct IncludeResolver {
    include_re: Regex,
    var_re: Regex,
}

impl IncludeResolver {
    pub fn new(prefix: &str) -> Result<Self, regex::Error> {
        let escaped = regex::escape(prefix);
        Ok(Self {
            include_re: Regex::new(&format!(
                r#"{escaped}include\(\s*(?:'([^']*)'|"([^"]*)")"#
            ))?,
            // a dot only continues the name when an identifier follows it
            var_re: Regex::new(&format!(r"{escaped}([A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*)"))?,
        })
    }

    /// Expand every include in `content`, which was read from `path`
    pub fn resolve(&self, path: &Path, content: &str) -> Result<String, TransformError> {
        let mut stack = vec![normalize(path)];
        self.expand(path, content, &Context::new(), &mut stack)
    }

    fn expand(
        &self,
        path: &Path,
        content: &str,
        context: &Context,
        stack: &mut Vec<PathBuf>,
    ) -> Result<String, TransformError> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut out = String::with_capacity(content.len());
        let mut rest = content;

        while let Some(caps) = self.include_re.captures(rest) {
            let Some(directive) = caps.get(0) else { break };
            let target = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();

            out.push_str(&rest[..directive.start()]);
            let after = &rest[directive.end()..];
            let (local, consumed) =
                parse_arguments(after).map_err(|message| include_error(path, message))?;
            rest = &after[consumed..];

            let include_path = dir.join(target);
            let included = std::fs::read_to_string(&include_path).map_err(|e| {
                include_error(path, format!("cannot read `{}`: {}", target, e))
            })?;

            let key = normalize(&include_path);
            if stack.contains(&key) {
                let chain: Vec<String> = stack
                    .iter()
                    .chain(std::iter::once(&key))
                    .map(|p| p.display().to_string())
                    .collect();
                return Err(include_error(
                    path,
                    format!("include cycle: {}", chain.join(" -> ")),
                ));
            }
            if stack.len() >= MAX_DEPTH {
                return Err(include_error(
                    path,
                    format!("includes nested deeper than {}", MAX_DEPTH),
                ));
            }

            let mut merged = context.clone();
            if let Some(local) = local {
                merged.extend(local);
            }
            let included = self.substitute(&included, &merged);

            stack.push(key);
            let expanded = self.expand(&include_path, &included, &merged, stack)?;
            stack.pop();

            out.push_str(&expanded);
        }

        out.push_str(rest);
        Ok(out)
    }

    /// Replace `@@name` with context values; unknown names stay as written
    fn substitute(&self, content: &str, context: &Context) -> String {
        if context.is_empty() {
            return content.to_string();
        }

        self.var_re
            .replace_all(content, |caps: &regex::Captures<'_>| {
                let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
                let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                if name == "include" {
                    return whole.to_string();
                }
                match lookup(context, name) {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Null) => String::new(),
                    Some(other) => other.to_string(),
                    None => whole.to_string(),
                }
            })
            .into_owned()
    }
}

fn include_error(path: &Path, message: String) -> TransformError {
    TransformError::Include {
        path: path.to_path_buf(),
        message,
    }
}

/// Canonical form used for cycle detection
fn normalize(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Dotted lookup: `@@meta.title`
fn lookup<'a>(context: &'a Context, name: &str) -> Option<&'a Value> {
    let mut parts = name.split('.');
    let mut value = context.get(parts.next()?)?;
    for part in parts {
        value = value.get(part)?;
    }
    Some(value)
}

fn skip_whitespace(text: &str, pos: usize) -> usize {
    pos + (text[pos..].len() - text[pos..].trim_start().len())
}

/// Parse what follows the quoted include path: either `)` or `, {json})`.
/// Returns the context and the number of bytes consumed.
fn parse_arguments(after: &str) -> Result<(Option<Context>, usize), String> {
    let bytes = after.as_bytes();
    let mut pos = skip_whitespace(after, 0);

    match bytes.get(pos) {
        Some(b')') => return Ok((None, pos + 1)),
        Some(b',') => pos += 1,
        _ => return Err("expected `)` after include path".to_string()),
    }

    pos = skip_whitespace(after, pos);
    if bytes.get(pos) != Some(&b'{') {
        return Err("include context must be a JSON object".to_string());
    }
    let end = pos
        + matching_brace(&after[pos..]).ok_or_else(|| "unterminated include context".to_string())?;
    let context: Context = serde_json::from_str(&after[pos..=end])
        .map_err(|e| format!("invalid include context: {}", e))?;

    pos = skip_whitespace(after, end + 1);
    if bytes.get(pos) != Some(&b')') {
        return Err("expected `)` after include context".to_string());
    }
    Ok((Some(context), pos + 1))
}

/// Byte offset of the brace closing the object that starts at offset 0
fn matching_brace(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Pipeline step: include expansion
#[derive(Debug, Clone)]
pub struct ResolveIncludes {
    resolver: IncludeResolver,
}

impl ResolveIncludes {
    pub fn new(resolver: IncludeResolver) -> Self {
        Self { resolver }
    }
}

impl Transform for ResolveIncludes {
    fn name(&self) -> &'static str {
        "include"
    }

    fn apply(&self, unit: FileUnit) -> Result<FileUnit, TransformError> {
        let html = self.resolver.resolve(&unit.origin, unit.text()?)?;
        Ok(unit.with_text(html))
    }
}
