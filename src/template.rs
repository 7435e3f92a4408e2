//! A small template engine, a subset of Handlebars, for the Markdown report.
//!
//! Supported syntax:
//!   - `{{path}}` and `{{{path}}}` interpolation (no HTML escaping in either),
//!     with dotted paths, `this`, `../` and the `@index`/`@first`/`@last`/`@key`
//!     loop variables,
//!   - `{{#each path}}...{{else}}...{{/each}}` over arrays and objects,
//!   - `{{#if path}}`, `{{#unless path}}`, each with an optional `{{else}}`,
//!   - `{{! comment }}` and `{{!-- comment --}}`.
//!
//! Block tags and comments alone on a line are "standalone": the whole line,
//! including its newline, is dropped from the output, so templates can put
//! `{{#each}}` on its own line between Markdown table rows.

use std::borrow::Cow;

use serde::Serialize;
use serde_json::Value;

use crate::error::{CovdiffError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Each,
    If,
    Unless,
}

impl Block {
    fn name(&self) -> &'static str {
        match self {
            Block::Each => "each",
            Block::If => "if",
            Block::Unless => "unless",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "each" => Some(Block::Each),
            "if" => Some(Block::If),
            "unless" => Some(Block::Unless),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq)]
enum Token {
    Text(String),
    Var(String),
    Open(Block, String),
    Else,
    Close(Block),
}

#[derive(Debug, PartialEq)]
enum Node {
    Text(String),
    Var(String),
    Block {
        kind: Block,
        path: String,
        body: Vec<Node>,
        inverse: Vec<Node>,
    },
}

/// A compiled template, reusable across renders.
#[derive(Debug)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    pub fn compile(source: &str) -> Result<Self> {
        let mut tokens = tokenize(source)?.into_iter();
        let (nodes, ending) = build(&mut tokens)?;
        match ending {
            Ending::Eof => Ok(Self { nodes }),
            Ending::Else => Err(CovdiffError::Template(
                "{{else}} outside of a block".to_string(),
            )),
            Ending::Close(kind) => Err(CovdiffError::Template(format!(
                "unexpected {{{{/{}}}}}",
                kind.name()
            ))),
        }
    }

    /// Render against a JSON context.
    pub fn render(&self, context: &Value) -> String {
        let mut out = String::new();
        let mut scopes = vec![Scope::root(context)];
        render_nodes(&self.nodes, &mut scopes, &mut out);
        out
    }

    /// Render against anything serializable.
    pub fn render_serialize<T: Serialize>(&self, context: &T) -> Result<String> {
        let value = serde_json::to_value(context)?;
        Ok(self.render(&value))
    }
}

// ---------------------------------------------------------------------------
// Tokenizing
// ---------------------------------------------------------------------------

fn unclosed(position: usize) -> CovdiffError {
    CovdiffError::Template(format!("unclosed tag at byte {position}"))
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut cursor = 0;

    while let Some(offset) = source[cursor..].find("{{") {
        let start = cursor + offset;
        let rest = &source[start..];

        let (inner, end, raw) = if rest.starts_with("{{{") {
            let close = rest[3..].find("}}}").ok_or_else(|| unclosed(start))?;
            (&rest[3..3 + close], start + 3 + close + 3, true)
        } else if rest.starts_with("{{!--") {
            let close = rest[5..].find("--}}").ok_or_else(|| unclosed(start))?;
            (&rest[2..5 + close], start + 5 + close + 4, false)
        } else {
            let close = rest[2..].find("}}").ok_or_else(|| unclosed(start))?;
            (&rest[2..2 + close], start + 2 + close + 2, false)
        };

        let token = if raw {
            Some(Token::Var(inner.trim().to_string()))
        } else {
            classify(inner.trim(), start)?
        };

        let mut text_end = start;
        let mut next = end;
        if !matches!(token, Some(Token::Var(_))) {
            if let Some((line_start, line_end)) = standalone(source, start, end) {
                text_end = line_start.max(cursor);
                next = line_end;
            }
        }

        if text_end > cursor {
            tokens.push(Token::Text(source[cursor..text_end].to_string()));
        }
        if let Some(token) = token {
            tokens.push(token);
        }
        cursor = next;
    }

    if cursor < source.len() {
        tokens.push(Token::Text(source[cursor..].to_string()));
    }
    Ok(tokens)
}

/// Turn the inside of a `{{ }}` tag into a token. Comments yield `None`.
fn classify(inner: &str, position: usize) -> Result<Option<Token>> {
    if inner.starts_with('!') {
        return Ok(None);
    }
    if inner == "else" {
        return Ok(Some(Token::Else));
    }
    if let Some(rest) = inner.strip_prefix('#') {
        let (name, path) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        let kind = Block::from_name(name).ok_or_else(|| {
            CovdiffError::Template(format!("unknown block helper '{name}' at byte {position}"))
        })?;
        let path = path.trim();
        if path.is_empty() {
            return Err(CovdiffError::Template(format!(
                "{{{{#{name}}}}} needs an argument at byte {position}"
            )));
        }
        return Ok(Some(Token::Open(kind, path.to_string())));
    }
    if let Some(name) = inner.strip_prefix('/') {
        let kind = Block::from_name(name.trim()).ok_or_else(|| {
            CovdiffError::Template(format!("unknown closing tag '{name}' at byte {position}"))
        })?;
        return Ok(Some(Token::Close(kind)));
    }
    if inner.is_empty() {
        return Err(CovdiffError::Template(format!("empty tag at byte {position}")));
    }
    Ok(Some(Token::Var(inner.to_string())))
}

/// If the tag at `start..end` is alone on its line, return the byte range of
/// that whole line including its trailing newline.
fn standalone(source: &str, start: usize, end: usize) -> Option<(usize, usize)> {
    let line_start = source[..start].rfind('\n').map_or(0, |i| i + 1);
    if !source[line_start..start].chars().all(|c| c == ' ' || c == '\t') {
        return None;
    }
    let line_end = source[end..].find('\n').map_or(source.len(), |i| end + i + 1);
    if !source[end..line_end].chars().all(char::is_whitespace) {
        return None;
    }
    Some((line_start, line_end))
}

// ---------------------------------------------------------------------------
// Tree building
// ---------------------------------------------------------------------------

enum Ending {
    Eof,
    Else,
    Close(Block),
}

fn build(tokens: &mut std::vec::IntoIter<Token>) -> Result<(Vec<Node>, Ending)> {
    let mut nodes = Vec::new();
    while let Some(token) = tokens.next() {
        match token {
            Token::Text(text) => nodes.push(Node::Text(text)),
            Token::Var(path) => nodes.push(Node::Var(path)),
            Token::Else => return Ok((nodes, Ending::Else)),
            Token::Close(kind) => return Ok((nodes, Ending::Close(kind))),
            Token::Open(kind, path) => {
                let (body, ending) = build(tokens)?;
                let inverse = match ending {
                    Ending::Close(closed) if closed == kind => Vec::new(),
                    Ending::Else => match build(tokens)? {
                        (inverse, Ending::Close(closed)) if closed == kind => inverse,
                        _ => return Err(mismatched(kind)),
                    },
                    _ => return Err(mismatched(kind)),
                };
                nodes.push(Node::Block {
                    kind,
                    path,
                    body,
                    inverse,
                });
            }
        }
    }
    Ok((nodes, Ending::Eof))
}

fn mismatched(kind: Block) -> CovdiffError {
    CovdiffError::Template(format!("{{{{#{}}}}} is not closed", kind.name()))
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

struct Scope<'a> {
    value: &'a Value,
    index: Option<usize>,
    last: bool,
    key: Option<&'a str>,
}

impl<'a> Scope<'a> {
    fn root(value: &'a Value) -> Self {
        Self {
            value,
            index: None,
            last: false,
            key: None,
        }
    }
}

fn render_nodes<'a>(nodes: &[Node], scopes: &mut Vec<Scope<'a>>, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Var(path) => {
                if let Some(value) = lookup(path, scopes) {
                    write_value(&value, out);
                }
            }
            Node::Block {
                kind,
                path,
                body,
                inverse,
            } => {
                let value = lookup(path, scopes);
                match kind {
                    Block::If | Block::Unless => {
                        let truthy = value.as_deref().is_some_and(is_truthy);
                        let branch = if truthy == (*kind == Block::If) {
                            body
                        } else {
                            inverse
                        };
                        render_nodes(branch, scopes, out);
                    }
                    Block::Each => render_each(value, body, inverse, scopes, out),
                }
            }
        }
    }
}

fn render_each<'a>(
    value: Option<Cow<'a, Value>>,
    body: &[Node],
    inverse: &[Node],
    scopes: &mut Vec<Scope<'a>>,
    out: &mut String,
) {
    // Only borrowed values can become scopes; loop variables are never iterable.
    let items: Vec<(Option<&'a str>, &'a Value)> = match value {
        Some(Cow::Borrowed(Value::Array(items))) => items.iter().map(|v| (None, v)).collect(),
        Some(Cow::Borrowed(Value::Object(map))) => {
            map.iter().map(|(k, v)| (Some(k.as_str()), v)).collect()
        }
        _ => Vec::new(),
    };

    if items.is_empty() {
        render_nodes(inverse, scopes, out);
        return;
    }

    let len = items.len();
    for (i, (key, item)) in items.into_iter().enumerate() {
        scopes.push(Scope {
            value: item,
            index: Some(i),
            last: i + 1 == len,
            key,
        });
        render_nodes(body, scopes, out);
        scopes.pop();
    }
}

fn lookup<'a>(path: &str, scopes: &[Scope<'a>]) -> Option<Cow<'a, Value>> {
    let mut path = path.trim();
    let mut depth = 0;
    while let Some(rest) = path.strip_prefix("../") {
        depth += 1;
        path = rest;
    }
    let scope = scopes.len().checked_sub(depth + 1).map(|i| &scopes[i])?;

    if let Some(var) = path.strip_prefix('@') {
        return match var {
            "index" => scope.index.map(|i| Cow::Owned(Value::from(i))),
            "first" => scope.index.map(|i| Cow::Owned(Value::Bool(i == 0))),
            "last" => scope.index.map(|_| Cow::Owned(Value::Bool(scope.last))),
            "key" => scope.key.map(|k| Cow::Owned(Value::from(k))),
            _ => None,
        };
    }

    if path == "this" || path == "." {
        return Some(Cow::Borrowed(scope.value));
    }
    if let Some(rest) = path.strip_prefix("this.") {
        return walk(scope.value, rest).map(Cow::Borrowed);
    }

    // Plain names only see the current scope; outer scopes need `../`.
    walk(scope.value, path).map(Cow::Borrowed)
}

fn walk<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |v, segment| match v {
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => v.get(segment),
    })
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => {}
        Value::String(s) => out.push_str(s),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        other => out.push_str(&other.to_string()),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}
