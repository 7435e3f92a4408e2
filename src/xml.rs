//! Generic XML → tree conversion.
//!
//! The tree is a `serde_json::Value`:
//!   - attributes become `@_<name>` string entries,
//!   - an element with only text becomes a bare string,
//!   - text next to attributes or children is stored under `#text`,
//!   - an element with nothing in it becomes an empty object,
//!   - repeated children with the same name become an array.
//!
//! Callers declare the dotted element paths that must always decode as arrays,
//! so a single `<package>` still yields a one-element list.
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde_json::{Map, Value};

use crate::error::{CovdiffError, Result};

/// Paths that are lists in either supported schema.
pub const LIST_PATHS: &[&str] = &[
    "coverage.project.file",
    "coverage.project.package",
    "coverage.project.package.file",
    "coverage.packages.package",
    "coverage.packages.package.classes.class",
    "coverage.sources.source",
];

/// Deepest element nesting accepted. Neither schema comes close.
pub const MAX_DEPTH: usize = 256;

const ATTRIBUTE_PREFIX: &str = "@_";
const TEXT_KEY: &str = "#text";

/// An element that has been opened but not yet closed.
struct Frame {
    name: String,
    path: String,
    node: Map<String, Value>,
    text: String,
}

impl Frame {
    fn root() -> Self {
        Self {
            name: String::new(),
            path: String::new(),
            node: Map::new(),
            text: String::new(),
        }
    }

    fn open(parent: &Frame, e: &BytesStart) -> Self {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let path = if parent.path.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", parent.path, name)
        };

        let mut node = Map::new();
        for attr in e.attributes().flatten() {
            let key = String::from_utf8_lossy(attr.key.as_ref());
            let value = match attr.unescape_value() {
                Ok(v) => v.into_owned(),
                Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
            };
            node.insert(format!("{ATTRIBUTE_PREFIX}{key}"), Value::String(value));
        }

        Self {
            name,
            path,
            node,
            text: String::new(),
        }
    }

    fn into_value(self) -> Value {
        let text = self.text.trim();
        if self.node.is_empty() {
            if text.is_empty() {
                Value::Object(Map::new())
            } else {
                Value::String(text.to_string())
            }
        } else {
            let mut node = self.node;
            if !text.is_empty() {
                node.insert(TEXT_KEY.to_string(), Value::String(text.to_string()));
            }
            Value::Object(node)
        }
    }

    fn attach(&mut self, name: String, path: &str, child: Value, list_paths: &[&str]) {
        let always_list = list_paths.contains(&path);
        match self.node.get_mut(&name) {
            Some(Value::Array(items)) => items.push(child),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, child]);
            }
            None if always_list => {
                self.node.insert(name, Value::Array(vec![child]));
            }
            None => {
                self.node.insert(name, child);
            }
        }
    }
}

/// Parse XML text into a generic tree, forcing `list_paths` to be arrays.
pub fn parse_tree(input: &[u8], list_paths: &[&str]) -> Result<Value> {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);

    let mut stack = vec![Frame::root()];
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf);
        match event {
            Err(e) => {
                return Err(CovdiffError::Xml {
                    source: e,
                    position: reader.buffer_position(),
                })
            }
            Ok(Event::Eof) => break,
            Ok(Event::Start(ref e)) => {
                check_depth(&stack, &reader)?;
                let frame = Frame::open(current(&stack), e);
                stack.push(frame);
            }
            Ok(Event::Empty(ref e)) => {
                check_depth(&stack, &reader)?;
                let frame = Frame::open(current(&stack), e);
                close(&mut stack, frame, list_paths);
            }
            Ok(Event::End(_)) => {
                if stack.len() > 1 {
                    if let Some(frame) = stack.pop() {
                        close(&mut stack, frame, list_paths);
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                let text = match e.unescape() {
                    Ok(t) => t.into_owned(),
                    Err(_) => String::from_utf8_lossy(e).into_owned(),
                };
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text);
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(e));
                }
            }
            // Declarations, comments, processing instructions, doctype.
            _ => {}
        }
        buf.clear();
    }

    // Close anything left open by a truncated document.
    while stack.len() > 1 {
        if let Some(frame) = stack.pop() {
            close(&mut stack, frame, list_paths);
        }
    }

    let root = stack.pop().map(|f| f.node).unwrap_or_default();
    Ok(Value::Object(root))
}

/// The root frame is depth zero, so a new element lands at `stack.len()`.
fn check_depth(stack: &[Frame], reader: &Reader<&[u8]>) -> Result<()> {
    if stack.len() > MAX_DEPTH {
        return Err(CovdiffError::XmlDepth {
            limit: MAX_DEPTH,
            position: reader.buffer_position(),
        });
    }
    Ok(())
}

fn current(stack: &[Frame]) -> &Frame {
    // The root frame is never popped, so the stack is never empty here.
    &stack[stack.len() - 1]
}

fn close(stack: &mut [Frame], frame: Frame, list_paths: &[&str]) {
    let name = frame.name.clone();
    let path = frame.path.clone();
    let value = frame.into_value();
    if let Some(parent) = stack.last_mut() {
        parent.attach(name, &path, value, list_paths);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attributes_and_children() {
        let xml = br#"<?xml version="1.0"?>
<coverage line-rate="0.5">
  <sources><source>/src</source></sources>
  <packages>
    <package name="a"/>
    <package name="b"/>
  </packages>
</coverage>"#;
        let tree = parse_tree(xml, &[]).unwrap();
        assert_eq!(
            tree,
            json!({
                "coverage": {
                    "@_line-rate": "0.5",
                    "sources": { "source": "/src" },
                    "packages": {
                        "package": [ { "@_name": "a" }, { "@_name": "b" } ]
                    }
                }
            })
        );
    }

    #[test]
    fn test_list_paths_force_arrays() {
        let xml = br#"<coverage><sources><source>/src</source></sources><packages><package name="a"/></packages></coverage>"#;
        let tree = parse_tree(xml, LIST_PATHS).unwrap();
        assert_eq!(tree["coverage"]["sources"]["source"], json!(["/src"]));
        assert_eq!(tree["coverage"]["packages"]["package"], json!([{ "@_name": "a" }]));
    }

    #[test]
    fn test_list_path_only_applies_at_declared_depth() {
        // `file` under `package` is declared, but `file` under `class` is not.
        let xml = br#"<coverage><project><package><file name="x"><class><file/></class></file></package></project></coverage>"#;
        let tree = parse_tree(xml, LIST_PATHS).unwrap();
        let file = &tree["coverage"]["project"]["package"][0]["file"];
        assert!(file.is_array());
        assert!(file[0]["class"]["file"].is_object());
    }

    #[test]
    fn test_text_with_attributes() {
        let xml = br#"<a kind="x">hello &amp; bye</a>"#;
        let tree = parse_tree(xml, &[]).unwrap();
        assert_eq!(tree, json!({ "a": { "@_kind": "x", "#text": "hello & bye" } }));
    }

    #[test]
    fn test_empty_element_is_empty_object() {
        let tree = parse_tree(b"<coverage><packages></packages></coverage>", &[]).unwrap();
        assert_eq!(tree, json!({ "coverage": { "packages": {} } }));
    }

    #[test]
    fn test_malformed_reports_position() {
        let result = parse_tree(b"<coverage><project></coverage>", &[]);
        let err = result.unwrap_err();
        assert!(
            format!("{err}").contains("position"),
            "Error should contain position info: {err}"
        );
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| {
            let mut xml = "<a>".repeat(depth);
            xml.push_str(&"</a>".repeat(depth));
            xml
        };

        assert!(parse_tree(nested(MAX_DEPTH).as_bytes(), &[]).is_ok());

        let err = parse_tree(nested(MAX_DEPTH + 1).as_bytes(), &[]).unwrap_err();
        assert!(matches!(err, CovdiffError::XmlDepth { limit: MAX_DEPTH, .. }));

        let err = parse_tree(nested(20_000).as_bytes(), &[]).unwrap_err();
        assert!(matches!(err, CovdiffError::XmlDepth { .. }));
    }
}
