use crate::expression::scanner::Cursor;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A value flowing through a filter chain.
///
/// Null is modelled as `Option::None` at every call site, so this type
/// only covers values that exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Plain scalar text (numbers and booleans are carried as text too)
    Text(String),
    /// Ordered sequence
    List(Vec<Value>),
    /// Nested object, walked by dotted paths
    Map(BTreeMap<String, Value>),
    /// Template text that still has to be rendered before use
    Snippet(String),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::List(items.into_iter().map(|s| Value::Text(s.into())).collect())
    }

    /// Convert a JSON tree. Numbers and booleans become text; JSON null
    /// becomes `None`, and null list items are dropped.
    pub fn from_json(json: serde_json::Value) -> Option<Value> {
        match json {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(b) => Some(Value::Text(b.to_string())),
            serde_json::Value::Number(n) => Some(Value::Text(n.to_string())),
            serde_json::Value::String(s) => Some(Value::Text(s)),
            serde_json::Value::Array(items) => Some(Value::List(
                items.into_iter().filter_map(Value::from_json).collect(),
            )),
            serde_json::Value::Object(map) => Some(Value::Map(
                map.into_iter()
                    .filter_map(|(k, v)| Value::from_json(v).map(|v| (k, v)))
                    .collect(),
            )),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Snippet(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Value::Text(s) | Value::Snippet(s) => s.is_empty(),
            Value::List(items) => items.is_empty(),
            Value::Map(map) => map.is_empty(),
        }
    }

    /// View this value as a list: lists directly, text when it is a
    /// serialized inline table such as `[a,b,c]`.
    pub fn to_list(&self) -> Option<Vec<Value>> {
        match self {
            Value::List(items) => Some(items.clone()),
            Value::Text(s) => parse_inline_list(s),
            _ => None,
        }
    }

    /// Name reported by the `type` filter.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Text(_) => "STRING",
            Value::List(_) => "LIST",
            Value::Map(_) => "OBJECT",
            Value::Snippet(_) => "CHUNK",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) | Value::Snippet(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{k}:{v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

/// Text form of an optional value, null rendering as the empty string.
pub fn text_of(value: Option<&Value>) -> String {
    value.map(Value::to_string).unwrap_or_default()
}

/// Nested inline tables deeper than this stay as text.
pub const MAX_INLINE_DEPTH: usize = 32;

/// Parse `[a,b,[c,d]]` into a list. Items are split on unescaped top-level
/// commas; `\,` inside an item is unescaped. Returns `None` unless the
/// opening `[` is closed by the final `]`.
pub fn parse_inline_list(text: &str) -> Option<Vec<Value>> {
    parse_inline_list_at(text, 0)
}

fn parse_inline_list_at(text: &str, depth: usize) -> Option<Vec<Value>> {
    let trimmed = text.trim();
    if !trimmed.starts_with('[') || list_close(trimmed) != Some(trimmed.len() - 1) {
        return None;
    }
    let inner = &trimmed[1..trimmed.len() - 1];
    if inner.trim().is_empty() {
        return Some(Vec::new());
    }

    let mut items = Vec::new();
    let mut cursor = Cursor::new(inner);
    let mut start = 0;
    let mut brackets = 0usize;
    while let Some(c) = cursor.peek() {
        match c {
            '\\' => cursor.advance(2),
            '[' => {
                brackets += 1;
                cursor.advance(1);
            }
            ']' => {
                brackets = brackets.saturating_sub(1);
                cursor.advance(1);
            }
            ',' if brackets == 0 => {
                items.push(inline_item(&inner[start..cursor.pos()], depth));
                cursor.advance(1);
                start = cursor.pos();
            }
            _ => cursor.advance(1),
        }
    }
    items.push(inline_item(&inner[start..], depth));
    Some(items)
}

/// Offset of the `]` matching the `[` that opens `text`.
fn list_close(text: &str) -> Option<usize> {
    let mut cursor = Cursor::new(text);
    let mut depth = 0usize;
    while let Some(c) = cursor.peek() {
        match c {
            '\\' => {
                cursor.advance(2);
                continue;
            }
            '[' => depth += 1,
            ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(cursor.pos());
                }
            }
            _ => {}
        }
        cursor.advance(1);
    }
    None
}

fn inline_item(raw: &str, depth: usize) -> Value {
    let item = raw.trim();
    if depth + 1 < MAX_INLINE_DEPTH {
        if let Some(nested) = parse_inline_list_at(item, depth + 1) {
            return Value::List(nested);
        }
    }
    Value::Text(item.replace("\\,", ",").replace("\\]", "]"))
}
