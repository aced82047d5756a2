use super::chain::filter_shape_end;
use super::scanner::{Cursor, next_unescaped_delim};
use crate::value::Value;
use serde::Serialize;

/// Leading characters that mark text as a tag reference.
pub const TAG_SIGILS: [char; 5] = ['~', '$', '+', '^', '.'];

/// Parsed content of a tag reference: `path[:default][|chain]` or
/// `path[|chain][:default]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagExpression {
    /// Dotted lookup path, one entry for simple or command tags
    pub path: Vec<String>,
    /// Unparsed filter chain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_chain: Option<String>,
    /// Unparsed default value; may itself be tag syntax
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_text: Option<String>,
    /// True when the default was written before the chain (`x:d|f`), so the
    /// default is substituted first and then filtered. False for `x|f:d`,
    /// where the default bypasses the filters.
    pub apply_filters_to_default: bool,
}

impl TagExpression {
    /// Parse raw tag text, already stripped of braces and sigil.
    pub fn parse(raw: &str) -> Self {
        let (colon, pipe) = scan_separators(raw);

        let (path, filter_chain, default_text, apply_filters_to_default) = match (colon, pipe) {
            (None, None) => (raw, None, None, false),
            (Some(c), None) => (&raw[..c], None, Some(&raw[c + 1..]), false),
            (Some(c), Some(p)) if c < p => (
                &raw[..c],
                Some(&raw[p + 1..]),
                Some(&raw[c + 1..p]),
                true,
            ),
            (_, Some(p)) => match find_default_colon(raw, p + 1) {
                Some(c) => (
                    &raw[..p],
                    Some(&raw[p + 1..c]),
                    Some(&raw[c + 1..]),
                    false,
                ),
                None => (&raw[..p], Some(&raw[p + 1..]), None, false),
            },
        };

        Self {
            path: split_path(path.trim()),
            filter_chain: filter_chain
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            default_text: default_text.map(str::to_string),
            apply_filters_to_default,
        }
    }

    /// The default value with the magic-braces rule applied.
    pub fn default_value(&self) -> Option<Value> {
        self.default_text.as_deref().map(magic_braces)
    }
}

/// Free-function form of [`TagExpression::parse`].
pub fn parse_tag_expression(raw: &str) -> TagExpression {
    TagExpression::parse(raw)
}

/// Re-wrap text that starts with a tag sigil in braces so it renders as a
/// tag. A backslash before the sigil yields the literal text instead.
pub fn magic_braces(text: &str) -> Value {
    if let Some(rest) = text.strip_prefix('\\') {
        if looks_like_tag(rest) {
            return Value::Text(rest.to_string());
        }
    }
    if looks_like_tag(text) {
        return Value::Snippet(format!("{{{text}}}"));
    }
    Value::Text(text.to_string())
}

/// Sigil followed by something that can start a reference, so `$5` or
/// `.5` stay literal.
fn looks_like_tag(text: &str) -> bool {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some('+'), Some('(')) => true,
        (Some(sigil), Some(next)) if TAG_SIGILS.contains(&sigil) => {
            next.is_alphabetic() || next == '_'
        }
        _ => false,
    }
}

/// First default colon and first real pipe at path level. Backtick
/// sub-references and `includeIf(...)` / `include.(...)` clauses are opaque.
fn scan_separators(raw: &str) -> (Option<usize>, Option<usize>) {
    let mut cursor = Cursor::new(raw);
    let mut colon = None;

    while let Some(c) = cursor.peek() {
        match c {
            '\\' => cursor.advance(2),
            '`' => match next_unescaped_delim('`', raw, cursor.pos() + 1) {
                Some(close) => cursor.seek(close + 1),
                None => cursor.advance(1),
            },
            'i' if cursor.starts_with("includeIf(") || cursor.starts_with("include.(") => {
                let open = cursor.pos() + cursor.rest().find('(').unwrap_or(0);
                cursor.seek(open);
                if !cursor.skip_balanced() {
                    cursor.advance(1);
                }
            }
            ':' => {
                if colon.is_none() {
                    colon = Some(cursor.pos());
                }
                cursor.advance(1);
            }
            '|' => return (colon, Some(cursor.pos())),
            _ => cursor.advance(1),
        }
    }
    (colon, None)
}

/// With the chain starting at `chain_start`, find the colon that separates
/// the default. Each filter's regex, `onmatch` walk or argument list is
/// skipped, so colons inside filter arguments never count.
fn find_default_colon(raw: &str, chain_start: usize) -> Option<usize> {
    let mut segment_start = chain_start;
    loop {
        let shape_end = filter_shape_end(raw, segment_start);
        let boundary = next_unescaped_delim('|', raw, shape_end);
        let segment_end = boundary.unwrap_or(raw.len());
        if let Some(colon) = next_unescaped_delim(':', raw, shape_end) {
            if colon < segment_end {
                return Some(colon);
            }
        }
        segment_start = boundary? + 1;
    }
}

/// Split a path on dots outside backtick groups. A leading dot marks a
/// command reference, which stays in one piece.
fn split_path(path: &str) -> Vec<String> {
    if path.starts_with('.') || !path.contains('.') {
        return vec![path.to_string()];
    }

    let mut segments = Vec::new();
    let mut cursor = Cursor::new(path);
    let mut start = 0;
    while let Some(c) = cursor.peek() {
        match c {
            '`' => match next_unescaped_delim('`', path, cursor.pos() + 1) {
                Some(close) => cursor.seek(close + 1),
                None => cursor.advance(1),
            },
            '.' => {
                segments.push(path[start..cursor.pos()].to_string());
                cursor.advance(1);
                start = cursor.pos();
            }
            _ => cursor.advance(1),
        }
    }
    segments.push(path[start..].to_string());
    segments
}
