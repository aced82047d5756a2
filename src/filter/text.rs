use super::FilterContext;
use crate::expression::{FilterInvocation, magic_braces};
use crate::value::Value;

pub(crate) fn map_text(input: Option<Value>, f: impl FnOnce(&str) -> String) -> Option<Value> {
    input.map(|v| Value::Text(f(&v.to_string())))
}

pub fn trim_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    _call: &FilterInvocation,
) -> Option<Value> {
    map_text(input, |s| s.trim().to_string())
}

/// Backslash-escape backslashes and both quote characters.
pub fn quote_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    _call: &FilterInvocation,
) -> Option<Value> {
    map_text(input, |s| {
        let mut out = String::with_capacity(s.len() + 4);
        for c in s.chars() {
            if matches!(c, '\\' | '"' | '\'') {
                out.push('\\');
            }
            out.push(c);
        }
        out
    })
}

pub fn upper_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    _call: &FilterInvocation,
) -> Option<Value> {
    map_text(input, str::to_uppercase)
}

pub fn lower_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    _call: &FilterInvocation,
) -> Option<Value> {
    map_text(input, str::to_lowercase)
}

pub fn capitalize_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    _call: &FilterInvocation,
) -> Option<Value> {
    map_text(input, |s| {
        let mut chars = s.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    })
}

/// `indent(n[,pad])`: prefix every line with `pad` repeated `n` times.
/// Line endings (LF, CR, CRLF) are kept as written and nothing is added
/// after a final line break.
pub fn indent_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    call: &FilterInvocation,
) -> Option<Value> {
    let count = call
        .arg(0)
        .and_then(|n| n.trim().parse::<usize>().ok())
        .unwrap_or(1);
    let pad = match call.arg(1) {
        Some(p) if !p.is_empty() => p,
        _ => " ",
    };
    let prefix = pad.repeat(count);
    map_text(input, |s| indent(s, &prefix))
}

pub fn indent(text: &str, prefix: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    let mut at_line_start = true;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if at_line_start {
            out.push_str(prefix);
            at_line_start = false;
        }
        out.push(c);
        match c {
            '\r' if chars.peek() == Some(&'\n') => {
                out.push('\n');
                chars.next();
                at_line_start = true;
            }
            '\r' | '\n' => at_line_start = true,
            _ => {}
        }
    }
    out
}

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || "@!?*#$()+=:;,~/._- ".contains(c)
}

/// Drop every character outside a conservative safe set.
pub fn defang_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    _call: &FilterInvocation,
) -> Option<Value> {
    map_text(input, |s| s.chars().filter(|&c| is_safe(c)).collect())
}

fn marker_filter(input: Option<Value>, call: &FilterInvocation, attr: &str) -> Option<Value> {
    let expected = call.arg(0).unwrap_or_default().trim();
    let token = call
        .arg(1)
        .map(str::to_string)
        .unwrap_or_else(|| format!(" {attr}=\"{attr}\""));
    let actual = input.map(|v| v.to_string()).unwrap_or_default();
    Some(Value::Text(if actual.trim() == expected {
        token
    } else {
        String::new()
    }))
}

pub fn selected_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    call: &FilterInvocation,
) -> Option<Value> {
    marker_filter(input, call, "selected")
}

pub fn checked_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    call: &FilterInvocation,
) -> Option<Value> {
    marker_filter(input, call, "checked")
}

/// `alternate(a,b,...)`: pick an argument by the numeric input modulo the
/// argument count. Non-numeric input passes through.
pub fn alternate_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    call: &FilterInvocation,
) -> Option<Value> {
    let input = input?;
    let Ok(n) = input.to_string().trim().parse::<i64>() else {
        return Some(input);
    };
    let choices: Vec<&str> = match call.call_args() {
        [] => vec!["even", "odd"],
        args => args.iter().map(String::as_str).collect(),
    };
    let pick = n.rem_euclid(choices.len() as i64) as usize;
    Some(magic_braces(choices[pick]))
}

/// English ordinal suffix for an integer.
pub fn ordinal_suffix(n: i64) -> &'static str {
    let n = n.unsigned_abs();
    match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

pub fn ordinal_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    _call: &FilterInvocation,
) -> Option<Value> {
    let input = input?;
    match input.to_string().trim().parse::<i64>() {
        Ok(n) => Some(Value::text(ordinal_suffix(n))),
        Err(_) => Some(input),
    }
}

/// `ondefined(v)`: `v` for a defined, non-empty input, otherwise null.
pub fn ondefined_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    call: &FilterInvocation,
) -> Option<Value> {
    match input {
        Some(v) if !v.is_empty() => Some(magic_braces(call.arg(0).unwrap_or_default())),
        _ => None,
    }
}

/// `default(v)`: `v` for a null or empty input, otherwise the input.
pub fn default_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    call: &FilterInvocation,
) -> Option<Value> {
    match input {
        Some(v) if !v.is_empty() => Some(v),
        _ => Some(magic_braces(call.arg(0).unwrap_or_default())),
    }
}

pub fn type_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    _call: &FilterInvocation,
) -> Option<Value> {
    Some(Value::text(input.as_ref().map_or("NULL", Value::type_name)))
}

pub fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn xml_unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

pub fn xmlescape_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    _call: &FilterInvocation,
) -> Option<Value> {
    map_text(input, xml_escape)
}

pub fn unescapexml_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    _call: &FilterInvocation,
) -> Option<Value> {
    map_text(input, xml_unescape)
}
