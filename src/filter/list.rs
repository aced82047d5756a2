use super::FilterContext;
use super::regex::RegexDirective;
use crate::expression::FilterInvocation;
use crate::value::Value;

/// `join(div)`: list to text. Non-list input passes through.
pub fn join_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    call: &FilterInvocation,
) -> Option<Value> {
    let input = input?;
    let Some(items) = input.to_list() else {
        return Some(input);
    };
    let div = call.arg(0).unwrap_or_default();
    let joined = items
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(div);
    Some(Value::Text(joined))
}

/// `get(idx)`: one element; negative indexes count from the end.
pub fn get_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    call: &FilterInvocation,
) -> Option<Value> {
    let input = input?;
    let key = call.arg(0).unwrap_or_default().trim();

    if let Value::Map(map) = &input {
        return map.get(key).cloned();
    }
    let Some(items) = input.to_list() else {
        return Some(input);
    };
    let idx: i64 = key.parse().ok()?;
    let idx = if idx < 0 { idx + items.len() as i64 } else { idx };
    usize::try_from(idx).ok().and_then(|i| items.get(i).cloned())
}

/// `split(delim,limit)`: text to list.
///
/// A `/re/` delimiter is a regex, anything else is literal text, and no
/// delimiter splits on whitespace runs. `limit` caps the number of pieces;
/// the last piece keeps the remainder.
pub fn split_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    call: &FilterInvocation,
) -> Option<Value> {
    let input = input?;
    let text = input.to_string();
    let delim = call.arg(0).unwrap_or_default();
    let limit = call
        .arg(1)
        .and_then(|l| l.trim().parse::<usize>().ok())
        .filter(|&l| l > 0)
        .unwrap_or(usize::MAX);

    let pieces: Vec<String> = if delim.trim().is_empty() {
        split_whitespace_limited(&text, limit)
    } else if delim.starts_with('/') {
        match RegexDirective::parse_match(delim).and_then(|d| d.compile()) {
            Ok(re) => re.splitn(&text, limit).map(str::to_string).collect(),
            Err(err) => {
                log::warn!("split: {err}");
                return Some(input);
            }
        }
    } else {
        text.splitn(limit, delim).map(str::to_string).collect()
    };

    Some(Value::List(pieces.into_iter().map(Value::Text).collect()))
}

fn split_whitespace_limited(text: &str, limit: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut rest = text.trim_start();
    while !rest.is_empty() {
        if pieces.len() + 1 == limit {
            pieces.push(rest.to_string());
            break;
        }
        match rest.find(char::is_whitespace) {
            Some(end) => {
                pieces.push(rest[..end].to_string());
                rest = rest[end..].trim_start();
            }
            None => {
                pieces.push(rest.to_string());
                break;
            }
        }
    }
    pieces
}

/// `length`: element count for lists, character count for text.
pub fn length_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    _call: &FilterInvocation,
) -> Option<Value> {
    let len = match &input {
        None => 0,
        Some(Value::Map(map)) => map.len(),
        Some(value) => match value.to_list() {
            Some(items) => items.len(),
            None => value.to_string().chars().count(),
        },
    };
    Some(Value::Text(len.to_string()))
}

/// `sort`: lexical ascending.
pub fn sort_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    _call: &FilterInvocation,
) -> Option<Value> {
    let input = input?;
    let Some(mut items) = input.to_list() else {
        return Some(input);
    };
    items.sort_by_key(Value::to_string);
    Some(Value::List(items))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_split_with_limit() {
        assert_eq!(split_whitespace_limited("  a b   c ", usize::MAX), vec!["a", "b", "c"]);
        assert_eq!(split_whitespace_limited("a b c", 2), vec!["a", "b c"]);
        assert!(split_whitespace_limited("   ", usize::MAX).is_empty());
    }
}
