//! Translation of the conditional-include shorthand.
//!
//! `{.includeIf(cond).tpl}` and `{+(cond)tpl}` are rewritten into an
//! ordinary value tag whose filter chain performs the test:
//!
//! ```text
//! (~x)            ~x|ondefined(+tpl):
//! (!x)            ~x|ondefined():+tpl
//! (~x == lit)     ~x|onmatch(/^lit$/,+tpl)nomatch()
//! (~x != lit)     ~x|onmatch(/^lit$/,)nomatch(+tpl)
//! (~x == ~y)      ~y|onmatch(/^<current x>$/,+tpl)nomatch()
//! (~x =~ /re/)    ~x|onmatch(/re/,+tpl)nomatch()
//! (~x !~ /re/)    ~x|onmatch(/re/,)nomatch(+tpl)
//! ```

use super::scanner::{find_matching_close, next_unescaped_delim};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IncludeIfError {
    #[error("missing parenthesized condition in \"{0}\"")]
    MissingCondition(String),

    #[error("missing template name in \"{0}\"")]
    MissingTemplate(String),

    #[error("malformed condition \"{0}\"")]
    MalformedCondition(String),

    #[error("expected /regex/ after {op} in \"{cond}\"")]
    ExpectedRegex { op: String, cond: String },
}

impl IncludeIfError {
    /// Inline text rendered in place of the tag.
    pub fn to_annotation(&self) -> String {
        format!("[includeIf syntax error: {self}]")
    }
}

/// True when tag text (after its sigil) uses the shorthand.
pub fn is_include_if(body: &str, sigil: char) -> bool {
    match sigil {
        '+' => body.trim_start().starts_with('('),
        '.' | '^' => body.starts_with("includeIf("),
        _ => false,
    }
}

/// Rewrite shorthand text (after its sigil) into tag text with a `~` sigil.
///
/// `lookup` returns the current text of a path and is used for the eager
/// side of `~x == ~y` comparisons.
pub fn translate_include_if(
    body: &str,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<String, IncludeIfError> {
    let text = body.trim();
    let text = text.strip_prefix("includeIf").unwrap_or(text);
    if !text.starts_with('(') {
        return Err(IncludeIfError::MissingCondition(body.to_string()));
    }
    let close = find_matching_close(text, 0)
        .ok_or_else(|| IncludeIfError::MissingCondition(body.to_string()))?;
    let condition = text[1..close].trim();
    let template = text[close + 1..].trim();
    let template = template.strip_prefix('.').unwrap_or(template).trim();
    if template.is_empty() {
        return Err(IncludeIfError::MissingTemplate(body.to_string()));
    }
    let include = format!("+{template}");

    if let Some(name) = condition.strip_prefix('!') {
        if find_operator(name).is_none() {
            let name = path_name(name.trim())
                .ok_or_else(|| IncludeIfError::MalformedCondition(condition.to_string()))?;
            return Ok(format!("~{name}|ondefined():{include}"));
        }
    }

    let Some((op_at, op)) = find_operator(condition) else {
        let name = path_name(condition)
            .ok_or_else(|| IncludeIfError::MalformedCondition(condition.to_string()))?;
        return Ok(format!("~{name}|ondefined({include}):"));
    };

    let lhs = condition[..op_at].trim();
    let rhs = condition[op_at + op.len()..].trim();
    if !lhs.starts_with(['~', '$']) {
        return Err(IncludeIfError::MalformedCondition(condition.to_string()));
    }
    let lhs_name =
        path_name(lhs).ok_or_else(|| IncludeIfError::MalformedCondition(condition.to_string()))?;

    let (subject, pattern) = match op {
        "=~" | "!~" => {
            let closed = rhs.starts_with('/') && next_unescaped_delim('/', rhs, 1).is_some();
            if !closed {
                return Err(IncludeIfError::ExpectedRegex {
                    op: op.to_string(),
                    cond: condition.to_string(),
                });
            }
            (lhs_name, rhs.to_string())
        }
        _ if rhs.starts_with(['~', '$']) => {
            let rhs_name = path_name(rhs)
                .ok_or_else(|| IncludeIfError::MalformedCondition(condition.to_string()))?;
            let current = lookup(&lhs_name).unwrap_or_default();
            (rhs_name, format!("/^{}$/", escape_literal(&current)))
        }
        _ => {
            if rhs.is_empty() {
                return Err(IncludeIfError::MalformedCondition(condition.to_string()));
            }
            (lhs_name, format!("/^{}$/", escape_literal(unquote(rhs))))
        }
    };

    let negated = op.starts_with('!');
    Ok(if negated {
        format!("~{subject}|onmatch({pattern},)nomatch({include})")
    } else {
        format!("~{subject}|onmatch({pattern},{include})nomatch()")
    })
}

/// Escape a literal for use inside `/^...$/`. Letters, digits and spaces
/// pass through; other ASCII gets a backslash. `<`, `>` and non-ASCII are
/// left alone since escaping them changes their meaning or is rejected.
pub fn escape_literal(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len() * 2);
    for c in literal.chars() {
        if c.is_ascii_alphanumeric() || c == ' ' || c == '<' || c == '>' || !c.is_ascii() {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}

fn find_operator(condition: &str) -> Option<(usize, &'static str)> {
    ["==", "!=", "=~", "!~"]
        .into_iter()
        .filter_map(|op| condition.find(op).map(|at| (at, op)))
        .min_by_key(|(at, _)| *at)
}

/// Strip the sigil off a reference and validate the remaining path.
fn path_name(reference: &str) -> Option<String> {
    let name = reference
        .strip_prefix(['~', '$'])
        .unwrap_or(reference)
        .trim();
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '-'));
    valid.then(|| name.to_string())
}

fn unquote(text: &str) -> &str {
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
    }
    text
}
