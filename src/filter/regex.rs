//! Perl-style substitution: `s/pattern/replacement/flags`.

use super::FilterContext;
use super::error::FilterError;
use crate::expression::FilterInvocation;
use crate::expression::scanner::next_unescaped_delim;
use crate::value::Value;
use regex::{Captures, Regex, RegexBuilder};
use std::sync::LazyLock;

static UPPER_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)!U@(.*?)@U!").expect("valid upper marker regex"));
static LOWER_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)!L@(.*?)@L!").expect("valid lower marker regex"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegexFlags {
    pub global: bool,
    pub ignore_case: bool,
    pub multi_line: bool,
    pub dot_all: bool,
}

impl RegexFlags {
    /// Read flags backward from the end of `tail` until a non-flag character.
    fn parse_trailing(tail: &str) -> Self {
        let mut flags = Self::default();
        for c in tail.chars().rev() {
            match c {
                'g' => flags.global = true,
                'i' => flags.ignore_case = true,
                'm' => flags.multi_line = true,
                's' => flags.dot_all = true,
                _ => break,
            }
        }
        flags
    }
}

/// A parsed `/pattern/[replacement/]flags` literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexDirective {
    pub pattern: String,
    /// Present for substitutions only
    pub replacement: Option<String>,
    pub flags: RegexFlags,
}

impl RegexDirective {
    /// Parse `s/pat/repl/flags` or the same without the leading `s`.
    pub fn parse_substitution(text: &str) -> Result<Self, FilterError> {
        let text = text.trim();
        let first = if text.starts_with("s/") {
            1
        } else if text.starts_with('/') {
            0
        } else {
            return Err(FilterError::MissingDelimiter(text.to_string()));
        };
        let pattern_end = next_unescaped_delim('/', text, first + 1)
            .ok_or_else(|| FilterError::MissingDelimiter(text.to_string()))?;
        let replacement_end = next_unescaped_delim('/', text, pattern_end + 1)
            .ok_or_else(|| FilterError::MissingDelimiter(text.to_string()))?;

        Ok(Self {
            pattern: text[first + 1..pattern_end].to_string(),
            replacement: Some(text[pattern_end + 1..replacement_end].to_string()),
            flags: RegexFlags::parse_trailing(&text[replacement_end + 1..]),
        })
    }

    /// Parse a match-only literal `/pat/flags`; text without a leading slash
    /// is taken as a bare pattern.
    pub fn parse_match(text: &str) -> Result<Self, FilterError> {
        let text = text.trim();
        if !text.starts_with('/') {
            return Ok(Self {
                pattern: text.to_string(),
                replacement: None,
                flags: RegexFlags::default(),
            });
        }
        let close = next_unescaped_delim('/', text, 1)
            .ok_or_else(|| FilterError::MissingDelimiter(text.to_string()))?;
        Ok(Self {
            pattern: text[1..close].to_string(),
            replacement: None,
            flags: RegexFlags::parse_trailing(&text[close + 1..]),
        })
    }

    pub fn compile(&self) -> Result<Regex, FilterError> {
        RegexBuilder::new(&self.pattern)
            .case_insensitive(self.flags.ignore_case)
            .multi_line(self.flags.multi_line)
            .dot_matches_new_line(self.flags.dot_all)
            .build()
            .map_err(|source| FilterError::Regex {
                pattern: self.pattern.clone(),
                source,
            })
    }
}

/// Run a substitution directive over `input`.
pub fn substitute(input: &str, directive: &RegexDirective) -> Result<String, FilterError> {
    let re = directive.compile()?;
    let replacement = translate_replacement(directive.replacement.as_deref().unwrap_or(""));
    let replaced = if directive.flags.global {
        re.replace_all(input, replacement.as_str())
    } else {
        re.replace(input, replacement.as_str())
    };
    Ok(apply_case_markers(&replaced))
}

/// Decode Perl-style escapes in a replacement and rewrite it into the
/// `regex` crate's `$`-syntax.
///
/// `\U$1` and `\L$1` become `!U@${1}@U!` / `!L@${1}@L!` markers that
/// [`apply_case_markers`] folds after substitution.
pub fn translate_replacement(replacement: &str) -> String {
    let chars: Vec<char> = replacement.chars().collect();
    let mut out = String::with_capacity(replacement.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' if i + 1 < chars.len() => {
                let next = chars[i + 1];
                i += 2;
                match next {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    'f' => out.push('\u{0C}'),
                    'b' => out.push('\u{08}'),
                    'u' => match decode_unicode(&chars[i..]) {
                        Some(decoded) => {
                            push_literal(&mut out, decoded);
                            i += 4;
                        }
                        None => out.push('u'),
                    },
                    '0' => {
                        let (decoded, used) = decode_octal(&chars[i..]);
                        push_literal(&mut out, decoded);
                        i += used;
                    }
                    '1'..='9' => {
                        out.push_str("${");
                        out.push(next);
                        out.push('}');
                    }
                    'U' | 'L' => match group_ref(&chars[i..]) {
                        Some((group, used)) => {
                            out.push_str(&format!("!{next}@${{{group}}}@{next}!"));
                            i += used;
                        }
                        None => out.push(next),
                    },
                    other => push_literal(&mut out, other),
                }
            }
            '$' => match group_ref(&chars[i..]) {
                Some((group, used)) => {
                    out.push_str(&format!("${{{group}}}"));
                    i += used;
                }
                None => {
                    out.push_str("$$");
                    i += 1;
                }
            },
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Uppercase or lowercase the text between case markers and drop them.
pub fn apply_case_markers(text: &str) -> String {
    if !text.contains("@U!") && !text.contains("@L!") {
        return text.to_string();
    }
    let upper = UPPER_MARKER_RE.replace_all(text, |caps: &Captures| caps[1].to_uppercase());
    LOWER_MARKER_RE
        .replace_all(&upper, |caps: &Captures| caps[1].to_lowercase())
        .into_owned()
}

fn push_literal(out: &mut String, c: char) {
    if c == '$' {
        out.push_str("$$");
    } else {
        out.push(c);
    }
}

fn decode_unicode(chars: &[char]) -> Option<char> {
    if chars.len() < 4 {
        return None;
    }
    let hex: String = chars[..4].iter().collect();
    u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32)
}

/// Octal digits after `\0`, at most three.
fn decode_octal(chars: &[char]) -> (char, usize) {
    let digits: String = chars
        .iter()
        .take(3)
        .take_while(|c| matches!(c, '0'..='7'))
        .collect();
    let value = if digits.is_empty() {
        0
    } else {
        u32::from_str_radix(&digits, 8).unwrap_or(0)
    };
    (char::from_u32(value).unwrap_or('\0'), digits.len())
}

/// A group reference at the start of `chars`: `$N`, `${name}` or `\N`.
/// Returns the group name and the number of chars consumed.
fn group_ref(chars: &[char]) -> Option<(String, usize)> {
    match chars {
        ['$', '{', rest @ ..] => {
            let close = rest.iter().position(|&c| c == '}')?;
            let name: String = rest[..close].iter().collect();
            (!name.is_empty()).then_some((name, close + 3))
        }
        ['$', rest @ ..] | ['\\', rest @ ..] => {
            let digits: String = rest.iter().take_while(|c| c.is_ascii_digit()).collect();
            (!digits.is_empty()).then(|| {
                let used = digits.len() + 1;
                (digits, used)
            })
        }
        _ => None,
    }
}

/// `s/.../.../` filter. A literal without its closing delimiters passes the
/// input through; a pattern the regex engine rejects appends an annotation.
pub fn substitution_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    call: &FilterInvocation,
) -> Option<Value> {
    let input = input?;
    let text = input.to_string();
    let result = RegexDirective::parse_substitution(&call.text)
        .and_then(|directive| substitute(&text, &directive));
    match result {
        Ok(out) => Some(Value::Text(out)),
        Err(FilterError::MissingDelimiter(_)) => Some(input),
        Err(err) => Some(Value::Text(format!("{text}{}", err.to_annotation()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(input: &str, literal: &str) -> String {
        let directive = RegexDirective::parse_substitution(literal).unwrap();
        substitute(input, &directive).unwrap()
    }

    #[test]
    fn test_parse_substitution_parts() {
        let d = RegexDirective::parse_substitution(r"s/a\/b/c/gi").unwrap();
        assert_eq!(d.pattern, r"a\/b");
        assert_eq!(d.replacement.as_deref(), Some("c"));
        assert!(d.flags.global && d.flags.ignore_case);
        assert!(!d.flags.multi_line && !d.flags.dot_all);
    }

    #[test]
    fn test_missing_delimiter() {
        assert!(matches!(
            RegexDirective::parse_substitution("s/abc/def"),
            Err(FilterError::MissingDelimiter(_))
        ));
    }

    #[test]
    fn test_first_match_vs_global() {
        assert_eq!(sub("aaa", "s/a/b/"), "baa");
        assert_eq!(sub("aaa", "s/a/b/g"), "bbb");
    }

    #[test]
    fn test_non_greedy_global() {
        assert_eq!(
            sub("Lemon Lion Liar Loon Lenore Forlorn", "s/L[^ ]*?n/Chunky/g"),
            "Chunky Chunky Liar Chunky Chunkyore Forlorn"
        );
    }

    #[test]
    fn test_group_references() {
        assert_eq!(sub("john smith", r"s/(\w+) (\w+)/$2, $1/"), "smith, john");
        assert_eq!(sub("ab", r"s/(a)(b)/\2\1/"), "ba");
        assert_eq!(sub("a1", "s/(a)1/${1}0/"), "a0");
    }

    #[test]
    fn test_case_conversion_markers() {
        assert_eq!(sub("hello world", r"s/(\w+)/\U$1/g"), "HELLO WORLD");
        assert_eq!(sub("HELLO World", r"s/(\w+) (\w+)/\L$1 $2/"), "hello World");
    }

    #[test]
    fn test_replacement_escapes() {
        assert_eq!(sub("a b", r"s/ /\n/"), "a\nb");
        assert_eq!(sub("a", r"s/a/A\t/"), "A\t");
        assert_eq!(sub("a", r"s/a/\$5/"), "$5");
        assert_eq!(sub("a", r"s/a/x\/y/"), "x/y");
        assert_eq!(sub("a", r"s/a/\0101/"), "A");
    }

    #[test]
    fn test_flags_multiline_and_dotall() {
        assert_eq!(sub("a\nb", "s/^b/c/m"), "a\nc");
        assert_eq!(sub("a\nb", "s/a.b/x/s"), "x");
        assert_eq!(sub("a\nb", "s/a.b/x/"), "a\nb");
    }

    #[test]
    fn test_parse_match_literal() {
        let d = RegexDirective::parse_match("/E.*O/i").unwrap();
        assert_eq!(d.pattern, "E.*O");
        assert!(d.flags.ignore_case);
        assert_eq!(d.replacement, None);
    }
}
