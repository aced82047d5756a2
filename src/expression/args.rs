use super::scanner::{Cursor, find_matching_close, next_unescaped_delim};

/// Legacy ceiling on positional arguments; the last one keeps the
/// unsplit remainder.
pub const MAX_ARGS: usize = 15;

/// Synthetic argument marking the start of an appended `nomatch(...)` clause.
pub const NOMATCH_SENTINEL: &str = "|nomatch|";

/// Parse the text between a filter's `(` and its matching `)`.
///
/// Quoted form (`"a","b"`) yields up to two string arguments whose content is
/// never split further; anything after them is split in bare form. Bare form
/// splits on top-level commas, keeping commas inside quotes, regex literals
/// and nested brackets.
pub fn parse_args(inner: &str) -> Vec<String> {
    let lead = inner.len() - inner.trim_start().len();
    if inner[lead..].starts_with('"') {
        parse_quoted_form(inner, lead)
    } else {
        split_bare(inner)
    }
}

/// Parse an argument list that starts at `(`, including an immediately
/// following `nomatch(...)` clause.
pub fn parse_arg_list(paren_text: &str) -> Vec<String> {
    if !paren_text.starts_with('(') {
        return Vec::new();
    }
    let Some(close) = find_matching_close(paren_text, 0) else {
        return parse_args(&paren_text[1..]);
    };

    let mut args = parse_args(&paren_text[1..close]);
    if let Some(fallback) = nomatch_clause(&paren_text[close + 1..]) {
        args.push(NOMATCH_SENTINEL.to_string());
        args.push(fallback);
    }
    args
}

/// Inner text of a `nomatch(...)` clause at the start of `text`.
fn nomatch_clause(text: &str) -> Option<String> {
    let trimmed = text.trim_start();
    let offset = text.len() - trimmed.len();
    if !trimmed.starts_with("nomatch(") {
        return None;
    }
    let open = offset + "nomatch".len();
    let inner = match find_matching_close(text, open) {
        Some(close) => &text[open + 1..close],
        None => &text[open + 1..],
    };
    Some(clean_arg(inner))
}

fn parse_quoted_form(inner: &str, lead: usize) -> Vec<String> {
    let mut args = Vec::new();
    let Some(first_close) = next_unescaped_delim('"', inner, lead + 1) else {
        args.push(unescape_quotes(&inner[lead + 1..]));
        return args;
    };
    args.push(unescape_quotes(&inner[lead + 1..first_close]));

    let mut cursor = Cursor::at(inner, first_close + 1);
    cursor.skip_whitespace();
    let had_comma = cursor.eat(",");
    cursor.skip_whitespace();

    if had_comma && cursor.peek() == Some('"') {
        let open = cursor.pos();
        match next_unescaped_delim('"', inner, open + 1) {
            Some(close) => {
                args.push(unescape_quotes(&inner[open + 1..close]));
                cursor.seek(close + 1);
                cursor.skip_whitespace();
                if cursor.eat(",") {
                    args.extend(split_bare(cursor.rest()));
                }
            }
            None => args.push(unescape_quotes(&inner[open + 1..])),
        }
    } else if had_comma {
        args.extend(split_bare(cursor.rest()));
    }
    args
}

fn split_bare(text: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut cursor = Cursor::new(text);
    let mut start = 0;
    let mut at_arg_start = true;

    while let Some(c) = cursor.peek() {
        match c {
            '\\' => {
                cursor.advance(2);
                at_arg_start = false;
            }
            c if at_arg_start && c.is_whitespace() => cursor.advance(1),
            '/' if at_arg_start => {
                if !cursor.skip_regex_literal() {
                    cursor.advance(1);
                }
                at_arg_start = false;
            }
            '"' => {
                if !cursor.skip_quoted() {
                    cursor.seek(text.len());
                }
                at_arg_start = false;
            }
            '(' | '{' | '[' => {
                if !cursor.skip_balanced() {
                    cursor.advance(1);
                }
                at_arg_start = false;
            }
            ',' if args.len() + 1 < MAX_ARGS => {
                args.push(clean_arg(&text[start..cursor.pos()]));
                cursor.advance(1);
                start = cursor.pos();
                at_arg_start = true;
            }
            _ => {
                cursor.advance(1);
                at_arg_start = false;
            }
        }
    }
    args.push(clean_arg(&text[start..]));
    args
}

/// Normalize one bare argument: regex literals pass through untouched, a
/// fully quoted argument loses its quotes, and `\,` becomes a plain comma.
fn clean_arg(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('/') {
        return trimmed.to_string();
    }
    if trimmed.len() >= 2
        && trimmed.starts_with('"')
        && next_unescaped_delim('"', trimmed, 1) == Some(trimmed.len() - 1)
    {
        return unescape_quotes(&trimmed[1..trimmed.len() - 1]);
    }
    raw.replace("\\,", ",")
}

fn unescape_quotes(s: &str) -> String {
    s.replace("\\\"", "\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &str) -> Vec<String> {
        parse_args(s)
    }

    #[test]
    fn test_bare_arguments_without_context() {
        assert_eq!(args("%,.2f"), vec!["%", ".2f"]);
        assert_eq!(args("3"), vec!["3"]);
        assert_eq!(args(""), vec![""]);
    }

    #[test]
    fn test_bare_comma_split() {
        assert_eq!(args("3,_"), vec!["3", "_"]);
        assert_eq!(args("a,b,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_escaped_comma_is_not_a_split_point() {
        assert_eq!(args(r"a\,b,c"), vec!["a,b", "c"]);
    }

    #[test]
    fn test_regex_literal_keeps_its_commas() {
        assert_eq!(
            args("/a,b/i,out1,/x/,out2"),
            vec!["/a,b/i", "out1", "/x/", "out2"]
        );
    }

    #[test]
    fn test_quoted_substring_keeps_its_commas() {
        assert_eq!(args(r#"x,"a,b",y"#), vec!["x", "a,b", "y"]);
    }

    #[test]
    fn test_quoted_form_pair() {
        assert_eq!(args(r#""x*2","%.2f""#), vec!["x*2", "%.2f"]);
        assert_eq!(args(r#""a,b""#), vec!["a,b"]);
        assert_eq!(args(r#""say \"hi\"""#), vec![r#"say "hi""#]);
    }

    #[test]
    fn test_quoted_form_with_trailing_vars() {
        assert_eq!(args(r#""x*y","%d",~y"#), vec!["x*y", "%d", "~y"]);
        assert_eq!(args(r#""x*y",~y"#), vec!["x*y", "~y"]);
    }

    #[test]
    fn test_unterminated_quote_truncates_at_end() {
        assert_eq!(args(r#""open"#), vec!["open"]);
    }

    #[test]
    fn test_argument_ceiling_keeps_remainder() {
        let text = (0..20).map(|i| i.to_string()).collect::<Vec<_>>().join(",");
        let parsed = args(&text);
        assert_eq!(parsed.len(), MAX_ARGS);
        assert_eq!(parsed[MAX_ARGS - 1], "14,15,16,17,18,19");
    }

    #[test]
    fn test_nomatch_clause_appends_sentinel_pair() {
        let parsed = parse_arg_list("(/E.*O/i,greetings!)nomatch(darn!)");
        assert_eq!(
            parsed,
            vec!["/E.*O/i", "greetings!", NOMATCH_SENTINEL, "darn!"]
        );
    }

    #[test]
    fn test_empty_nomatch_clause() {
        let parsed = parse_arg_list("(/^a$/,+tpl)nomatch()");
        assert_eq!(parsed, vec!["/^a$/", "+tpl", NOMATCH_SENTINEL, ""]);
    }

    #[test]
    fn test_unclosed_paren_truncates() {
        assert_eq!(parse_arg_list("(a,b"), vec!["a", "b"]);
    }
}
