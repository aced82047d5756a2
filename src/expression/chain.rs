use super::scanner::{Cursor, next_unescaped_delim};

/// Split `filter1|filter2|...` at top-level pipes only.
///
/// Pipes inside a leading `s/.../.../` (or bare `/.../`) regex, inside an
/// `onmatch(...)nomatch(...)` argument list, or inside any balanced
/// `name(...)` argument list are not split points.
pub fn split_filters(text: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    while let Some(pipe) = next_filter_boundary(text, start) {
        segments.push(text[start..pipe].trim());
        start = pipe + 1;
    }
    segments.push(text[start..].trim());
    segments
}

/// Split off the first filter of a chain, returning it and the remainder.
pub fn split_first_filter(text: &str) -> (&str, Option<&str>) {
    match next_filter_boundary(text, 0) {
        Some(pipe) => (text[..pipe].trim(), Some(&text[pipe + 1..])),
        None => (text.trim(), None),
    }
}

/// Offset of the pipe ending the filter that starts at `from`.
pub fn next_filter_boundary(text: &str, from: usize) -> Option<usize> {
    next_unescaped_delim('|', text, filter_shape_end(text, from))
}

/// Offset just past the syntactic "shape" of the filter starting at `from`:
/// its regex body, its `onmatch` argument walk, or its `name(...)` list.
/// Anything between the shape end and the next pipe is loose text.
pub fn filter_shape_end(text: &str, from: usize) -> usize {
    let mut cursor = Cursor::at(text, from);
    cursor.skip_whitespace();

    if cursor.starts_with("s/") || cursor.peek() == Some('/') {
        let first_slash = if cursor.peek() == Some('/') {
            cursor.pos()
        } else {
            cursor.pos() + 1
        };
        return skip_substitution(text, first_slash).unwrap_or(cursor.pos());
    }

    if cursor.starts_with("onmatch") {
        return skip_onmatch(&mut cursor);
    }

    let rest = cursor.rest();
    let name_len = rest
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-'))
        .count();
    cursor.seek(cursor.pos() + name_len);
    if cursor.peek() == Some('(') {
        let open = cursor.pos();
        if cursor.skip_balanced() {
            return cursor.pos();
        }
        return open;
    }
    cursor.pos()
}

/// From the first `/` of `s/pat/repl/flags`, return the offset past the
/// flags. A missing final delimiter ends the shape after the pattern.
fn skip_substitution(text: &str, first_slash: usize) -> Option<usize> {
    let mid = next_unescaped_delim('/', text, first_slash + 1)?;
    let Some(end) = next_unescaped_delim('/', text, mid + 1) else {
        return Some(mid + 1);
    };
    let mut cursor = Cursor::at(text, end + 1);
    cursor.skip_flags();
    Some(cursor.pos())
}

/// Walk `onmatch(/re/,out,/re/,out...)` pair by pair, then an optional
/// `nomatch(...)`. An unterminated construct consumes the rest of the text.
fn skip_onmatch(cursor: &mut Cursor) -> usize {
    let end = cursor.src().len();
    cursor.eat("onmatch");
    cursor.skip_whitespace();
    if !cursor.eat("(") {
        return cursor.pos();
    }

    loop {
        cursor.skip_whitespace();
        match cursor.peek() {
            None => return end,
            Some(')') => {
                cursor.advance(1);
                break;
            }
            Some('/') => {
                if !cursor.skip_regex_literal() {
                    return end;
                }
            }
            Some(_) => scan_value(cursor),
        }

        cursor.skip_whitespace();
        match cursor.peek() {
            Some(',') => cursor.advance(1),
            Some(')') => {
                cursor.advance(1);
                break;
            }
            Some(_) => {
                scan_value(cursor);
                continue;
            }
            None => return end,
        }

        scan_value(cursor);
        match cursor.peek() {
            Some(',') => cursor.advance(1),
            Some(')') => {
                cursor.advance(1);
                break;
            }
            _ => return end,
        }
    }

    skip_onmatch_tail(cursor).unwrap_or(cursor.pos())
}

/// Skip a `nomatch(...)` clause directly after the cursor.
fn skip_onmatch_tail(cursor: &mut Cursor) -> Option<usize> {
    let save = cursor.pos();
    cursor.skip_whitespace();
    if cursor.starts_with("nomatch(") {
        cursor.advance("nomatch".len());
        if cursor.skip_balanced() {
            return Some(cursor.pos());
        }
        return Some(cursor.src().len());
    }
    cursor.seek(save);
    None
}

/// Move to the next top-level `,` or `)` of an argument value.
fn scan_value(cursor: &mut Cursor) {
    while let Some(c) = cursor.peek() {
        match c {
            ',' | ')' => return,
            '\\' => cursor.advance(2),
            '"' => {
                if !cursor.skip_quoted() {
                    cursor.advance(1);
                }
            }
            '(' | '{' | '[' => {
                if !cursor.skip_balanced() {
                    cursor.advance(1);
                }
            }
            _ => cursor.advance(1),
        }
    }
}
