//! Escape-aware delimiter scanning.
//!
//! All offsets are byte offsets. Every delimiter this engine cares about is
//! ASCII, so any offset returned here is also a char boundary.

/// Find the next `delim` at or after `from` that is not escaped by an odd
/// number of immediately preceding backslashes.
pub fn next_unescaped_delim(delim: char, text: &str, from: usize) -> Option<usize> {
    let mut search = from;
    while search <= text.len() {
        let found = search + text.get(search..)?.find(delim)?;
        if !is_escaped(text, found) {
            return Some(found);
        }
        search = found + delim.len_utf8();
    }
    None
}

/// True when the byte at `idx` is preceded by an odd run of backslashes.
pub fn is_escaped(text: &str, idx: usize) -> bool {
    let run = text.as_bytes()[..idx.min(text.len())]
        .iter()
        .rev()
        .take_while(|&&b| b == b'\\')
        .count();
    run % 2 == 1
}

/// Given the offset of an opening `(`, `{` or `[`, find its matching close.
///
/// Same-kind brackets nest. Backslash escapes, double-quoted strings and
/// regex literals that open an argument (a `/` directly after the open
/// bracket or a comma) are skipped whole.
pub fn find_matching_close(text: &str, open_idx: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let open = *bytes.get(open_idx)?;
    let close = match open {
        b'(' => b')',
        b'{' => b'}',
        b'[' => b']',
        _ => return None,
    };

    let mut depth = 0usize;
    let mut i = open_idx;
    let mut arg_start = true;
    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'\\' => {
                i += 2;
                arg_start = false;
                continue;
            }
            b'"' if i > open_idx => {
                i = next_unescaped_delim('"', text, i + 1)? + 1;
                arg_start = false;
                continue;
            }
            b'/' if arg_start && depth == 1 => {
                if let Some(end) = next_unescaped_delim('/', text, i + 1) {
                    i = end + 1;
                    arg_start = false;
                    continue;
                }
            }
            _ if b == open => depth += 1,
            _ if b == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        if !b.is_ascii_whitespace() {
            arg_start = (b == open && depth == 1) || (b == b',' && depth == 1);
        }
        i += 1;
    }
    None
}

/// A read position over a source string with named helpers for the
/// "skip past a matched construct" moves the parsers keep needing.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    pub fn at(src: &'a str, pos: usize) -> Self {
        Self {
            src,
            pos: pos.min(src.len()),
        }
    }

    pub fn src(&self) -> &'a str {
        self.src
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn is_done(&self) -> bool {
        self.pos >= self.src.len()
    }

    pub fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    /// Advance by `n` chars, stopping at end of input.
    pub fn advance(&mut self, n: usize) {
        let step: usize = self.rest().chars().take(n).map(char::len_utf8).sum();
        self.pos += step;
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.src.len());
    }

    pub fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Consume `prefix` if the input continues with it.
    pub fn eat(&mut self, prefix: &str) -> bool {
        if self.starts_with(prefix) {
            self.pos += prefix.len();
            true
        } else {
            false
        }
    }

    /// Offset of the next unescaped `delim` at or after the cursor.
    pub fn find(&self, delim: char) -> Option<usize> {
        next_unescaped_delim(delim, self.src, self.pos)
    }

    /// With the cursor on an opening `/`, move just past the closing `/` and
    /// any trailing flag letters. Returns false (cursor unchanged) when the
    /// literal never closes.
    pub fn skip_regex_literal(&mut self) -> bool {
        if self.peek() != Some('/') {
            return false;
        }
        match next_unescaped_delim('/', self.src, self.pos + 1) {
            Some(close) => {
                self.pos = close + 1;
                self.skip_flags();
                true
            }
            None => false,
        }
    }

    /// Move past a run of regex flag letters.
    pub fn skip_flags(&mut self) {
        let rest = self.rest();
        let n = rest
            .bytes()
            .take_while(|b| matches!(b, b'g' | b'i' | b'm' | b's' | b'x'))
            .count();
        self.pos += n;
    }

    /// With the cursor on a `"`, move past the matching unescaped quote.
    pub fn skip_quoted(&mut self) -> bool {
        if self.peek() != Some('"') {
            return false;
        }
        match next_unescaped_delim('"', self.src, self.pos + 1) {
            Some(close) => {
                self.pos = close + 1;
                true
            }
            None => false,
        }
    }

    /// With the cursor on an open bracket, move past its matching close.
    pub fn skip_balanced(&mut self) -> bool {
        match find_matching_close(self.src, self.pos) {
            Some(close) => {
                self.pos = close + 1;
                true
            }
            None => false,
        }
    }
}
