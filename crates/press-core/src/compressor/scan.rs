//! Literal and comment scanning for the style minifier.
//!
//! All functions take the source as `(byte offset, char)` pairs and return
//! the index one past the end of the scanned item.

use super::MinifyError;

pub(super) type Chars = [(usize, char)];

pub(super) fn char_at(chars: &Chars, i: usize) -> Option<char> {
    chars.get(i).map(|&(_, c)| c)
}

/// Byte offset of `chars[i]`, or the source length past the end.
pub(super) fn byte_at(chars: &Chars, i: usize, source_len: usize) -> usize {
    chars.get(i).map(|&(offset, _)| offset).unwrap_or(source_len)
}

fn unterminated(chars: &Chars, start: usize, what: &'static str) -> MinifyError {
    MinifyError::Unterminated {
        what,
        offset: chars.get(start).map(|&(o, _)| o).unwrap_or(0),
    }
}

/// `start` points at the `/` of `/*`.
pub(super) fn comment_end(chars: &Chars, start: usize) -> Result<usize, MinifyError> {
    let mut j = start + 2;
    while j + 1 < chars.len() {
        if chars[j].1 == '*' && chars[j + 1].1 == '/' {
            return Ok(j + 2);
        }
        j += 1;
    }
    Err(unterminated(chars, start, "comment"))
}

/// `start` points at the opening quote.
pub(super) fn string_end(chars: &Chars, start: usize) -> Result<usize, MinifyError> {
    let quote = chars[start].1;
    let mut j = start + 1;
    loop {
        match char_at(chars, j) {
            None | Some('\n') => return Err(unterminated(chars, start, "string")),
            Some('\\') => j += 2,
            Some(c) if c == quote => return Ok(j + 1),
            Some(_) => j += 1,
        }
    }
}
