use super::scan::{byte_at, char_at, comment_end, string_end};
use super::{AssetCompressor, MinifyError};
use crate::types::AssetKind;

#[derive(Debug, Clone, Copy, Default)]
pub struct StyleCompressor;

impl AssetCompressor for StyleCompressor {
    fn kind(&self) -> AssetKind {
        AssetKind::Style
    }

    fn minify(&self, source: &str) -> Result<String, MinifyError> {
        minify_style(source)
    }
}

/// Conservative CSS minifier: drops comments (except `/*!`) and
/// redundant whitespace, and the last `;` of each block.
pub fn minify_style(source: &str) -> Result<String, MinifyError> {
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let mut out = String::with_capacity(source.len());
    let mut pending_space = false;
    let mut i = 0;

    while let Some(c) = char_at(&chars, i) {
        match c {
            '/' if char_at(&chars, i + 1) == Some('*') => {
                let end = comment_end(&chars, i)?;
                if char_at(&chars, i + 2) == Some('!') {
                    separate(&mut out, pending_space, c);
                    out.push_str(&source[chars[i].0..byte_at(&chars, end, source.len())]);
                    out.push('\n');
                    pending_space = false;
                } else {
                    pending_space = true;
                }
                i = end;
            }
            '"' | '\'' => {
                let end = string_end(&chars, i)?;
                separate(&mut out, pending_space, c);
                out.push_str(&source[chars[i].0..byte_at(&chars, end, source.len())]);
                pending_space = false;
                i = end;
            }
            c if c.is_whitespace() => {
                pending_space = true;
                i += 1;
            }
            c => {
                separate(&mut out, pending_space, c);
                if c == '}' && out.ends_with(';') {
                    out.pop();
                }
                out.push(c);
                pending_space = false;
                i += 1;
            }
        }
    }

    let len = out.trim_end().len();
    out.truncate(len);
    if !out.is_empty() {
        out.push('\n');
    }
    Ok(out)
}

fn separate(out: &mut String, pending_space: bool, next: char) {
    if !pending_space {
        return;
    }
    let Some(prev) = out.chars().next_back() else {
        return;
    };
    // ':' only loses the space after it; `a :hover` differs from `a:hover`
    if prev.is_whitespace() || "{};,>:".contains(prev) || "{};,>".contains(next) {
        return;
    }
    out.push(' ');
}
