//! Split a command line into simple commands.
//!
//! Byte-level scan that understands quoting, backslash escapes, `$(...)` and
//! backticks, so operators inside them never split. `&` that belongs to a
//! redirection (`2>&1`, `&>file`) is part of a word, not a separator.

use std::ops::Range;

use crate::types::{Segment, SegmentError, Separator};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(Range<usize>),
    Separator(Separator),
}

/// Split `line` into segments. Empty segments (`;;`, trailing `&`) are
/// dropped.
pub fn split_segments(line: &str) -> Result<Vec<Segment>, SegmentError> {
    let mut segments = Vec::new();
    let mut words: Vec<Range<usize>> = Vec::new();
    let mut preceded_by = None;

    for token in tokenize(line)? {
        match token {
            Token::Word(range) => words.push(range),
            Token::Separator(sep) => {
                if let Some(segment) = close_segment(&mut words, preceded_by) {
                    segments.push(segment);
                }
                preceded_by = Some(sep);
            }
        }
    }
    if let Some(segment) = close_segment(&mut words, preceded_by) {
        segments.push(segment);
    }
    Ok(segments)
}

fn close_segment(words: &mut Vec<Range<usize>>, preceded_by: Option<Separator>) -> Option<Segment> {
    let first = words.first()?.start;
    let last = words.last()?.end;
    Some(Segment { range: first..last, words: std::mem::take(words), preceded_by })
}

fn tokenize(line: &str) -> Result<Vec<Token>, SegmentError> {
    let bytes = line.as_bytes();
    let len = bytes.len();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < len {
        i = skip_blanks(bytes, i, len);
        if i >= len {
            break;
        }

        if bytes[i] == b'#' {
            while i < len && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }

        if let Some((sep, end)) = separator_at(bytes, i, len) {
            tokens.push(Token::Separator(sep));
            i = end;
            continue;
        }

        let start = i;
        i = consume_word(bytes, i, len)?;
        if start < i {
            tokens.push(Token::Word(start..i));
        }
    }
    Ok(tokens)
}

/// Spaces and tabs; newlines are separators.
fn skip_blanks(bytes: &[u8], mut i: usize, len: usize) -> usize {
    while i < len && matches!(bytes[i], b' ' | b'\t' | b'\r') {
        i += 1;
    }
    i
}

fn separator_at(bytes: &[u8], i: usize, len: usize) -> Option<(Separator, usize)> {
    let next = if i + 1 < len { Some(bytes[i + 1]) } else { None };
    match bytes[i] {
        b'\n' => Some((Separator::Newline, i + 1)),
        b';' => Some((Separator::Semi, i + 1)),
        b'|' => match next {
            Some(b'|') => Some((Separator::Or, i + 2)),
            Some(b'&') => Some((Separator::Pipe, i + 2)),
            _ => Some((Separator::Pipe, i + 1)),
        },
        b'&' => match next {
            Some(b'&') => Some((Separator::And, i + 2)),
            Some(b'>') => None,
            _ => Some((Separator::Background, i + 1)),
        },
        _ => None,
    }
}

/// Step over a backslash and the whole character it escapes.
fn skip_escape(bytes: &[u8], i: usize, len: usize) -> usize {
    let width = match bytes.get(i + 1) {
        None => 0,
        Some(&b) if b < 0x80 => 1,
        Some(&b) if b >= 0xF0 => 4,
        Some(&b) if b >= 0xE0 => 3,
        Some(_) => 2,
    };
    (i + 1 + width).min(len)
}

/// `&` directly after `>` (`2>&1`) or before `>` (`&>`) is a redirection.
fn is_redirect_ampersand(bytes: &[u8], i: usize, len: usize) -> bool {
    (i > 0 && bytes[i - 1] == b'>') || (i + 1 < len && bytes[i + 1] == b'>')
}

fn consume_word(bytes: &[u8], mut i: usize, len: usize) -> Result<usize, SegmentError> {
    while i < len {
        let b = bytes[i];
        if matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'|' | b';') {
            break;
        }
        if b == b'&' && !is_redirect_ampersand(bytes, i, len) {
            break;
        }

        match b {
            b'\\' => i = skip_escape(bytes, i, len),
            b'\'' => {
                let open = i;
                i += 1;
                while i < len && bytes[i] != b'\'' {
                    i += 1;
                }
                if i >= len {
                    return Err(SegmentError::UnterminatedQuote { quote: '\'', offset: open });
                }
                i += 1;
            }
            b'"' => i = consume_double_quoted(bytes, i, len)?,
            b'$' if i + 1 < len && bytes[i + 1] == b'(' => i = consume_dollar_paren(bytes, i, len)?,
            b'`' => i = consume_backticks(bytes, i, len)?,
            _ => i += 1,
        }
    }
    Ok(i)
}

fn consume_double_quoted(bytes: &[u8], start: usize, len: usize) -> Result<usize, SegmentError> {
    let mut i = start + 1;
    while i < len {
        match bytes[i] {
            b'"' => return Ok(i + 1),
            b'\\' => i = skip_escape(bytes, i, len),
            b'$' if i + 1 < len && bytes[i + 1] == b'(' => i = consume_dollar_paren(bytes, i, len)?,
            b'`' => i = consume_backticks(bytes, i, len)?,
            _ => i += 1,
        }
    }
    Err(SegmentError::UnterminatedQuote { quote: '"', offset: start })
}

fn consume_dollar_paren(bytes: &[u8], start: usize, len: usize) -> Result<usize, SegmentError> {
    let mut i = start + 2;
    let mut depth: u32 = 1;

    while i < len {
        match bytes[i] {
            b'\\' => i = skip_escape(bytes, i, len),
            b'\'' => {
                let open = i;
                i += 1;
                while i < len && bytes[i] != b'\'' {
                    i += 1;
                }
                if i >= len {
                    return Err(SegmentError::UnterminatedQuote { quote: '\'', offset: open });
                }
                i += 1;
            }
            b'"' => i = consume_double_quoted(bytes, i, len)?,
            b'$' if i + 1 < len && bytes[i + 1] == b'(' => {
                depth += 1;
                i += 2;
            }
            b'(' => {
                depth += 1;
                i += 1;
            }
            b')' => {
                depth -= 1;
                i += 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => i += 1,
        }
    }
    Err(SegmentError::UnterminatedSubstitution { offset: start })
}

fn consume_backticks(bytes: &[u8], start: usize, len: usize) -> Result<usize, SegmentError> {
    let mut i = start + 1;
    while i < len {
        match bytes[i] {
            b'\\' => i = skip_escape(bytes, i, len),
            b'`' => return Ok(i + 1),
            _ => i += 1,
        }
    }
    Err(SegmentError::UnterminatedSubstitution { offset: start })
}
