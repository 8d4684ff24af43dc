//! Phase 1: Preprocess. Terminal escapes, decorations and whitespace.

use regex::Regex;
use std::sync::LazyLock;

static RE_OSC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)").unwrap());
static RE_CSI: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]").unwrap());
static RE_CHARSET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x1b[()*+][A-Za-z0-9]").unwrap());
static RE_ESC2: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x1b[@-_]?").unwrap());

/// Remove ANSI escape sequences (CSI, OSC, charset selection, two-byte escapes).
pub fn strip_ansi(text: &str) -> String {
    if !text.contains('\x1b') {
        return text.to_string();
    }
    let result = RE_OSC.replace_all(text, "");
    let result = RE_CSI.replace_all(&result, "");
    let result = RE_CHARSET.replace_all(&result, "");
    RE_ESC2.replace_all(&result, "").into_owned()
}

/// Apply carriage-return overwrites the way a terminal shows them: each
/// rewrite is drawn over the line from column 0, so text past its end stays.
pub fn resolve_carriage_returns(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    text.replace("\r\n", "\n")
        .split('\n')
        .map(overlay_rewrites)
        .collect::<Vec<_>>()
        .join("\n")
}

fn overlay_rewrites(line: &str) -> String {
    let mut screen: Vec<char> = Vec::new();
    for part in line.split('\r').filter(|p| !p.is_empty()) {
        for (col, c) in part.chars().enumerate() {
            match screen.get_mut(col) {
                Some(cell) => *cell = c,
                None => screen.push(c),
            }
        }
    }
    screen.into_iter().collect()
}

/// Box drawing, block elements and braille spinner glyphs.
fn is_decoration(c: char) -> bool {
    matches!(c, '\u{2500}'..='\u{259F}' | '\u{2800}'..='\u{28FF}')
}

/// Drop control characters (except tab and newline) and decoration glyphs.
pub fn strip_controls_and_decorations(text: &str) -> String {
    text.chars()
        .filter(|&c| c == '\n' || c == '\t' || !(c.is_control() || is_decoration(c)))
        .collect()
}

/// Collapse runs of blank lines to one and trim blank lines at both ends.
pub fn collapse_blank_lines<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    let mut result: Vec<String> = Vec::with_capacity(lines.len());
    let mut prev_blank = true;
    for line in lines {
        let line = line.as_ref();
        let blank = line.trim().is_empty();
        if blank {
            if !prev_blank {
                result.push(String::new());
            }
        } else {
            result.push(line.to_string());
        }
        prev_blank = blank;
    }
    while result.last().is_some_and(|l| l.is_empty()) {
        result.pop();
    }
    result
}

/// Run every preprocessing pass.
pub fn apply(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let result = strip_ansi(text);
    let result = resolve_carriage_returns(&result);
    let result = strip_controls_and_decorations(&result);
    let lines: Vec<&str> = result.lines().map(str::trim_end).collect();
    collapse_blank_lines(&lines).join("\n")
}
