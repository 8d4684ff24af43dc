//! Phase 2: Skip. Delete lines matching a category's noise patterns.

use regex::Regex;

use crate::phase1_preprocess::collapse_blank_lines;

/// True when any pattern matches. Patterns are tried in order and the first
/// hit decides; later patterns never see the line.
pub fn is_noise(line: &str, patterns: &[Regex]) -> bool {
    patterns.iter().any(|re| re.is_match(line))
}

/// Remove noise lines. Surviving lines are never rewritten; blank runs left
/// behind by removals are collapsed.
pub fn apply(text: &str, patterns: &[Regex]) -> String {
    if text.is_empty() || patterns.is_empty() {
        return text.to_string();
    }
    let kept: Vec<&str> = text.lines().filter(|line| !is_noise(line, patterns)).collect();
    collapse_blank_lines(&kept).join("\n")
}
