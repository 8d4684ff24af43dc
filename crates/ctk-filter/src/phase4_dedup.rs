//! Phase 4: Dedup. Collapse streaks of similar consecutive lines.
//!
//! A streak keeps its first line and gains one annotation line stating how
//! many lines were folded into it. Blank and annotation lines never join a
//! streak, so running the phase twice changes nothing.

use ctk_core::{DedupePolicy, Similarity};
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

static RE_ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(repeated \d+ more times?\)$").unwrap());
static RE_VOLATILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[0-9a-f]{7,}\b|\d+").unwrap());

/// The annotation appended after a collapsed streak's representative.
pub fn annotation(folded: usize) -> String {
    if folded == 1 {
        "(repeated 1 more time)".to_string()
    } else {
        format!("(repeated {folded} more times)")
    }
}

pub fn is_annotation(line: &str) -> bool {
    RE_ANNOTATION.is_match(line)
}

/// Comparison key for a line under the given similarity.
pub fn similarity_key(line: &str, similarity: Similarity) -> Cow<'_, str> {
    match similarity {
        Similarity::Exact => Cow::Borrowed(line),
        Similarity::MaskNumbers => RE_VOLATILE.replace_all(line, "#"),
    }
}

fn joins_streak(line: &str) -> bool {
    !line.trim().is_empty() && !is_annotation(line)
}

/// Collapse every maximal streak of at least `min_repeats` similar lines.
pub fn collapse_streaks<S: AsRef<str>>(lines: &[S], policy: DedupePolicy) -> Vec<String> {
    let min = policy.effective_min_repeats();
    let mut out = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].as_ref();
        if !joins_streak(line) {
            out.push(line.to_string());
            i += 1;
            continue;
        }
        let key = similarity_key(line, policy.similarity);
        let mut j = i + 1;
        while j < lines.len() {
            let next = lines[j].as_ref();
            if !joins_streak(next) || similarity_key(next, policy.similarity) != key {
                break;
            }
            j += 1;
        }

        let run = j - i;
        if run >= min {
            out.push(line.to_string());
            out.push(annotation(run - 1));
        } else {
            out.extend(lines[i..j].iter().map(|l| l.as_ref().to_string()));
        }
        i = j;
    }
    out
}

/// Apply the dedupe phase to a whole buffer.
pub fn apply(text: &str, policy: DedupePolicy) -> String {
    if text.is_empty() {
        return String::new();
    }
    let lines: Vec<&str> = text.lines().collect();
    collapse_streaks(&lines, policy).join("\n")
}
