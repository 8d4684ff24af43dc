//! Phase 3: Compact. Per-category restructuring into a denser form.
//!
//! Each rule returns `None` when the structure it expects is absent, and the
//! phase then passes its input through untouched.

use ctk_core::{CompactRule, FilterConfig};
use regex::Regex;
use std::sync::LazyLock;

use crate::phase1_preprocess::collapse_blank_lines;
use crate::pipeline::PhaseOutcome;
use crate::{compact_git, compact_tests};

/// Apply `rule` to `text`.
pub fn apply(text: &str, rule: CompactRule, config: &FilterConfig) -> PhaseOutcome {
    if text.is_empty() || rule == CompactRule::Identity {
        return PhaseOutcome::Applied(text.to_string());
    }
    let compacted = match rule {
        CompactRule::Identity => Some(text.to_string()),
        CompactRule::GitStatus => compact_git::compact_status(text, config),
        CompactRule::Pytest => compact_tests::compact_pytest(text, config),
        CompactRule::CargoTest => compact_tests::compact_cargo_test(text, config),
        CompactRule::GoTest => compact_tests::compact_go_test(text, config),
        CompactRule::ContainerTable => compact_table(text),
    };
    match compacted {
        Some(out) => {
            let lines: Vec<&str> = out.lines().collect();
            PhaseOutcome::Applied(collapse_blank_lines(&lines).join("\n"))
        }
        None => {
            tracing::debug!(rule = rule.as_str(), "compaction structure absent, passing through");
            PhaseOutcome::Fallback {
                text: text.to_string(),
                reason: format!("{}: expected structure not found", rule.as_str()),
            }
        }
    }
}

static RE_DIGEST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bsha256:([0-9a-f]{12})[0-9a-f]{52}\b").unwrap());
static RE_LONG_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([0-9a-f]{12})[0-9a-f]{52}\b").unwrap());
static RE_WIDE_GAP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\S) {3,}").unwrap());
static RE_COLUMNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S {2,}\S").unwrap());

/// Shorten full container/image ids and squeeze column padding.
pub fn compact_table(text: &str) -> Option<String> {
    let tabular = text
        .lines()
        .any(|l| RE_COLUMNS.is_match(l) || RE_LONG_ID.is_match(l));
    if !tabular {
        return None;
    }
    let out = text
        .lines()
        .map(|line| {
            let line = RE_DIGEST.replace_all(line, "sha256:$1");
            let line = RE_LONG_ID.replace_all(&line, "$1");
            RE_WIDE_GAP.replace_all(&line, "$1  ").into_owned()
        })
        .collect::<Vec<_>>()
        .join("\n");
    Some(out)
}
