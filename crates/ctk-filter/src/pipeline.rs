//! Filter pipeline: runs the four phases and the savings guard.

use ctk_core::{tokens, CommandCategory, FilterConfig};
use serde::Serialize;

use crate::{phase1_preprocess, phase2_skip, phase3_compact, phase4_dedup};

/// Pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Preprocess,
    Skip,
    Compact,
    Dedupe,
    /// Final check that filtering did not grow the output.
    Guard,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preprocess => "preprocess",
            Self::Skip => "skip",
            Self::Compact => "compact",
            Self::Dedupe => "dedupe",
            Self::Guard => "guard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseStatus {
    Applied,
    /// Not run: no category, or nothing to check.
    Skipped,
    /// Ran but handed its input through unchanged.
    Fallback(String),
}

/// Result of a phase that may decline to transform its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseOutcome {
    Applied(String),
    Fallback { text: String, reason: String },
}

impl PhaseOutcome {
    pub fn text(&self) -> &str {
        match self {
            Self::Applied(text) | Self::Fallback { text, .. } => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Applied(text) | Self::Fallback { text, .. } => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    pub fn status(&self) -> PhaseStatus {
        match self {
            Self::Applied(_) => PhaseStatus::Applied,
            Self::Fallback { reason, .. } => PhaseStatus::Fallback(reason.clone()),
        }
    }
}

fn line_count(text: &str) -> usize {
    text.lines().count()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseReport {
    pub phase: Phase,
    pub status: PhaseStatus,
    pub lines_in: usize,
    pub lines_out: usize,
}

impl PhaseReport {
    fn new(phase: Phase, status: PhaseStatus, input: &str, output: &str) -> Self {
        Self { phase, status, lines_in: line_count(input), lines_out: line_count(output) }
    }

    fn skipped(phase: Phase, text: &str) -> Self {
        let n = line_count(text);
        Self { phase, status: PhaseStatus::Skipped, lines_in: n, lines_out: n }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.status, PhaseStatus::Fallback(_))
    }
}

/// Filtered output with statistics.
#[derive(Debug, Clone, Serialize)]
pub struct FilterResult {
    pub filtered_text: String,
    pub original_tokens: usize,
    pub filtered_tokens: usize,
    pub savings_ratio: f64,
    pub category: Option<String>,
    pub phases: Vec<PhaseReport>,
}

impl FilterResult {
    pub fn tokens_saved(&self) -> usize {
        self.original_tokens.saturating_sub(self.filtered_tokens)
    }

    pub fn phase(&self, phase: Phase) -> Option<&PhaseReport> {
        self.phases.iter().find(|r| r.phase == phase)
    }

    /// Phases that declined to transform, in order.
    pub fn fallbacks(&self) -> impl Iterator<Item = &PhaseReport> {
        self.phases.iter().filter(|r| r.is_fallback())
    }
}

/// The output filter. Stateless apart from its limits; safe to share.
#[derive(Debug, Clone, Default)]
pub struct FilterPipeline {
    config: FilterConfig,
}

impl FilterPipeline {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Filter a captured buffer. Without a category only preprocessing runs.
    pub fn filter(&self, raw: &str, category: Option<&CommandCategory>) -> FilterResult {
        let original_tokens = tokens::estimate(raw);
        let mut phases = Vec::with_capacity(5);

        let pre = phase1_preprocess::apply(raw);
        phases.push(PhaseReport::new(Phase::Preprocess, PhaseStatus::Applied, raw, &pre));

        let Some(category) = category else {
            for phase in [Phase::Skip, Phase::Compact, Phase::Dedupe] {
                phases.push(PhaseReport::skipped(phase, &pre));
            }
            let text = pre.clone();
            return self.finish(raw, pre, text, original_tokens, None, phases);
        };

        let skipped = phase2_skip::apply(&pre, category.skip_patterns());
        phases.push(PhaseReport::new(Phase::Skip, PhaseStatus::Applied, &pre, &skipped));

        let compacted = phase3_compact::apply(&skipped, category.compact_rule(), &self.config);
        phases.push(PhaseReport::new(
            Phase::Compact,
            compacted.status(),
            &skipped,
            compacted.text(),
        ));
        let compacted = compacted.into_text();

        let deduped = phase4_dedup::apply(&compacted, category.dedupe());
        phases.push(PhaseReport::new(Phase::Dedupe, PhaseStatus::Applied, &compacted, &deduped));

        self.finish(raw, pre, deduped, original_tokens, Some(category.name()), phases)
    }

    /// Filter raw bytes; invalid UTF-8 is replaced, never rejected.
    pub fn filter_bytes(&self, raw: &[u8], category: Option<&CommandCategory>) -> FilterResult {
        self.filter(&String::from_utf8_lossy(raw), category)
    }

    fn finish(
        &self,
        raw: &str,
        pre: String,
        text: String,
        original_tokens: usize,
        category: Option<&str>,
        mut phases: Vec<PhaseReport>,
    ) -> FilterResult {
        let mut filtered_text = text;
        let mut filtered_tokens = tokens::estimate(&filtered_text);

        if filtered_tokens > original_tokens {
            tracing::debug!(
                category = category.unwrap_or("-"),
                original_tokens,
                filtered_tokens,
                "filtered output grew, falling back"
            );
            let pre_tokens = tokens::estimate(&pre);
            let (text, count) = if pre_tokens <= original_tokens {
                (pre, pre_tokens)
            } else {
                (raw.to_string(), original_tokens)
            };
            phases.push(PhaseReport::new(
                Phase::Guard,
                PhaseStatus::Fallback("filtered output larger than original".into()),
                &filtered_text,
                &text,
            ));
            filtered_text = text;
            filtered_tokens = count;
        } else {
            phases.push(PhaseReport::new(Phase::Guard, PhaseStatus::Applied, &filtered_text, &filtered_text));
        }

        FilterResult {
            filtered_text,
            original_tokens,
            filtered_tokens,
            savings_ratio: tokens::savings_ratio(original_tokens, filtered_tokens),
            category: category.map(str::to_string),
            phases,
        }
    }
}
