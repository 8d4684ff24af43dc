//! Token estimation: a cheap, tokenizer-free approximation.
//!
//! The estimate is `max(ceil(chars / 4), words)`. Both terms can only shrink
//! when lines are removed, so dropping lines never raises the estimate.

/// Average characters per token for source code and terminal output.
pub const CHARS_PER_TOKEN: usize = 4;

/// Estimate the token count of `text`.
pub fn estimate(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    let chars = text.chars().count();
    let words = text.split_whitespace().count();
    chars.div_ceil(CHARS_PER_TOKEN).max(words)
}

/// `1 - filtered/original`, clamped to `[0, 1]`; zero when `original` is zero.
pub fn savings_ratio(original: usize, filtered: usize) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (1.0 - filtered as f64 / original as f64).clamp(0.0, 1.0)
}

/// Tokens saved, never negative.
pub fn tokens_saved(original: usize, filtered: usize) -> usize {
    original.saturating_sub(filtered)
}
