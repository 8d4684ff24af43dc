//! ctk command router: classify a shell command line against the category
//! registry and rewrite it to run through the output proxy.
//!
//! Classification is a pure function of the registry, the proxy settings and
//! the line: no I/O, no global state.

pub mod extract;
pub mod normalize;
pub mod rewrite;
pub mod rules;
pub mod segments;
pub mod types;

pub use extract::SubcommandExtractor;
pub use normalize::{normalize_words, NormalizedCommand};
pub use rules::{match_category, MAX_EXTRACT_DEPTH};
pub use segments::split_segments;
pub use types::*;

use ctk_core::{CategoryRegistry, ProxyConfig};

/// Classify `line` and produce the command to execute.
///
/// The first segment is matched against every category; later segments
/// (after `&&`, `||`, `;`, `&` or a newline) only count when their category
/// is multi-segment. Unknown and malformed lines pass through unchanged, as
/// does any line with a segment that already runs the proxy program.
pub fn classify<'r>(registry: &'r CategoryRegistry, line: &str, proxy: &ProxyConfig) -> ClassificationResult<'r> {
    if line.trim().is_empty() {
        return ClassificationResult::passthrough(line);
    }
    let segments = match split_segments(line) {
        Ok(segments) => segments,
        Err(e) => {
            tracing::debug!(error = %e, "malformed command line, passing through");
            return ClassificationResult::passthrough(line);
        }
    };

    for (index, segment) in segments.iter().enumerate() {
        let first = index == 0;
        if !first && !segment.preceded_by.is_some_and(|s| s.starts_command()) {
            continue;
        }
        let raw = segment.raw_words(line);
        let Some(normalized) = normalize_words(&raw) else {
            continue;
        };
        if normalized.program() == proxy.program_name() {
            tracing::debug!(segment = index, "line already runs through the proxy");
            return ClassificationResult::passthrough(line);
        }
        let text = normalized.text();
        let Some(category) = match_category(registry, &text) else {
            continue;
        };
        if !first && !category.is_multi_segment() {
            continue;
        }

        let Some(resolved) = rules::resolve(registry, category, &normalized.words, 0) else {
            return ClassificationResult::passthrough(line);
        };
        let name = resolved.category.name();

        let rewritten_command = if !resolved.category.proxies() {
            line.to_string()
        } else if rewrite::redirects_stdout(&raw) {
            tracing::debug!(category = name, "stdout redirected to a file, not rewriting");
            line.to_string()
        } else {
            rewrite::rewrite_segment(line, segment, proxy, name).unwrap_or_else(|| {
                tracing::debug!(category = name, "proxy prefix could not be quoted");
                line.to_string()
            })
        };

        let inner_command = resolved.inner.map(|words| {
            shlex::try_join(words.iter().map(String::as_str)).unwrap_or_else(|_| words.join(" "))
        });

        return ClassificationResult {
            matched_category: Some(resolved.category),
            rewritten_command,
            inner_command,
            segment_index: Some(index),
            normalized: Some(text),
        };
    }

    ClassificationResult::passthrough(line)
}

/// Classify against the built-in registry with default proxy settings.
pub fn classify_builtin(line: &str) -> ClassificationResult<'static> {
    classify(CategoryRegistry::builtin(), line, &ProxyConfig::default())
}
