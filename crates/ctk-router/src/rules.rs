//! Ordered first-match classification against the category registry.

use ctk_core::{CategoryRegistry, CommandCategory};

use crate::extract::SubcommandExtractor;
use crate::normalize::normalize_words;
use crate::types::Extraction;

/// Nesting limit for extractor recursion (`compose exec` → `kubectl exec` → ...).
pub const MAX_EXTRACT_DEPTH: usize = 3;

/// First category, in registration order, whose patterns accept `normalized`.
pub fn match_category<'r>(registry: &'r CategoryRegistry, normalized: &str) -> Option<&'r CommandCategory> {
    registry.iter().find(|c| c.matches(normalized))
}

/// A category after following its extractor.
#[derive(Debug, Clone)]
pub struct Resolved<'r> {
    pub category: &'r CommandCategory,
    /// Innermost nested command, for compound invocations.
    pub inner: Option<Vec<String>>,
}

/// Follow `category`'s extractor. The nested command is classified again and
/// wins when it matches; otherwise the outer category stands. `None` when the
/// extractor cannot parse the invocation.
pub fn resolve<'r>(
    registry: &'r CategoryRegistry,
    category: &'r CommandCategory,
    words: &[String],
    depth: usize,
) -> Option<Resolved<'r>> {
    let inner = match category.extractor().extract(words) {
        Extraction::NotApplicable => return Some(Resolved { category, inner: None }),
        Extraction::Malformed(reason) => {
            tracing::debug!(category = category.name(), reason, "subcommand extraction failed");
            return None;
        }
        Extraction::Inner(inner) => inner,
    };

    if depth + 1 < MAX_EXTRACT_DEPTH {
        if let Some(nested) = normalize_words(&inner) {
            if let Some(found) = match_category(registry, &nested.text()) {
                if let Some(r) = resolve(registry, found, &nested.words, depth + 1) {
                    return Some(Resolved { category: r.category, inner: Some(r.inner.unwrap_or(inner)) });
                }
            }
        }
    }
    Some(Resolved { category, inner: Some(inner) })
}
