//! Wrap a matched segment in the proxy invocation.

use ctk_core::ProxyConfig;
use regex::Regex;
use std::sync::LazyLock;

use crate::normalize::is_env_assignment;
use crate::types::Segment;

static RE_STDOUT_REDIRECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(1?>{1,2}|&>{1,2}|>\|)(.*)$").unwrap());

/// True when the segment sends stdout to a file. `>&2` style duplications
/// are not files.
pub fn redirects_stdout(raw_words: &[&str]) -> bool {
    raw_words.iter().enumerate().any(|(i, word)| {
        let Some(caps) = RE_STDOUT_REDIRECT.captures(word) else {
            return false;
        };
        let target = match caps.get(2).map(|m| m.as_str()) {
            Some(t) if !t.is_empty() => t,
            _ => raw_words.get(i + 1).copied().unwrap_or(""),
        };
        !target.is_empty() && !target.starts_with('&')
    })
}

/// `<program> <args..> --category <name> --`, shell-quoted.
pub fn proxy_prefix(proxy: &ProxyConfig, category: &str) -> Option<String> {
    let mut words: Vec<&str> = vec![proxy.program.as_str()];
    words.extend(proxy.args.iter().map(String::as_str));
    words.extend(["--category", category, "--"]);
    shlex::try_join(words).ok()
}

/// Insert the proxy prefix before the segment's command, after any leading
/// assignments so they still reach the wrapped program.
pub fn rewrite_segment(line: &str, segment: &Segment, proxy: &ProxyConfig, category: &str) -> Option<String> {
    let at = segment
        .words
        .iter()
        .find(|r| !is_env_assignment(&line[r.start..r.end]))?
        .start;
    let prefix = proxy_prefix(proxy, category)?;
    Some(format!("{}{} {}", &line[..at], prefix, &line[at..]))
}
