use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CtkConfig {
    pub proxy: ProxyConfig,
    pub filter: FilterConfig,
    /// Category names removed from the built-in registry.
    pub disabled_categories: Vec<String>,
}

impl CtkConfig {
    /// Parse a JSON document; absent fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// How a recognized command is re-invoked through the proxy:
/// `<program> <args..> --category <name> -- <command>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProxyConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            program: "ctk".into(),
            args: vec!["run".into()],
        }
    }
}

impl ProxyConfig {
    /// Basename of the proxy program, used to recognize already-proxied commands.
    pub fn program_name(&self) -> &str {
        self.program.rsplit('/').next().unwrap_or(&self.program)
    }
}

/// Bounds applied by the compaction rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FilterConfig {
    /// Lines kept per failing-test block before the rest is summarized.
    pub max_failure_lines: usize,
    /// Lines kept per captured stdout/stderr/log section.
    pub max_captured_lines: usize,
    /// Untracked paths listed individually before collapsing to a count.
    pub untracked_limit: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_failure_lines: 30,
            max_captured_lines: 10,
            untracked_limit: 20,
        }
    }
}
