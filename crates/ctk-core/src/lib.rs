//! Shared model for the ctk command proxy: command categories and their
//! registry, token estimation, metrics records and configuration.

pub mod category;
pub mod config;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod tokens;

pub use category::{
    CategorySpec, CommandCategory, CompactRule, DedupePolicy, ExtractorKind, MatchPattern,
    PatternSpec, Similarity,
};
pub use config::{CtkConfig, FilterConfig, ProxyConfig};
pub use error::{CtkError, Result};
pub use metrics::{JsonLinesSink, MemorySink, MetricsRecord, MetricsSink, NullSink};
pub use registry::{CategoryRegistry, RegistrySpec, BUILTIN_REGISTRY};
