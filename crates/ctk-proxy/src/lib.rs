//! ctk proxy glue: the calls an executor makes around one command.
//!
//! Before running: [`Proxy::classify`] decides the category and the command
//! line to execute. After running: [`Proxy::finish`] filters the captured
//! output, reports a metrics record and hands back the exit code untouched.

use std::sync::Arc;

use ctk_core::{CategoryRegistry, CommandCategory, CtkConfig, MetricsRecord, MetricsSink, NullSink, ProxyConfig};
use ctk_filter::{FilterPipeline, FilterResult};
use ctk_router::ClassificationResult;

/// Output of the wrapped command as the executor captured it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: i32,
}

impl CapturedOutput {
    pub fn new(stdout: impl Into<Vec<u8>>, stderr: impl Into<Vec<u8>>, exit_code: i32) -> Self {
        Self { stdout: stdout.into(), stderr: stderr.into(), exit_code }
    }

    /// stdout followed by stderr, on a fresh line.
    pub fn combined(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.stdout.len() + self.stderr.len() + 1);
        out.extend_from_slice(&self.stdout);
        if !self.stdout.is_empty() && !self.stderr.is_empty() && !self.stdout.ends_with(b"\n") {
            out.push(b'\n');
        }
        out.extend_from_slice(&self.stderr);
        out
    }
}

/// What the executor shows the caller.
#[derive(Debug, Clone)]
pub struct ProxyOutcome {
    pub text: String,
    pub exit_code: i32,
    pub result: FilterResult,
}

/// Registry, filter and reporting wired together.
#[derive(Clone)]
pub struct Proxy {
    registry: Arc<CategoryRegistry>,
    pipeline: FilterPipeline,
    proxy: ProxyConfig,
    sink: Arc<dyn MetricsSink>,
}

impl std::fmt::Debug for Proxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Proxy")
            .field("categories", &self.registry.names())
            .field("pipeline", &self.pipeline)
            .field("proxy", &self.proxy)
            .finish_non_exhaustive()
    }
}

impl Default for Proxy {
    fn default() -> Self {
        Self::from_config(&CtkConfig::default(), Arc::new(NullSink))
    }
}

impl Proxy {
    pub fn new(
        registry: CategoryRegistry,
        pipeline: FilterPipeline,
        proxy: ProxyConfig,
        sink: Arc<dyn MetricsSink>,
    ) -> Self {
        Self { registry: Arc::new(registry), pipeline, proxy, sink }
    }

    /// Built-in registry minus the configured disabled categories.
    pub fn from_config(config: &CtkConfig, sink: Arc<dyn MetricsSink>) -> Self {
        let registry = CategoryRegistry::builtin().without(&config.disabled_categories);
        tracing::debug!(
            categories = registry.len(),
            disabled = config.disabled_categories.len(),
            "proxy configured"
        );
        Self::new(registry, FilterPipeline::new(config.filter.clone()), config.proxy.clone(), sink)
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    pub fn proxy_config(&self) -> &ProxyConfig {
        &self.proxy
    }

    /// Classify a command line and compute the line to execute.
    pub fn classify(&self, line: &str) -> ClassificationResult<'_> {
        ctk_router::classify(&self.registry, line, &self.proxy)
    }

    /// Look up the category named on the proxy's command line. An unknown
    /// name means the output is only preprocessed.
    pub fn resolve(&self, name: &str) -> Option<&CommandCategory> {
        let found = self.registry.get(name);
        if found.is_none() {
            tracing::warn!(category = name, "unknown category, output passes through");
        }
        found
    }

    /// Filter captured output and report it. The exit code is returned as
    /// captured.
    pub fn finish(&self, category: Option<&str>, output: CapturedOutput) -> ProxyOutcome {
        let category = category.and_then(|name| self.resolve(name));
        let result = self.pipeline.filter_bytes(&output.combined(), category);

        let record = MetricsRecord::new(result.category.as_deref(), result.original_tokens, result.filtered_tokens)
            .with_exit_code(output.exit_code);
        if let Err(e) = self.sink.record(&record) {
            tracing::warn!(error = %e, "metrics sink failed");
        }

        ProxyOutcome { text: result.filtered_text.clone(), exit_code: output.exit_code, result }
    }
}
