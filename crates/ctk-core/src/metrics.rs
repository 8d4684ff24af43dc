//! Per-invocation metrics records and the reporting-sink seam.
//!
//! The core never owns storage. Callers hand in a sink; where records end up
//! is the sink's business.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub category: Option<String>,
    pub original_tokens: usize,
    pub filtered_tokens: usize,
    pub savings_ratio: f64,
    pub exit_code: Option<i32>,
    pub timestamp: DateTime<Utc>,
}

impl MetricsRecord {
    pub fn new(category: Option<&str>, original_tokens: usize, filtered_tokens: usize) -> Self {
        Self {
            category: category.map(str::to_string),
            original_tokens,
            filtered_tokens,
            savings_ratio: crate::tokens::savings_ratio(original_tokens, filtered_tokens),
            exit_code: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    pub fn tokens_saved(&self) -> usize {
        crate::tokens::tokens_saved(self.original_tokens, self.filtered_tokens)
    }
}

/// Receives one record per filtered invocation.
pub trait MetricsSink: Send + Sync {
    fn record(&self, record: &MetricsRecord) -> anyhow::Result<()>;
}

/// Discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl MetricsSink for NullSink {
    fn record(&self, _record: &MetricsRecord) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<MetricsRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<MetricsRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MetricsSink for MemorySink {
    fn record(&self, record: &MetricsRecord) -> anyhow::Result<()> {
        self.records
            .lock()
            .map_err(|_| anyhow::anyhow!("metrics buffer poisoned"))?
            .push(record.clone());
        Ok(())
    }
}

/// Writes each record as one JSON line.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer: Mutex::new(writer) }
    }

    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> MetricsSink for JsonLinesSink<W> {
    fn record(&self, record: &MetricsRecord) -> anyhow::Result<()> {
        let line = serde_json::to_string(record)?;
        let mut w = self
            .writer
            .lock()
            .map_err(|_| anyhow::anyhow!("metrics writer poisoned"))?;
        writeln!(w, "{line}")?;
        w.flush()?;
        Ok(())
    }
}
