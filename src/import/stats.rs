// src/import/stats.rs
//! Import statistics shared by the workers, and the serialized progress
//! output they write through.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

/// Counters aggregated over one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub blocks_created: usize,
    pub create_calls: usize,
    pub placeholder_failures: usize,
    pub images_uploaded: usize,
    pub images_degraded: usize,
    pub diagrams_imported: usize,
    pub diagrams_failed: usize,
    pub tables_filled: usize,
    pub tables_failed: usize,
    /// Extra attempts spent by the retry executor, over all tasks.
    pub retries: u32,
    pub rate_limited: u32,
    pub fallbacks_applied: usize,
    pub fallbacks_failed: usize,
    pub failures: Vec<String>,
}

impl ImportStats {
    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.failures.push(message.into());
    }

    pub fn record_attempts(&mut self, attempts: u32, rate_limited: u32) {
        self.retries += attempts.saturating_sub(1);
        self.rate_limited += rate_limited;
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Statistics handle passed into every worker.
pub type SharedStats = Arc<Mutex<ImportStats>>;

pub fn shared_stats() -> SharedStats {
    Arc::new(Mutex::new(ImportStats::default()))
}

/// Wall-clock time spent in each phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PhaseTimings {
    #[serde(with = "millis")]
    pub creation: Duration,
    #[serde(with = "millis")]
    pub workers: Duration,
    #[serde(with = "millis")]
    pub fallback: Duration,
}

mod millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }
}

/// Final account of one import, printed as text or JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    pub document_id: String,
    pub source: String,
    pub started_at: DateTime<Utc>,
    pub segments: usize,
    pub diagrams_queued: usize,
    pub tables_queued: usize,
    pub fallback_ran: bool,
    pub timings: PhaseTimings,
    pub stats: ImportStats,
}

impl ImportReport {
    pub fn has_failures(&self) -> bool {
        self.stats.has_failures()
    }
}

/// Line-serialized progress output for concurrent workers.
///
/// Every line is written under one lock so lines from different workers
/// never interleave. Lines are also logged at debug level.
pub struct ProgressReporter {
    enabled: bool,
    sink: Mutex<Box<dyn Write + Send>>,
}

impl ProgressReporter {
    pub fn new(enabled: bool) -> Self {
        Self::to_writer(enabled, Box::new(std::io::stderr()))
    }

    pub fn to_writer(enabled: bool, sink: Box<dyn Write + Send>) -> Self {
        Self {
            enabled,
            sink: Mutex::new(sink),
        }
    }

    pub fn silent() -> Self {
        Self::to_writer(false, Box::new(std::io::sink()))
    }

    pub fn line(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        log::debug!("{}", message);
        if !self.enabled {
            return;
        }
        let mut sink = self.sink.lock();
        if let Err(e) = writeln!(sink, "{}", message).and_then(|_| sink.flush()) {
            log::warn!("Failed to write progress line: {}", e);
        }
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("enabled", &self.enabled)
            .finish()
    }
}
