// src/output/types.rs
//! What an export writes, and what happened when it was written.

use std::path::PathBuf;
use std::time::Duration;

/// Ordered writes for one export; nothing happens until it is delivered.
#[derive(Debug, Clone, Default)]
pub struct OutputPlan {
    pub operations: Vec<DeliveryTarget>,
}

impl OutputPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_operation(mut self, operation: DeliveryTarget) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// A single write.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryTarget {
    /// Rendered Markdown to a file
    WriteFile { path: PathBuf, content: String },
    /// A downloaded image
    WriteBytes { path: PathBuf, content: Vec<u8> },
    CreateDirectory { path: PathBuf },
    /// Rendered Markdown to stdout
    PrintToStdout { content: String },
}

impl DeliveryTarget {
    /// Short description for failure reporting.
    pub fn describe(&self) -> String {
        match self {
            DeliveryTarget::WriteFile { path, .. } | DeliveryTarget::WriteBytes { path, .. } => {
                format!("write {}", path.display())
            }
            DeliveryTarget::CreateDirectory { path } => format!("create {}", path.display()),
            DeliveryTarget::PrintToStdout { .. } => "print to stdout".to_string(),
        }
    }
}

/// Outcome of delivering a plan. Every operation is attempted, so one
/// report can hold both successes and failures.
#[derive(Debug, Clone, Default)]
pub struct OutputReport {
    pub completed: Vec<CompletedOperation>,
    pub failed: Vec<FailedOperation>,
    pub stats: DeliveryStats,
}

impl OutputReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, operation: DeliveryTarget, bytes_written: usize) {
        self.stats.operations_completed += 1;
        self.stats.bytes_written += bytes_written;
        self.completed.push(CompletedOperation {
            operation,
            bytes_written,
        });
    }

    pub fn record_failure(&mut self, operation: DeliveryTarget, error: String) {
        self.stats.operations_failed += 1;
        self.failed.push(FailedOperation { operation, error });
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// One "operation: error" line per failure.
    pub fn failure_messages(&self) -> Vec<String> {
        self.failed
            .iter()
            .map(|f| format!("{}: {}", f.operation.describe(), f.error))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct CompletedOperation {
    pub operation: DeliveryTarget,
    pub bytes_written: usize,
}

#[derive(Debug, Clone)]
pub struct FailedOperation {
    pub operation: DeliveryTarget,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct DeliveryStats {
    pub operations_completed: usize,
    pub operations_failed: usize,
    pub bytes_written: usize,
    pub elapsed: Duration,
}
