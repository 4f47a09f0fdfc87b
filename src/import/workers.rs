// src/import/workers.rs
//! Phase 2: bounded concurrent diagram imports and table fills.
//!
//! Two pools, each a counting semaphore, run side by side. Every task owns
//! exactly one block id; the only shared state is the statistics aggregate
//! and the progress reporter.

use super::stats::{ProgressReporter, SharedStats};
use super::tasks::{DiagramTask, FailedDiagram, TableTask};
use crate::api::DocumentRepository;
use crate::constants::{DIAGRAM_MAX_TOTAL_ATTEMPTS, TABLE_RATE_LIMIT_RETRIES, TABLE_RETRY_STEP};
use crate::error::{AppError, ErrorClass};
use crate::error_recovery::{do_with_retry, Backoff, RetryPolicy};
use crate::types::{BlockId, DocumentId, StyledText, WorkerCount};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Pool sizes and retry budget of phase 2.
#[derive(Debug, Clone, Copy)]
pub struct WorkerSettings {
    pub diagram_workers: WorkerCount,
    pub table_workers: WorkerCount,
    pub diagram_max_retries: u32,
}

/// Shared handles every worker task clones.
#[derive(Clone)]
pub struct WorkerContext {
    pub repository: Arc<dyn DocumentRepository>,
    pub document: DocumentId,
    pub stats: SharedStats,
    pub reporter: Arc<ProgressReporter>,
    pub cancel: CancellationToken,
}

/// Runs every queued task and returns the diagrams that still failed.
///
/// Returns once all dispatched tasks, of both pools, have completed.
pub async fn run_workers(
    context: &WorkerContext,
    settings: WorkerSettings,
    diagrams: Vec<DiagramTask>,
    tables: Vec<TableTask>,
) -> Vec<FailedDiagram> {
    log::info!(
        "Processing {} diagrams ({} workers) and {} tables ({} workers)",
        diagrams.len(),
        settings.diagram_workers.get(),
        tables.len(),
        settings.table_workers.get()
    );

    let (failed, ()) = futures::join!(
        run_diagram_pool(context, settings, diagrams),
        run_table_pool(context, settings.table_workers, tables),
    );
    failed
}

async fn run_diagram_pool(
    context: &WorkerContext,
    settings: WorkerSettings,
    tasks: Vec<DiagramTask>,
) -> Vec<FailedDiagram> {
    let semaphore = Arc::new(Semaphore::new(settings.diagram_workers.get()));
    let policy = RetryPolicy::new(settings.diagram_max_retries, DIAGRAM_MAX_TOTAL_ATTEMPTS);
    let mut join_set = JoinSet::new();

    for task in tasks {
        let semaphore = Arc::clone(&semaphore);
        let context = context.clone();
        let policy = policy.clone();
        join_set.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    return Err(FailedDiagram {
                        task,
                        reason: "worker pool closed".to_string(),
                    })
                }
            };
            import_diagram(&context, &policy, task).await
        });
    }

    let mut failed = Vec::new();
    while let Some(result) = join_set.join_next().await {
        match result {
            Ok(Ok(())) => {}
            Ok(Err(failure)) => failed.push(failure),
            Err(e) => {
                log::error!("Diagram worker task failed with join error: {}", e);
                context
                    .stats
                    .lock()
                    .record_failure(format!("diagram worker panicked: {}", e));
            }
        }
    }
    failed
}

/// Diagram syntax errors are never worth another attempt.
pub fn classify_diagram_error(error: &AppError) -> ErrorClass {
    if error.is_syntax_error() {
        ErrorClass::Permanent
    } else {
        error.classify()
    }
}

async fn import_diagram(
    context: &WorkerContext,
    policy: &RetryPolicy,
    task: DiagramTask,
) -> Result<(), FailedDiagram> {
    let Some(whiteboard) = task.whiteboard.clone() else {
        let reason = format!("board {} has no whiteboard token", task.placeholder);
        record_diagram_failure(context, &task, &reason);
        return Err(FailedDiagram { task, reason });
    };

    let outcome = do_with_retry(&context.cancel, policy, classify_diagram_error, |attempt| {
        if attempt > 1 {
            context
                .reporter
                .line(format!("Retrying {} (attempt {})", task.label(), attempt));
        }
        context
            .repository
            .import_diagram(&whiteboard, &task.source, task.syntax)
    })
    .await;

    match outcome {
        Ok(success) => {
            {
                let mut stats = context.stats.lock();
                stats.diagrams_imported += 1;
                stats.record_attempts(success.attempts, success.rate_limited);
            }
            context.reporter.line(format!(
                "Imported {} into board {} (ticket {})",
                task.label(),
                task.placeholder,
                success.value
            ));
            Ok(())
        }
        Err(failure) => {
            let reason = failure.error.to_string();
            context
                .stats
                .lock()
                .record_attempts(failure.attempts, failure.rate_limited);
            record_diagram_failure(context, &task, &reason);
            Err(FailedDiagram { task, reason })
        }
    }
}

fn record_diagram_failure(context: &WorkerContext, task: &DiagramTask, reason: &str) {
    context
        .reporter
        .line(format!("Failed to import {}: {}", task.label(), reason));
    let mut stats = context.stats.lock();
    stats.diagrams_failed += 1;
    stats.record_failure(format!("diagram {}: {}", task.placeholder, reason));
}

async fn run_table_pool(context: &WorkerContext, workers: WorkerCount, tasks: Vec<TableTask>) {
    let semaphore = Arc::new(Semaphore::new(workers.get()));
    let mut join_set = JoinSet::new();

    for task in tasks {
        let semaphore = Arc::clone(&semaphore);
        let context = context.clone();
        join_set.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return;
            };
            fill_table(&context, task).await;
        });
    }

    while let Some(result) = join_set.join_next().await {
        if let Err(e) = result {
            log::error!("Table worker task failed with join error: {}", e);
            context
                .stats
                .lock()
                .record_failure(format!("table worker panicked: {}", e));
        }
    }
}

/// Only rate limits are retried for table calls; anything else ends the
/// attempt.
fn classify_table_error(error: &AppError) -> ErrorClass {
    match error.classify() {
        ErrorClass::RateLimited => ErrorClass::RateLimited,
        _ => ErrorClass::Permanent,
    }
}

fn table_policy() -> RetryPolicy {
    RetryPolicy::new(0, TABLE_RATE_LIMIT_RETRIES + 1).with_backoff(Backoff::Linear {
        step: TABLE_RETRY_STEP,
    })
}

async fn fill_table(context: &WorkerContext, task: TableTask) {
    match try_fill_table(context, &task).await {
        Ok(()) => {
            context.stats.lock().tables_filled += 1;
            context.reporter.line(format!(
                "Filled table {} ({}x{})",
                task.table, task.data.rows, task.data.columns
            ));
        }
        Err(e) => {
            context
                .reporter
                .line(format!("Failed to fill table {}: {}", task.table, e));
            let mut stats = context.stats.lock();
            stats.tables_failed += 1;
            stats.record_failure(format!("table {}: {}", task.table, e));
        }
    }
}

async fn try_fill_table(context: &WorkerContext, task: &TableTask) -> Result<(), AppError> {
    let policy = table_policy();
    let document = &context.document;

    let cells = retry_table_call(context, &policy, || {
        context.repository.get_cell_ids(document, &task.table)
    })
    .await?;

    let expected = task.data.rows * task.data.columns;
    if cells.len() != expected {
        log::warn!(
            "Table {} has {} cells, expected {}",
            task.table,
            cells.len(),
            expected
        );
    }

    let rich = fill_cells(context, &policy, &cells, &task.data.cells_rich).await;
    match rich {
        Ok(()) => Ok(()),
        Err(e) if e.classify() == ErrorClass::RateLimited => Err(e),
        Err(e) => {
            log::info!(
                "Rich fill of table {} failed ({}), falling back to plain text",
                task.table,
                e
            );
            let plain: Vec<StyledText> = task
                .data
                .cells_plain
                .iter()
                .map(|cell| StyledText::plain(cell.as_str()))
                .collect();
            fill_cells(context, &policy, &cells, &plain).await
        }
    }
}

async fn fill_cells(
    context: &WorkerContext,
    policy: &RetryPolicy,
    cells: &[BlockId],
    content: &[StyledText],
) -> Result<(), AppError> {
    retry_table_call(context, policy, || {
        context.repository.fill_cells(&context.document, cells, content)
    })
    .await
}

async fn retry_table_call<T, F, Fut>(
    context: &WorkerContext,
    policy: &RetryPolicy,
    mut call: F,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, AppError>>,
{
    match do_with_retry(&context.cancel, policy, classify_table_error, |_| call()).await {
        Ok(outcome) => {
            context
                .stats
                .lock()
                .record_attempts(outcome.attempts, outcome.rate_limited);
            Ok(outcome.value)
        }
        Err(failure) => {
            context
                .stats
                .lock()
                .record_attempts(failure.attempts, failure.rate_limited);
            Err(failure.error)
        }
    }
}
