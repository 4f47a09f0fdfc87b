// src/import/mod.rs
//! Three-phase import of a Markdown file into a live document.
//!
//! 1. Sequential creation of blocks, board placeholders and table shells.
//! 2. Concurrent diagram imports and table fills, each with retry.
//! 3. Replacement of diagrams that still failed by code blocks.

mod creation;
mod fallback;
mod stats;
mod tasks;
mod workers;

pub use creation::{BlockCreator, PreparedSegment};
pub use fallback::{fallback_source, run_fallback};
pub use stats::{
    shared_stats, ImportReport, ImportStats, PhaseTimings, ProgressReporter, SharedStats,
};
pub use tasks::{DiagramTask, FailedDiagram, QueuedWork, TableTask};
pub use workers::{classify_diagram_error, run_workers, WorkerContext, WorkerSettings};

use crate::api::DocumentRepository;
use crate::constants::{PHASE_TWO_COOLDOWN, PHASE_TWO_COOLDOWN_THRESHOLD};
use crate::error::AppError;
use crate::parsing::{
    convert_with_table_data, resolve_images, split_segments, ConvertedDocument, ImageOptions,
    SegmentKind,
};
use crate::types::DocumentId;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Everything that shapes one import run.
#[derive(Debug, Clone)]
pub struct ImportSettings {
    pub workers: WorkerSettings,
    pub images: ImageOptions,
}

/// Segments the file and converts every Markdown segment.
pub fn prepare_segments(markdown: &str) -> Vec<PreparedSegment> {
    split_segments(markdown)
        .into_iter()
        .map(|segment| match segment.kind {
            SegmentKind::Markdown => {
                PreparedSegment::Markdown(convert_with_table_data(&segment.content))
            }
            SegmentKind::Diagram(syntax) => PreparedSegment::Diagram {
                syntax,
                source: segment.content,
            },
            SegmentKind::Equation => PreparedSegment::Equation(segment.content),
        })
        .collect()
}

/// What an import would do, computed locally without remote calls.
#[derive(Debug, Clone, Serialize)]
pub struct ImportPlan {
    pub segments: Vec<PlannedSegment>,
    pub blocks: usize,
    pub diagrams: usize,
    pub tables: usize,
    pub pending_images: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlannedSegment {
    Markdown { document: ConvertedDocument },
    Diagram { syntax: crate::model::DiagramSyntax, source: String },
    Equation { expression: String },
}

/// Builds the dry-run plan for `markdown`.
pub fn plan_import(markdown: &str) -> ImportPlan {
    let mut plan = ImportPlan {
        segments: Vec::new(),
        blocks: 0,
        diagrams: 0,
        tables: 0,
        pending_images: 0,
    };

    for segment in prepare_segments(markdown) {
        let planned = match segment {
            PreparedSegment::Markdown(document) => {
                plan.blocks += document.block_count();
                plan.tables += document.tables.len();
                plan.pending_images += count_pending_images(&document.nodes);
                PlannedSegment::Markdown { document }
            }
            PreparedSegment::Diagram { syntax, source } => {
                plan.blocks += 1;
                plan.diagrams += 1;
                PlannedSegment::Diagram { syntax, source }
            }
            PreparedSegment::Equation(expression) => {
                plan.blocks += 1;
                PlannedSegment::Equation { expression }
            }
        };
        plan.segments.push(planned);
    }
    plan
}

fn count_pending_images(nodes: &[crate::model::BlockNode]) -> usize {
    nodes
        .iter()
        .map(|node| usize::from(node.pending_image.is_some()) + count_pending_images(&node.children))
        .sum()
}

/// Runs the three phases against one document.
pub struct Importer {
    repository: Arc<dyn DocumentRepository>,
    settings: ImportSettings,
    reporter: Arc<ProgressReporter>,
    cancel: CancellationToken,
}

impl Importer {
    pub fn new(
        repository: Arc<dyn DocumentRepository>,
        settings: ImportSettings,
        reporter: Arc<ProgressReporter>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            repository,
            settings,
            reporter,
            cancel,
        }
    }

    /// Imports `markdown` into `document`.
    ///
    /// Fails only when block creation fails; diagram, table and fallback
    /// failures are reported in the returned summary.
    pub async fn import(
        &self,
        document: &DocumentId,
        markdown: &str,
        source_name: &str,
    ) -> Result<ImportReport, AppError> {
        let started_at = chrono::Utc::now();
        let stats = shared_stats();
        let mut timings = PhaseTimings::default();

        // Phase 1
        let started = Instant::now();
        let mut segments = prepare_segments(markdown);
        let segment_count = segments.len();
        self.resolve_images(&mut segments, document, &stats).await;

        let mut creator = BlockCreator::new(self.repository.as_ref(), document, &stats, &self.reporter);
        let work = creator.create_segments(segments).await?;
        let calls = creator.calls();
        timings.creation = started.elapsed();
        log::info!(
            "Created {} blocks in {} calls; {} diagrams and {} tables queued",
            stats.lock().blocks_created,
            calls,
            work.diagrams.len(),
            work.tables.len()
        );

        let diagrams_queued = work.diagrams.len();
        let tables_queued = work.tables.len();

        // Phase 2
        let started = Instant::now();
        let failed = if work.is_empty() {
            Vec::new()
        } else {
            if calls > PHASE_TWO_COOLDOWN_THRESHOLD {
                log::info!("Cooling down {:?} after {} create calls", PHASE_TWO_COOLDOWN, calls);
                tokio::select! {
                    _ = self.cancel.cancelled() => return Err(AppError::Cancelled),
                    _ = tokio::time::sleep(PHASE_TWO_COOLDOWN) => {}
                }
            }
            let context = WorkerContext {
                repository: Arc::clone(&self.repository),
                document: document.clone(),
                stats: Arc::clone(&stats),
                reporter: Arc::clone(&self.reporter),
                cancel: self.cancel.clone(),
            };
            run_workers(&context, self.settings.workers, work.diagrams, work.tables).await
        };
        timings.workers = started.elapsed();

        // Phase 3
        let started = Instant::now();
        let fallback_ran = !failed.is_empty();
        if fallback_ran {
            log::info!("Degrading {} failed diagrams to code blocks", failed.len());
            if let Err(e) = run_fallback(
                self.repository.as_ref(),
                document,
                failed,
                &stats,
                &self.reporter,
            )
            .await
            {
                log::warn!("Fallback phase could not list the document: {}", e);
                stats.lock().record_failure(format!("fallback: {}", e));
            }
        }
        timings.fallback = started.elapsed();

        let stats = stats.lock().clone();
        Ok(ImportReport {
            document_id: document.as_str().to_string(),
            source: source_name.to_string(),
            started_at,
            segments: segment_count,
            diagrams_queued,
            tables_queued,
            fallback_ran,
            timings,
            stats,
        })
    }

    async fn resolve_images(
        &self,
        segments: &mut [PreparedSegment],
        document: &DocumentId,
        stats: &SharedStats,
    ) {
        for segment in segments.iter_mut() {
            if let PreparedSegment::Markdown(converted) = segment {
                let resolution = resolve_images(
                    &mut converted.nodes,
                    self.repository.as_ref(),
                    document,
                    &self.settings.images,
                )
                .await;
                let mut stats = stats.lock();
                stats.images_uploaded += resolution.uploaded;
                stats.images_degraded += resolution.degraded;
                stats.failures.extend(resolution.failures);
            }
        }
    }
}
