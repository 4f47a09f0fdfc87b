// src/import/fallback.rs
//! Phase 3: degrade failed diagrams into code blocks.
//!
//! Positions are looked up from the live child list, after the workers are
//! done. Replacements run from the highest index down so earlier positions
//! stay valid.

use super::stats::{ProgressReporter, SharedStats};
use super::tasks::FailedDiagram;
use crate::api::DocumentRepository;
use crate::error::AppError;
use crate::model::{Block, CodeLanguage};
use crate::types::{BlockId, DocumentId};
use std::collections::HashMap;

/// Code block content standing in for a diagram: a comment line naming the
/// syntax, then the original source.
pub fn fallback_source(failed: &FailedDiagram) -> String {
    let syntax = failed.task.syntax;
    format!(
        "{} {} diagram (whiteboard import failed)\n{}",
        syntax.comment_prefix(),
        syntax,
        failed.task.source
    )
}

/// Replaces each failed diagram's placeholder with a code block carrying
/// its source. Failures are recorded per diagram and never stop the rest.
pub async fn run_fallback(
    repository: &dyn DocumentRepository,
    document: &DocumentId,
    failed: Vec<FailedDiagram>,
    stats: &SharedStats,
    reporter: &ProgressReporter,
) -> Result<(), AppError> {
    if failed.is_empty() {
        return Ok(());
    }
    let root: BlockId = document.cast();

    let children = repository.list_children(document, &root).await?;
    let positions: HashMap<&BlockId, usize> = children
        .iter()
        .enumerate()
        .map(|(index, block)| (block.id(), index))
        .collect();

    let mut located = Vec::with_capacity(failed.len());
    for item in failed {
        match positions.get(&item.task.placeholder) {
            Some(&index) => located.push((index, item)),
            None => {
                log::warn!(
                    "Placeholder {} is no longer in the document, skipping fallback",
                    item.task.placeholder
                );
                let mut stats = stats.lock();
                stats.fallbacks_failed += 1;
                stats.record_failure(format!(
                    "fallback {}: placeholder not found",
                    item.task.placeholder
                ));
            }
        }
    }
    located.sort_by(|a, b| b.0.cmp(&a.0));

    for (index, item) in located {
        match replace_placeholder(repository, document, &root, index, &item).await {
            Ok(()) => {
                stats.lock().fallbacks_applied += 1;
                reporter.line(format!(
                    "Replaced {} at position {} with a code block",
                    item.task.label(),
                    index
                ));
            }
            Err(e) => {
                reporter.line(format!(
                    "Fallback for {} at position {} failed: {}",
                    item.task.label(),
                    index,
                    e
                ));
                let mut stats = stats.lock();
                stats.fallbacks_failed += 1;
                stats.record_failure(format!("fallback {}: {}", item.task.placeholder, e));
            }
        }
    }

    Ok(())
}

async fn replace_placeholder(
    repository: &dyn DocumentRepository,
    document: &DocumentId,
    root: &BlockId,
    index: usize,
    item: &FailedDiagram,
) -> Result<(), AppError> {
    repository
        .delete_children(document, root, index, index + 1)
        .await?;
    let code = Block::code(
        CodeLanguage::from_info_string(item.task.syntax.as_str()),
        fallback_source(item),
    );
    repository
        .create_children(document, root, &[code], Some(index))
        .await?;
    Ok(())
}
