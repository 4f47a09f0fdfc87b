// src/import/creation.rs
//! Phase 1: sequential block creation.
//!
//! Segments are created in document order. Nodes go out in batches under
//! their parent; nested children follow right after the batch that created
//! their parent. Tables and diagrams only get their shell here and are
//! queued for the workers.

use super::stats::{ProgressReporter, SharedStats};
use super::tasks::{DiagramTask, QueuedWork, TableTask};
use crate::api::DocumentRepository;
use crate::constants::{BLOCK_MAX_RENDER_DEPTH, CREATE_CHILDREN_BATCH_SIZE};
use crate::error::AppError;
use crate::model::{Block, BlockNode, DiagramSyntax, TableData};
use crate::parsing::ConvertedDocument;
use crate::types::{BlockId, DocumentId, StyledText, TextElement, WhiteboardId};

/// A segment ready for creation.
#[derive(Debug, Clone)]
pub enum PreparedSegment {
    Markdown(ConvertedDocument),
    Diagram { syntax: DiagramSyntax, source: String },
    Equation(String),
}

/// One pending creation: nodes to create under `parent`.
struct PendingLevel {
    parent: BlockId,
    nodes: Vec<BlockNode>,
    depth: usize,
}

pub struct BlockCreator<'a> {
    repository: &'a dyn DocumentRepository,
    document: &'a DocumentId,
    root: BlockId,
    stats: &'a SharedStats,
    reporter: &'a ProgressReporter,
    batches: usize,
}

impl<'a> BlockCreator<'a> {
    pub fn new(
        repository: &'a dyn DocumentRepository,
        document: &'a DocumentId,
        stats: &'a SharedStats,
        reporter: &'a ProgressReporter,
    ) -> Self {
        Self {
            repository,
            document,
            root: document.cast(),
            stats,
            reporter,
            batches: 0,
        }
    }

    /// Creates every segment in order and returns the queued work.
    ///
    /// A failed batch aborts the run; a failed diagram placeholder is
    /// recorded and skipped.
    pub async fn create_segments(
        &mut self,
        segments: Vec<PreparedSegment>,
    ) -> Result<QueuedWork, AppError> {
        let mut work = QueuedWork::default();

        for (index, segment) in segments.into_iter().enumerate() {
            match segment {
                PreparedSegment::Markdown(converted) => {
                    let ConvertedDocument { nodes, tables } = converted;
                    let mut tables: Vec<Option<TableData>> = tables.into_iter().map(Some).collect();
                    let root = self.root.clone();
                    self.create_tree(root, nodes, &mut tables, &mut work.tables)
                        .await?;
                }
                PreparedSegment::Equation(expression) => {
                    // No top-level equation block can be created
                    let paragraph = Block::text_block(StyledText::from_elements(vec![
                        TextElement::equation(expression),
                    ]));
                    let root = self.root.clone();
                    self.create_batch(&root, &[paragraph]).await?;
                }
                PreparedSegment::Diagram { syntax, source } => {
                    match self.create_placeholder().await {
                        Ok((placeholder, whiteboard)) => {
                            self.reporter
                                .line(format!("Reserved board {} for {} diagram", placeholder, syntax));
                            work.diagrams.push(DiagramTask {
                                placeholder,
                                whiteboard,
                                syntax,
                                source,
                            });
                        }
                        Err(e) => {
                            log::warn!("Failed to create board for diagram segment {}: {}", index, e);
                            let mut stats = self.stats.lock();
                            stats.placeholder_failures += 1;
                            stats.record_failure(format!(
                                "segment {}: {} board could not be created: {}",
                                index, syntax, e
                            ));
                        }
                    }
                }
            }
        }

        Ok(work)
    }

    /// Number of create calls issued so far.
    pub fn calls(&self) -> usize {
        self.batches
    }

    async fn create_placeholder(&mut self) -> Result<(BlockId, Option<WhiteboardId>), AppError> {
        let root = self.root.clone();
        let created = self
            .repository
            .create_children(self.document, &root, &[Block::empty_board()], None)
            .await?;
        self.batches += 1;
        self.stats.lock().create_calls += 1;

        match created.into_iter().next() {
            Some(Block::Board(board)) => {
                self.stats.lock().blocks_created += 1;
                Ok((board.common.id, board.token))
            }
            Some(other) => Err(AppError::MalformedResponse(format!(
                "Expected a board block, service returned {}",
                other.block_type()
            ))),
            None => Err(AppError::MalformedResponse(
                "Board creation returned no block".to_string(),
            )),
        }
    }

    /// Creates `nodes` under `parent`, then each node's children under the
    /// node's new id. Nesting past the depth cap is flattened into the
    /// deepest allowed parent.
    async fn create_tree(
        &mut self,
        parent: BlockId,
        nodes: Vec<BlockNode>,
        tables: &mut [Option<TableData>],
        table_tasks: &mut Vec<TableTask>,
    ) -> Result<(), AppError> {
        let mut pending = vec![PendingLevel {
            parent,
            nodes,
            depth: 0,
        }];

        while let Some(level) = pending.pop() {
            let mut nested = Vec::new();
            let mut remaining = level.nodes;

            while !remaining.is_empty() {
                let rest = remaining.split_off(remaining.len().min(CREATE_CHILDREN_BATCH_SIZE));
                let chunk = std::mem::replace(&mut remaining, rest);
                let blocks: Vec<Block> = chunk.iter().map(|node| node.block.clone()).collect();
                let created = self.create_batch(&level.parent, &blocks).await?;

                for (node, block) in chunk.into_iter().zip(created) {
                    if let Some(slot) = node.table_slot {
                        match tables.get_mut(slot).and_then(Option::take) {
                            Some(data) => table_tasks.push(TableTask {
                                table: block.id().clone(),
                                data,
                            }),
                            None => log::warn!("Table {} has no cell data", block.id()),
                        }
                    }
                    if node.children.is_empty() {
                        continue;
                    }
                    let (parent, depth) = if level.depth + 1 >= BLOCK_MAX_RENDER_DEPTH {
                        log::warn!(
                            "Nesting deeper than {} under {}, flattening",
                            BLOCK_MAX_RENDER_DEPTH,
                            block.id()
                        );
                        (level.parent.clone(), level.depth)
                    } else {
                        (block.id().clone(), level.depth + 1)
                    };
                    nested.push(PendingLevel {
                        parent,
                        nodes: node.children,
                        depth,
                    });
                }
            }

            // Depth first: the first parent's children are created next
            pending.extend(nested.into_iter().rev());
        }

        Ok(())
    }

    /// One create call. Failure aborts the import.
    async fn create_batch(&mut self, parent: &BlockId, blocks: &[Block]) -> Result<Vec<Block>, AppError> {
        let batch = self.batches + 1;
        let created = self
            .repository
            .create_children(self.document, parent, blocks, None)
            .await
            .map_err(|e| AppError::BatchCreationFailed {
                batch,
                source: Box::new(e),
            })?;
        self.batches = batch;

        if created.len() != blocks.len() {
            return Err(AppError::BatchCreationFailed {
                batch,
                source: Box::new(AppError::MalformedResponse(format!(
                    "sent {} blocks, service returned {}",
                    blocks.len(),
                    created.len()
                ))),
            });
        }

        {
            let mut stats = self.stats.lock();
            stats.create_calls += 1;
            stats.blocks_created += created.len();
        }
        log::debug!("Batch {}: created {} blocks under {}", batch, created.len(), parent);
        Ok(created)
    }
}
