// src/api/mod.rs
//! Document service interaction: the calls the converter pipelines make.
//!
//! Business logic depends on the [`DocumentRepository`] trait, never on HTTP
//! details; [`HttpDocumentClient`] is the production implementation and
//! tests substitute an in-memory one.

pub mod client;
mod pagination;
pub mod parser;
pub mod wire;

use crate::error::AppError;
use crate::model::{Block, DiagramSyntax};
use crate::types::{BlockId, DocumentId, FolderId, StyledText, WhiteboardId};
use std::path::Path;

/// What an uploaded media file is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaParent {
    DocxImage,
}

impl MediaParent {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaParent::DocxImage => "docx_image",
        }
    }
}

/// The ability to read and edit documents of the remote service.
///
/// This is the fundamental algebra for API interaction. Each method is one
/// remote call except the provided ones, which compose the others.
#[async_trait::async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn create_document(
        &self,
        title: &str,
        folder: Option<&FolderId>,
    ) -> Result<DocumentId, AppError>;

    /// Creates `children` under `parent` at `index` (appending when `None`)
    /// and returns them with their assigned ids, in order.
    async fn create_children(
        &self,
        document: &DocumentId,
        parent: &BlockId,
        children: &[Block],
        index: Option<usize>,
    ) -> Result<Vec<Block>, AppError>;

    /// Deletes the children of `parent` in `[start_index, end_index)`.
    async fn delete_children(
        &self,
        document: &DocumentId,
        parent: &BlockId,
        start_index: usize,
        end_index: usize,
    ) -> Result<(), AppError>;

    async fn list_children(
        &self,
        document: &DocumentId,
        block: &BlockId,
    ) -> Result<Vec<Block>, AppError>;

    /// Every block of the document as one flat list, in document order.
    async fn list_blocks(&self, document: &DocumentId) -> Result<Vec<Block>, AppError>;

    async fn get_block(&self, document: &DocumentId, block: &BlockId) -> Result<Block, AppError>;

    /// Imports diagram source into a whiteboard and returns the import ticket.
    async fn import_diagram(
        &self,
        whiteboard: &WhiteboardId,
        source: &str,
        syntax: DiagramSyntax,
    ) -> Result<String, AppError>;

    /// Uploads a local file and returns its media token.
    async fn upload_media(
        &self,
        path: &Path,
        parent: MediaParent,
        parent_id: &str,
    ) -> Result<String, AppError>;

    async fn download_media(&self, token: &str) -> Result<Vec<u8>, AppError>;

    /// Cell block ids of a table, row-major.
    async fn get_cell_ids(
        &self,
        document: &DocumentId,
        table: &BlockId,
    ) -> Result<Vec<BlockId>, AppError> {
        match self.get_block(document, table).await? {
            Block::Table(table) => Ok(table.cells),
            other => Err(AppError::MalformedResponse(format!(
                "Block {} is a {}, not a table",
                other.id(),
                other.block_type()
            ))),
        }
    }

    /// Writes one paragraph into each cell, pairing `cells` with `content`.
    ///
    /// A fresh cell holds one empty paragraph: the new paragraph goes in
    /// front of it and the empty one is removed. Cells with blank content
    /// are left untouched.
    async fn fill_cells(
        &self,
        document: &DocumentId,
        cells: &[BlockId],
        content: &[StyledText],
    ) -> Result<(), AppError> {
        for (cell, text) in cells.iter().zip(content) {
            if text.is_blank() {
                continue;
            }
            let paragraph = Block::text_block(text.clone());
            self.create_children(document, cell, std::slice::from_ref(&paragraph), Some(0))
                .await?;
            self.delete_children(document, cell, 1, 2).await?;
        }
        Ok(())
    }
}

// Re-export the public interface
pub use client::{HttpDocumentClient, DEFAULT_API_BASE};
