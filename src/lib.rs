// src/lib.rs
//! blockmark library — converts between Markdown files and block-structured
//! online documents.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling** — `AppError`, `ErrorClass`, `ValidationError`
//! - **Configuration** — `PipelineConfig`, `ImportConfig`, `ExportConfig`
//! - **Domain model** — `Block`, `BlockTree`, `BlockNode`, `TableData`
//! - **Domain types** — `BlockId`, `DocumentId`, `StyledText`, `AccessToken`
//! - **API client** — `DocumentRepository`, `HttpDocumentClient`
//! - **Conversion** — `render_blocks` (blocks → Markdown), `convert` (Markdown → blocks)
//! - **Import** — `Importer` and its three phases

pub mod analytics;
pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod error_recovery;
pub mod formatting;
pub mod import;
pub mod model;
pub mod output;
pub mod parsing;
pub mod pipeline;
pub mod types;

// --- Error Handling ---
pub use crate::error::{AppError, ErrorClass, RemoteErrorCode};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{CommandLineInput, ExportConfig, ImportConfig, PipelineConfig};

// --- Domain Model ---
pub use crate::model::{Block, BlockCommon, BlockNode, BlockTree, DiagramSyntax, TableData};

// --- Domain Types ---
pub use crate::types::{
    AccessToken, Admonition, BlockId, DocumentId, FolderId, RenderedMarkdown, StyledText,
    TextElement, TextStyle, WhiteboardId, WorkerCount,
};

// --- API Client ---
pub use crate::api::{DocumentRepository, HttpDocumentClient, MediaParent};

// --- Conversion ---
pub use crate::formatting::{render_blocks, render_tree, RenderOptions};
pub use crate::parsing::{convert, convert_with_table_data, split_segments};

// --- Retry ---
pub use crate::error_recovery::{do_with_retry, RetryPolicy};

// --- Import ---
pub use crate::import::{
    plan_import, ImportReport, ImportSettings, ImportStats, Importer, ProgressReporter,
    WorkerSettings,
};

// --- Pipelines ---
pub use crate::pipeline::{
    dry_run, run_import, DocumentExport, DocumentSource, MarkdownComposer, MarkdownDelivery,
};
