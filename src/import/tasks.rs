// src/import/tasks.rs
//! Work items queued during block creation and consumed by the workers.

use crate::model::{DiagramSyntax, TableData};
use crate::types::{BlockId, WhiteboardId};
use serde::Serialize;

/// A diagram waiting to be imported into its placeholder whiteboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagramTask {
    /// The board block reserving the diagram's position.
    pub placeholder: BlockId,
    /// `None` when the service returned the board without a token.
    pub whiteboard: Option<WhiteboardId>,
    pub syntax: DiagramSyntax,
    pub source: String,
}

impl DiagramTask {
    /// Short label for log lines: syntax and first source line.
    pub fn label(&self) -> String {
        let first_line = self.source.lines().next().unwrap_or("").trim();
        format!("{} '{}'", self.syntax, first_line)
    }
}

/// A created table whose cells still need their content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableTask {
    pub table: BlockId,
    pub data: TableData,
}

/// A diagram that could not be imported and must be degraded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedDiagram {
    pub task: DiagramTask,
    pub reason: String,
}

/// Everything block creation hands over to the later phases.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueuedWork {
    pub diagrams: Vec<DiagramTask>,
    pub tables: Vec<TableTask>,
}

impl QueuedWork {
    pub fn is_empty(&self) -> bool {
        self.diagrams.is_empty() && self.tables.is_empty()
    }
}
