use super::Block;
use crate::types::StyledText;
use serde::Serialize;

/// A block produced locally by the Markdown converter, with its nested
/// children embedded. Nodes are turned into remote blocks top-down during
/// phase 1; the embedded children are created under the parent's returned id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockNode {
    pub block: Block,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BlockNode>,
    /// Index into the converted document's table list, set on table nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_slot: Option<usize>,
    /// Image awaiting upload, set on image nodes built from Markdown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_image: Option<PendingImage>,
}

impl BlockNode {
    pub fn new(block: Block) -> Self {
        Self {
            block,
            children: Vec::new(),
            table_slot: None,
            pending_image: None,
        }
    }

    pub fn with_children(mut self, children: Vec<BlockNode>) -> Self {
        self.children = children;
        self
    }

    /// Number of nodes in this subtree, the node itself included.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(BlockNode::subtree_len).sum::<usize>()
    }
}

/// Image reference found in Markdown, before it has a media token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingImage {
    pub source: String,
    pub alt: String,
}

impl PendingImage {
    pub fn is_remote(&self) -> bool {
        self.source.starts_with("http://") || self.source.starts_with("https://")
    }
}

/// Cell content of one table, kept aside until phase 2 fills the cells.
///
/// `rows` counts the header row when `header_row` is set. Both cell views are
/// row-major and hold exactly `rows * columns` entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableData {
    pub rows: usize,
    pub columns: usize,
    pub header_row: bool,
    pub column_widths: Vec<u32>,
    pub cells_plain: Vec<String>,
    pub cells_rich: Vec<StyledText>,
}

impl TableData {
    /// Data rows, header excluded.
    pub fn data_rows(&self) -> usize {
        if self.header_row {
            self.rows.saturating_sub(1)
        } else {
            self.rows
        }
    }

    pub fn row_plain(&self, row: usize) -> &[String] {
        let start = row * self.columns;
        let end = (start + self.columns).min(self.cells_plain.len());
        self.cells_plain.get(start..end).unwrap_or(&[])
    }
}
