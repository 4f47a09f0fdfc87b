use super::common::BlockCommon;
use super::language::CodeLanguage;
use crate::types::{BackgroundColor, StyledText, WhiteboardId};
use serde::{Deserialize, Serialize};

/// Text content block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TextBlockContent {
    pub text: StyledText,
}

impl TextBlockContent {
    pub fn new(text: StyledText) -> Self {
        Self { text }
    }
}

/// Document root; its children are the top-level blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PageBlock {
    pub common: BlockCommon,
    pub content: TextBlockContent,
}

/// Paragraph block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TextBlock {
    pub common: BlockCommon,
    pub content: TextBlockContent,
}

/// Heading block, levels 1 through 9
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingBlock {
    pub common: BlockCommon,
    pub level: u8,
    pub content: TextBlockContent,
}

/// Bulleted or ordered list item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ListItemBlock {
    pub common: BlockCommon,
    pub content: TextBlockContent,
}

/// To-do block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ToDoBlock {
    pub common: BlockCommon,
    pub content: TextBlockContent,
    pub done: bool,
}

/// Code block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeBlock {
    pub common: BlockCommon,
    pub language: CodeLanguage,
    pub wrap: bool,
    pub content: TextBlockContent,
}

/// Single-paragraph quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct QuoteBlock {
    pub common: BlockCommon,
    pub content: TextBlockContent,
}

/// Structural container without a payload of its own
/// (quote container, table cell)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ContainerBlock {
    pub common: BlockCommon,
}

/// Callout block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalloutBlock {
    pub common: BlockCommon,
    pub background: BackgroundColor,
    pub emoji: Option<String>,
}

/// Table geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TableProperty {
    pub rows: usize,
    pub columns: usize,
    pub column_widths: Vec<u32>,
    pub header_row: bool,
}

/// Table block; `cells` lists cell block ids row-major
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableBlock {
    pub common: BlockCommon,
    pub property: TableProperty,
    pub cells: Vec<crate::types::BlockId>,
}

/// Image block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ImageBlock {
    pub common: BlockCommon,
    pub token: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Divider block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DividerBlock {
    pub common: BlockCommon,
}

/// Block-level equation (read-only: the service cannot create these)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EquationBlock {
    pub common: BlockCommon,
    pub expression: String,
}

/// Whiteboard canvas; the token is assigned by the service on creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BoardBlock {
    pub common: BlockCommon,
    pub token: Option<WhiteboardId>,
}

/// Multi-column layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GridBlock {
    pub common: BlockCommon,
    pub column_size: u32,
}

/// One column of a grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GridColumnBlock {
    pub common: BlockCommon,
    pub width_ratio: u32,
}

/// Attached file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FileBlock {
    pub common: BlockCommon,
    pub token: String,
    pub name: String,
}

/// Embedded sheet or bitable, referenced by token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EmbedBlock {
    pub common: BlockCommon,
    pub token: String,
}

/// Legacy diagram block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DiagramBlock {
    pub common: BlockCommon,
    pub diagram_type: u32,
}

/// Any block kind this crate does not model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UnknownBlock {
    pub common: BlockCommon,
    pub block_type: u32,
}
