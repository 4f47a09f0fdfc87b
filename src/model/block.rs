use super::blocks::*;
use super::common::BlockCommon;
use crate::types::{BlockId, StyledText};
use serde::{Deserialize, Serialize};

/// Macro to reduce boilerplate in Block enum methods
macro_rules! match_all_blocks {
    ($self:expr, $pattern:pat => $result:expr) => {
        match $self {
            Block::Page($pattern) => $result,
            Block::Text($pattern) => $result,
            Block::Heading($pattern) => $result,
            Block::Bullet($pattern) => $result,
            Block::Ordered($pattern) => $result,
            Block::ToDo($pattern) => $result,
            Block::Code($pattern) => $result,
            Block::Quote($pattern) => $result,
            Block::QuoteContainer($pattern) => $result,
            Block::Callout($pattern) => $result,
            Block::Table($pattern) => $result,
            Block::TableCell($pattern) => $result,
            Block::Image($pattern) => $result,
            Block::Divider($pattern) => $result,
            Block::Equation($pattern) => $result,
            Block::Board($pattern) => $result,
            Block::Grid($pattern) => $result,
            Block::GridColumn($pattern) => $result,
            Block::File($pattern) => $result,
            Block::Sheet($pattern) => $result,
            Block::Bitable($pattern) => $result,
            Block::Diagram($pattern) => $result,
            Block::Unknown($pattern) => $result,
        }
    };
}

/// Block represents every block kind of the remote document model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Block {
    Page(PageBlock),
    Text(TextBlock),
    Heading(HeadingBlock),
    Bullet(ListItemBlock),
    Ordered(ListItemBlock),
    ToDo(ToDoBlock),
    Code(CodeBlock),
    Quote(QuoteBlock),
    QuoteContainer(ContainerBlock),
    Callout(CalloutBlock),
    Table(TableBlock),
    TableCell(ContainerBlock),
    Image(ImageBlock),
    Divider(DividerBlock),
    Equation(EquationBlock),
    Board(BoardBlock),
    Grid(GridBlock),
    GridColumn(GridColumnBlock),
    File(FileBlock),
    Sheet(EmbedBlock),
    Bitable(EmbedBlock),
    Diagram(DiagramBlock),
    Unknown(UnknownBlock),
}

impl Block {
    /// Get the block's ID
    pub fn id(&self) -> &BlockId {
        match_all_blocks!(self, b => &b.common.id)
    }

    /// Get the ids of the block's children, in order
    pub fn children(&self) -> &[BlockId] {
        match_all_blocks!(self, b => &b.common.children)
    }

    /// Check if block has children
    pub fn has_children(&self) -> bool {
        !self.children().is_empty()
    }

    /// Get common block data
    pub fn common(&self) -> &BlockCommon {
        match_all_blocks!(self, b => &b.common)
    }

    /// Get mutable common block data
    pub fn common_mut(&mut self) -> &mut BlockCommon {
        match_all_blocks!(self, b => &mut b.common)
    }

    /// Runs of a text-bearing block
    pub fn text(&self) -> Option<&StyledText> {
        match self {
            Block::Page(b) => Some(&b.content.text),
            Block::Text(b) => Some(&b.content.text),
            Block::Heading(b) => Some(&b.content.text),
            Block::Bullet(b) | Block::Ordered(b) => Some(&b.content.text),
            Block::ToDo(b) => Some(&b.content.text),
            Block::Code(b) => Some(&b.content.text),
            Block::Quote(b) => Some(&b.content.text),
            _ => None,
        }
    }

    pub fn is_list_item(&self) -> bool {
        matches!(self, Block::Bullet(_) | Block::Ordered(_) | Block::ToDo(_))
    }

    /// Get block type name
    pub fn block_type(&self) -> &'static str {
        match self {
            Block::Page(_) => "page",
            Block::Text(_) => "text",
            Block::Heading(_) => "heading",
            Block::Bullet(_) => "bullet",
            Block::Ordered(_) => "ordered",
            Block::ToDo(_) => "todo",
            Block::Code(_) => "code",
            Block::Quote(_) => "quote",
            Block::QuoteContainer(_) => "quote_container",
            Block::Callout(_) => "callout",
            Block::Table(_) => "table",
            Block::TableCell(_) => "table_cell",
            Block::Image(_) => "image",
            Block::Divider(_) => "divider",
            Block::Equation(_) => "equation",
            Block::Board(_) => "board",
            Block::Grid(_) => "grid",
            Block::GridColumn(_) => "grid_column",
            Block::File(_) => "file",
            Block::Sheet(_) => "sheet",
            Block::Bitable(_) => "bitable",
            Block::Diagram(_) => "diagram",
            Block::Unknown(_) => "unknown",
        }
    }

    /// Numeric kind code used on the wire
    pub fn kind_code(&self) -> u32 {
        match self {
            Block::Page(_) => 1,
            Block::Text(_) => 2,
            Block::Heading(b) => 2 + u32::from(b.level.clamp(1, 9)),
            Block::Bullet(_) => 12,
            Block::Ordered(_) => 13,
            Block::Code(_) => 14,
            Block::Quote(_) => 15,
            Block::Equation(_) => 16,
            Block::ToDo(_) => 17,
            Block::Bitable(_) => 18,
            Block::Callout(_) => 19,
            Block::Diagram(_) => 21,
            Block::Divider(_) => 22,
            Block::File(_) => 23,
            Block::Grid(_) => 24,
            Block::GridColumn(_) => 25,
            Block::Image(_) => 27,
            Block::Sheet(_) => 30,
            Block::Table(_) => 31,
            Block::TableCell(_) => 32,
            Block::QuoteContainer(_) => 34,
            Block::Board(_) => 43,
            Block::Unknown(b) => b.block_type,
        }
    }

    // --- Constructors for locally built blocks ---

    pub fn text_block(text: StyledText) -> Self {
        Block::Text(TextBlock {
            common: BlockCommon::default(),
            content: TextBlockContent::new(text),
        })
    }

    pub fn heading(level: u8, text: StyledText) -> Self {
        Block::Heading(HeadingBlock {
            common: BlockCommon::default(),
            level: level.clamp(1, 9),
            content: TextBlockContent::new(text),
        })
    }

    pub fn code(language: super::CodeLanguage, source: impl Into<String>) -> Self {
        Block::Code(CodeBlock {
            common: BlockCommon::default(),
            language,
            wrap: false,
            content: TextBlockContent::new(StyledText::plain(source)),
        })
    }

    pub fn divider() -> Self {
        Block::Divider(DividerBlock::default())
    }

    pub fn empty_board() -> Self {
        Block::Board(BoardBlock::default())
    }
}
