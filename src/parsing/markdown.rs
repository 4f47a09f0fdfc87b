// src/parsing/markdown.rs
//! Markdown to block conversion over `pulldown-cmark` events.
//!
//! The converter keeps a stack of open containers (the document root, block
//! quotes, list items) and an inline buffer for the paragraph being read.
//! Inline styles are tracked on a separate stack where every entry extends
//! its parent, so nested emphasis accumulates rather than replaces.
//!
//! The container stack is capped at [`BLOCK_MAX_RENDER_DEPTH`]: quotes and
//! list items opened past the cap do not nest further, their content lands
//! in the deepest open container.

use super::table::{split_table, ParsedTable};
use crate::constants::{BLOCK_MAX_RENDER_DEPTH, IMAGE_TOKEN_SCHEME, TABLE_MAX_ROWS};
use crate::model::*;
use crate::types::{Admonition, StyledText, TextElement, TextStyle, ValidatedUrl};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use serde::Serialize;

/// Output of one conversion: block nodes plus the cell content of every
/// table among them, indexed by [`BlockNode::table_slot`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConvertedDocument {
    pub nodes: Vec<BlockNode>,
    pub tables: Vec<TableData>,
}

impl ConvertedDocument {
    /// Total number of blocks, nested ones included.
    pub fn block_count(&self) -> usize {
        self.nodes.iter().map(BlockNode::subtree_len).sum()
    }
}

/// Converts Markdown into block nodes, discarding table cell content.
pub fn convert(markdown: &str) -> Vec<BlockNode> {
    convert_with_table_data(markdown).nodes
}

/// Converts Markdown into block nodes and the table data needed to fill
/// their cells later.
pub fn convert_with_table_data(markdown: &str) -> ConvertedDocument {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_MATH);

    let mut state = ConverterState::new();
    for (event, range) in Parser::new_ext(markdown, options).into_offset_iter() {
        let opens_paragraph = matches!(event, Event::Start(Tag::Paragraph));
        state.handle_event(event);
        if opens_paragraph {
            // A `\#` escape reads as the same text, so only a literal `#`
            // in the source can open a deep heading
            state.paragraph_starts_with_hash = markdown[range].starts_with('#');
        }
    }
    state.finish()
}

// --- Converter state ---

#[derive(Debug)]
enum Container {
    Root(Vec<BlockNode>),
    Quote(Vec<BlockNode>),
    Item(ListItemState),
}

#[derive(Debug)]
struct ListItemState {
    ordered: bool,
    checked: Option<bool>,
    text: Option<StyledText>,
    children: Vec<BlockNode>,
}

#[derive(Debug, Default)]
struct TableState {
    columns: usize,
    header: Vec<StyledText>,
    rows: Vec<Vec<StyledText>>,
    current_row: Vec<StyledText>,
}

#[derive(Debug)]
struct ImageState {
    source: String,
    alt: String,
}

#[derive(Debug)]
struct CodeState {
    info: String,
    source: String,
}

struct ConverterState {
    containers: Vec<Container>,
    /// One entry per open list: whether it is ordered
    lists: Vec<bool>,
    inline: StyledText,
    style_stack: Vec<TextStyle>,
    heading: Option<u8>,
    code: Option<CodeState>,
    table: Option<TableState>,
    image: Option<ImageState>,
    tables: Vec<TableData>,
    /// Quotes and items opened past the depth cap and not yet closed
    flattened: usize,
    /// Images read inside a heading, emitted after it
    deferred: Vec<BlockNode>,
    paragraph_starts_with_hash: bool,
}

impl ConverterState {
    fn new() -> Self {
        Self {
            containers: vec![Container::Root(Vec::new())],
            lists: Vec::new(),
            inline: StyledText::new(),
            style_stack: Vec::new(),
            heading: None,
            code: None,
            table: None,
            image: None,
            tables: Vec::new(),
            flattened: 0,
            deferred: Vec::new(),
            paragraph_starts_with_hash: false,
        }
    }

    /// Whether another quote or list item may nest; counts it as flattened
    /// when not.
    fn may_nest(&mut self) -> bool {
        if self.flattened == 0 && self.containers.len() < BLOCK_MAX_RENDER_DEPTH {
            return true;
        }
        if self.flattened == 0 {
            log::warn!(
                "Nesting deeper than {} levels, keeping further content at that depth",
                BLOCK_MAX_RENDER_DEPTH
            );
        }
        self.flattened += 1;
        false
    }

    /// Closes a flattened quote or item, if the innermost open one is.
    fn close_flattened(&mut self) -> bool {
        if self.flattened == 0 {
            return false;
        }
        self.flattened -= 1;
        self.flush_inline();
        true
    }

    fn current_style(&self) -> TextStyle {
        self.style_stack.last().cloned().unwrap_or_default()
    }

    fn push_style(&mut self, change: impl FnOnce(&mut TextStyle)) {
        let mut style = self.current_style();
        change(&mut style);
        self.style_stack.push(style);
    }

    fn pop_style(&mut self) {
        self.style_stack.pop();
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            // Block structure
            Event::Start(Tag::Paragraph) => self.flush_inline(),
            Event::End(TagEnd::Paragraph) => self.flush_inline(),
            Event::Start(Tag::Heading { level, .. }) => {
                self.flush_inline();
                self.heading = Some(level as u8);
            }
            Event::End(TagEnd::Heading(_)) => self.handle_heading_end(),
            Event::Start(Tag::BlockQuote(_)) => {
                self.flush_inline();
                if self.may_nest() {
                    self.containers.push(Container::Quote(Vec::new()));
                }
            }
            Event::End(TagEnd::BlockQuote(_)) => {
                if !self.close_flattened() {
                    self.handle_quote_end();
                }
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                self.flush_inline();
                let info = match kind {
                    CodeBlockKind::Fenced(info) => info.to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                self.code = Some(CodeState {
                    info,
                    source: String::new(),
                });
            }
            Event::End(TagEnd::CodeBlock) => self.handle_code_end(),
            Event::Start(Tag::List(first_number)) => {
                self.flush_inline();
                self.lists.push(first_number.is_some());
            }
            Event::End(TagEnd::List(_)) => {
                self.lists.pop();
            }
            Event::Start(Tag::Item) => {
                self.flush_inline();
                if self.may_nest() {
                    let ordered = self.lists.last().copied().unwrap_or(false);
                    self.containers.push(Container::Item(ListItemState {
                        ordered,
                        checked: None,
                        text: None,
                        children: Vec::new(),
                    }));
                }
            }
            Event::End(TagEnd::Item) => {
                if !self.close_flattened() {
                    self.handle_item_end();
                }
            }
            Event::TaskListMarker(checked) => {
                if self.flattened > 0 {
                    return;
                }
                if let Some(Container::Item(item)) = self.containers.last_mut() {
                    item.checked = Some(checked);
                }
            }
            Event::Rule => {
                self.flush_inline();
                self.push_node(BlockNode::new(Block::divider()));
            }

            // Tables
            Event::Start(Tag::Table(alignments)) => {
                self.flush_inline();
                self.table = Some(TableState {
                    columns: alignments.len(),
                    ..Default::default()
                });
            }
            Event::End(TagEnd::Table) => self.handle_table_end(),
            Event::Start(Tag::TableHead | Tag::TableRow) => {
                if let Some(table) = self.table.as_mut() {
                    table.current_row.clear();
                }
            }
            Event::End(TagEnd::TableHead) => {
                if let Some(table) = self.table.as_mut() {
                    table.header = std::mem::take(&mut table.current_row);
                }
            }
            Event::End(TagEnd::TableRow) => {
                if let Some(table) = self.table.as_mut() {
                    let row = std::mem::take(&mut table.current_row);
                    table.rows.push(row);
                }
            }
            Event::Start(Tag::TableCell) => {
                self.inline = StyledText::new();
            }
            Event::End(TagEnd::TableCell) => {
                let mut cell = std::mem::take(&mut self.inline);
                cell.trim();
                if let Some(table) = self.table.as_mut() {
                    table.current_row.push(cell);
                }
            }

            // Inline styles
            Event::Start(Tag::Emphasis) => self.push_style(|s| s.italic = true),
            Event::Start(Tag::Strong) => self.push_style(|s| s.bold = true),
            Event::Start(Tag::Strikethrough) => self.push_style(|s| s.strikethrough = true),
            Event::End(TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough) => {
                self.pop_style()
            }
            Event::Start(Tag::Link { dest_url, .. }) => {
                let link = ValidatedUrl::parse(&dest_url).ok();
                if link.is_none() {
                    log::debug!("Link target '{}' is not absolute, keeping text only", dest_url);
                }
                self.push_style(|s| {
                    if link.is_some() {
                        s.link = link;
                    }
                });
            }
            Event::End(TagEnd::Link) => self.pop_style(),
            Event::Start(Tag::Image { dest_url, .. }) => {
                self.image = Some(ImageState {
                    source: dest_url.to_string(),
                    alt: String::new(),
                });
            }
            Event::End(TagEnd::Image) => self.handle_image_end(),

            // Inline content
            Event::Text(text) => self.handle_text(&text),
            Event::Code(code) => {
                let mut style = self.current_style();
                style.inline_code = true;
                self.inline.push(TextElement::styled(code.to_string(), style));
            }
            Event::InlineMath(expression) | Event::DisplayMath(expression) => {
                self.inline.push(TextElement::equation(expression.trim()));
            }
            Event::SoftBreak => self.handle_text(" "),
            Event::HardBreak => self.handle_text("\n"),
            Event::InlineHtml(html) => self.handle_inline_html(&html),
            Event::Html(html) => self.handle_block_html(&html),
            Event::FootnoteReference(label) => self.handle_text(&format!("[^{}]", label)),
            _ => {}
        }
    }

    // --- Inline handlers ---

    fn handle_text(&mut self, text: &str) {
        if let Some(code) = self.code.as_mut() {
            code.source.push_str(text);
            return;
        }
        if let Some(image) = self.image.as_mut() {
            image.alt.push_str(text);
            return;
        }
        let style = self.current_style();
        self.inline.push(TextElement::styled(text, style));
    }

    fn handle_inline_html(&mut self, html: &str) {
        let tag = html.trim().to_ascii_lowercase();
        match tag.as_str() {
            "<u>" | "<ins>" => self.push_style(|s| s.underline = true),
            "</u>" | "</ins>" => self.pop_style(),
            "<br>" | "<br/>" | "<br />" => self.handle_text("\n"),
            _ if tag.starts_with("<!--") => {}
            _ => self.handle_text(html),
        }
    }

    fn handle_block_html(&mut self, html: &str) {
        let trimmed = html.trim();
        if trimmed.is_empty() || (trimmed.starts_with("<!--") && trimmed.ends_with("-->")) {
            log::debug!("Dropping HTML comment: {}", trimmed);
            return;
        }
        self.flush_inline();
        self.push_node(BlockNode::new(Block::text_block(StyledText::plain(trimmed))));
    }

    // --- Block handlers ---

    /// Ends the paragraph being read, if any, routing it into the current
    /// container. The first paragraph of a list item becomes its text.
    fn flush_inline(&mut self) {
        if self.table.is_some() || self.heading.is_some() {
            return;
        }
        let literal_hash = std::mem::take(&mut self.paragraph_starts_with_hash);
        let mut text = std::mem::take(&mut self.inline);
        text.trim();
        if text.is_empty() || text.is_blank() {
            return;
        }

        if let Some(Container::Item(item)) = self.containers.last_mut() {
            if item.text.is_none() && item.children.is_empty() {
                item.text = Some(text);
                return;
            }
        }

        let block = match deep_heading_level(&text).filter(|_| literal_hash) {
            Some(level) => {
                text.strip_prefix_chars(level as usize + 1);
                text.trim();
                Block::heading(level, text)
            }
            None => Block::text_block(text),
        };
        self.push_node(BlockNode::new(block));
    }

    fn handle_heading_end(&mut self) {
        let Some(level) = self.heading.take() else {
            return;
        };
        let mut text = std::mem::take(&mut self.inline);
        text.trim();
        if !text.is_empty() {
            self.push_node(BlockNode::new(Block::heading(level, text)));
        }
        for node in std::mem::take(&mut self.deferred) {
            self.push_node(node);
        }
    }

    fn handle_code_end(&mut self) {
        let Some(code) = self.code.take() else {
            return;
        };
        let language = CodeLanguage::from_info_string(&code.info);
        let source = code.source.strip_suffix('\n').unwrap_or(&code.source);
        self.push_node(BlockNode::new(Block::code(language, source)));
    }

    fn handle_item_end(&mut self) {
        self.flush_inline();
        let Some(Container::Item(item)) = self.containers.pop() else {
            log::warn!("List item end without an open item");
            return;
        };

        let ListItemState {
            ordered,
            checked,
            text,
            children,
        } = item;
        let Some(text) = text.filter(|t| !t.is_blank()) else {
            // Nothing to show: keep any nested content at this level
            for child in children {
                self.push_node(child);
            }
            return;
        };

        let content = TextBlockContent::new(text);
        let common = BlockCommon::default();
        let block = match (checked, ordered) {
            (Some(done), _) => Block::ToDo(ToDoBlock {
                common,
                content,
                done,
            }),
            (None, true) => Block::Ordered(ListItemBlock { common, content }),
            (None, false) => Block::Bullet(ListItemBlock { common, content }),
        };
        self.push_node(BlockNode::new(block).with_children(children));
    }

    /// Closes a block quote as a callout when it opens with `[!TAG]`, as a
    /// single-paragraph quote, or as a quote container.
    fn handle_quote_end(&mut self) {
        self.flush_inline();
        let Some(Container::Quote(mut nodes)) = self.containers.pop() else {
            log::warn!("Block quote end without an open quote");
            return;
        };

        if let Some(tag) = nodes.first_mut().and_then(take_admonition_tag) {
            if nodes
                .first()
                .and_then(|n| n.block.text())
                .is_some_and(StyledText::is_empty)
            {
                nodes.remove(0);
            }
            let callout = Block::Callout(CalloutBlock {
                common: BlockCommon::default(),
                background: tag.background(),
                emoji: None,
            });
            self.push_node(BlockNode::new(callout).with_children(nodes));
            return;
        }

        let single_paragraph = nodes.len() == 1
            && nodes[0].children.is_empty()
            && matches!(nodes[0].block, Block::Text(_));
        if single_paragraph {
            if let Some(Block::Text(paragraph)) = nodes.pop().map(|n| n.block) {
                self.push_node(BlockNode::new(Block::Quote(QuoteBlock {
                    common: BlockCommon::default(),
                    content: paragraph.content,
                })));
            }
            return;
        }

        if nodes.is_empty() {
            return;
        }
        let container = Block::QuoteContainer(ContainerBlock::default());
        self.push_node(BlockNode::new(container).with_children(nodes));
    }

    fn handle_table_end(&mut self) {
        let Some(table) = self.table.take() else {
            return;
        };
        let header = Some(table.header).filter(|h| h.iter().any(|cell| !cell.is_blank()));
        let parsed = ParsedTable {
            columns: table.columns,
            header,
            rows: table.rows,
        };

        for data in split_table(parsed, TABLE_MAX_ROWS) {
            let block = Block::Table(TableBlock {
                common: BlockCommon::default(),
                property: TableProperty {
                    rows: data.rows,
                    columns: data.columns,
                    column_widths: data.column_widths.clone(),
                    header_row: data.header_row,
                },
                cells: Vec::new(),
            });
            let mut node = BlockNode::new(block);
            node.table_slot = Some(self.tables.len());
            self.tables.push(data);
            self.push_node(node);
        }
    }

    /// Images are blocks of their own: the text read so far is closed as a
    /// paragraph and the image follows it. An image inside a heading follows
    /// the heading.
    fn handle_image_end(&mut self) {
        let Some(image) = self.image.take() else {
            return;
        };
        if self.table.is_some() {
            // Cells hold text only
            self.handle_text(&image.alt);
            return;
        }
        self.flush_inline();

        let node = match image.source.strip_prefix(IMAGE_TOKEN_SCHEME) {
            Some(token) => BlockNode::new(Block::Image(ImageBlock {
                token: token.to_string(),
                ..Default::default()
            })),
            None => {
                let mut node = BlockNode::new(Block::Image(ImageBlock::default()));
                node.pending_image = Some(PendingImage {
                    source: image.source,
                    alt: image.alt,
                });
                node
            }
        };
        if self.heading.is_some() {
            self.deferred.push(node);
        } else {
            self.push_node(node);
        }
    }

    fn push_node(&mut self, node: BlockNode) {
        match self.containers.last_mut() {
            Some(Container::Root(nodes)) | Some(Container::Quote(nodes)) => nodes.push(node),
            Some(Container::Item(item)) => item.children.push(node),
            None => log::warn!("Dropping {} block outside any container", node.block.block_type()),
        }
    }

    fn finish(mut self) -> ConvertedDocument {
        self.flush_inline();
        // Close anything left open by truncated input
        while self.containers.len() > 1 {
            match self.containers.last() {
                Some(Container::Item(_)) => self.handle_item_end(),
                Some(Container::Quote(_)) => self.handle_quote_end(),
                _ => break,
            }
        }
        let nodes = match self.containers.pop() {
            Some(Container::Root(nodes)) => nodes,
            _ => Vec::new(),
        };
        ConvertedDocument {
            nodes,
            tables: self.tables,
        }
    }
}

/// Level of a `#######`-style heading, which CommonMark reads as a paragraph.
fn deep_heading_level(text: &StyledText) -> Option<u8> {
    let Some(TextElement::Text { content, .. }) = text.elements.first() else {
        return None;
    };
    let hashes = content.chars().take_while(|c| *c == '#').count();
    let followed_by_space = content[hashes..].starts_with(' ');
    ((7..=9).contains(&hashes) && followed_by_space).then_some(hashes as u8)
}

/// Strips a leading `[!TAG]` from a quote's first paragraph and returns the
/// tag.
fn take_admonition_tag(node: &mut BlockNode) -> Option<Admonition> {
    let Block::Text(paragraph) = &mut node.block else {
        return None;
    };
    let plain = paragraph.content.text.to_plain_text();
    let rest = plain.strip_prefix("[!")?;
    let end = rest.find(']')?;
    let tag: Admonition = rest[..end].parse().ok()?;

    paragraph.content.text.strip_prefix_chars(end + 3);
    paragraph.content.text.trim();
    Some(tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BackgroundColor;
    use pretty_assertions::assert_eq;

    fn kinds(nodes: &[BlockNode]) -> Vec<&'static str> {
        nodes.iter().map(|n| n.block.block_type()).collect()
    }

    fn text_of(node: &BlockNode) -> String {
        node.block.text().map(StyledText::to_plain_text).unwrap_or_default()
    }

    #[test]
    fn test_basic_blocks() {
        let nodes = convert("# Title\n\nSome text.\n\n---\n\n```rust\nfn main() {}\n```\n");
        assert_eq!(kinds(&nodes), vec!["heading", "text", "divider", "code"]);
        match &nodes[3].block {
            Block::Code(code) => {
                assert_eq!(code.language.name(), "rust");
                assert_eq!(code.content.text.to_plain_text(), "fn main() {}");
            }
            other => panic!("expected code, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_lists() {
        let nodes = convert("- parent\n  1. first\n  2. second\n- [x] done\n");
        assert_eq!(kinds(&nodes), vec!["bullet", "todo"]);
        assert_eq!(text_of(&nodes[0]), "parent");
        assert_eq!(kinds(&nodes[0].children), vec!["ordered", "ordered"]);
        assert!(matches!(&nodes[1].block, Block::ToDo(todo) if todo.done));
    }

    #[test]
    fn test_empty_list_item_is_dropped() {
        let nodes = convert("- one\n-\n- two\n");
        assert_eq!(kinds(&nodes), vec!["bullet", "bullet"]);
    }

    #[test]
    fn test_styles_accumulate() {
        let nodes = convert("**bold [link](https://example.com/) end**\n");
        let text = nodes[0].block.text().unwrap();
        let link = text
            .elements
            .iter()
            .find(|e| e.plain_text() == "link")
            .unwrap();
        assert!(link.style().bold);
        assert_eq!(
            link.style().link.as_ref().map(|u| u.as_str()),
            Some("https://example.com/")
        );
    }

    #[test]
    fn test_relative_link_degrades_to_text() {
        let nodes = convert("see [the docs](./docs.md) and [top](#top)\n");
        let text = nodes[0].block.text().unwrap();
        assert!(text.elements.iter().all(|e| e.style().link.is_none()));
        assert_eq!(text.to_plain_text(), "see the docs and top");
    }

    #[test]
    fn test_callout_convention() {
        let nodes = convert("> [!WARNING]\n> Mind the gap\n");
        assert_eq!(kinds(&nodes), vec!["callout"]);
        match &nodes[0].block {
            Block::Callout(callout) => assert_eq!(callout.background, BackgroundColor::LightYellow),
            other => panic!("expected callout, got {:?}", other),
        }
        assert_eq!(text_of(&nodes[0].children[0]), "Mind the gap");
    }

    #[test]
    fn test_quotes() {
        let nodes = convert("> just one line\n\n> first\n>\n> second\n");
        assert_eq!(kinds(&nodes), vec!["quote", "quote_container"]);
        assert_eq!(nodes[1].children.len(), 2);
    }

    #[test]
    fn test_table_keeps_cell_content_aside() {
        let converted = convert_with_table_data("| a | b |\n| --- | --- |\n| **1** | 2 |\n");
        assert_eq!(kinds(&converted.nodes), vec!["table"]);
        assert_eq!(converted.nodes[0].table_slot, Some(0));
        let data = &converted.tables[0];
        assert!(data.header_row);
        assert_eq!(data.cells_plain, vec!["a", "b", "1", "2"]);
        assert!(data.cells_rich[2].elements[0].style().bold);
    }

    #[test]
    fn test_blank_header_means_no_header_row() {
        let converted = convert_with_table_data("|  |  |\n| --- | --- |\n| x | y |\n");
        assert!(!converted.tables[0].header_row);
        assert_eq!(converted.tables[0].rows, 1);
    }

    #[test]
    fn test_images() {
        let nodes = convert("Intro ![chart](images/chart.png)\n\n![x](image-token://boxcn123)\n");
        assert_eq!(kinds(&nodes), vec!["text", "image", "image"]);
        let pending = nodes[1].pending_image.as_ref().unwrap();
        assert_eq!(pending.source, "images/chart.png");
        assert_eq!(pending.alt, "chart");
        assert!(matches!(&nodes[2].block, Block::Image(img) if img.token == "boxcn123"));
    }

    #[test]
    fn test_deep_headings() {
        let nodes = convert("######## Level eight\n");
        match &nodes[0].block {
            Block::Heading(heading) => {
                assert_eq!(heading.level, 8);
                assert_eq!(heading.content.text.to_plain_text(), "Level eight");
            }
            other => panic!("expected heading, got {:?}", other),
        }
    }

    #[test]
    fn test_escaped_hashes_stay_text() {
        let nodes = convert("\\####### seven\n");
        assert_eq!(kinds(&nodes), vec!["text"]);
        assert_eq!(text_of(&nodes[0]), "####### seven");
    }

    #[test]
    fn test_image_in_heading_follows_it() {
        let nodes = convert("# Title ![logo](logo.png)\n\nAfter\n");
        assert_eq!(kinds(&nodes), vec!["heading", "image", "text"]);
        assert_eq!(text_of(&nodes[0]), "Title");
        assert_eq!(nodes[1].pending_image.as_ref().unwrap().source, "logo.png");
    }

    fn depth(nodes: &[BlockNode]) -> usize {
        let mut deepest = 0;
        let mut level: Vec<&BlockNode> = nodes.iter().collect();
        while !level.is_empty() {
            deepest += 1;
            level = level.iter().flat_map(|n| n.children.iter()).collect();
        }
        deepest
    }

    #[test]
    fn test_deep_quotes_are_capped() {
        let markdown = format!("{} innermost\n", ">".repeat(10_000));
        let converted = convert_with_table_data(&markdown);
        assert!(depth(&converted.nodes) <= BLOCK_MAX_RENDER_DEPTH);
        assert!(converted.block_count() >= 1);
        let all_text = serde_json::to_string(&converted.nodes).unwrap();
        assert!(all_text.contains("innermost"));
    }

    #[test]
    fn test_deep_lists_are_capped() {
        let markdown = format!("{}bottom\n\nafter\n", "- ".repeat(1_000));
        let nodes = convert(&markdown);
        assert!(depth(&nodes) <= BLOCK_MAX_RENDER_DEPTH);
        assert_eq!(nodes.last().map(text_of).as_deref(), Some("after"));
    }

    #[test]
    fn test_underline_and_inline_math() {
        let nodes = convert("<u>under</u> and $x^2$\n");
        let text = nodes[0].block.text().unwrap();
        assert!(text.elements[0].style().underline);
        assert!(matches!(
            text.elements.last(),
            Some(TextElement::Equation { expression, .. }) if expression == "x^2"
        ));
    }
}
