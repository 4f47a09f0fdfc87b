// src/formatting/pure_visitor.rs
//! Recursive block visitor that renders a block tree as Markdown.
//!
//! The visitor borrows the [`BlockTree`] built for one conversion and
//! resolves child ids through it. A block that cannot be rendered becomes an
//! HTML comment in place; the walk always continues with its siblings.

use super::block_renderer::RenderOptions;
use super::rich_text::{paragraph_to_markdown, styled_text_to_markdown};
use super::state::{FormatContext, SiblingRun};
use crate::constants::{IMAGE_TOKEN_SCHEME, INDENT_SPACES};
use crate::error::AppError;
use crate::model::*;
use crate::types::{Admonition, StyledText, TextElement};

/// Trait for formatting blocks into output strings.
pub trait BlockRenderer {
    /// Format a block; `number` is its position when it is an ordered item.
    fn render_block(
        &self,
        block: &Block,
        number: Option<usize>,
        context: FormatContext,
    ) -> Result<String, AppError>;
}

/// Formats blocks as markdown.
pub struct MarkdownBlockRenderer<'a> {
    tree: &'a BlockTree,
    options: &'a RenderOptions,
}

impl<'a> MarkdownBlockRenderer<'a> {
    pub fn new(tree: &'a BlockTree, options: &'a RenderOptions) -> Self {
        Self { tree, options }
    }

    /// Renders a run of sibling blocks, separating them with blank lines
    /// except between items of the same list.
    pub fn render_sequence(&self, blocks: &[&Block], context: FormatContext) -> String {
        let mut output = String::new();
        let mut run = SiblingRun::new();

        for block in blocks {
            let separator = run.separator(block);
            let number = run.advance(block);
            let rendered = match self.render_block(block, number, context) {
                Ok(rendered) => rendered,
                Err(e) => {
                    log::warn!("Failed to render {} block {}: {}", block.block_type(), block.id(), e);
                    format!(
                        "<!-- failed to render {} block {}: {} -->",
                        block.block_type(),
                        block.id(),
                        e.to_string().replace("--", "- -")
                    )
                }
            };
            if rendered.is_empty() {
                continue;
            }
            output.push_str(separator);
            output.push_str(&rendered);
            run.mark_emitted();
        }

        output
    }

    /// Renders the resolved children of `block` as one sequence.
    fn render_children(&self, block: &Block, context: FormatContext) -> String {
        let children: Vec<&Block> = self.tree.children_of(block).collect();
        self.render_sequence(&children, context)
    }

    /// Appends rendered children below `head`, separated by a blank line.
    fn with_children(&self, head: String, block: &Block, context: FormatContext) -> String {
        let children = self.render_children(block, context);
        match (head.is_empty(), children.is_empty()) {
            (_, true) => head,
            (true, false) => children,
            (false, false) => format!("{}\n\n{}", head, children),
        }
    }

    // --- Block-type formatters ---

    fn format_heading(&self, b: &HeadingBlock) -> String {
        let text = styled_text_to_markdown(&b.content.text);
        if text.trim().is_empty() {
            return String::new();
        }
        if b.level > 6 && self.options.degrade_deep_headings {
            return styled_text_to_markdown(&emboldened(&b.content.text));
        }
        format!("{} {}", "#".repeat(b.level as usize), text)
    }

    /// Format a list item with its children indented under the marker.
    fn format_list_item(
        &self,
        marker: &str,
        text: &StyledText,
        block: &Block,
        indent: usize,
        context: FormatContext,
    ) -> String {
        let pad = " ".repeat(indent);
        let body = paragraph_to_markdown(text).replace('\n', &format!("\n{}", pad));
        let head = format!("{}{}", marker, body).trim_end().to_string();
        let children = self.render_children(block, context);
        if children.is_empty() {
            head
        } else {
            format!("{}\n{}", head, indent_block_content(&children, &pad))
        }
    }

    /// Format code block with language, lengthening the fence past any
    /// backtick run inside the code.
    fn format_code_block(&self, b: &CodeBlock) -> String {
        let code = b.content.text.to_plain_text();
        let longest_run = code
            .split(|c| c != '`')
            .map(str::len)
            .max()
            .unwrap_or(0);
        let fence = "`".repeat(longest_run.max(2) + 1);
        format!(
            "{}{}\n{}\n{}",
            fence,
            b.language.name(),
            code.trim_end_matches('\n'),
            fence
        )
    }

    fn format_callout(&self, b: &CalloutBlock, block: &Block, context: FormatContext) -> String {
        let tag = Admonition::from_background(b.background);
        let children = self.render_children(block, context);
        let body = if children.is_empty() {
            format!("[!{}]", tag.as_str())
        } else {
            format!("[!{}]\n{}", tag.as_str(), children)
        };
        quote_lines(&body)
    }

    /// Format a table as GitHub-flavored Markdown.
    ///
    /// Cells are resolved by position; missing cells render empty. A table
    /// without a header row gets an empty one, since GFM requires it.
    fn format_table(&self, b: &TableBlock, context: FormatContext) -> Result<String, AppError> {
        let columns = b.property.columns;
        let rows = b.property.rows;
        if columns == 0 {
            return Err(AppError::MalformedResponse(format!(
                "table {} declares {} rows but no columns",
                b.common.id, rows
            )));
        }

        let cell_ids = if b.cells.is_empty() {
            &b.common.children
        } else {
            &b.cells
        };
        if cell_ids.len() != rows * columns {
            log::debug!(
                "Table {} has {} cells for a {}x{} grid",
                b.common.id,
                cell_ids.len(),
                rows,
                columns
            );
        }

        let grid: Vec<Vec<String>> = (0..rows)
            .map(|row| {
                (0..columns)
                    .map(|column| {
                        cell_ids
                            .get(row * columns + column)
                            .and_then(|id| self.tree.get(id))
                            .map(|cell| self.format_table_cell(cell, context))
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();

        let empty_header = vec![String::new(); columns];
        let (header, body) = match grid.split_first() {
            Some((first, rest)) if b.property.header_row => (first, rest),
            _ => (&empty_header, grid.as_slice()),
        };

        let mut lines = Vec::with_capacity(body.len() + 2);
        lines.push(table_row(header));
        lines.push(format!("|{}", " --- |".repeat(columns)));
        lines.extend(body.iter().map(|row| table_row(row)));
        Ok(lines.join("\n"))
    }

    /// Inline rendering of a cell's paragraphs, safe inside a table row.
    fn format_table_cell(&self, cell: &Block, context: FormatContext) -> String {
        let parts: Vec<String> = self
            .tree
            .children_of(cell)
            .map(|child| match child.text() {
                Some(text) => styled_text_to_markdown(text),
                None => self
                    .render_block(child, None, context.enter_block())
                    .unwrap_or_default(),
            })
            .filter(|part| !part.trim().is_empty())
            .collect();
        parts
            .join("<br>")
            .replace('|', "\\|")
            .replace('\n', "<br>")
    }

    fn format_image(&self, b: &ImageBlock) -> String {
        let target = match self.options.image_paths.get(&b.token) {
            Some(path) if path.contains(' ') => format!("<{}>", path),
            Some(path) => path.clone(),
            None => format!("{}{}", IMAGE_TOKEN_SCHEME, b.token),
        };
        format!("![image]({})", target)
    }
}

impl BlockRenderer for MarkdownBlockRenderer<'_> {
    fn render_block(
        &self,
        block: &Block,
        number: Option<usize>,
        context: FormatContext,
    ) -> Result<String, AppError> {
        if context.depth_limit_reached() {
            log::warn!(
                "Nesting depth limit reached at block {} (depth {})",
                block.id(),
                context.current_recursion_depth()
            );
            return Ok(format!("<!-- nesting depth limit reached at block {} -->", block.id()));
        }
        let inner = context.enter_block();

        let content = match block {
            Block::Page(_) | Block::Grid(_) | Block::GridColumn(_) | Block::TableCell(_) => {
                self.render_children(block, inner)
            }
            Block::Text(b) => {
                self.with_children(paragraph_to_markdown(&b.content.text), block, inner)
            }
            Block::Heading(b) => self.with_children(self.format_heading(b), block, inner),
            Block::Bullet(b) => {
                self.format_list_item("- ", &b.content.text, block, INDENT_SPACES, inner)
            }
            Block::Ordered(b) => {
                let marker = format!("{}. ", number.unwrap_or(1));
                let indent = marker.len();
                self.format_list_item(&marker, &b.content.text, block, indent, inner)
            }
            Block::ToDo(b) => {
                let marker = if b.done { "- [x] " } else { "- [ ] " };
                self.format_list_item(marker, &b.content.text, block, INDENT_SPACES, inner)
            }
            Block::Code(b) => self.format_code_block(b),
            Block::Quote(b) => {
                let body = self.with_children(paragraph_to_markdown(&b.content.text), block, inner);
                quote_lines(&body)
            }
            Block::QuoteContainer(_) => {
                let body = self.render_children(block, inner);
                if body.is_empty() {
                    String::new()
                } else {
                    quote_lines(&body)
                }
            }
            Block::Callout(b) => self.format_callout(b, block, inner),
            Block::Table(b) => self.format_table(b, inner)?,
            Block::Image(b) => self.format_image(b),
            Block::Divider(_) => "---".to_string(),
            Block::Equation(b) => format!("$$\n{}\n$$", b.expression.trim()),
            Block::Board(b) => match &b.token {
                Some(token) => format!("<!-- whiteboard {} -->", token),
                None => "<!-- whiteboard -->".to_string(),
            },
            Block::File(b) => format!("<!-- file {} ({}) -->", b.name, b.token),
            Block::Sheet(b) => format!("<!-- sheet {} -->", b.token),
            Block::Bitable(b) => format!("<!-- bitable {} -->", b.token),
            Block::Diagram(b) => format!("<!-- diagram type {} -->", b.diagram_type),
            Block::Unknown(b) => format!("<!-- unsupported block type {} -->", b.block_type),
        };

        Ok(content)
    }
}

// --- Helpers ---

/// Indents each non-empty line of `text` by `indent`, preserving blank lines.
fn indent_block_content(text: &str, indent: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                line.to_string()
            } else {
                format!("{}{}", indent, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prefixes every line with `> `; blank lines become a bare `>`.
fn quote_lines(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                ">".to_string()
            } else {
                format!("> {}", line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn table_row(cells: &[String]) -> String {
    format!("| {} |", cells.join(" | "))
}

/// Copy of `text` with every span made bold.
fn emboldened(text: &StyledText) -> StyledText {
    let elements = text
        .elements
        .iter()
        .cloned()
        .map(|element| match element {
            TextElement::Text { content, mut style } => {
                style.bold = true;
                TextElement::Text { content, style }
            }
            other => other,
        })
        .collect();
    StyledText::from_elements(elements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BackgroundColor, BlockId};

    fn common(id: &str, children: &[&str]) -> BlockCommon {
        BlockCommon::new(BlockId::from(id))
            .with_children(children.iter().map(|c| BlockId::from(*c)).collect())
    }

    fn text(id: &str, content: &str) -> Block {
        Block::Text(TextBlock {
            common: common(id, &[]),
            content: TextBlockContent::new(StyledText::plain(content)),
        })
    }

    fn bullet(id: &str, content: &str, children: &[&str]) -> Block {
        Block::Bullet(ListItemBlock {
            common: common(id, children),
            content: TextBlockContent::new(StyledText::plain(content)),
        })
    }

    fn render(blocks: Vec<Block>, options: &RenderOptions) -> String {
        let tree = BlockTree::from_blocks(blocks);
        let renderer = MarkdownBlockRenderer::new(&tree, options);
        let roots: Vec<&Block> = tree.roots().collect();
        renderer.render_sequence(&roots, FormatContext::new())
    }

    #[test]
    fn test_nested_list_formatting() {
        let output = render(
            vec![
                bullet("a", "parent", &["b"]),
                bullet("b", "child", &[]),
                bullet("c", "sibling", &[]),
            ],
            &RenderOptions::default(),
        );
        assert_eq!(output, "- parent\n  - child\n- sibling");
    }

    #[test]
    fn test_callout_renders_admonition() {
        let callout = Block::Callout(CalloutBlock {
            common: common("c", &["t"]),
            background: BackgroundColor::LightRed,
            emoji: None,
        });
        let output = render(vec![callout, text("t", "careful")], &RenderOptions::default());
        assert_eq!(output, "> [!CAUTION]\n> careful");
    }

    #[test]
    fn test_table_without_header_gets_empty_header() {
        let table = Block::Table(TableBlock {
            common: common("t", &["c1", "c2"]),
            property: TableProperty {
                rows: 1,
                columns: 2,
                column_widths: vec![],
                header_row: false,
            },
            cells: vec![BlockId::from("c1"), BlockId::from("c2")],
        });
        let cell = |id: &str, child: &str| {
            Block::TableCell(ContainerBlock {
                common: common(id, &[child]),
            })
        };
        let output = render(
            vec![
                table,
                cell("c1", "p1"),
                text("p1", "a|b"),
                cell("c2", "p2"),
                text("p2", "c"),
            ],
            &RenderOptions::default(),
        );
        assert_eq!(output, "|  |  |\n| --- | --- |\n| a\\|b | c |");
    }

    #[test]
    fn test_deep_heading_degrades_when_configured() {
        let heading = Block::Heading(HeadingBlock {
            common: common("h", &[]),
            level: 8,
            content: TextBlockContent::new(StyledText::plain("Deep")),
        });
        let kept = render(vec![heading.clone()], &RenderOptions::default());
        assert_eq!(kept, "######## Deep");

        let options = RenderOptions {
            degrade_deep_headings: true,
            ..Default::default()
        };
        assert_eq!(render(vec![heading], &options), "**Deep**");
    }

    #[test]
    fn test_unknown_block_degrades_to_comment() {
        let unknown = Block::Unknown(UnknownBlock {
            common: common("u", &[]),
            block_type: 999,
        });
        let output = render(vec![text("a", "before"), unknown, text("b", "after")], &RenderOptions::default());
        assert_eq!(output, "before\n\n<!-- unsupported block type 999 -->\n\nafter");
    }

    #[test]
    fn test_broken_table_does_not_abort_walk() {
        let table = Block::Table(TableBlock {
            common: common("t", &[]),
            property: TableProperty {
                rows: 2,
                columns: 0,
                column_widths: vec![],
                header_row: false,
            },
            cells: vec![],
        });
        let output = render(vec![table, text("b", "after")], &RenderOptions::default());
        assert!(output.starts_with("<!-- failed to render table block t"));
        assert!(output.ends_with("after"));
    }

    #[test]
    fn test_code_fence_outgrows_inner_fences() {
        let code = Block::Code(CodeBlock {
            common: common("k", &[]),
            language: CodeLanguage::from_info_string("markdown"),
            wrap: false,
            content: TextBlockContent::new(StyledText::plain("```rust\nfn main() {}\n```")),
        });
        let output = render(vec![code], &RenderOptions::default());
        assert!(output.starts_with("````markdown\n"));
        assert!(output.ends_with("\n````"));
    }
}
