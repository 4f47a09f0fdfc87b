// src/formatting/block_renderer.rs
//! Block rendering engine: converts a document's flat block listing to
//! Markdown.
//!
//! The listing is indexed once into a [`BlockTree`], then the top-level
//! blocks are walked in listing order by the [`MarkdownBlockRenderer`].

use super::pure_visitor::MarkdownBlockRenderer;
use super::state::FormatContext;
use crate::constants::CHARS_PER_BLOCK_ESTIMATE;
use crate::error::AppError;
use crate::model::{Block, BlockTree};
use crate::types::RenderedMarkdown;
use std::collections::HashMap;

// --- Core Types ---

/// Options that change how blocks are rendered.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Render headings deeper than level 6 as bold paragraphs.
    pub degrade_deep_headings: bool,
    /// Image token to the link target written for it, for images that
    /// were downloaded before rendering.
    pub image_paths: HashMap<String, String>,
}

// --- Public API ---

/// Renders a flat block listing into Markdown.
///
/// Never fails on block content: malformed blocks become comments. The
/// output ends with a newline unless the document is empty.
pub fn render_blocks(blocks: Vec<Block>, options: &RenderOptions) -> Result<RenderedMarkdown, AppError> {
    let tree = BlockTree::from_blocks(blocks);
    render_tree(&tree, options)
}

/// Renders an already indexed block tree into Markdown.
pub fn render_tree(tree: &BlockTree, options: &RenderOptions) -> Result<RenderedMarkdown, AppError> {
    let renderer = MarkdownBlockRenderer::new(tree, options);
    let roots: Vec<&Block> = tree.roots().collect();

    log::debug!(
        "Rendering {} blocks ({} top-level)",
        tree.len(),
        roots.len()
    );

    let mut output = String::with_capacity(tree.len() * CHARS_PER_BLOCK_ESTIMATE);
    output.push_str(&renderer.render_sequence(&roots, FormatContext::new()));

    // Blocks whose parents form a cycle are still shown, after a marker
    for entry in tree.cycle_entries() {
        if !output.is_empty() {
            output.push_str("\n\n");
        }
        output.push_str(&format!("<!-- cyclic block {} -->", entry.id()));
        let rendered = renderer.render_sequence(&[entry], FormatContext::new());
        if !rendered.is_empty() {
            output.push_str("\n\n");
            output.push_str(&rendered);
        }
    }
    if !output.is_empty() {
        output.push('\n');
    }

    Ok(RenderedMarkdown::new(output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockCommon, PageBlock, TextBlock, TextBlockContent};
    use crate::types::{BlockId, StyledText};
    use pretty_assertions::assert_eq;

    fn paragraph(id: &str, parent: &str, text: &str) -> Block {
        Block::Text(TextBlock {
            common: BlockCommon::new(BlockId::from(id)).with_parent(BlockId::from(parent)),
            content: TextBlockContent::new(StyledText::plain(text)),
        })
    }

    fn page(children: &[&str]) -> Block {
        Block::Page(PageBlock {
            common: BlockCommon::new(BlockId::from("doc"))
                .with_children(children.iter().map(|c| BlockId::from(*c)).collect()),
            content: TextBlockContent::new(StyledText::plain("Title")),
        })
    }

    #[test]
    fn test_page_block_is_elided() {
        let blocks = vec![
            page(&["a", "b"]),
            paragraph("a", "doc", "First"),
            paragraph("b", "doc", "Second"),
        ];
        let markdown = render_blocks(blocks, &RenderOptions::default()).unwrap();
        assert_eq!(markdown.as_str(), "First\n\nSecond\n");
    }

    #[test]
    fn test_empty_document_renders_empty() {
        let markdown = render_blocks(vec![page(&[])], &RenderOptions::default()).unwrap();
        assert_eq!(markdown.as_str(), "");
    }

    #[test]
    fn test_cyclic_children_render_behind_marker() {
        let mut a = paragraph("a", "doc", "a");
        a.common_mut().children = vec![BlockId::from("b")];
        let mut b = paragraph("b", "a", "b");
        b.common_mut().children = vec![BlockId::from("a")];

        let markdown = render_blocks(vec![page(&["a"]), a, b], &RenderOptions::default()).unwrap();
        assert_eq!(markdown.as_str(), "<!-- cyclic block a -->\n\na\n\nb\n");
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let blocks = vec![
            page(&["a", "b"]),
            paragraph("a", "doc", "One"),
            Block::heading(2, StyledText::plain("Two")),
            paragraph("b", "doc", "Three"),
        ];
        let first = render_blocks(blocks.clone(), &RenderOptions::default()).unwrap();
        let second = render_blocks(blocks, &RenderOptions::default()).unwrap();
        assert_eq!(first, second);
    }
}
