// src/formatting/mod.rs
//! Renders document blocks into Markdown.

// Sub-modules
pub mod block_renderer;
mod pure_visitor;
pub mod rich_text;
mod state;

pub use self::block_renderer::{render_blocks, render_tree, RenderOptions};
pub use self::rich_text::styled_text_to_markdown;
