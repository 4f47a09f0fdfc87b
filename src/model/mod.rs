mod block;
pub mod blocks;
pub mod common;
mod diagram;
mod language;
mod node;
mod tree;

pub use block::Block;
pub use blocks::*;
pub use common::*;
pub use diagram::DiagramSyntax;
pub use language::CodeLanguage;
pub use node::{BlockNode, PendingImage, TableData};
pub use tree::BlockTree;
