// src/analytics/mod.rs
//! Content measurement for fetched document listings.

use crate::model::{Block, BlockTree};
use std::collections::BTreeMap;

/// Detailed content breakdown for diagnostics and logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockCensus {
    pub total_blocks: usize,
    /// Count per block kind name, sorted by name.
    pub per_kind: BTreeMap<&'static str, usize>,
    /// Raw wire codes of kinds this client does not model.
    pub unknown_kinds: BTreeMap<u32, usize>,
    /// Blocks that are neither the page nor claimed by a container.
    pub top_level: usize,
    pub deepest_nesting: usize,
    pub image_tokens: usize,
}

impl BlockCensus {
    /// Kinds the Markdown output can only carry as comments.
    pub fn unsupported(&self) -> usize {
        ["board", "file", "sheet", "bitable", "diagram", "unknown"]
            .iter()
            .filter_map(|kind| self.per_kind.get(kind))
            .sum()
    }
}

/// Measures a flat block listing.
pub fn census(tree: &BlockTree) -> BlockCensus {
    let mut census = BlockCensus::default();

    for block in tree.blocks() {
        census.total_blocks += 1;
        *census.per_kind.entry(block.block_type()).or_default() += 1;
        match block {
            Block::Unknown(unknown) => {
                *census.unknown_kinds.entry(unknown.block_type).or_default() += 1;
            }
            Block::Image(image) if !image.token.is_empty() => census.image_tokens += 1,
            _ => {}
        }
    }

    for root in tree.roots() {
        census.top_level += 1;
        census.deepest_nesting = census.deepest_nesting.max(max_depth(tree, root, 1));
    }
    for entry in tree.cycle_entries() {
        census.deepest_nesting = census.deepest_nesting.max(max_depth(tree, entry, 1));
    }

    census
}

/// Gets the maximum depth below `block`, guarding against cyclic listings.
fn max_depth(tree: &BlockTree, block: &Block, depth: usize) -> usize {
    if depth >= crate::constants::BLOCK_MAX_RENDER_DEPTH {
        return depth;
    }
    tree.children_of(block)
        .filter(|child| child.id() != block.id())
        .map(|child| max_depth(tree, child, depth + 1))
        .max()
        .unwrap_or(depth)
}

/// Logs the census the way export reports it.
pub fn log_census(census: &BlockCensus) {
    log::info!(
        "Document has {} blocks ({} top level, nesting depth {})",
        census.total_blocks,
        census.top_level,
        census.deepest_nesting
    );
    for (kind, count) in &census.per_kind {
        log::debug!("  {}: {}", kind, count);
    }
    for (code, count) in &census.unknown_kinds {
        log::warn!("{} blocks of unsupported kind {} will be exported as comments", count, code);
    }
}
