// src/formatting/state.rs
//! Immutable formatting state with pure transitions for Markdown generation.

use crate::constants::BLOCK_MAX_RENDER_DEPTH;
use crate::model::Block;

/// Formatting context threaded through the recursive walk.
/// All methods return new instances, preserving immutability.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatContext {
    /// Current recursion depth
    recursion_depth: usize,
}

impl FormatContext {
    /// Creates a new, empty formatting context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks if the recursion depth limit has been reached.
    pub fn depth_limit_reached(&self) -> bool {
        self.recursion_depth >= BLOCK_MAX_RENDER_DEPTH
    }

    /// Returns the current recursion depth.
    pub fn current_recursion_depth(&self) -> usize {
        self.recursion_depth
    }

    /// Enters a new block level, incrementing recursion depth.
    pub fn enter_block(&self) -> Self {
        Self {
            recursion_depth: self.recursion_depth + 1,
        }
    }
}

/// Sibling bookkeeping for one run of blocks: separators and the ordered
/// list counter.
#[derive(Debug, Default)]
pub struct SiblingRun {
    previous_was_list: bool,
    ordered_number: usize,
    emitted_any: bool,
}

impl SiblingRun {
    pub fn new() -> Self {
        Self::default()
    }

    /// Separator to put before `block`: a single newline between list
    /// items of one list, a blank line otherwise.
    pub fn separator(&self, block: &Block) -> &'static str {
        if !self.emitted_any {
            ""
        } else if self.previous_was_list && block.is_list_item() {
            "\n"
        } else {
            "\n\n"
        }
    }

    /// Advances past `block`; returns its number when it is an ordered item.
    pub fn advance(&mut self, block: &Block) -> Option<usize> {
        let number = if matches!(block, Block::Ordered(_)) {
            self.ordered_number += 1;
            Some(self.ordered_number)
        } else {
            self.ordered_number = 0;
            None
        };
        self.previous_was_list = block.is_list_item();
        number
    }

    pub fn mark_emitted(&mut self) {
        self.emitted_any = true;
    }
}
