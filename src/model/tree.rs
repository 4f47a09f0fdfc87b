use super::Block;
use crate::types::BlockId;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// Lookup table over a flat block listing.
///
/// Built once per conversion: an id→block map in listing order plus the set
/// of ids some non-page container claims as its child. Claimed ids are only
/// ever rendered through their parent, and each through one parent only: a
/// walk from the roots assigns every block a single owner, so a listing with
/// shared or cyclic child ids still renders as a tree.
#[derive(Debug, Default)]
pub struct BlockTree {
    blocks: IndexMap<BlockId, Block>,
    claimed: HashSet<BlockId>,
    /// Child id → the block it is rendered under
    owners: HashMap<BlockId, BlockId>,
    /// Claimed blocks no root reaches, each standing for one cycle
    cycle_entries: Vec<BlockId>,
}

impl BlockTree {
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        let mut map = IndexMap::with_capacity(blocks.len());
        for block in blocks {
            let id = block.id().clone();
            if map.contains_key(&id) {
                log::warn!("Duplicate block id {} in listing, keeping the first", id);
                continue;
            }
            map.insert(id, block);
        }

        let mut claimed = HashSet::new();
        for block in map.values() {
            if matches!(block, Block::Page(_)) {
                continue;
            }
            for child in block.children() {
                if child != block.id() {
                    claimed.insert(child.clone());
                }
            }
            if let Block::Table(table) = block {
                claimed.extend(table.cells.iter().cloned());
            }
        }

        let mut tree = Self {
            blocks: map,
            claimed,
            owners: HashMap::new(),
            cycle_entries: Vec::new(),
        };
        tree.assign_owners();
        tree
    }

    /// Walks down from every root, then from every claimed block still
    /// unreached; the latter only happens when parents form a cycle.
    fn assign_owners(&mut self) {
        let mut visited: HashSet<BlockId> = HashSet::new();
        let roots: Vec<BlockId> = self.roots().map(|b| b.id().clone()).collect();
        for root in roots {
            self.walk_from(root, &mut visited);
        }

        let unreached: Vec<BlockId> = self
            .blocks
            .values()
            .filter(|b| !matches!(b, Block::Page(_)))
            .map(|b| b.id().clone())
            .filter(|id| !visited.contains(id))
            .collect();
        for id in unreached {
            if visited.contains(&id) {
                continue;
            }
            log::warn!("Block {} is only reachable through a cycle of parents", id);
            self.cycle_entries.push(id.clone());
            self.walk_from(id, &mut visited);
        }
    }

    fn walk_from(&mut self, start: BlockId, visited: &mut HashSet<BlockId>) {
        visited.insert(start.clone());
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(block) = self.blocks.get(&id) else {
                continue;
            };
            let mut children: Vec<BlockId> = block.children().to_vec();
            if let Block::Table(table) = block {
                children.extend(table.cells.iter().cloned());
            }
            for child in children {
                let known = self
                    .blocks
                    .get(&child)
                    .is_some_and(|b| !matches!(b, Block::Page(_)));
                if known && visited.insert(child.clone()) {
                    self.owners.insert(child.clone(), id.clone());
                    stack.push(child);
                }
            }
        }
    }

    pub fn get(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.get(id)
    }

    pub fn is_claimed(&self, id: &BlockId) -> bool {
        self.claimed.contains(id)
    }

    /// Top-level blocks in listing order: everything that is neither the
    /// page block nor claimed by a container.
    pub fn roots(&self) -> impl Iterator<Item = &Block> {
        self.blocks
            .values()
            .filter(|block| !matches!(block, Block::Page(_)) && !self.is_claimed(block.id()))
    }

    /// One block per parent cycle, in listing order. These are rendered
    /// after the roots, behind a placeholder.
    pub fn cycle_entries(&self) -> impl Iterator<Item = &Block> {
        self.cycle_entries.iter().filter_map(|id| self.blocks.get(id))
    }

    /// Resolved children of `block`. Ids missing from the listing, or
    /// rendered under another parent, are skipped.
    pub fn children_of<'a>(&'a self, block: &'a Block) -> impl Iterator<Item = &'a Block> + 'a {
        block.children().iter().filter_map(move |id| {
            if self.owners.get(id) != Some(block.id()) {
                log::debug!("Skipping child {} of {}: not owned here", id, block.id());
                return None;
            }
            self.blocks.get(id)
        })
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
