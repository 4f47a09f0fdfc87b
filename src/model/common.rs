use crate::types::BlockId;
use serde::{Deserialize, Serialize};

/// Common fields for all blocks.
///
/// Children are held by id: the remote service returns a document as a
/// flat, paginated list and the tree is rebuilt from these references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockCommon {
    pub id: BlockId,
    pub parent_id: Option<BlockId>,
    pub children: Vec<BlockId>,
}

impl BlockCommon {
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            parent_id: None,
            children: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: BlockId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_children(mut self, children: Vec<BlockId>) -> Self {
        self.children = children;
        self
    }
}

impl Default for BlockCommon {
    fn default() -> Self {
        Self::new(BlockId::new_v4())
    }
}
