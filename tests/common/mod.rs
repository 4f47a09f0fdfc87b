// tests/common/mod.rs
//! In-memory document service shared by the integration tests.
//!
//! The mock keeps a real block tree: created blocks get ids, tables get
//! their cells (each holding one empty paragraph) and boards get a
//! whiteboard token, so the import phases run unmodified against it.
//!
//! Failures can be scripted per call kind: each scripted error is returned
//! by the next call of that kind, after which calls behave normally.

#![allow(dead_code)]

use blockmark::api::MediaParent;
use blockmark::model::{Block, BoardBlock, ContainerBlock, PageBlock};
use blockmark::{
    AppError, BlockCommon, BlockId, DiagramSyntax, DocumentId, DocumentRepository, FolderId,
    RemoteErrorCode, StyledText, WhiteboardId,
};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

/// One recorded service call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateDocument { title: String },
    CreateChildren { parent: BlockId, kinds: Vec<&'static str>, index: Option<usize> },
    DeleteChildren { parent: BlockId, start: usize, end: usize },
    ListChildren { block: BlockId },
    ListBlocks,
    GetBlock { block: BlockId },
    GetCellIds { table: BlockId },
    FillCells { cells: usize, styled: bool },
    ImportDiagram { whiteboard: WhiteboardId, syntax: DiagramSyntax, source: String },
    UploadMedia { path: PathBuf },
    DownloadMedia { token: String },
}

#[derive(Default)]
struct MockState {
    blocks: HashMap<BlockId, Block>,
    calls: Vec<Call>,
    next_id: usize,
    diagram_error: Option<String>,
    diagram_script: VecDeque<AppError>,
    cell_id_script: VecDeque<AppError>,
    fill_script: VecDeque<AppError>,
    reject_styled_fills: bool,
    drop_failed_boards: bool,
    create_fails_after: Option<usize>,
    create_calls: usize,
    media: HashMap<String, Vec<u8>>,
}

pub struct MockRepository {
    document: DocumentId,
    state: Mutex<MockState>,
}

impl MockRepository {
    pub const DOCUMENT: &'static str = "doxcnMockDocument";

    /// A repository holding one empty document.
    pub fn new() -> Self {
        let document = DocumentId::from(Self::DOCUMENT);
        let repository = Self {
            document: document.clone(),
            state: Mutex::new(MockState::default()),
        };
        repository.insert_page(&document);
        repository
    }

    pub fn document(&self) -> DocumentId {
        self.document.clone()
    }

    /// Every diagram import fails with a syntax error carrying `message`.
    pub fn fail_diagrams_with(self, message: &str) -> Self {
        self.state.lock().diagram_error = Some(message.to_string());
        self
    }

    /// The next diagram imports fail with `codes`, in order.
    pub fn script_diagram_errors(self, codes: &[RemoteErrorCode]) -> Self {
        self.state.lock().diagram_script.extend(codes.iter().map(scripted));
        self
    }

    /// The next cell-id fetches fail with `codes`, in order.
    pub fn script_cell_id_errors(self, codes: &[RemoteErrorCode]) -> Self {
        self.state.lock().cell_id_script.extend(codes.iter().map(scripted));
        self
    }

    /// The next cell fills fail with `codes`, in order.
    pub fn script_fill_errors(self, codes: &[RemoteErrorCode]) -> Self {
        self.state.lock().fill_script.extend(codes.iter().map(scripted));
        self
    }

    /// Fills carrying any styled run fail with an invalid-parameter error.
    pub fn reject_styled_fills(self) -> Self {
        self.state.lock().reject_styled_fills = true;
        self
    }

    /// A board whose diagram import fails is removed from the document,
    /// as if someone deleted it while the import ran.
    pub fn drop_failed_boards(self) -> Self {
        self.state.lock().drop_failed_boards = true;
        self
    }

    /// Create calls after the first `count` fail with an invalid-parameter error.
    pub fn fail_create_after(self, count: usize) -> Self {
        self.state.lock().create_fails_after = Some(count);
        self
    }

    pub fn with_media(self, token: &str, bytes: Vec<u8>) -> Self {
        self.state.lock().media.insert(token.to_string(), bytes);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn count_calls(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|call| matches(call)).count()
    }

    /// Top-level blocks of the document, in order.
    pub fn top_level(&self) -> Vec<Block> {
        let state = self.state.lock();
        children_of(&state, &self.document.cast())
    }

    pub fn children(&self, id: &BlockId) -> Vec<Block> {
        let state = self.state.lock();
        children_of(&state, id)
    }

    /// Plain text written into each cell of `table`, row-major.
    pub fn cell_texts(&self, table: &BlockId) -> Vec<String> {
        let state = self.state.lock();
        let Some(Block::Table(table)) = state.blocks.get(table) else {
            return Vec::new();
        };
        table
            .cells
            .iter()
            .map(|cell| {
                children_of(&state, cell)
                    .iter()
                    .filter_map(|block| block.text().map(StyledText::to_plain_text))
                    .collect::<Vec<_>>()
                    .join("")
            })
            .collect()
    }

    fn insert_page(&self, document: &DocumentId) {
        let page = Block::Page(PageBlock {
            common: BlockCommon::new(document.cast()),
            content: Default::default(),
        });
        self.state.lock().blocks.insert(page.id().clone(), page);
    }
}

fn children_of(state: &MockState, id: &BlockId) -> Vec<Block> {
    state
        .blocks
        .get(id)
        .map(|block| {
            block
                .children()
                .iter()
                .filter_map(|child| state.blocks.get(child).cloned())
                .collect()
        })
        .unwrap_or_default()
}

fn next_id(state: &mut MockState, prefix: &str) -> String {
    state.next_id += 1;
    format!("{}{:04}", prefix, state.next_id)
}

/// Stores `block` under `parent` with a fresh id; tables get their cells.
fn store(state: &mut MockState, parent: &BlockId, mut block: Block) -> Block {
    let id = BlockId::from(next_id(state, "blk").as_str());
    {
        let common = block.common_mut();
        common.id = id.clone();
        common.parent_id = Some(parent.clone());
        common.children.clear();
    }

    match &mut block {
        Block::Board(BoardBlock { token, .. }) => {
            *token = Some(WhiteboardId::from(next_id(state, "wb").as_str()));
        }
        Block::Table(table) => {
            let count = table.property.rows * table.property.columns;
            let mut cells = Vec::with_capacity(count);
            for _ in 0..count {
                let cell_id = BlockId::from(next_id(state, "cell").as_str());
                let mut paragraph = Block::text_block(StyledText::new());
                paragraph.common_mut().id = BlockId::from(next_id(state, "blk").as_str());
                paragraph.common_mut().parent_id = Some(cell_id.clone());
                let cell = Block::TableCell(ContainerBlock {
                    common: BlockCommon::new(cell_id.clone())
                        .with_parent(id.clone())
                        .with_children(vec![paragraph.id().clone()]),
                });
                state.blocks.insert(paragraph.id().clone(), paragraph);
                state.blocks.insert(cell_id.clone(), cell);
                cells.push(cell_id);
            }
            table.common.children = cells.clone();
            table.cells = cells;
        }
        _ => {}
    }

    state.blocks.insert(id, block.clone());
    block
}

fn scripted(code: &RemoteErrorCode) -> AppError {
    AppError::remote(code.clone(), format!("scripted {}", code))
}

/// Detaches the board holding `whiteboard` from its parent.
fn drop_board(state: &mut MockState, whiteboard: &WhiteboardId) {
    let board = state.blocks.values().find_map(|block| match block {
        Block::Board(BoardBlock {
            common,
            token: Some(token),
            ..
        }) if token == whiteboard => Some((common.id.clone(), common.parent_id.clone())),
        _ => None,
    });
    let Some((id, Some(parent))) = board else {
        return;
    };
    if let Some(parent) = state.blocks.get_mut(&parent) {
        parent.common_mut().children.retain(|child| child != &id);
    }
    state.blocks.remove(&id);
}

fn not_found(what: &BlockId) -> AppError {
    AppError::remote(RemoteErrorCode::NotFound, format!("block {} not found", what))
}

#[async_trait::async_trait]
impl DocumentRepository for MockRepository {
    async fn create_document(
        &self,
        title: &str,
        _folder: Option<&FolderId>,
    ) -> Result<DocumentId, AppError> {
        self.state.lock().calls.push(Call::CreateDocument {
            title: title.to_string(),
        });
        Ok(self.document.clone())
    }

    async fn create_children(
        &self,
        _document: &DocumentId,
        parent: &BlockId,
        children: &[Block],
        index: Option<usize>,
    ) -> Result<Vec<Block>, AppError> {
        let mut state = self.state.lock();
        state.calls.push(Call::CreateChildren {
            parent: parent.clone(),
            kinds: children.iter().map(Block::block_type).collect(),
            index,
        });
        state.create_calls += 1;
        if state
            .create_fails_after
            .is_some_and(|limit| state.create_calls > limit)
        {
            return Err(AppError::remote(
                RemoteErrorCode::InvalidParameter,
                "invalid block payload",
            ));
        }
        if !state.blocks.contains_key(parent) {
            return Err(not_found(parent));
        }

        let created: Vec<Block> = children
            .iter()
            .cloned()
            .map(|child| store(&mut state, parent, child))
            .collect();
        let ids: Vec<BlockId> = created.iter().map(|block| block.id().clone()).collect();

        let Some(parent_block) = state.blocks.get_mut(parent) else {
            return Err(not_found(parent));
        };
        let siblings = &mut parent_block.common_mut().children;
        let at = index.unwrap_or(siblings.len()).min(siblings.len());
        siblings.splice(at..at, ids);

        Ok(created)
    }

    async fn delete_children(
        &self,
        _document: &DocumentId,
        parent: &BlockId,
        start_index: usize,
        end_index: usize,
    ) -> Result<(), AppError> {
        let mut state = self.state.lock();
        state.calls.push(Call::DeleteChildren {
            parent: parent.clone(),
            start: start_index,
            end: end_index,
        });
        let Some(parent_block) = state.blocks.get_mut(parent) else {
            return Err(not_found(parent));
        };
        let siblings = &mut parent_block.common_mut().children;
        if start_index >= end_index || end_index > siblings.len() {
            return Err(AppError::remote(
                RemoteErrorCode::InvalidParameter,
                format!("invalid range {}..{}", start_index, end_index),
            ));
        }
        let removed: Vec<BlockId> = siblings.drain(start_index..end_index).collect();
        for id in removed {
            state.blocks.remove(&id);
        }
        Ok(())
    }

    async fn list_children(
        &self,
        _document: &DocumentId,
        block: &BlockId,
    ) -> Result<Vec<Block>, AppError> {
        let mut state = self.state.lock();
        state.calls.push(Call::ListChildren {
            block: block.clone(),
        });
        if !state.blocks.contains_key(block) {
            return Err(not_found(block));
        }
        Ok(children_of(&state, block))
    }

    async fn list_blocks(&self, _document: &DocumentId) -> Result<Vec<Block>, AppError> {
        let mut state = self.state.lock();
        state.calls.push(Call::ListBlocks);

        // Document order: the page, then a pre-order walk of its children
        let mut listing = Vec::with_capacity(state.blocks.len());
        let root: BlockId = self.document.cast();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(block) = state.blocks.get(&id) {
                stack.extend(block.children().iter().rev().cloned());
                listing.push(block.clone());
            }
        }
        Ok(listing)
    }

    async fn get_block(&self, _document: &DocumentId, block: &BlockId) -> Result<Block, AppError> {
        let mut state = self.state.lock();
        state.calls.push(Call::GetBlock {
            block: block.clone(),
        });
        state.blocks.get(block).cloned().ok_or_else(|| not_found(block))
    }

    async fn import_diagram(
        &self,
        whiteboard: &WhiteboardId,
        source: &str,
        syntax: DiagramSyntax,
    ) -> Result<String, AppError> {
        let mut state = self.state.lock();
        state.calls.push(Call::ImportDiagram {
            whiteboard: whiteboard.clone(),
            syntax,
            source: source.to_string(),
        });
        if let Some(error) = state.diagram_script.pop_front() {
            return Err(error);
        }
        match state.diagram_error.clone() {
            Some(message) => {
                if state.drop_failed_boards {
                    drop_board(&mut state, whiteboard);
                }
                Err(AppError::remote(RemoteErrorCode::InvalidParameter, message))
            }
            None => Ok(next_id(&mut state, "ticket")),
        }
    }

    async fn upload_media(
        &self,
        path: &Path,
        _parent: MediaParent,
        _parent_id: &str,
    ) -> Result<String, AppError> {
        let bytes = std::fs::read(path)?;
        let mut state = self.state.lock();
        state.calls.push(Call::UploadMedia {
            path: path.to_path_buf(),
        });
        let token = next_id(&mut state, "boxcn");
        state.media.insert(token.clone(), bytes);
        Ok(token)
    }

    async fn download_media(&self, token: &str) -> Result<Vec<u8>, AppError> {
        let mut state = self.state.lock();
        state.calls.push(Call::DownloadMedia {
            token: token.to_string(),
        });
        state.media.get(token).cloned().ok_or_else(|| {
            AppError::remote(RemoteErrorCode::NotFound, format!("media {} not found", token))
        })
    }

    async fn get_cell_ids(
        &self,
        _document: &DocumentId,
        table: &BlockId,
    ) -> Result<Vec<BlockId>, AppError> {
        let mut state = self.state.lock();
        state.calls.push(Call::GetCellIds {
            table: table.clone(),
        });
        if let Some(error) = state.cell_id_script.pop_front() {
            return Err(error);
        }
        match state.blocks.get(table) {
            Some(Block::Table(table)) => Ok(table.cells.clone()),
            _ => Err(not_found(table)),
        }
    }

    async fn fill_cells(
        &self,
        document: &DocumentId,
        cells: &[BlockId],
        content: &[StyledText],
    ) -> Result<(), AppError> {
        let styled = content
            .iter()
            .flat_map(|text| &text.elements)
            .any(|element| !element.style().is_plain());
        {
            let mut state = self.state.lock();
            state.calls.push(Call::FillCells {
                cells: cells.len(),
                styled,
            });
            if let Some(error) = state.fill_script.pop_front() {
                return Err(error);
            }
            if styled && state.reject_styled_fills {
                return Err(AppError::remote(
                    RemoteErrorCode::InvalidParameter,
                    "unsupported text element style",
                ));
            }
        }

        for (cell, text) in cells.iter().zip(content) {
            if text.is_blank() {
                continue;
            }
            let paragraph = Block::text_block(text.clone());
            self.create_children(document, cell, std::slice::from_ref(&paragraph), Some(0))
                .await?;
            self.delete_children(document, cell, 1, 2).await?;
        }
        Ok(())
    }
}
