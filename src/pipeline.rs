// src/pipeline.rs
//! The two command pipelines.
//!
//! Export runs fetch → compose → deliver through the capability traits
//! below, so each stage can be exercised in isolation. Import hands the
//! file to the three-phase [`Importer`].

use crate::analytics::{census, log_census};
use crate::api::DocumentRepository;
use crate::config::{ExportConfig, ImportConfig};
use crate::error::AppError;
use crate::formatting::{render_tree, RenderOptions};
use crate::import::{plan_import, ImportReport, Importer, ProgressReporter};
use crate::model::{Block, BlockTree};
use crate::output::{
    asset_filename, deliver_all, get_relative_path, DeliveryTarget, OutputPlan, OutputReport,
};
use crate::types::{DocumentId, RenderedMarkdown};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Retrieves the flat block listing of a document.
#[async_trait::async_trait]
pub trait DocumentSource {
    async fn fetch(&self, id: &DocumentId) -> Result<Vec<Block>, AppError>;
}

/// Transforms an indexed block tree into Markdown.
pub trait MarkdownComposer {
    fn compose(
        &self,
        tree: &BlockTree,
        assets: &DownloadedAssets,
    ) -> Result<RenderedMarkdown, AppError>;
}

/// Delivers rendered Markdown and downloaded images to their destinations.
pub trait MarkdownDelivery {
    fn deliver(
        &self,
        markdown: RenderedMarkdown,
        assets: DownloadedAssets,
    ) -> Result<OutputReport, AppError>;
}

/// Image media fetched before rendering.
#[derive(Debug, Clone, Default)]
pub struct DownloadedAssets {
    pub files: Vec<(PathBuf, Vec<u8>)>,
    /// Media token to the link written into the Markdown.
    pub links: HashMap<String, String>,
}

/// Export of one document to Markdown.
pub struct DocumentExport<'a> {
    repository: Arc<dyn DocumentRepository>,
    config: &'a ExportConfig,
}

impl<'a> DocumentExport<'a> {
    pub fn new(repository: Arc<dyn DocumentRepository>, config: &'a ExportConfig) -> Self {
        Self { repository, config }
    }

    pub async fn run(&self) -> Result<OutputReport, AppError> {
        let blocks = self.fetch(&self.config.document_id).await?;
        let tree = BlockTree::from_blocks(blocks);
        log_census(&census(&tree));

        let assets = match &self.config.assets_dir {
            Some(dir) => self.download_assets(&tree, dir).await,
            None => DownloadedAssets::default(),
        };

        let markdown = self.compose(&tree, &assets)?;
        self.deliver(markdown, assets)
    }

    /// The file image links are made relative to.
    fn link_anchor(&self) -> PathBuf {
        self.config
            .output_file
            .clone()
            .unwrap_or_else(|| PathBuf::from("export.md"))
    }

    /// Downloads every image token once. A failed download keeps the token
    /// link in the output.
    async fn download_assets(&self, tree: &BlockTree, dir: &Path) -> DownloadedAssets {
        let anchor = self.link_anchor();
        let mut assets = DownloadedAssets::default();
        let mut seen = HashSet::new();

        for block in tree.blocks() {
            let Block::Image(image) = block else {
                continue;
            };
            if image.token.is_empty() || !seen.insert(image.token.clone()) {
                continue;
            }

            let bytes = match self.repository.download_media(&image.token).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::warn!("Could not download image {}: {}", image.token, e);
                    continue;
                }
            };

            let path = dir.join(asset_filename(&image.token, &bytes));
            let link = get_relative_path(&anchor, &path).unwrap_or_else(|e| {
                log::debug!("{}; linking {} as given", e, path.display());
                path.to_string_lossy().replace('\\', "/")
            });
            log::debug!("Image {} -> {}", image.token, link);
            assets.links.insert(image.token.clone(), link);
            assets.files.push((path, bytes));
        }

        log::info!("Downloaded {} images", assets.files.len());
        assets
    }
}

#[async_trait::async_trait]
impl DocumentSource for DocumentExport<'_> {
    async fn fetch(&self, id: &DocumentId) -> Result<Vec<Block>, AppError> {
        log::info!("Retrieving blocks of document {}", id);
        let blocks = self.repository.list_blocks(id).await?;
        log::info!("Retrieved {} blocks", blocks.len());
        Ok(blocks)
    }
}

impl MarkdownComposer for DocumentExport<'_> {
    fn compose(
        &self,
        tree: &BlockTree,
        assets: &DownloadedAssets,
    ) -> Result<RenderedMarkdown, AppError> {
        let options = RenderOptions {
            degrade_deep_headings: self.config.degrade_deep_headings,
            image_paths: assets.links.clone(),
        };
        render_tree(tree, &options)
    }
}

impl MarkdownDelivery for DocumentExport<'_> {
    fn deliver(
        &self,
        markdown: RenderedMarkdown,
        assets: DownloadedAssets,
    ) -> Result<OutputReport, AppError> {
        let mut plan = OutputPlan::new();

        if let (Some(dir), false) = (&self.config.assets_dir, assets.files.is_empty()) {
            plan = plan.with_operation(DeliveryTarget::CreateDirectory { path: dir.clone() });
            for (path, content) in assets.files {
                plan = plan.with_operation(DeliveryTarget::WriteBytes { path, content });
            }
        }

        plan = match &self.config.output_file {
            Some(path) => plan.with_operation(DeliveryTarget::WriteFile {
                path: path.clone(),
                content: markdown.into_string(),
            }),
            None => plan.with_operation(DeliveryTarget::PrintToStdout {
                content: markdown.into_string(),
            }),
        };

        deliver_all(plan)
    }
}

fn read_markdown(path: &Path) -> Result<String, AppError> {
    std::fs::read_to_string(path).map_err(|e| {
        AppError::Io(std::io::Error::new(
            e.kind(),
            format!("Could not read {}: {}", path.display(), e),
        ))
    })
}

/// Converts the file locally and returns the planned blocks and queued
/// work as pretty JSON.
pub fn dry_run(config: &ImportConfig) -> Result<String, AppError> {
    let markdown = read_markdown(&config.markdown_file)?;
    let plan = plan_import(&markdown);
    log::info!(
        "Planned {} blocks, {} diagrams, {} tables",
        plan.blocks,
        plan.diagrams,
        plan.tables
    );
    Ok(format!("{}\n", serde_json::to_string_pretty(&plan)?))
}

/// Imports the configured file, creating the target document first when
/// no document id was given.
pub async fn run_import(
    repository: Arc<dyn DocumentRepository>,
    config: &ImportConfig,
    reporter: Arc<ProgressReporter>,
    cancel: CancellationToken,
) -> Result<ImportReport, AppError> {
    let markdown = read_markdown(&config.markdown_file)?;

    let document = match &config.document_id {
        Some(id) => id.clone(),
        None => {
            let id = repository
                .create_document(&config.title, config.folder.as_ref())
                .await?;
            log::info!("Created document '{}' ({})", config.title, id);
            id
        }
    };

    let source_name = config.markdown_file.display().to_string();
    let importer = Importer::new(repository, config.settings.clone(), reporter, cancel);
    importer.import(&document, &markdown, &source_name).await
}
