// src/parsing/images.rs
//! Resolution of Markdown image references into image blocks.
//!
//! Local images are uploaded once per distinct path and the returned media
//! token is written into every node that referenced them. Anything that
//! cannot become an image block (remote URLs, failed or disabled uploads)
//! degrades to a visible text paragraph so no content disappears.

use crate::api::{DocumentRepository, MediaParent};
use crate::model::{Block, BlockNode, ImageBlock};
use crate::types::{DocumentId, StyledText, TextElement, TextStyle, ValidatedUrl};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// How image references are resolved.
#[derive(Debug, Clone)]
pub struct ImageOptions {
    pub upload: bool,
    /// Directory relative image paths are resolved against.
    pub base_dir: PathBuf,
}

/// Counts from one resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageResolution {
    pub uploaded: usize,
    pub degraded: usize,
    pub failures: Vec<String>,
}

/// Uploads local images referenced by `nodes` and rewrites every pending
/// image node into an image block or a placeholder paragraph.
pub async fn resolve_images(
    nodes: &mut [BlockNode],
    repository: &dyn DocumentRepository,
    document: &DocumentId,
    options: &ImageOptions,
) -> ImageResolution {
    let mut resolution = ImageResolution::default();

    let mut sources = Vec::new();
    collect_local_sources(nodes, &mut sources);

    let mut tokens: HashMap<String, String> = HashMap::new();
    if options.upload {
        for source in sources {
            let path = resolve_path(&options.base_dir, &source);
            match repository
                .upload_media(&path, MediaParent::DocxImage, document.as_str())
                .await
            {
                Ok(token) => {
                    log::debug!("Uploaded image {} as {}", path.display(), token);
                    resolution.uploaded += 1;
                    tokens.insert(source, token);
                }
                Err(e) => {
                    log::warn!("Failed to upload image {}: {}", path.display(), e);
                    resolution
                        .failures
                        .push(format!("image {}: {}", path.display(), e));
                }
            }
        }
    } else if !sources.is_empty() {
        log::info!("Image upload disabled, {} local images become placeholders", sources.len());
    }

    apply_tokens(nodes, &tokens, &mut resolution);
    resolution
}

fn collect_local_sources(nodes: &[BlockNode], sources: &mut Vec<String>) {
    for node in nodes {
        if let Some(pending) = &node.pending_image {
            if !pending.is_remote() && !sources.contains(&pending.source) {
                sources.push(pending.source.clone());
            }
        }
        collect_local_sources(&node.children, sources);
    }
}

fn apply_tokens(
    nodes: &mut [BlockNode],
    tokens: &HashMap<String, String>,
    resolution: &mut ImageResolution,
) {
    for node in nodes.iter_mut() {
        if let Some(pending) = node.pending_image.take() {
            node.block = match tokens.get(&pending.source) {
                Some(token) => Block::Image(ImageBlock {
                    token: token.clone(),
                    ..Default::default()
                }),
                None => {
                    resolution.degraded += 1;
                    placeholder(&pending.source, &pending.alt)
                }
            };
        }
        apply_tokens(&mut node.children, tokens, resolution);
    }
}

/// Paragraph standing in for an image: a link for remote images, bracketed
/// text naming the file otherwise.
fn placeholder(source: &str, alt: &str) -> Block {
    let label = if alt.trim().is_empty() { source } else { alt.trim() };
    match ValidatedUrl::parse(source) {
        Ok(url) => {
            let style = TextStyle {
                link: Some(url),
                ..Default::default()
            };
            Block::text_block(StyledText::from_elements(vec![TextElement::styled(
                label, style,
            )]))
        }
        Err(_) => Block::text_block(StyledText::plain(format!("[image: {} ({})]", label, source))),
    }
}

/// Resolves `source` against `base_dir` unless it is absolute. A leading
/// `file://` is stripped and percent-escapes are decoded.
fn resolve_path(base_dir: &Path, source: &str) -> PathBuf {
    let source = source.strip_prefix("file://").unwrap_or(source);
    let decoded = percent_encoding::percent_decode_str(source).decode_utf8_lossy();
    let path = Path::new(decoded.as_ref());
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PendingImage;

    fn pending(source: &str) -> BlockNode {
        let mut node = BlockNode::new(Block::Image(ImageBlock::default()));
        node.pending_image = Some(PendingImage {
            source: source.to_string(),
            alt: "diagram".to_string(),
        });
        node
    }

    #[test]
    fn test_resolve_path() {
        let base = Path::new("/docs");
        assert_eq!(resolve_path(base, "img/a%20b.png"), PathBuf::from("/docs/img/a b.png"));
        assert_eq!(resolve_path(base, "/abs/c.png"), PathBuf::from("/abs/c.png"));
    }

    #[test]
    fn test_tokens_and_placeholders() {
        let mut nodes = vec![
            pending("a.png"),
            pending("https://example.com/b.png"),
            pending("missing.png"),
        ];
        let tokens = HashMap::from([("a.png".to_string(), "boxcnA".to_string())]);
        let mut resolution = ImageResolution::default();
        apply_tokens(&mut nodes, &tokens, &mut resolution);

        assert!(matches!(&nodes[0].block, Block::Image(img) if img.token == "boxcnA"));
        let remote = nodes[1].block.text().unwrap();
        assert!(remote.elements[0].style().link.is_some());
        assert_eq!(
            nodes[2].block.text().unwrap().to_plain_text(),
            "[image: diagram (missing.png)]"
        );
        assert_eq!(resolution.degraded, 2);
        assert!(nodes.iter().all(|n| n.pending_image.is_none()));
    }

    #[test]
    fn test_collect_skips_remote_and_duplicates() {
        let nested = BlockNode::new(Block::divider()).with_children(vec![pending("a.png")]);
        let nodes = vec![pending("a.png"), pending("http://x.org/y.png"), nested];
        let mut sources = Vec::new();
        collect_local_sources(&nodes, &mut sources);
        assert_eq!(sources, vec!["a.png".to_string()]);
    }
}
