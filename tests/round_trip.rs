//! Markdown → document → Markdown through the in-memory service.

mod common;

use blockmark::config::{ExportConfig, RemoteConfig};
use blockmark::model::{Block, BlockNode};
use blockmark::parsing::ImageOptions;
use blockmark::{
    convert, render_blocks, AccessToken, DocumentExport, DocumentId, DocumentRepository,
    ImportSettings, Importer, ProgressReporter, RenderOptions, StyledText, WorkerCount,
    WorkerSettings,
};
use common::MockRepository;
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const DOCUMENT: &str = "# Release notes

Some **bold** text with a [link](https://example.com/docs).

- one
- two
  - nested

1. first
2. second

- [ ] open task
- [x] done task

```rust
fn main() {}
```

> quoted line

> [!WARNING]
> mind the gap

| name | value |
| --- | --- |
| a | 1 |
| b | 2 |

---

Closing paragraph.
";

fn shape(nodes: &[BlockNode]) -> Vec<String> {
    nodes
        .iter()
        .map(|node| {
            let kind = match &node.block {
                Block::Heading(h) => format!("heading{}", h.level),
                other => other.block_type().to_string(),
            };
            if node.children.is_empty() {
                kind
            } else {
                format!("{}[{}]", kind, shape(&node.children).join(","))
            }
        })
        .collect()
}

async fn import(repository: &Arc<MockRepository>, markdown: &str) {
    let settings = ImportSettings {
        workers: WorkerSettings {
            diagram_workers: WorkerCount::new(1).unwrap(),
            table_workers: WorkerCount::new(1).unwrap(),
            diagram_max_retries: 0,
        },
        images: ImageOptions {
            upload: false,
            base_dir: PathBuf::from("."),
        },
    };
    let report = Importer::new(
        repository.clone(),
        settings,
        Arc::new(ProgressReporter::silent()),
        CancellationToken::new(),
    )
    .import(&repository.document(), markdown, "round-trip.md")
    .await
    .unwrap();
    assert!(!report.has_failures(), "{:?}", report.stats.failures);
}

async fn export(repository: &MockRepository, options: &RenderOptions) -> String {
    let blocks = repository.list_blocks(&repository.document()).await.unwrap();
    render_blocks(blocks, options).unwrap().into_string()
}

#[tokio::test]
async fn test_round_trip_preserves_kinds_and_order() {
    let repository = Arc::new(MockRepository::new());
    import(&repository, DOCUMENT).await;

    let markdown = export(&repository, &RenderOptions::default()).await;

    assert_eq!(shape(&convert(&markdown)), shape(&convert(DOCUMENT)));
    assert!(markdown.contains("**bold**"));
    assert!(markdown.contains("[link](https://example.com/docs)"));
    assert!(markdown.contains("| a | 1 |"));
}

#[tokio::test]
async fn test_export_is_idempotent() {
    let repository = Arc::new(MockRepository::new());
    import(&repository, DOCUMENT).await;

    let first = export(&repository, &RenderOptions::default()).await;
    let second = export(&repository, &RenderOptions::default()).await;
    assert_eq!(first, second);
}

#[test]
fn test_deep_headings_round_trip_unless_degraded() {
    let blocks = vec![
        Block::heading(7, StyledText::plain("Seven")),
        Block::heading(9, StyledText::plain("Nine")),
    ];

    let kept = render_blocks(blocks.clone(), &RenderOptions::default())
        .unwrap()
        .into_string();
    assert_eq!(shape(&convert(&kept)), vec!["heading7", "heading9"]);

    let degraded = render_blocks(
        blocks,
        &RenderOptions {
            degrade_deep_headings: true,
            ..Default::default()
        },
    )
    .unwrap()
    .into_string();
    assert_eq!(degraded, "**Seven**\n\n**Nine**\n");
    assert_eq!(shape(&convert(&degraded)), vec!["text", "text"]);
}

#[tokio::test]
async fn test_export_downloads_images_beside_output() {
    let png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A];
    let repository = Arc::new(MockRepository::new().with_media("boxcnChart", png.clone()));
    import(&repository, "Chart below.\n\n![chart](image-token://boxcnChart)\n").await;

    let dir = tempfile::tempdir().unwrap();
    let output_file = dir.path().join("doc.md");
    let config = ExportConfig {
        document_id: DocumentId::from(MockRepository::DOCUMENT),
        output_file: Some(output_file.clone()),
        assets_dir: Some(dir.path().join("assets")),
        degrade_deep_headings: false,
        verbose: false,
        remote: RemoteConfig {
            access_token: AccessToken::new("u-test-token-123456").unwrap(),
            base_url: None,
        },
    };

    let report = DocumentExport::new(repository.clone(), &config)
        .run()
        .await
        .unwrap();
    assert!(report.is_success());

    let markdown = std::fs::read_to_string(&output_file).unwrap();
    assert_eq!(markdown, "Chart below.\n\n![image](assets/boxcnChart.png)\n");
    assert_eq!(std::fs::read(dir.path().join("assets/boxcnChart.png")).unwrap(), png);
}

#[test]
fn test_literal_markers_stay_text() {
    let texts = [
        "- not a list",
        "1. Revenue grew",
        "# not heading",
        "> not quote",
        "####### seven",
        "+ plus",
        "***",
        "2*3 = 6 and a_b [x] ~y~ <z> `q` $5 back\\slash",
    ];
    let blocks = texts
        .iter()
        .map(|text| Block::text_block(StyledText::plain(*text)))
        .collect();

    let markdown = render_blocks(blocks, &RenderOptions::default())
        .unwrap()
        .into_string();
    let nodes = convert(&markdown);

    assert_eq!(shape(&nodes), vec!["text"; texts.len()]);
    let reread: Vec<String> = nodes
        .iter()
        .map(|node| node.block.text().map(|t| t.to_plain_text()).unwrap_or_default())
        .collect();
    assert_eq!(reread, texts);
}
