// src/config.rs
use crate::error::AppError;
use crate::import::{ImportSettings, WorkerSettings};
use crate::output::SummaryFormat;
use crate::parsing::ImageOptions;
use crate::types::{AccessToken, DocumentId, FolderId, WorkerCount};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Environment variable holding the access token for every remote call.
pub const ACCESS_TOKEN_ENV: &str = "BLOCKMARK_ACCESS_TOKEN";
/// Optional override of the service base URL.
pub const API_BASE_ENV: &str = "BLOCKMARK_API_BASE";

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import a Markdown file into a document
    Import(ImportArgs),
    /// Export a document as Markdown
    Export(ExportArgs),
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Markdown file to import
    pub markdown_file: PathBuf,

    /// Existing document to append to (ID or URL); a new document is created when absent
    #[arg(long)]
    pub document_id: Option<String>,

    /// Title of the created document (defaults to the file stem)
    #[arg(long)]
    pub title: Option<String>,

    /// Folder to create the document in (ID or URL)
    #[arg(long)]
    pub folder: Option<String>,

    /// Keep local images as text placeholders instead of uploading them
    #[arg(long, default_value_t = false)]
    pub no_upload_images: bool,

    /// Concurrent diagram imports
    #[arg(long, default_value_t = 4)]
    pub diagram_workers: usize,

    /// Concurrent table fills
    #[arg(long, default_value_t = 2)]
    pub table_workers: usize,

    /// Failed diagram attempts tolerated before falling back to a code block
    #[arg(long, default_value_t = 3)]
    pub diagram_max_retries: u32,

    /// Format of the final summary
    #[arg(long, value_enum, default_value_t = SummaryFormat::Text)]
    pub output: SummaryFormat,

    /// Print the planned blocks and queued work as JSON without calling the service
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Document to export (ID or URL)
    pub document_id: String,

    /// Output file for the Markdown (stdout when absent)
    #[arg(short, long)]
    pub output_file: Option<String>,

    /// Download image media next to the Markdown and link it relatively
    #[arg(long, default_value_t = false)]
    pub download_images: bool,

    /// Directory for downloaded images (defaults to `assets` beside the output)
    #[arg(long)]
    pub assets_dir: Option<String>,

    /// Render headings deeper than level 6 as bold paragraphs
    #[arg(long, default_value_t = false)]
    pub degrade_deep_headings: bool,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl CommandLineInput {
    pub fn verbose(&self) -> bool {
        match &self.command {
            Command::Import(args) => args.verbose,
            Command::Export(args) => args.verbose,
        }
    }
}

/// Credentials and endpoint for the document service.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub access_token: AccessToken,
    pub base_url: Option<String>,
}

impl RemoteConfig {
    fn resolve(env: &impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let token = env(ACCESS_TOKEN_ENV).ok_or_else(|| {
            AppError::MissingConfiguration(format!(
                "{} environment variable not set",
                ACCESS_TOKEN_ENV
            ))
        })?;

        Ok(RemoteConfig {
            access_token: AccessToken::new(token)?,
            base_url: env(API_BASE_ENV).filter(|base| !base.trim().is_empty()),
        })
    }
}

/// Resolved import configuration.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub markdown_file: PathBuf,
    pub document_id: Option<DocumentId>,
    pub title: String,
    pub folder: Option<FolderId>,
    pub settings: ImportSettings,
    pub output: SummaryFormat,
    pub dry_run: bool,
    pub verbose: bool,
    /// Absent only for dry runs.
    pub remote: Option<RemoteConfig>,
}

impl ImportConfig {
    pub fn resolve(
        args: ImportArgs,
        env: &impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let remote = if args.dry_run {
            RemoteConfig::resolve(env).ok()
        } else {
            Some(RemoteConfig::resolve(env)?)
        };

        let document_id = args.document_id.as_deref().map(DocumentId::parse).transpose()?;
        let folder = args.folder.as_deref().map(FolderId::parse).transpose()?;

        let title = args
            .title
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| file_stem(&args.markdown_file));

        let base_dir = args
            .markdown_file
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let settings = ImportSettings {
            workers: WorkerSettings {
                diagram_workers: WorkerCount::new(args.diagram_workers)?,
                table_workers: WorkerCount::new(args.table_workers)?,
                diagram_max_retries: args.diagram_max_retries,
            },
            images: ImageOptions {
                upload: !args.no_upload_images,
                base_dir,
            },
        };

        Ok(ImportConfig {
            markdown_file: args.markdown_file,
            document_id,
            title,
            folder,
            settings,
            output: args.output,
            dry_run: args.dry_run,
            verbose: args.verbose,
            remote,
        })
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "Untitled".to_string())
}

/// Resolved export configuration.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub document_id: DocumentId,
    pub output_file: Option<PathBuf>,
    /// Set when images should be downloaded.
    pub assets_dir: Option<PathBuf>,
    pub degrade_deep_headings: bool,
    pub verbose: bool,
    pub remote: RemoteConfig,
}

impl ExportConfig {
    pub fn resolve(
        args: ExportArgs,
        env: &impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let remote = RemoteConfig::resolve(env)?;
        let document_id = DocumentId::parse(&args.document_id)?;
        let output_file = args.output_file.map(PathBuf::from);

        let assets_dir = if args.download_images || args.assets_dir.is_some() {
            Some(match args.assets_dir {
                Some(dir) => PathBuf::from(dir),
                None => output_file
                    .as_deref()
                    .and_then(Path::parent)
                    .map(|dir| dir.join("assets"))
                    .unwrap_or_else(|| PathBuf::from("assets")),
            })
        } else {
            None
        };

        Ok(ExportConfig {
            document_id,
            output_file,
            assets_dir,
            degrade_deep_headings: args.degrade_deep_headings,
            verbose: args.verbose,
            remote,
        })
    }
}

/// A fully resolved invocation.
#[derive(Debug, Clone)]
pub enum PipelineConfig {
    Import(ImportConfig),
    Export(ExportConfig),
}

impl PipelineConfig {
    /// Resolves a complete configuration from CLI input and the process environment.
    pub fn resolve(cli: CommandLineInput) -> Result<Self, AppError> {
        Self::resolve_with_env(cli, |key| std::env::var(key).ok())
    }

    pub fn resolve_with_env(
        cli: CommandLineInput,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        match cli.command {
            Command::Import(args) => Ok(PipelineConfig::Import(ImportConfig::resolve(args, &env)?)),
            Command::Export(args) => Ok(PipelineConfig::Export(ExportConfig::resolve(args, &env)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValidationError;

    fn env_with_token(key: &str) -> Option<String> {
        (key == ACCESS_TOKEN_ENV).then(|| "u-test-token-123456".to_string())
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn parse(args: &[&str]) -> CommandLineInput {
        CommandLineInput::try_parse_from(std::iter::once("blockmark").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_import_defaults() {
        let cli = parse(&["import", "docs/notes.md"]);
        let PipelineConfig::Import(config) =
            PipelineConfig::resolve_with_env(cli, env_with_token).unwrap()
        else {
            panic!("expected import config");
        };

        assert_eq!(config.title, "notes");
        assert_eq!(config.settings.workers.diagram_workers.get(), 4);
        assert_eq!(config.settings.workers.table_workers.get(), 2);
        assert_eq!(config.settings.workers.diagram_max_retries, 3);
        assert!(config.settings.images.upload);
        assert_eq!(config.settings.images.base_dir, PathBuf::from("docs"));
        assert_eq!(config.output, SummaryFormat::Text);
        assert!(config.remote.is_some());
    }

    #[test]
    fn test_missing_token() {
        let cli = parse(&["export", "doxcnAbCdEf123"]);
        assert!(matches!(
            PipelineConfig::resolve_with_env(cli, no_env),
            Err(AppError::MissingConfiguration(_))
        ));
    }

    #[test]
    fn test_dry_run_needs_no_token() {
        let cli = parse(&["import", "notes.md", "--dry-run", "--output", "json"]);
        let PipelineConfig::Import(config) = PipelineConfig::resolve_with_env(cli, no_env).unwrap()
        else {
            panic!("expected import config");
        };
        assert!(config.dry_run);
        assert!(config.remote.is_none());
        assert_eq!(config.output, SummaryFormat::Json);
        assert_eq!(config.settings.images.base_dir, PathBuf::from("."));
    }

    #[test]
    fn test_worker_count_bounds() {
        let cli = parse(&["import", "notes.md", "--diagram-workers", "0"]);
        assert!(matches!(
            PipelineConfig::resolve_with_env(cli, env_with_token),
            Err(AppError::ValidationError(ValidationError::OutOfBounds { .. }))
        ));
    }

    #[test]
    fn test_export_assets_dir_defaults_beside_output() {
        let cli = parse(&["export", "doxcnAbCdEf123", "-o", "out/doc.md", "--download-images"]);
        let PipelineConfig::Export(config) =
            PipelineConfig::resolve_with_env(cli, env_with_token).unwrap()
        else {
            panic!("expected export config");
        };
        assert_eq!(config.assets_dir, Some(PathBuf::from("out/assets")));
        assert_eq!(config.output_file, Some(PathBuf::from("out/doc.md")));
    }
}
