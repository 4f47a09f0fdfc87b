// src/api/client.rs
//! HTTP client for the document service.
//!
//! A thin wrapper around reqwest: it adds authentication, builds endpoint
//! URLs and captures the rate-limit reset header. Parsing lives in
//! `parser`, the block JSON shape in `wire`.

use super::parser::{
    parse_api_response, parse_block_response, parse_blocks_page, parse_created_children,
    parse_empty_response,
};
use super::wire::block_to_wire;
use super::{DocumentRepository, MediaParent};
use crate::constants::{HTTP_REQUEST_TIMEOUT, RATE_LIMIT_RESET_HEADER};
use crate::error::AppError;
use crate::model::{Block, DiagramSyntax};
use crate::types::{AccessToken, BlockId, DocumentId, FolderId, WhiteboardId};
use reqwest::{header, Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;

pub const DEFAULT_API_BASE: &str = "https://open.feishu.cn/open-apis";

/// A thin wrapper around reqwest Client for document API requests.
#[derive(Clone)]
pub struct HttpDocumentClient {
    client: Client,
    base_url: String,
}

impl HttpDocumentClient {
    /// Creates a new HTTP client authenticated with `token`.
    pub fn new(token: &AccessToken, base_url: Option<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers(token)?)
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()?;
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        Ok(Self { client, base_url })
    }

    /// Creates the default headers for document API requests.
    fn create_headers(token: &AccessToken) -> Result<header::HeaderMap, AppError> {
        let mut headers = header::HeaderMap::new();

        let auth_header = format!("Bearer {}", token.as_str());
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&auth_header).map_err(|e| {
                AppError::MissingConfiguration(format!("Invalid access token format: {}", e))
            })?,
        );

        Ok(headers)
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    async fn send(&self, request: RequestBuilder) -> Result<ApiResponse<String>, AppError> {
        let response = request.send().await?;
        extract_response_text(response).await
    }

    /// Makes a GET request to the specified endpoint.
    pub async fn get(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<ApiResponse<String>, AppError> {
        let url = self.url(endpoint);
        log::debug!("GET {}", url);
        self.send(self.client.get(url).query(query)).await
    }

    /// Makes a POST request with JSON body to the specified endpoint.
    pub async fn post<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
        body: &T,
    ) -> Result<ApiResponse<String>, AppError> {
        let url = self.url(endpoint);
        log::debug!("POST {}", url);
        self.send(self.client.post(url).query(query).json(body)).await
    }

    /// Makes a DELETE request with JSON body to the specified endpoint.
    pub async fn delete<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> Result<ApiResponse<String>, AppError> {
        let url = self.url(endpoint);
        log::debug!("DELETE {}", url);
        self.send(self.client.delete(url).json(body)).await
    }
}

#[async_trait::async_trait]
impl DocumentRepository for HttpDocumentClient {
    async fn create_document(
        &self,
        title: &str,
        folder: Option<&FolderId>,
    ) -> Result<DocumentId, AppError> {
        #[derive(Deserialize)]
        struct CreatedDocument {
            document: DocumentInfo,
        }
        #[derive(Deserialize)]
        struct DocumentInfo {
            document_id: String,
        }

        let mut body = json!({ "title": title });
        if let Some(folder) = folder {
            body["folder_token"] = json!(folder.as_str());
        }
        let result = self.post("docx/v1/documents", &[], &body).await?;
        let created: CreatedDocument = parse_api_response(result)?;
        Ok(DocumentId::from_remote(created.document.document_id))
    }

    async fn create_children(
        &self,
        document: &DocumentId,
        parent: &BlockId,
        children: &[Block],
        index: Option<usize>,
    ) -> Result<Vec<Block>, AppError> {
        let wire = children
            .iter()
            .map(block_to_wire)
            .collect::<Result<Vec<_>, _>>()?;
        let mut body = json!({ "children": wire });
        if let Some(index) = index {
            body["index"] = json!(index);
        }
        let endpoint = format!(
            "docx/v1/documents/{}/blocks/{}/children",
            document.as_str(),
            parent.as_str()
        );
        let result = self
            .post(&endpoint, &[("document_revision_id", "-1".to_string())], &body)
            .await?;
        parse_created_children(result)
    }

    async fn delete_children(
        &self,
        document: &DocumentId,
        parent: &BlockId,
        start_index: usize,
        end_index: usize,
    ) -> Result<(), AppError> {
        let endpoint = format!(
            "docx/v1/documents/{}/blocks/{}/children/batch_delete?document_revision_id=-1",
            document.as_str(),
            parent.as_str()
        );
        let body = json!({ "start_index": start_index, "end_index": end_index });
        let result = self.delete(&endpoint, &body).await?;
        parse_empty_response(result)
    }

    async fn list_children(
        &self,
        document: &DocumentId,
        block: &BlockId,
    ) -> Result<Vec<Block>, AppError> {
        let endpoint = format!(
            "docx/v1/documents/{}/blocks/{}/children",
            document.as_str(),
            block.as_str()
        );
        super::pagination::fetch_all_pages(|page_size, page_token| {
            let endpoint = endpoint.clone();
            async move {
                let mut query = vec![("page_size", page_size.to_string())];
                if let Some(token) = page_token {
                    query.push(("page_token", token));
                }
                let result = self.get(&endpoint, &query).await?;
                parse_blocks_page(result)
            }
        })
        .await
    }

    async fn list_blocks(&self, document: &DocumentId) -> Result<Vec<Block>, AppError> {
        let endpoint = format!("docx/v1/documents/{}/blocks", document.as_str());
        super::pagination::fetch_all_pages(|page_size, page_token| {
            let endpoint = endpoint.clone();
            async move {
                let mut query = vec![("page_size", page_size.to_string())];
                if let Some(token) = page_token {
                    query.push(("page_token", token));
                }
                let result = self.get(&endpoint, &query).await?;
                parse_blocks_page(result)
            }
        })
        .await
    }

    async fn get_block(&self, document: &DocumentId, block: &BlockId) -> Result<Block, AppError> {
        let endpoint = format!(
            "docx/v1/documents/{}/blocks/{}",
            document.as_str(),
            block.as_str()
        );
        let result = self.get(&endpoint, &[]).await?;
        parse_block_response(result)
    }

    async fn import_diagram(
        &self,
        whiteboard: &WhiteboardId,
        source: &str,
        syntax: DiagramSyntax,
    ) -> Result<String, AppError> {
        #[derive(Deserialize)]
        struct ImportedDiagram {
            #[serde(default)]
            node_id: String,
        }

        let endpoint = format!("board/v1/whiteboards/{}/nodes/plantuml", whiteboard.as_str());
        let body = json!({
            "plant_uml_code": source,
            "style_type": 1,
            "syntax_type": syntax.wire_code(),
        });
        let result = self.post(&endpoint, &[], &body).await?;
        let imported: ImportedDiagram = parse_api_response(result)?;
        Ok(imported.node_id)
    }

    async fn upload_media(
        &self,
        path: &Path,
        parent: MediaParent,
        parent_id: &str,
    ) -> Result<String, AppError> {
        #[derive(Deserialize)]
        struct Uploaded {
            file_token: String,
        }

        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let size = bytes.len();
        let form = reqwest::multipart::Form::new()
            .text("file_name", file_name.clone())
            .text("parent_type", parent.as_str())
            .text("parent_node", parent_id.to_string())
            .text("size", size.to_string())
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            );

        let url = self.url("drive/v1/medias/upload_all");
        log::debug!("POST {} ({} bytes)", url, size);
        let result = self.send(self.client.post(url).multipart(form)).await?;
        let uploaded: Uploaded = parse_api_response(result)?;
        Ok(uploaded.file_token)
    }

    async fn download_media(&self, token: &str) -> Result<Vec<u8>, AppError> {
        let url = self.url(&format!("drive/v1/medias/{}/download", token));
        log::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        if response.status().is_success() {
            return Ok(response.bytes().await?.to_vec());
        }
        let result = extract_response_text(response).await?;
        parse_empty_response(result).and(Err(AppError::MalformedResponse(format!(
            "Media download of {} failed without an error body",
            token
        ))))
    }
}

/// Result of an HTTP operation with response metadata.
#[derive(Debug)]
pub struct ApiResponse<T> {
    pub data: T,
    pub status: reqwest::StatusCode,
    pub url: String,
    /// Seconds until the rate-limit quota resets, from the response header.
    pub reset_after: Option<u64>,
}

/// Extracts the response body as text with metadata.
pub async fn extract_response_text(response: Response) -> Result<ApiResponse<String>, AppError> {
    let status = response.status();
    let url = response.url().to_string();
    let reset_after = response
        .headers()
        .get(RATE_LIMIT_RESET_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok());
    let text = response.text().await?;

    Ok(ApiResponse {
        data: text,
        status,
        url,
        reset_after,
    })
}
