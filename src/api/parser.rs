// src/api/parser.rs
//! Parsing of the service's `{code, msg, data}` response envelope.
//!
//! A response is a success only when the HTTP status is 2xx *and* the
//! envelope code is zero; everything else becomes `AppError::RemoteService`
//! carrying the typed code, the message and the rate-limit reset hint.

use super::client::ApiResponse;
use super::wire::{block_from_wire, WireBlock};
use crate::constants::ERROR_BODY_PREVIEW_LENGTH;
use crate::error::{AppError, RemoteErrorCode};
use crate::model::Block;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default = "Option::default")]
    data: Option<T>,
}

/// One page of a paginated listing.
#[derive(Debug, Deserialize)]
pub struct ListingPage<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub page_token: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

/// Parse any envelope response into its `data` payload.
pub fn parse_api_response<T>(result: ApiResponse<String>) -> Result<T, AppError>
where
    T: serde::de::DeserializeOwned,
{
    let envelope: Envelope<T> = match serde_json::from_str(&result.data) {
        Ok(envelope) => envelope,
        Err(e) if result.status.is_success() => {
            log::error!("Failed to parse response from {}: {}", result.url, e);
            return Err(AppError::MalformedResponse(format!(
                "{} (body: {})",
                e,
                preview(&result.data)
            )));
        }
        Err(_) => return Err(error_from_status(&result)),
    };

    if envelope.code != 0 {
        return Err(AppError::RemoteService {
            code: RemoteErrorCode::from_api_code(envelope.code),
            message: envelope.msg,
            status: Some(result.status.as_u16()),
            reset_after: result.reset_after,
        });
    }

    if !result.status.is_success() {
        return Err(error_from_status(&result));
    }

    envelope.data.ok_or_else(|| {
        AppError::MalformedResponse(format!("Response from {} has no data", result.url))
    })
}

/// Checks an envelope whose payload the caller doesn't need.
pub fn parse_empty_response(result: ApiResponse<String>) -> Result<(), AppError> {
    parse_api_response::<serde_json::Value>(result).map(|_| ())
}

/// Turns a non-JSON error body into a status-code error.
pub fn error_from_status(result: &ApiResponse<String>) -> AppError {
    AppError::RemoteService {
        code: RemoteErrorCode::from_http_status(result.status.as_u16()),
        message: format!("HTTP {} from {}: {}", result.status, result.url, preview(&result.data)),
        status: Some(result.status.as_u16()),
        reset_after: result.reset_after,
    }
}

/// Parse a page of blocks from a listing call.
pub fn parse_blocks_page(result: ApiResponse<String>) -> Result<ListingPage<Block>, AppError> {
    let page: ListingPage<WireBlock> = parse_api_response(result)?;
    Ok(ListingPage {
        items: page.items.into_iter().map(block_from_wire).collect(),
        page_token: page.page_token.filter(|t| !t.is_empty()),
        has_more: page.has_more,
    })
}

/// Parse a single-block response (`data.block`).
pub fn parse_block_response(result: ApiResponse<String>) -> Result<Block, AppError> {
    #[derive(Deserialize)]
    struct BlockData {
        block: WireBlock,
    }
    let data: BlockData = parse_api_response(result)?;
    Ok(block_from_wire(data.block))
}

/// Parse the blocks a create-children call returned (`data.children`).
pub fn parse_created_children(result: ApiResponse<String>) -> Result<Vec<Block>, AppError> {
    #[derive(Deserialize)]
    struct CreatedData {
        #[serde(default)]
        children: Vec<WireBlock>,
    }
    let data: CreatedData = parse_api_response(result)?;
    Ok(data.children.into_iter().map(block_from_wire).collect())
}

fn preview(body: &str) -> String {
    if body.chars().count() > ERROR_BODY_PREVIEW_LENGTH {
        let head: String = body.chars().take(ERROR_BODY_PREVIEW_LENGTH).collect();
        format!("{}...", head)
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn response(status: u16, body: &str, reset_after: Option<u64>) -> ApiResponse<String> {
        ApiResponse {
            data: body.to_string(),
            status: StatusCode::from_u16(status).unwrap(),
            url: "https://example.test/open-apis/x".to_string(),
            reset_after,
        }
    }

    #[test]
    fn test_rate_limit_envelope() {
        let result = parse_empty_response(response(
            429,
            r#"{"code":99991400,"msg":"request trigger frequency limit"}"#,
            Some(2),
        ));
        match result {
            Err(AppError::RemoteService {
                code, reset_after, ..
            }) => {
                assert_eq!(code, RemoteErrorCode::RateLimited);
                assert_eq!(reset_after, Some(2));
            }
            other => panic!("expected rate limit error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_json_error_falls_back_to_status() {
        let result = parse_empty_response(response(502, "<html>bad gateway</html>", None));
        match result {
            Err(AppError::RemoteService { code, .. }) => {
                assert_eq!(code, RemoteErrorCode::HttpStatus(502));
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[test]
    fn test_blocks_page() {
        let page = parse_blocks_page(response(
            200,
            r#"{"code":0,"msg":"success","data":{"items":[
                {"block_id":"a","block_type":22,"divider":{}}
            ],"page_token":"","has_more":false}}"#,
            None,
        ))
        .unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(page.page_token.is_none());
        assert!(!page.has_more);
    }
}
