// src/api/pagination.rs
//! Page-token pagination over listing endpoints.

use super::parser::ListingPage;
use crate::constants::DOCUMENT_LISTING_PAGE_SIZE;
use crate::error::AppError;

/// Safety stop for a listing that keeps claiming `has_more`.
const MAX_LISTING_PAGES: u32 = 10_000;

/// Fetches all pages using async closures directly.
///
/// `fetch_fn` receives the page size and the token of the page to fetch
/// (`None` for the first one).
pub async fn fetch_all_pages<T, F, Fut>(mut fetch_fn: F) -> Result<Vec<T>, AppError>
where
    F: FnMut(usize, Option<String>) -> Fut,
    Fut: std::future::Future<Output = Result<ListingPage<T>, AppError>>,
{
    let mut all_items = Vec::new();
    let mut page_token = None;
    let mut pages_fetched = 0u32;

    loop {
        if pages_fetched >= MAX_LISTING_PAGES {
            log::warn!("Stopped listing after {} pages", pages_fetched);
            break;
        }

        let page = fetch_fn(DOCUMENT_LISTING_PAGE_SIZE, page_token).await?;
        pages_fetched += 1;
        all_items.extend(page.items);
        page_token = page.page_token;

        if !page.has_more || page_token.is_none() {
            break;
        }
    }

    log::debug!("Fetched {} items in {} pages", all_items.len(), pages_fetched);
    Ok(all_items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_follows_page_tokens() {
        let items = fetch_all_pages(|_, token: Option<String>| async move {
            let (items, next) = match token.as_deref() {
                None => (vec![1, 2], Some("p2".to_string())),
                Some("p2") => (vec![3], None),
                Some(other) => panic!("unexpected token {}", other),
            };
            Ok(ListingPage {
                has_more: next.is_some(),
                items,
                page_token: next,
            })
        })
        .await
        .unwrap();
        assert_eq!(items, vec![1, 2, 3]);
    }
}
