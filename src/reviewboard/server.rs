use anyhow::{bail, Result};
use async_trait::async_trait;
use std::future::Future;

use crate::reviewboard::types::{
    DiffRevision, FileDiff, Page, Repository, ReviewEvent, ReviewRequest, ReviewRequestQuery,
};

/// Upper bound on pages walked in one listing. A server that keeps handing
/// out next links past this is treated as broken.
pub const MAX_PAGES: usize = 1000;

/// The review-server operations this tool relies on.
///
/// Listing methods take the cursor returned in the previous page's `next`
/// (or `None` for the first page).
#[async_trait]
pub trait ReviewServer: Send + Sync {
    /// Base URL of the server, used to build links shown to users
    fn base_url(&self) -> &str;

    async fn repositories(&self, cursor: Option<String>) -> Result<Page<Repository>>;

    async fn review_requests(
        &self,
        query: &ReviewRequestQuery,
        cursor: Option<String>,
    ) -> Result<Page<ReviewRequest>>;

    async fn diff_revisions(
        &self,
        review_request: u64,
        cursor: Option<String>,
    ) -> Result<Page<DiffRevision>>;

    async fn diff_files(
        &self,
        review_request: u64,
        revision: u32,
        cursor: Option<String>,
    ) -> Result<Page<FileDiff>>;

    /// Raw patch bytes of one file of a diff revision
    async fn file_patch(&self, review_request: u64, revision: u32, file_id: u64)
        -> Result<Vec<u8>>;

    async fn reviews(&self, review_request: u64, cursor: Option<String>) -> Result<Page<ReviewEvent>>;

    /// Mark a review request submitted, optionally with a closing description
    async fn close_review_request(&self, review_request: u64, description: Option<&str>)
        -> Result<()>;
}

/// Everything a paginated listing returned, plus the server's reported total.
#[derive(Debug, Clone)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub total_results: usize,
}

/// Walk a listing from its first page until no next cursor remains.
pub async fn collect_all<T, F, Fut>(mut fetch: F) -> Result<Listing<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut items = Vec::new();
    let mut total_results = None;
    let mut cursor = None;

    for _ in 0..MAX_PAGES {
        let page = fetch(cursor.take()).await?;
        total_results.get_or_insert(page.total_results);
        items.extend(page.items);
        match page.next {
            Some(next) => cursor = Some(next),
            None => {
                return Ok(Listing {
                    items,
                    total_results: total_results.unwrap_or(0),
                })
            }
        }
    }

    bail!("Listing did not end after {} pages", MAX_PAGES)
}
