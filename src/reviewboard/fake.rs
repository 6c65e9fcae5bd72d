//! In-memory review server for tests. Listings are split into pages of
//! `page_size` items and cursors are plain start offsets.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::reviewboard::server::ReviewServer;
use crate::reviewboard::types::{
    DiffRevision, FileDiff, Page, Repository, ReviewEvent, ReviewRequest, ReviewRequestQuery,
    ReviewStatus,
};

pub const BASE_URL: &str = "https://rb.example.com";

/// Fixed instant tests measure from
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + chrono::Duration::seconds(secs)
}

pub fn repository(id: u64, name: &str, path: &str) -> Repository {
    Repository {
        id,
        name: name.to_string(),
        path: path.to_string(),
        mirror_path: None,
    }
}

pub fn review_request(id: u64, branch: &str, submitter: &str) -> ReviewRequest {
    ReviewRequest {
        id,
        branch: branch.to_string(),
        summary: format!("Review {}", id),
        status: ReviewStatus::Pending,
        submitter: submitter.to_string(),
        repository: None,
        last_updated: at(0),
        url: format!("{}/r/{}/", BASE_URL, id),
    }
}

pub fn ship_it(id: u64, user: &str, timestamp: DateTime<Utc>) -> ReviewEvent {
    ReviewEvent {
        id,
        user: user.to_string(),
        timestamp,
        public: true,
        ship_it: true,
    }
}

pub fn file_diff(id: u64, path: &str, dest_detail: &str) -> FileDiff {
    FileDiff {
        id,
        source_file: path.to_string(),
        dest_file: path.to_string(),
        source_revision: "0000000".to_string(),
        dest_detail: dest_detail.to_string(),
        status: Some("modified".to_string()),
    }
}

struct FakeRequest {
    repository_id: Option<u64>,
    to_users: Vec<String>,
    to_groups: Vec<String>,
    request: ReviewRequest,
}

pub struct FakeServer {
    page_size: usize,
    repositories: Vec<Repository>,
    requests: Vec<FakeRequest>,
    diffs: HashMap<u64, Vec<DiffRevision>>,
    files: HashMap<(u64, u32), Vec<FileDiff>>,
    patches: HashMap<(u64, u32, u64), Vec<u8>>,
    reviews: HashMap<u64, Vec<ReviewEvent>>,
    failing: bool,
    closed: Mutex<Vec<(u64, Option<String>)>>,
    calls: Mutex<Vec<String>>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self {
            page_size: 2,
            repositories: Vec::new(),
            requests: Vec::new(),
            diffs: HashMap::new(),
            files: HashMap::new(),
            patches: HashMap::new(),
            reviews: HashMap::new(),
            failing: false,
            closed: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    /// Make every call fail, as if the server were unreachable
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn with_repository(mut self, repo: Repository) -> Self {
        self.repositories.push(repo);
        self
    }

    pub fn with_review_request(mut self, repository_id: u64, request: ReviewRequest) -> Self {
        self.requests.push(FakeRequest {
            repository_id: Some(repository_id),
            to_users: Vec::new(),
            to_groups: Vec::new(),
            request,
        });
        self
    }

    pub fn with_targeted_request(
        mut self,
        request: ReviewRequest,
        to_users: &[&str],
        to_groups: &[&str],
    ) -> Self {
        self.requests.push(FakeRequest {
            repository_id: None,
            to_users: to_users.iter().map(|s| s.to_string()).collect(),
            to_groups: to_groups.iter().map(|s| s.to_string()).collect(),
            request,
        });
        self
    }

    pub fn with_diff(mut self, review_request: u64, revision: DiffRevision) -> Self {
        self.diffs.entry(review_request).or_default().push(revision);
        self
    }

    pub fn with_file(
        mut self,
        review_request: u64,
        revision: u32,
        file: FileDiff,
        patch: impl AsRef<[u8]>,
    ) -> Self {
        self.patches
            .insert((review_request, revision, file.id), patch.as_ref().to_vec());
        self.files
            .entry((review_request, revision))
            .or_default()
            .push(file);
        self
    }

    pub fn with_review(mut self, review_request: u64, event: ReviewEvent) -> Self {
        self.reviews.entry(review_request).or_default().push(event);
        self
    }

    /// Review requests closed so far, with their descriptions
    pub fn closed(&self) -> Vec<(u64, Option<String>)> {
        self.closed.lock().unwrap().clone()
    }

    /// Names of the calls made so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str) -> Result<()> {
        self.calls.lock().unwrap().push(call.to_string());
        if self.failing {
            return Err(anyhow!("connection refused"));
        }
        Ok(())
    }

    fn paginate<T: Clone>(&self, items: &[T], page_size: usize, cursor: Option<String>) -> Result<Page<T>> {
        let start = match cursor {
            Some(c) => c.parse::<usize>()?,
            None => 0,
        };
        let end = (start + page_size).min(items.len());
        Ok(Page {
            items: items[start.min(end)..end].to_vec(),
            total_results: items.len(),
            next: (end < items.len()).then(|| end.to_string()),
        })
    }
}

#[async_trait]
impl ReviewServer for FakeServer {
    fn base_url(&self) -> &str {
        BASE_URL
    }

    async fn repositories(&self, cursor: Option<String>) -> Result<Page<Repository>> {
        self.record("repositories")?;
        self.paginate(&self.repositories, self.page_size, cursor)
    }

    async fn review_requests(
        &self,
        query: &ReviewRequestQuery,
        cursor: Option<String>,
    ) -> Result<Page<ReviewRequest>> {
        self.record("review_requests")?;
        let matching: Vec<ReviewRequest> = self
            .requests
            .iter()
            .filter(|r| query.repository.is_none() || r.repository_id == query.repository)
            .filter(|r| query.status.map_or(true, |s| r.request.status == s))
            .filter(|r| {
                query
                    .to_users
                    .as_ref()
                    .map_or(true, |u| r.to_users.contains(u))
            })
            .filter(|r| {
                query
                    .to_groups
                    .as_ref()
                    .map_or(true, |g| r.to_groups.contains(g))
            })
            .filter(|r| {
                query
                    .from_user
                    .as_ref()
                    .map_or(true, |u| &r.request.submitter == u)
            })
            .map(|r| r.request.clone())
            .collect();
        let page_size = query
            .max_results
            .map_or(self.page_size, |m| m as usize);
        self.paginate(&matching, page_size, cursor)
    }

    async fn diff_revisions(
        &self,
        review_request: u64,
        cursor: Option<String>,
    ) -> Result<Page<DiffRevision>> {
        self.record("diff_revisions")?;
        let diffs = self.diffs.get(&review_request).cloned().unwrap_or_default();
        self.paginate(&diffs, self.page_size, cursor)
    }

    async fn diff_files(
        &self,
        review_request: u64,
        revision: u32,
        cursor: Option<String>,
    ) -> Result<Page<FileDiff>> {
        self.record("diff_files")?;
        let files = self
            .files
            .get(&(review_request, revision))
            .cloned()
            .unwrap_or_default();
        self.paginate(&files, self.page_size, cursor)
    }

    async fn file_patch(
        &self,
        review_request: u64,
        revision: u32,
        file_id: u64,
    ) -> Result<Vec<u8>> {
        self.record("file_patch")?;
        self.patches
            .get(&(review_request, revision, file_id))
            .cloned()
            .ok_or_else(|| anyhow!("no patch for file {}", file_id))
    }

    async fn reviews(&self, review_request: u64, cursor: Option<String>) -> Result<Page<ReviewEvent>> {
        self.record("reviews")?;
        let reviews = self.reviews.get(&review_request).cloned().unwrap_or_default();
        self.paginate(&reviews, self.page_size, cursor)
    }

    async fn close_review_request(
        &self,
        review_request: u64,
        description: Option<&str>,
    ) -> Result<()> {
        self.record("close_review_request")?;
        self.closed
            .lock()
            .unwrap()
            .push((review_request, description.map(str::to_string)));
        Ok(())
    }
}
