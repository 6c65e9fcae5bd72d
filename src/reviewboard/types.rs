use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

/// A repository as registered on the review server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub path: String,
    pub mirror_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStatus {
    Pending,
    Submitted,
    Discarded,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Submitted => "submitted",
            ReviewStatus::Discarded => "discarded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReviewStatus::Pending),
            "submitted" => Some(ReviewStatus::Submitted),
            "discarded" => Some(ReviewStatus::Discarded),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReviewRequest {
    pub id: u64,
    pub branch: String,
    pub summary: String,
    pub status: ReviewStatus,
    pub submitter: String,
    pub repository: Option<String>, // display name, if the request has a repository
    pub last_updated: DateTime<Utc>,
    pub url: String, // absolute URL for browsers
}

impl ReviewRequest {
    /// Time since the request was last updated
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.last_updated
    }
}

/// One uploaded diff revision of a review request.
#[derive(Debug, Clone)]
pub struct DiffRevision {
    pub id: u64,
    pub revision: u32,
    pub timestamp: DateTime<Utc>,
}

/// Per-file entry of a diff revision.
#[derive(Debug, Clone)]
pub struct FileDiff {
    pub id: u64,
    pub source_file: String,
    pub dest_file: String,
    pub source_revision: String, // "PRE-CREATION" for new files
    pub dest_detail: String,     // new blob id for git repositories
    pub status: Option<String>,
}

impl FileDiff {
    pub fn is_deleted(&self) -> bool {
        self.status.as_deref() == Some("deleted")
    }
}

/// The most recent diff revision of a review, with every file's patch.
#[derive(Debug, Clone)]
pub struct LatestDiff {
    pub revision: u32,
    pub timestamp: DateTime<Utc>,
    pub files: Vec<FileDiff>,
    pub patches: BTreeMap<String, Vec<u8>>, // dest path -> raw patch bytes
}

/// A review left on a review request (an approval event when `ship_it`).
#[derive(Debug, Clone)]
pub struct ReviewEvent {
    pub id: u64,
    pub user: String,
    pub timestamp: DateTime<Utc>,
    pub public: bool,
    pub ship_it: bool,
}

/// One page of a listing. `next` is the opaque cursor for the following page.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_results: usize,
    pub next: Option<String>,
}

/// Query parameters for the review-request listing.
#[derive(Debug, Clone, Default)]
pub struct ReviewRequestQuery {
    pub repository: Option<u64>,
    pub status: Option<ReviewStatus>,
    pub to_users: Option<String>,
    pub to_groups: Option<String>,
    pub from_user: Option<String>,
    pub max_results: Option<u32>,
}

/// Parse a server timestamp.
///
/// Accepts RFC 3339 (`2013-09-26T17:22:45.108Z`) and the zone-less form older
/// servers emit, which is taken as UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| anyhow!("Invalid timestamp '{}': {}", s, e))
}

// Wire payloads. Only the fields this tool reads are modelled.

#[derive(Debug, Deserialize)]
pub(crate) struct Link {
    pub href: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Links {
    #[serde(default)]
    pub next: Option<Link>,
    #[serde(default)]
    pub submitter: Option<Link>,
    #[serde(default)]
    pub repository: Option<Link>,
    #[serde(default)]
    pub user: Option<Link>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepositoryPayload {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub mirror_path: Option<String>,
}

impl From<RepositoryPayload> for Repository {
    fn from(p: RepositoryPayload) -> Self {
        Repository {
            id: p.id,
            name: p.name,
            path: p.path,
            mirror_path: p.mirror_path.filter(|m| !m.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewRequestPayload {
    pub id: u64,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub summary: String,
    pub status: String,
    pub last_updated: String,
    #[serde(default)]
    pub absolute_url: String,
    #[serde(default)]
    pub links: Links,
}

impl TryFrom<ReviewRequestPayload> for ReviewRequest {
    type Error = anyhow::Error;

    fn try_from(p: ReviewRequestPayload) -> Result<Self> {
        let status = ReviewStatus::parse(&p.status)
            .ok_or_else(|| anyhow!("Unknown status '{}' on review request {}", p.status, p.id))?;
        Ok(ReviewRequest {
            id: p.id,
            branch: p.branch.unwrap_or_default(),
            summary: p.summary,
            status,
            submitter: p
                .links
                .submitter
                .and_then(|l| l.title)
                .unwrap_or_default(),
            repository: p.links.repository.and_then(|l| l.title),
            last_updated: parse_timestamp(&p.last_updated)?,
            url: p.absolute_url,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DiffPayload {
    pub id: u64,
    pub revision: u32,
    pub timestamp: String,
}

impl TryFrom<DiffPayload> for DiffRevision {
    type Error = anyhow::Error;

    fn try_from(p: DiffPayload) -> Result<Self> {
        Ok(DiffRevision {
            id: p.id,
            revision: p.revision,
            timestamp: parse_timestamp(&p.timestamp)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct FileDiffPayload {
    pub id: u64,
    #[serde(default)]
    pub source_file: String,
    pub dest_file: String,
    #[serde(default)]
    pub source_revision: String,
    #[serde(default)]
    pub dest_detail: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl From<FileDiffPayload> for FileDiff {
    fn from(p: FileDiffPayload) -> Self {
        FileDiff {
            id: p.id,
            source_file: p.source_file,
            dest_file: p.dest_file,
            source_revision: p.source_revision,
            dest_detail: p.dest_detail,
            status: p.status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewPayload {
    pub id: u64,
    #[serde(default)]
    pub ship_it: bool,
    #[serde(default)]
    pub public: bool,
    pub timestamp: String,
    #[serde(default)]
    pub links: Links,
}

impl TryFrom<ReviewPayload> for ReviewEvent {
    type Error = anyhow::Error;

    fn try_from(p: ReviewPayload) -> Result<Self> {
        Ok(ReviewEvent {
            id: p.id,
            user: p.links.user.and_then(|l| l.title).unwrap_or_default(),
            timestamp: parse_timestamp(&p.timestamp)?,
            public: p.public,
            ship_it: p.ship_it,
        })
    }
}
