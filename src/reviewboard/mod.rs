pub mod approvals;
pub mod client;
pub mod diffs;
pub mod finder;
pub mod locate;
pub mod server;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use approvals::{count_approvals, fetch_approvals};
pub use client::{create_client, RbClient};
pub use diffs::{latest_diff, latest_revision, revision_files};
pub use finder::{find_reviews, pending_reviews, PendingFilter, PendingReviews, StatusFilter};
pub use locate::{find_repository, RepositoryMatch};
pub use server::{ReviewServer, MAX_PAGES};
pub use types::{
    DiffRevision, FileDiff, LatestDiff, Repository, ReviewEvent, ReviewRequest, ReviewStatus,
};
