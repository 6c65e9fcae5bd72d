use anyhow::Result;
use tracing::debug;

use crate::reviewboard::server::{collect_all, ReviewServer};
use crate::reviewboard::types::{ReviewRequest, ReviewRequestQuery, ReviewStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    /// Pending review requests only
    Open,
    Any,
}

/// Review requests of a repository, optionally narrowed to one branch.
///
/// The listing cannot filter by branch server-side, so the whole result set
/// is collected before filtering.
pub async fn find_reviews(
    server: &dyn ReviewServer,
    repository_id: u64,
    branch: Option<&str>,
    status: StatusFilter,
) -> Result<Vec<ReviewRequest>> {
    let query = ReviewRequestQuery {
        repository: Some(repository_id),
        status: match status {
            StatusFilter::Open => Some(ReviewStatus::Pending),
            StatusFilter::Any => None,
        },
        ..Default::default()
    };
    let listing = collect_all(|cursor| server.review_requests(&query, cursor)).await?;
    debug!(
        total = listing.total_results,
        repository_id, "listed review requests"
    );

    let reviews: Vec<ReviewRequest> = listing
        .items
        .into_iter()
        .filter(|r| status == StatusFilter::Any || r.status == ReviewStatus::Pending)
        .filter(|r| branch.map_or(true, |b| r.branch.to_lowercase() == b.to_lowercase()))
        .collect();

    if let Some(branch) = branch {
        for review in &reviews {
            debug!(id = review.id, branch, "found review for branch");
        }
    }
    Ok(reviews)
}

/// Whose pending reviews to list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingFilter {
    /// Targeting a user, directly or through one of their groups
    ToUser(String),
    ToGroup(String),
    /// Posted by a user
    FromUser(String),
}

impl PendingFilter {
    /// Short description for messages, e.g. `user 'alice'`
    pub fn describe(&self) -> String {
        match self {
            PendingFilter::ToUser(user) => format!("user '{}'", user),
            PendingFilter::ToGroup(group) => format!("group '{}'", group),
            PendingFilter::FromUser(user) => format!("posted by '{}'", user),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PendingReviews {
    /// Count reported by the server, which may exceed `reviews.len()` when capped
    pub total_results: usize,
    pub reviews: Vec<ReviewRequest>,
}

/// Pending review requests for a user or group.
///
/// With `max_results` only the first page is requested and the server caps
/// it; otherwise every page is collected.
pub async fn pending_reviews(
    server: &dyn ReviewServer,
    filter: &PendingFilter,
    max_results: Option<u32>,
) -> Result<PendingReviews> {
    let mut query = ReviewRequestQuery {
        status: Some(ReviewStatus::Pending),
        max_results,
        ..Default::default()
    };
    match filter {
        PendingFilter::ToUser(user) => query.to_users = Some(user.clone()),
        PendingFilter::ToGroup(group) => query.to_groups = Some(group.clone()),
        PendingFilter::FromUser(user) => query.from_user = Some(user.clone()),
    }

    match max_results {
        Some(limit) => {
            let page = server.review_requests(&query, None).await?;
            let mut reviews = page.items;
            reviews.truncate(limit as usize);
            Ok(PendingReviews {
                total_results: page.total_results,
                reviews,
            })
        }
        None => {
            let listing = collect_all(|cursor| server.review_requests(&query, cursor)).await?;
            Ok(PendingReviews {
                total_results: listing.total_results,
                reviews: listing.items,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reviewboard::fake::{review_request, FakeServer};

    fn server() -> FakeServer {
        let mut submitted = review_request(14, "feature-x", "carol");
        submitted.status = ReviewStatus::Submitted;
        FakeServer::new()
            .page_size(2)
            .with_review_request(1, review_request(10, "main", "alice"))
            .with_review_request(1, review_request(11, "feature-y", "bob"))
            .with_review_request(2, review_request(12, "feature-x", "bob"))
            .with_review_request(1, review_request(13, "hotfix", "alice"))
            .with_review_request(1, submitted)
            .with_review_request(1, review_request(15, "Release-1", "dave"))
    }

    #[tokio::test]
    async fn test_branch_match_on_last_page() {
        let reviews = find_reviews(&server(), 1, Some("release-1"), StatusFilter::Open)
            .await
            .unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].id, 15);
    }

    #[tokio::test]
    async fn test_branch_match_is_exact_not_prefix() {
        let reviews = find_reviews(&server(), 1, Some("feature"), StatusFilter::Open)
            .await
            .unwrap();
        assert!(reviews.is_empty());
    }

    #[tokio::test]
    async fn test_open_filter_excludes_submitted() {
        let reviews = find_reviews(&server(), 1, Some("feature-x"), StatusFilter::Open)
            .await
            .unwrap();
        assert!(reviews.is_empty());

        let reviews = find_reviews(&server(), 1, Some("feature-x"), StatusFilter::Any)
            .await
            .unwrap();
        assert_eq!(reviews.iter().map(|r| r.id).collect::<Vec<_>>(), vec![14]);
    }

    #[tokio::test]
    async fn test_no_branch_returns_all_of_repository_in_order() {
        let reviews = find_reviews(&server(), 1, None, StatusFilter::Open)
            .await
            .unwrap();
        assert_eq!(
            reviews.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![10, 11, 13, 15]
        );
    }

    #[tokio::test]
    async fn test_pending_reviews_capped() {
        let server = FakeServer::new()
            .page_size(50)
            .with_targeted_request(review_request(1, "a", "x"), &[], &["Ops"])
            .with_targeted_request(review_request(2, "b", "x"), &[], &["Ops"])
            .with_targeted_request(review_request(3, "c", "x"), &[], &["Ops"])
            .with_targeted_request(review_request(4, "d", "x"), &[], &["Dev"]);

        let pending = pending_reviews(&server, &PendingFilter::ToGroup("Ops".to_string()), Some(2))
            .await
            .unwrap();
        assert_eq!(pending.total_results, 3);
        assert_eq!(pending.reviews.len(), 2);
        assert_eq!(server.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_pending_reviews_uncapped_collects_all_pages() {
        let server = FakeServer::new()
            .page_size(1)
            .with_targeted_request(review_request(1, "a", "alice"), &[], &[])
            .with_targeted_request(review_request(2, "b", "bob"), &[], &[])
            .with_targeted_request(review_request(3, "c", "alice"), &[], &[]);

        let pending = pending_reviews(&server, &PendingFilter::FromUser("alice".to_string()), None)
            .await
            .unwrap();
        assert_eq!(pending.total_results, 2);
        assert_eq!(
            pending.reviews.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![1, 3]
        );
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            PendingFilter::ToGroup("Ops".to_string()).describe(),
            "group 'Ops'"
        );
    }
}
