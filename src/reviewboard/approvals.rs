use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::reviewboard::server::{collect_all, ReviewServer};
use crate::reviewboard::types::ReviewEvent;

/// Approvers that count toward shipping, as `"user (review id)"`.
///
/// A review counts only if it is a ship-it, public, and strictly newer than
/// `since` (the upload time of the latest diff).
pub fn count_approvals(events: &[ReviewEvent], since: DateTime<Utc>) -> Vec<String> {
    events
        .iter()
        .filter(|event| {
            if !event.ship_it {
                return false;
            }
            if event.timestamp <= since {
                debug!(
                    id = event.id,
                    timestamp = %event.timestamp,
                    %since,
                    "skipping review, not after last diff upload"
                );
                return false;
            }
            event.public
        })
        .map(|event| {
            debug!(id = event.id, user = %event.user, "found ship-it since last diff");
            format!("{} ({})", event.user, event.id)
        })
        .collect()
}

/// Fetch every review on a review request and count the qualifying ship-its
pub async fn fetch_approvals(
    server: &dyn ReviewServer,
    review_request: u64,
    since: DateTime<Utc>,
) -> Result<Vec<String>> {
    let listing = collect_all(|cursor| server.reviews(review_request, cursor)).await?;
    Ok(count_approvals(&listing.items, since))
}
