use std::io::Write;
use tracing::info;

use super::CommandError;
use crate::reviewboard::{pending_reviews, PendingFilter, ReviewServer};

#[derive(Debug, Clone)]
pub struct SubmitAllOptions {
    pub user: String,
    /// List what would be closed without closing anything
    pub dry_run: bool,
}

/// Close every pending review posted by a user. Returns the ids closed, or
/// the ids that would be closed in a dry run.
pub async fn run(
    server: &dyn ReviewServer,
    options: &SubmitAllOptions,
    out: &mut dyn Write,
) -> Result<Vec<u64>, CommandError> {
    let filter = PendingFilter::FromUser(options.user.clone());
    let pending = pending_reviews(server, &filter, None).await?;
    writeln!(
        out,
        "Got {} pending/unsubmitted reviews {}",
        pending.reviews.len(),
        filter.describe()
    )?;

    let mut closed = Vec::with_capacity(pending.reviews.len());
    for review in &pending.reviews {
        writeln!(out, "Closing review {} ({})", review.id, review.summary)?;
        if !options.dry_run {
            server.close_review_request(review.id, None).await?;
            info!(id = review.id, "closed review");
        }
        closed.push(review.id);
    }

    if options.dry_run {
        writeln!(
            out,
            "Dry run, would submit {} pending/unsubmitted reviews {}",
            closed.len(),
            filter.describe()
        )?;
    } else {
        writeln!(
            out,
            "Submitted {} pending/unsubmitted reviews {}",
            closed.len(),
            filter.describe()
        )?;
    }
    Ok(closed)
}
