use std::io::Write;

use super::{find_single_review, CommandError};
use crate::reviewboard::ReviewServer;

#[derive(Debug, Clone)]
pub struct SubmitOptions {
    pub repo: String,
    pub branch: String,
    /// Close description
    pub message: Option<String>,
}

/// Mark the single open review for a repository and branch as submitted.
pub async fn run(
    server: &dyn ReviewServer,
    options: &SubmitOptions,
    out: &mut dyn Write,
) -> Result<u64, CommandError> {
    let (_, review) = find_single_review(server, &options.repo, &options.branch).await?;
    writeln!(out, "Found review {}", review.id)?;

    writeln!(out, "Submitting review {}", review.id)?;
    server
        .close_review_request(review.id, options.message.as_deref())
        .await?;
    Ok(review.id)
}
