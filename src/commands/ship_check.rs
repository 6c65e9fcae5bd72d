use std::io::Write;
use tracing::debug;

use super::{find_single_review, CommandError};
use crate::compare::compare_diff_sets;
use crate::git::{LocalVcs, RefSpec};
use crate::reviewboard::{fetch_approvals, latest_diff, ReviewServer};

#[derive(Debug, Clone)]
pub struct ShipCheckOptions {
    pub repo: String,
    pub branch: String,
    /// Ship-its required since the latest diff upload
    pub ship_its: usize,
    pub reference: RefSpec,
}

/// What a passing check found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipReport {
    pub review_id: u64,
    pub approvers: Vec<String>,
}

impl ShipReport {
    pub fn summary(&self) -> String {
        format!(
            "Since last diff upload, shipped by: {}",
            self.approvers.join(", ")
        )
    }
}

/// Check that the one open review for a branch matches the local diff and
/// has enough ship-its since its latest diff was uploaded.
///
/// Note that this fetches and pulls in the local checkout and leaves the
/// branch checked out.
pub async fn run(
    server: &dyn ReviewServer,
    vcs: &dyn LocalVcs,
    options: &ShipCheckOptions,
    out: &mut dyn Write,
) -> Result<ShipReport, CommandError> {
    let (repo, review) = find_single_review(server, &options.repo, &options.branch).await?;
    writeln!(out, "Found review {}", review.id)?;

    let diff = latest_diff(server, review.id)
        .await?
        .ok_or(CommandError::NoDiff(review.id))?;
    debug!(
        revision = diff.revision,
        timestamp = %diff.timestamp,
        files = diff.patches.len(),
        "latest diff of review {} in {}",
        review.id,
        repo.name
    );

    let local = vcs.sync_and_diff(&options.branch, &options.reference)?;
    let mismatches = compare_diff_sets(&local, &diff.patches);
    if !mismatches.is_empty() {
        return Err(CommandError::DiffMismatch(mismatches));
    }

    let approvers = fetch_approvals(server, review.id, diff.timestamp).await?;
    if approvers.len() < options.ship_its {
        return Err(CommandError::NotShipped {
            found: approvers.len(),
            required: options.ship_its,
        });
    }

    Ok(ShipReport {
        review_id: review.id,
        approvers,
    })
}
