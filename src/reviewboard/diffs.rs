use anyhow::Result;
use std::collections::BTreeMap;
use tracing::debug;

use crate::reviewboard::server::{collect_all, ReviewServer};
use crate::reviewboard::types::{DiffRevision, FileDiff, LatestDiff};

/// The latest diff revision of a review request.
///
/// Revisions are numbered 1..N with N the total count, so the latest is the
/// one numbered N wherever it appears in the listing. `None` when the review
/// has no diffs or no revision carries that number.
pub async fn latest_revision(
    server: &dyn ReviewServer,
    review_request: u64,
) -> Result<Option<DiffRevision>> {
    let listing = collect_all(|cursor| server.diff_revisions(review_request, cursor)).await?;
    let count = listing.total_results;
    if count == 0 {
        return Ok(None);
    }

    let latest = listing
        .items
        .into_iter()
        .find(|diff| diff.revision as usize == count);
    if let Some(diff) = &latest {
        debug!(
            review_request,
            count,
            revision = diff.revision,
            "found diffs, using the last one"
        );
    }
    Ok(latest)
}

/// Every file entry of one diff revision
pub async fn revision_files(
    server: &dyn ReviewServer,
    review_request: u64,
    revision: u32,
) -> Result<Vec<FileDiff>> {
    let listing =
        collect_all(|cursor| server.diff_files(review_request, revision, cursor)).await?;
    Ok(listing.items)
}

/// The latest diff of a review with every file's patch, keyed by destination path
pub async fn latest_diff(
    server: &dyn ReviewServer,
    review_request: u64,
) -> Result<Option<LatestDiff>> {
    let Some(revision) = latest_revision(server, review_request).await? else {
        return Ok(None);
    };

    let files = revision_files(server, review_request, revision.revision).await?;
    let mut patches = BTreeMap::new();
    for file in &files {
        let patch = server
            .file_patch(review_request, revision.revision, file.id)
            .await?;
        patches.insert(file.dest_file.clone(), patch);
    }

    Ok(Some(LatestDiff {
        revision: revision.revision,
        timestamp: revision.timestamp,
        files,
        patches,
    }))
}
