use std::io::Write;
use tracing::debug;

use super::CommandError;
use crate::git::{GitError, LocalVcs, RefSpec};
use crate::output::{labelled, Label};
use crate::reviewboard::{
    find_repository, find_reviews, latest_revision, revision_files, FileDiff, RepositoryMatch,
    ReviewServer, StatusFilter,
};

#[derive(Debug, Clone)]
pub struct FindMergedOptions {
    pub reference: RefSpec,
    /// Also accept repositories whose path is a suffix of the remote URL
    pub match_path_end: bool,
    pub use_colors: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindMergedReport {
    pub open_reviews: usize,
    /// Reviews with no diff uploaded
    pub skipped: Vec<u64>,
    pub merged: Vec<u64>,
}

/// Whether every file of a diff is present and unchanged at the reference
/// tip. An empty file list never counts as merged.
pub fn is_merged(
    vcs: &dyn LocalVcs,
    reference: &RefSpec,
    files: &[FileDiff],
) -> Result<bool, GitError> {
    if files.is_empty() {
        return Ok(false);
    }
    for file in files {
        if file.is_deleted() {
            if let Some(blob) = vcs.blob_id(reference, &file.source_file)? {
                debug!(file = %file.source_file, %blob, "deleted file still in tree");
                return Ok(false);
            }
            continue;
        }
        match vcs.blob_id(reference, &file.dest_file)? {
            Some(blob) if !file.dest_detail.is_empty() && blob.starts_with(&file.dest_detail) => {
                debug!(file = %file.dest_file, %blob, "file matches reference tip");
            }
            Some(blob) => {
                debug!(file = %file.dest_file, %blob, expected = %file.dest_detail, "blob differs");
                return Ok(false);
            }
            None => {
                debug!(file = %file.dest_file, "not in git tree");
                return Ok(false);
            }
        }
    }
    Ok(true)
}

/// Report open reviews whose latest diff is already contained in the
/// reference branch.
pub async fn run(
    server: &dyn ReviewServer,
    vcs: &dyn LocalVcs,
    options: &FindMergedOptions,
    out: &mut dyn Write,
) -> Result<FindMergedReport, CommandError> {
    let remote_url = vcs.remote_url(&options.reference.remote)?;
    debug!(remote = %options.reference.remote, url = %remote_url, "resolved remote");

    let target = RepositoryMatch::Url {
        url: remote_url.clone(),
        match_path_end: options.match_path_end,
    };
    let repo = find_repository(server, &target)
        .await?
        .ok_or_else(|| CommandError::RepositoryNotFound(format!("with uri '{}'", remote_url)))?;

    let reviews = find_reviews(server, repo.id, None, StatusFilter::Open).await?;
    let mut report = FindMergedReport {
        open_reviews: reviews.len(),
        ..Default::default()
    };
    if reviews.is_empty() {
        writeln!(out, "No open reviews found for repository {}", remote_url)?;
        return Ok(report);
    }

    for review in &reviews {
        debug!(id = review.id, "checking review");
        let Some(revision) = latest_revision(server, review.id).await? else {
            debug!(id = review.id, "no diff uploaded, skipping");
            report.skipped.push(review.id);
            continue;
        };

        let files = revision_files(server, review.id, revision.revision).await?;
        if is_merged(vcs, &options.reference, &files)? {
            let message = format!(
                "Review {} appears to be merged to {} but not submitted.",
                review.id, options.reference
            );
            writeln!(out, "{}", labelled(Label::Merged, &message, options.use_colors))?;
            report.merged.push(review.id);
        } else {
            debug!(id = review.id, "review does NOT appear to be merged yet");
        }
    }

    writeln!(
        out,
        "Checked {} open review(s) in {}, {} appear merged but not submitted.",
        report.open_reviews,
        repo.name,
        report.merged.len()
    )?;
    Ok(report)
}
