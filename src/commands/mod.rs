pub mod find_merged;
pub mod list_mine;
pub mod ship_check;
pub mod submit;
pub mod submit_all;

use tracing::debug;

use crate::compare::Mismatch;
use crate::git::{GitError, RefSpec};
use crate::output::{labelled, Label};
use crate::reviewboard::{
    find_repository, find_reviews, Repository, RepositoryMatch, ReviewRequest, ReviewServer,
    StatusFilter,
};

// Exit codes. Automation branches on these, so they are stable.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_USAGE: i32 = 2;
pub const EXIT_REPOSITORY_NOT_FOUND: i32 = 3;
pub const EXIT_NO_OPEN_REVIEW: i32 = 4;
pub const EXIT_MULTIPLE_OPEN_REVIEWS: i32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Git(#[from] GitError),
    #[error("Could not find ReviewBoard repository {0}")]
    RepositoryNotFound(String),
    #[error("No open reviews found for branch {branch} in repo {repo}")]
    NoOpenReview { repo: String, branch: String },
    #[error("Multiple open reviews found for branch {branch} in repo {repo}: {}", format_ids(.ids))]
    MultipleOpenReviews {
        repo: String,
        branch: String,
        ids: Vec<u64>,
    },
    #[error("Review {0} has no diff uploaded")]
    NoDiff(u64),
    #[error("{} file(s) differ between git and reviewboard", .0.len())]
    DiffMismatch(Vec<Mismatch>),
    #[error("Only found {found} shipit(s) since last diff upload, {required} are required")]
    NotShipped { found: usize, required: usize },
    #[error("Could not write output")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CommandError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandError::Usage(_) => EXIT_USAGE,
            CommandError::Git(e) if e.is_precondition() => EXIT_USAGE,
            CommandError::RepositoryNotFound(_) => EXIT_REPOSITORY_NOT_FOUND,
            CommandError::NoOpenReview { .. } => EXIT_NO_OPEN_REVIEW,
            CommandError::MultipleOpenReviews { .. } => EXIT_MULTIPLE_OPEN_REVIEWS,
            _ => EXIT_FAILURE,
        }
    }
}

/// Parse a `remote/branch` reference. Callers do this before any network
/// or git call so a malformed value fails fast as a usage error.
pub fn reference_branch(spec: &str) -> Result<RefSpec, CommandError> {
    spec.parse::<RefSpec>()
        .map_err(|e| CommandError::Usage(e.to_string()))
}

/// Lines to print on stderr for a failed command. A diff mismatch gets one
/// line per differing file ahead of the summary.
pub fn render_error(error: &CommandError, use_colors: bool) -> Vec<String> {
    let mut lines = Vec::new();
    if let CommandError::DiffMismatch(mismatches) = error {
        for mismatch in mismatches {
            lines.push(labelled(Label::Error, &mismatch.to_string(), use_colors));
        }
    }
    lines.push(labelled(Label::Error, &error_chain(error), use_colors));
    lines
}

/// An error with its sources, the way anyhow's `{:#}` renders them
fn error_chain(error: &CommandError) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn format_ids(ids: &[u64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Look up a repository by name and the one open review tracking `branch`.
///
/// Zero or several matching reviews are errors with their own exit codes.
pub async fn find_single_review(
    server: &dyn ReviewServer,
    repo_name: &str,
    branch: &str,
) -> Result<(Repository, ReviewRequest), CommandError> {
    let repo = find_repository(server, &RepositoryMatch::Name(repo_name.to_string()))
        .await?
        .ok_or_else(|| CommandError::RepositoryNotFound(format!("with name '{}'", repo_name)))?;
    debug!(id = repo.id, "found repository with name matching {}", repo_name);

    let mut reviews = find_reviews(server, repo.id, Some(branch), StatusFilter::Open).await?;
    match reviews.len() {
        0 => Err(CommandError::NoOpenReview {
            repo: repo.name.clone(),
            branch: branch.to_string(),
        }),
        1 => {
            let review = reviews.remove(0);
            Ok((repo, review))
        }
        _ => Err(CommandError::MultipleOpenReviews {
            repo: repo.name.clone(),
            branch: branch.to_string(),
            ids: reviews.iter().map(|r| r.id).collect(),
        }),
    }
}
