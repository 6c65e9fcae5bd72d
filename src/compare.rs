use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// One way a local diff set disagrees with the server's
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    OnlyInGit(String),
    OnlyInReviewBoard(String),
    ContentDiffers(String),
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::OnlyInGit(path) => write!(
                f,
                "file '{}' found in git diff but not reviewboard diff.",
                path
            ),
            Mismatch::OnlyInReviewBoard(path) => write!(
                f,
                "file '{}' found in reviewboard diff but not git diff.",
                path
            ),
            Mismatch::ContentDiffers(path) => {
                write!(f, "git and reviewboard diffs not same for file '{}'", path)
            }
        }
    }
}

/// Exact byte comparison of two patches. Whitespace, line endings, hunk
/// headers and encoding all count.
pub fn equivalent(local: &[u8], remote: &[u8]) -> bool {
    local == remote
}

/// Every mismatch between the local and server diff sets, local paths first
pub fn compare_diff_sets(
    local: &BTreeMap<String, Vec<u8>>,
    remote: &BTreeMap<String, Vec<u8>>,
) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();

    for (path, local_patch) in local {
        match remote.get(path) {
            None => mismatches.push(Mismatch::OnlyInGit(path.clone())),
            Some(remote_patch) if !equivalent(local_patch, remote_patch) => {
                debug!(
                    "#### git diff of {} ####\n{}",
                    path,
                    String::from_utf8_lossy(local_patch)
                );
                debug!(
                    "#### reviewboard diff of {} ####\n{}",
                    path,
                    String::from_utf8_lossy(remote_patch)
                );
                mismatches.push(Mismatch::ContentDiffers(path.clone()));
            }
            Some(_) => {}
        }
    }

    mismatches.extend(
        remote
            .keys()
            .filter(|path| !local.contains_key(*path))
            .map(|path| Mismatch::OnlyInReviewBoard(path.clone())),
    );

    mismatches
}
