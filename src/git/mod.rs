pub mod checkout;
#[cfg(test)]
pub(crate) mod fake;

pub use checkout::GitCheckout;

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("{0} is not a git checkout")]
    NotARepository(PathBuf),
    #[error("repo at {0} is bare")]
    Bare(PathBuf),
    #[error("Specified repository '{0}' is dirty, cannot run tests.")]
    Dirty(PathBuf),
    #[error("remote '{0}' does not exist")]
    MissingRemote(String),
    #[error("remote '{remote}' does not seem to have '{branch}' branch")]
    MissingBranch { remote: String, branch: String },
    #[error("master branch must be of the format '<remote name>/<branch name>', got '{0}'")]
    InvalidRefSpec(String),
    #[error("`git {command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },
    #[error("could not run git")]
    Spawn(#[source] std::io::Error),
}

impl GitError {
    /// Whether the checkout is unusable as given, as opposed to a git
    /// command failing midway
    pub fn is_precondition(&self) -> bool {
        !matches!(self, GitError::CommandFailed { .. } | GitError::Spawn(_))
    }
}

/// A remote-tracking branch, written `remote/branch`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefSpec {
    pub remote: String,
    pub branch: String,
}

impl FromStr for RefSpec {
    type Err = GitError;

    /// Split at the first `/`; the branch part may itself contain slashes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((remote, branch)) if !remote.is_empty() && !branch.is_empty() => Ok(RefSpec {
                remote: remote.to_string(),
                branch: branch.to_string(),
            }),
            _ => Err(GitError::InvalidRefSpec(s.to_string())),
        }
    }
}

impl fmt::Display for RefSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.remote, self.branch)
    }
}

/// Local working-copy operations the commands need
pub trait LocalVcs {
    /// Fetch and update the reference branch, check out `branch`, and diff
    /// every changed file against the reference tip. Patches are the raw
    /// bytes git printed. Mutates the checkout.
    fn sync_and_diff(
        &self,
        branch: &str,
        reference: &RefSpec,
    ) -> Result<BTreeMap<String, Vec<u8>>, GitError>;

    /// Fetch `remote` and return its URL
    fn remote_url(&self, remote: &str) -> Result<String, GitError>;

    /// Blob id of `path` at the reference tip, `None` if absent there
    fn blob_id(&self, reference: &RefSpec, path: &str) -> Result<Option<String>, GitError>;
}
