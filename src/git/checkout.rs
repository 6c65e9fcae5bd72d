use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{Command, Output};
use tracing::{debug, Level};

use super::{GitError, LocalVcs, RefSpec};

/// A local git working copy, driven through the `git` command line
#[derive(Debug, Clone)]
pub struct GitCheckout {
    path: PathBuf,
}

impl GitCheckout {
    /// Open the checkout at `path`, refusing bare repositories
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, GitError> {
        let checkout = Self { path: path.into() };
        let bare = checkout
            .run(&["rev-parse", "--is-bare-repository"])
            .map_err(|e| match e {
                GitError::CommandFailed { .. } => GitError::NotARepository(checkout.path.clone()),
                other => other,
            })?;
        if bare.trim() == "true" {
            return Err(GitError::Bare(checkout.path));
        }
        Ok(checkout)
    }

    fn output(&self, args: &[&str]) -> Result<Output, GitError> {
        debug!(path = %self.path.display(), "running command: git {}", args.join(" "));
        Command::new("git")
            .arg("-C")
            .arg(&self.path)
            .args(["-c", "core.quotepath=off"])
            .args(args)
            .output()
            .map_err(GitError::Spawn)
    }

    /// Run git and return stdout untouched, failing on a non-zero exit
    fn run_bytes(&self, args: &[&str]) -> Result<Vec<u8>, GitError> {
        let output = self.output(args)?;
        if !output.status.success() {
            return Err(GitError::CommandFailed {
                command: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        debug!("received output with length {}", output.stdout.len());
        Ok(output.stdout)
    }

    /// Like `run_bytes`, for output that is only read as text
    fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let stdout = self.run_bytes(args)?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    /// Run a `--verify --quiet` style query where a non-zero exit means "no"
    fn query(&self, args: &[&str]) -> Result<Option<String>, GitError> {
        let output = self.output(args)?;
        if output.status.success() {
            Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()))
        } else {
            Ok(None)
        }
    }

    fn is_dirty(&self) -> Result<bool, GitError> {
        let status = self.run(&["status", "--porcelain", "--untracked-files=no"])?;
        Ok(!status.trim().is_empty())
    }

    fn ensure_remote(&self, remote: &str) -> Result<(), GitError> {
        let remotes = self.run(&["remote"])?;
        if remotes.lines().any(|r| r.trim() == remote) {
            Ok(())
        } else {
            Err(GitError::MissingRemote(remote.to_string()))
        }
    }

    fn ensure_remote_branch(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        let refname = format!("refs/remotes/{}/{}", remote, branch);
        match self.query(&["rev-parse", "--verify", "--quiet", &refname])? {
            Some(_) => Ok(()),
            None => Err(GitError::MissingBranch {
                remote: remote.to_string(),
                branch: branch.to_string(),
            }),
        }
    }

    fn trace_head(&self, step: &str) {
        if tracing::enabled!(Level::DEBUG) {
            if let Ok(Some(head)) = self.query(&["rev-parse", "HEAD"]) {
                debug!("{}, head is at {}", step, head);
            }
        }
    }
}

impl LocalVcs for GitCheckout {
    fn sync_and_diff(
        &self,
        branch: &str,
        reference: &RefSpec,
    ) -> Result<BTreeMap<String, Vec<u8>>, GitError> {
        if self.is_dirty()? {
            return Err(GitError::Dirty(self.path.clone()));
        }

        self.ensure_remote(&reference.remote)?;
        debug!("fetching remote repo {}", reference.remote);
        self.run(&["fetch", "-q", &reference.remote])?;
        self.ensure_remote_branch(&reference.remote, branch)?;
        self.ensure_remote_branch(&reference.remote, &reference.branch)?;

        self.trace_head("before checkout of reference branch");
        self.run(&["checkout", "-q", &reference.branch])?;
        self.trace_head("checked out reference branch");
        self.run(&["pull", "-q", &reference.remote, &reference.branch])?;
        self.trace_head("pulled");
        self.run(&["checkout", "-q", branch])?;
        self.trace_head("checked out local branch");

        let reference = reference.to_string();
        let names = self.run(&["diff", "--no-color", "--name-only", &reference])?;

        let mut diffs = BTreeMap::new();
        for name in names.lines().map(str::trim).filter(|n| !n.is_empty()) {
            let patch =
                self.run_bytes(&["diff", "--no-color", "--full-index", &reference, "--", name])?;
            diffs.insert(name.to_string(), patch);
        }
        Ok(diffs)
    }

    fn remote_url(&self, remote: &str) -> Result<String, GitError> {
        self.ensure_remote(remote)?;
        self.run(&["fetch", "-q", remote])?;
        let url = self.run(&["remote", "get-url", remote])?;
        let url = url.trim().to_string();
        debug!("remote uri is {}", url);
        Ok(url)
    }

    fn blob_id(&self, reference: &RefSpec, path: &str) -> Result<Option<String>, GitError> {
        let spec = format!("{}:{}", reference, path);
        self.query(&["rev-parse", "--verify", "--quiet", &spec])
    }
}
