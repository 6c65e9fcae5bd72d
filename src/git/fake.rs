//! Scripted `LocalVcs` for command tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use super::{GitError, LocalVcs, RefSpec};

#[derive(Default)]
pub struct FakeVcs {
    diffs: BTreeMap<String, Vec<u8>>,
    url: String,
    blobs: HashMap<String, String>, // path at the reference tip -> blob id
    dirty: bool,
    calls: RefCell<Vec<String>>,
}

impl FakeVcs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_diff(mut self, path: &str, patch: impl AsRef<[u8]>) -> Self {
        self.diffs.insert(path.to_string(), patch.as_ref().to_vec());
        self
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    pub fn with_blob(mut self, path: &str, id: &str) -> Self {
        self.blobs.insert(path.to_string(), id.to_string());
        self
    }

    pub fn dirty(mut self) -> Self {
        self.dirty = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl LocalVcs for FakeVcs {
    fn sync_and_diff(
        &self,
        branch: &str,
        _reference: &RefSpec,
    ) -> Result<BTreeMap<String, Vec<u8>>, GitError> {
        self.calls.borrow_mut().push(format!("sync_and_diff {}", branch));
        if self.dirty {
            return Err(GitError::Dirty("/fake".into()));
        }
        Ok(self.diffs.clone())
    }

    fn remote_url(&self, remote: &str) -> Result<String, GitError> {
        self.calls.borrow_mut().push(format!("remote_url {}", remote));
        Ok(self.url.clone())
    }

    fn blob_id(&self, _reference: &RefSpec, path: &str) -> Result<Option<String>, GitError> {
        self.calls.borrow_mut().push(format!("blob_id {}", path));
        Ok(self.blobs.get(path).cloned())
    }
}
