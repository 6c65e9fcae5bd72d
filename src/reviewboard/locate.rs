use anyhow::{bail, Result};
use tracing::debug;

use crate::reviewboard::server::{ReviewServer, MAX_PAGES};
use crate::reviewboard::types::Repository;

/// How to recognise the wanted repository
#[derive(Debug, Clone)]
pub enum RepositoryMatch {
    /// Display name, compared case-insensitively
    Name(String),
    /// Clone URL, compared case-insensitively against the stored path and
    /// mirror path. With `match_path_end`, a stored path that is a suffix
    /// of the URL also matches (servers that store a shortened mirror path).
    Url { url: String, match_path_end: bool },
}

impl RepositoryMatch {
    pub fn matches(&self, repo: &Repository) -> bool {
        match self {
            RepositoryMatch::Name(name) => repo.name.to_lowercase() == name.to_lowercase(),
            RepositoryMatch::Url {
                url,
                match_path_end,
            } => {
                let url = url.to_lowercase();
                std::iter::once(repo.path.as_str())
                    .chain(repo.mirror_path.as_deref())
                    .filter(|p| !p.is_empty())
                    .map(str::to_lowercase)
                    .any(|p| p == url || (*match_path_end && url.ends_with(&p)))
            }
        }
    }
}

/// Find a repository by paging through the full listing.
///
/// Stops at the first match; returns `Ok(None)` once the listing is
/// exhausted without one.
pub async fn find_repository(
    server: &dyn ReviewServer,
    wanted: &RepositoryMatch,
) -> Result<Option<Repository>> {
    let mut cursor = None;
    let mut seen = 0;

    for _ in 0..MAX_PAGES {
        let page = server.repositories(cursor.take()).await?;
        for repo in page.items {
            seen += 1;
            if wanted.matches(&repo) {
                debug!(id = repo.id, name = %repo.name, "found matching repository");
                return Ok(Some(repo));
            }
        }
        match page.next {
            Some(next) => cursor = Some(next),
            None => {
                debug!(seen, "iterated through repositories without a match");
                return Ok(None);
            }
        }
    }

    bail!("Repository listing did not end after {} pages", MAX_PAGES)
}
