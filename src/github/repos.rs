//! GitHub repository listing.

use std::collections::HashSet;

use serde::Deserialize;

use crate::error::{MirrorError, Result};
use crate::github::GitHubClient;

/// Page size used when walking an organization's repositories.
pub const PAGE_SIZE: u32 = 100;

/// Repository information from GitHub API.
///
/// Only the fields mirroring needs are kept; the rest of the record is
/// ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRepo {
    pub name: String,
    pub ssh_url: String,
}

/// One page of an organization's repository collection.
#[derive(Debug, Clone, Default)]
pub struct RepoPage {
    pub repos: Vec<GitHubRepo>,
    /// Cursor of the following page, `None` on the last one.
    pub next: Option<u32>,
}

/// A repository to mirror: its name and the URL to clone it from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryDescriptor {
    pub name: String,
    pub clone_url: String,
}

impl RepositoryDescriptor {
    pub fn new(name: impl Into<String>, clone_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            clone_url: clone_url.into(),
        }
    }

    /// Build a descriptor from an API record, applying the SSH host override.
    pub fn from_repo(repo: GitHubRepo, host_override: Option<&str>) -> Self {
        let clone_url = match host_override {
            Some(host) => rewrite_host(&repo.ssh_url, host),
            None => repo.ssh_url,
        };
        Self {
            name: repo.name,
            clone_url,
        }
    }
}

/// Replace every literal `github.com` in `url` with `host`.
///
/// An empty `host` leaves the URL untouched.
pub fn rewrite_host(url: &str, host: &str) -> String {
    if host.is_empty() {
        url.to_string()
    } else {
        url.replace("github.com", host)
    }
}

/// Source of paginated organization repository listings.
pub trait RepoSource {
    /// Fetch page `page` (1-based) of the organization's repositories.
    fn org_repos_page(&self, org: &str, page: u32) -> Result<RepoPage>;
}

impl RepoSource for GitHubClient {
    fn org_repos_page(&self, org: &str, page: u32) -> Result<RepoPage> {
        let endpoint = format!(
            "/orgs/{}/repos?per_page={}&page={}&type=all",
            org, PAGE_SIZE, page
        );
        let (repos, next) = self.get_paged(&endpoint)?;
        Ok(RepoPage { repos, next })
    }
}

/// List every repository of `org`, following the next-page cursor until
/// the collection is exhausted.
///
/// Any failing page aborts the whole listing with [`MirrorError::List`].
pub fn list_repositories<S: RepoSource + ?Sized>(
    source: &S,
    org: &str,
    host_override: Option<&str>,
) -> Result<Vec<RepositoryDescriptor>> {
    let list_error = |message: String| MirrorError::List {
        org: org.to_string(),
        message,
    };

    let mut seen = HashSet::new();
    let mut descriptors = Vec::new();
    let mut page = 1;

    loop {
        let RepoPage { repos, next } = source
            .org_repos_page(org, page)
            .map_err(|e| list_error(e.to_string()))?;
        tracing::debug!(org, page, count = repos.len(), "fetched repository page");

        for repo in repos {
            if !seen.insert(repo.name.clone()) {
                tracing::debug!(name = %repo.name, "skipping repository listed twice");
                continue;
            }
            descriptors.push(RepositoryDescriptor::from_repo(repo, host_override));
        }

        match next {
            Some(next) if next > page => page = next,
            Some(next) => {
                return Err(list_error(format!(
                    "pagination cursor did not advance (page {} -> {})",
                    page, next
                )));
            }
            None => break,
        }
    }

    Ok(descriptors)
}
