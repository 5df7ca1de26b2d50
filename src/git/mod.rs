//! Git working copy operations: cloning and pull-with-rebase.
//!
//! # Example
//!
//! ```rust,no_run
//! use org_mirror::git::{GitAuth, GitOps, PullOps};
//!
//! let git = GitOps::open("./mirror/api")?.with_auth(GitAuth::default());
//! git.pull_rebase()?;
//!
//! let head = git.head_commit()?;
//! println!("{} (by {})", head.message, head.author);
//! # Ok::<(), org_mirror::error::MirrorError>(())
//! ```

mod auth;
mod pull;

pub use auth::GitAuth;
pub use pull::{CommitSummary, PullOps, PullOutcome};

use crate::error::Result;
use git2::Repository;
use git2::build::RepoBuilder;
use std::path::Path;

/// Git operations wrapper around a working copy.
pub struct GitOps {
    repo: Repository,
    auth: GitAuth,
}

impl GitOps {
    /// Open an existing working copy.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let repo = Repository::open(path.as_ref())?;
        Ok(Self {
            repo,
            auth: GitAuth::default(),
        })
    }

    /// Clone `url` into `path`, creating a full working copy.
    pub fn clone(url: &str, path: impl AsRef<Path>, auth: GitAuth) -> Result<Self> {
        let mut builder = RepoBuilder::new();
        builder.fetch_options(auth.fetch_options());

        let repo = builder.clone(url, path.as_ref())?;
        Ok(Self { repo, auth })
    }

    /// Set authentication method for remote operations.
    pub fn with_auth(mut self, auth: GitAuth) -> Self {
        self.auth = auth;
        self
    }
}
