//! # org-mirror
//!
//! Mirror every repository of a GitHub organization into a local directory:
//! clone what is missing, pull (with rebase) what is already there.
//!
//! The work happens in two steps:
//! - [`github::list_repositories`] walks the organization's repository
//!   collection page by page and yields one [`RepositoryDescriptor`] per
//!   repository, optionally routing SSH URLs through a host alias
//! - [`SyncDriver`] visits each descriptor in turn and clones or updates
//!   `destination/<name>`, continuing past failures unless told to fail fast
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use org_mirror::prelude::*;
//!
//! let config = SyncConfig::new("ghp_your_token_here", "my-org", "./mirror")
//!     .with_host_override("github-work");
//! config.validate()?;
//!
//! let client = GitHubClient::with_enterprise(config.token(), config.api_url());
//! let repos = list_repositories(&client, config.organization(), config.host_override())?;
//!
//! let report = SyncDriver::new(&config).run(&repos, &mut std::io::stdout())?;
//! println!("{} synced, {} failed", report.succeeded(), report.failed());
//! # Ok::<(), org_mirror::error::MirrorError>(())
//! ```

pub mod config;
pub mod error;
pub mod git;
pub mod github;
pub mod logging;
pub mod sync;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::SyncConfig;
    pub use crate::error::{MirrorError, Result};
    pub use crate::git::{CommitSummary, GitAuth, GitOps, PullOps, PullOutcome};
    pub use crate::github::{
        GitHubClient, GitHubRepo, RepoPage, RepoSource, RepositoryDescriptor, list_repositories,
    };
    pub use crate::sync::{SyncDriver, SyncOutcome, SyncReport};
}

pub use prelude::*;
