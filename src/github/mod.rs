//! GitHub API integration: listing an organization's repositories.
//!
//! # Example
//!
//! ```rust,no_run
//! use org_mirror::github::{GitHubClient, list_repositories};
//!
//! let client = GitHubClient::new("ghp_your_token_here");
//!
//! // Every repository of the organization, SSH URLs routed through an alias
//! let repos = list_repositories(&client, "my-org", Some("github-work"))?;
//!
//! for repo in repos {
//!     println!("{}: {}", repo.name, repo.clone_url);
//! }
//! # Ok::<(), org_mirror::error::MirrorError>(())
//! ```

mod client;
mod repos;

pub use client::{DEFAULT_API_URL, GitHubClient};
pub use repos::{
    GitHubRepo, PAGE_SIZE, RepoPage, RepoSource, RepositoryDescriptor, list_repositories,
    rewrite_host,
};
