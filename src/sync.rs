//! Clone-or-update driver over an organization's repositories.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::SyncConfig;
use crate::error::{MirrorError, Result};
use crate::git::{CommitSummary, GitOps, PullOps, PullOutcome};
use crate::github::RepositoryDescriptor;
use crate::logging::format_error;

/// What happened to a single repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No working copy existed; a fresh clone was made.
    Cloned { path: PathBuf },
    /// An existing working copy was pulled.
    Updated {
        path: PathBuf,
        pull: PullOutcome,
        head: CommitSummary,
    },
}

impl SyncOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Cloned { path } | Self::Updated { path, .. } => path,
        }
    }

    pub fn is_clone(&self) -> bool {
        matches!(self, Self::Cloned { .. })
    }
}

/// Per-repository results of a run, in processing order.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub results: Vec<(String, Result<SyncOutcome>)>,
}

impl SyncReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    /// Outcome recorded for `name`, if it was processed.
    pub fn get(&self, name: &str) -> Option<&Result<SyncOutcome>> {
        self.results
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| r)
    }
}

/// Mirrors repositories into the configured destination, one at a time.
pub struct SyncDriver<'a> {
    config: &'a SyncConfig,
}

impl<'a> SyncDriver<'a> {
    pub fn new(config: &'a SyncConfig) -> Self {
        Self { config }
    }

    /// Sync every repository in order, writing progress lines to `out`.
    ///
    /// A clone or update failure is printed and recorded, and the run moves
    /// on; under fail-fast it is returned instead and nothing after it is
    /// processed. Any other error aborts the run.
    pub fn run<W: Write>(
        &self,
        repos: &[RepositoryDescriptor],
        out: &mut W,
    ) -> Result<SyncReport> {
        fs::create_dir_all(self.config.destination())?;
        writeln!(out, "Found {} repositories. Updating now...", repos.len())?;

        let mut report = SyncReport::default();
        for repo in repos {
            match self.sync(repo, out) {
                Ok(outcome) => report.results.push((repo.name.clone(), Ok(outcome))),
                Err(e) if e.is_repository_error() => {
                    if self.config.is_fail_fast() {
                        return Err(e);
                    }
                    tracing::debug!(repo = %repo.name, error = %e, "continuing after failure");
                    writeln!(out, "{}", format_error(&e))?;
                    report.results.push((repo.name.clone(), Err(e)));
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "sync finished"
        );
        Ok(report)
    }

    /// Clone `repo` if it has no working copy yet, otherwise pull it.
    pub fn sync<W: Write>(
        &self,
        repo: &RepositoryDescriptor,
        out: &mut W,
    ) -> Result<SyncOutcome> {
        let path = self.config.destination().join(&repo.name);

        if path.is_dir() {
            writeln!(out, "{} already there, updating...", repo.name)?;
            let (pull, head) = self
                .update(&path)
                .map_err(|e| MirrorError::pull_failed(&repo.name, describe(e)))?;
            tracing::info!(repo = %repo.name, ?pull, "updated");
            writeln!(
                out,
                "Latest commit for {} -> {} (by {})",
                repo.name, head.message, head.author
            )?;
            Ok(SyncOutcome::Updated { path, pull, head })
        } else {
            writeln!(out, "{} not present, cloning...", repo.name)?;
            GitOps::clone(&repo.clone_url, &path, self.config.auth().clone())
                .map_err(|e| MirrorError::clone_failed(&repo.name, describe(e)))?;
            tracing::info!(repo = %repo.name, path = %path.display(), "cloned");
            Ok(SyncOutcome::Cloned { path })
        }
    }

    fn update(&self, path: &Path) -> Result<(PullOutcome, CommitSummary)> {
        let git = GitOps::open(path)?.with_auth(self.config.auth().clone());
        let pull = git.pull_rebase()?;
        let head = git.head_commit()?;
        Ok((pull, head))
    }
}

/// libgit2 messages already say what went wrong; drop the variant prefix.
fn describe(err: MirrorError) -> String {
    match err {
        MirrorError::Git(e) => e.message().to_string(),
        other => other.to_string(),
    }
}
