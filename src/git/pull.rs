//! Pull with rebase semantics.

use crate::error::Result;
use crate::git::GitOps;
use git2::build::CheckoutBuilder;
use git2::{AnnotatedCommit, ErrorCode, Rebase, RebaseOptions, Signature};

/// What a pull did to the local branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// The branch already contained the upstream history.
    UpToDate,
    /// The branch was moved forward to the upstream commit.
    FastForward,
    /// Local commits were replayed on top of upstream.
    Rebased { replayed: usize },
}

/// The commit a working copy's HEAD points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    pub id: String,
    /// Commit message without its trailing newline.
    pub message: String,
    pub author: String,
}

/// Pull operations for GitOps.
pub trait PullOps {
    /// Fetch the current branch's upstream and bring the branch up to date
    /// with it, rebasing local commits instead of merging.
    ///
    /// A conflicting rebase is aborted, leaving the working copy untouched.
    fn pull_rebase(&self) -> Result<PullOutcome>;

    /// Summarize the commit HEAD points at.
    fn head_commit(&self) -> Result<CommitSummary>;
}

impl PullOps for GitOps {
    fn pull_rebase(&self) -> Result<PullOutcome> {
        let head = self.repo.head()?;
        if !head.is_branch() {
            return Err(git2::Error::from_str("HEAD is detached, not on a branch").into());
        }
        let refname = head
            .name()
            .ok_or_else(|| git2::Error::from_str("branch name is not valid UTF-8"))?
            .to_string();

        let remote_name = self.repo.branch_upstream_remote(&refname).map_err(|e| {
            if e.code() == ErrorCode::NotFound {
                git2::Error::from_str(&format!("branch '{}' has no upstream", refname))
            } else {
                e
            }
        })?;
        let remote_name = remote_name
            .as_str()
            .ok_or_else(|| git2::Error::from_str("remote name is not valid UTF-8"))?;

        let mut remote = self.repo.find_remote(remote_name)?;
        let mut fetch_options = self.auth.fetch_options();
        tracing::debug!(remote = remote_name, branch = %refname, "fetching upstream");
        remote.fetch(&[] as &[&str], Some(&mut fetch_options), None)?;

        let upstream_name = self.repo.branch_upstream_name(&refname)?;
        let upstream_name = upstream_name
            .as_str()
            .ok_or_else(|| git2::Error::from_str("upstream name is not valid UTF-8"))?;
        let upstream_ref = self.repo.find_reference(upstream_name)?;
        let upstream = self.repo.reference_to_annotated_commit(&upstream_ref)?;

        let (analysis, _) = self.repo.merge_analysis(&[&upstream])?;
        if analysis.is_up_to_date() {
            return Ok(PullOutcome::UpToDate);
        }
        if analysis.is_fast_forward() {
            self.fast_forward(&refname, &upstream)?;
            return Ok(PullOutcome::FastForward);
        }

        let local = self.repo.reference_to_annotated_commit(&head)?;
        let replayed = self.rebase_onto(&local, &upstream)?;
        Ok(PullOutcome::Rebased { replayed })
    }

    fn head_commit(&self) -> Result<CommitSummary> {
        let commit = self.repo.head()?.peel_to_commit()?;
        let message = String::from_utf8_lossy(commit.message_bytes());
        let message = message.strip_suffix('\n').unwrap_or(&message).to_string();
        let author = String::from_utf8_lossy(commit.author().name_bytes()).into_owned();

        Ok(CommitSummary {
            id: commit.id().to_string(),
            message,
            author,
        })
    }
}

impl GitOps {
    fn fast_forward(&self, refname: &str, target: &AnnotatedCommit<'_>) -> Result<()> {
        let commit = self.repo.find_commit(target.id())?;
        // Update the worktree first so local edits abort the pull instead of
        // being overwritten.
        self.repo
            .checkout_tree(commit.as_object(), Some(CheckoutBuilder::new().safe()))?;

        let mut reference = self.repo.find_reference(refname)?;
        reference.set_target(target.id(), "pull: fast-forward")?;
        Ok(())
    }

    fn rebase_onto(
        &self,
        local: &AnnotatedCommit<'_>,
        upstream: &AnnotatedCommit<'_>,
    ) -> Result<usize> {
        let committer = self.signature()?;
        let mut options = RebaseOptions::new();
        let mut rebase = self
            .repo
            .rebase(Some(local), Some(upstream), None, Some(&mut options))?;

        match self.replay(&mut rebase, &committer) {
            Ok(replayed) => {
                rebase.finish(Some(&committer))?;
                Ok(replayed)
            }
            Err(e) => {
                if let Err(abort) = rebase.abort() {
                    tracing::warn!("failed to abort rebase: {}", abort);
                }
                Err(e)
            }
        }
    }

    fn replay(&self, rebase: &mut Rebase<'_>, committer: &Signature<'_>) -> Result<usize> {
        let mut replayed = 0;

        while let Some(operation) = rebase.next() {
            operation?;
            if self.repo.index()?.has_conflicts() {
                return Err(git2::Error::from_str(
                    "local commits conflict with upstream, rebase aborted",
                )
                .into());
            }

            match rebase.commit(None, committer, None) {
                Ok(_) => replayed += 1,
                // Already contained upstream.
                Err(e) if e.code() == ErrorCode::Applied => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(replayed)
    }

    fn signature(&self) -> Result<Signature<'static>> {
        self.repo.signature().or_else(|_| {
            // Fallback signature for unattended runs
            Signature::now("org-mirror", "org-mirror@localhost").map_err(|e| e.into())
        })
    }
}
