//! Credentials for git remote operations.

use std::cell::Cell;
use std::fmt;
use std::path::PathBuf;

use git2::{Cred, CredentialType, FetchOptions, RemoteCallbacks};

/// Authentication method for clone and fetch.
#[derive(Clone, Default)]
pub enum GitAuth {
    /// Keys served by the running ssh-agent (default credentials for
    /// non-SSH transports).
    #[default]
    Agent,
    /// An explicit private key file.
    SshKey {
        private_key_path: PathBuf,
        passphrase: Option<String>,
    },
}

impl fmt::Debug for GitAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Agent => f.write_str("Agent"),
            Self::SshKey {
                private_key_path,
                passphrase,
            } => f
                .debug_struct("SshKey")
                .field("private_key_path", private_key_path)
                .field("passphrase", &passphrase.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}

impl GitAuth {
    /// Create SSH key auth with a specific key path.
    pub fn ssh_key(path: impl Into<PathBuf>) -> Self {
        Self::SshKey {
            private_key_path: path.into(),
            passphrase: None,
        }
    }

    /// Set passphrase for SSH key auth.
    pub fn with_passphrase(self, passphrase: impl Into<String>) -> Self {
        match self {
            Self::SshKey {
                private_key_path, ..
            } => Self::SshKey {
                private_key_path,
                passphrase: Some(passphrase.into()),
            },
            other => other,
        }
    }

    /// Remote callbacks offering these credentials and logging transfer
    /// progress.
    pub(crate) fn remote_callbacks(&self) -> RemoteCallbacks<'static> {
        let auth = self.clone();
        // libgit2 re-invokes the callback after every rejection.
        let attempts = Cell::new(0u32);

        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(move |_url, username_from_url, allowed_types| {
            attempts.set(attempts.get() + 1);
            if attempts.get() > 1 {
                return Err(git2::Error::from_str("credentials were rejected"));
            }

            let username = username_from_url.unwrap_or("git");
            match &auth {
                GitAuth::SshKey {
                    private_key_path,
                    passphrase,
                } => Cred::ssh_key(username, None, private_key_path, passphrase.as_deref()),
                GitAuth::Agent if allowed_types.contains(CredentialType::SSH_KEY) => {
                    Cred::ssh_key_from_agent(username)
                }
                GitAuth::Agent => Cred::default(),
            }
        });

        callbacks.transfer_progress(|stats| {
            if stats.total_objects() > 0 && stats.received_objects() == stats.total_objects() {
                tracing::debug!(
                    "Resolving deltas {}/{}",
                    stats.indexed_deltas(),
                    stats.total_deltas()
                );
            } else if stats.total_objects() > 0 {
                tracing::debug!(
                    "Received {}/{} objects",
                    stats.received_objects(),
                    stats.total_objects()
                );
            }
            true
        });

        callbacks
    }

    /// Fetch options carrying [`Self::remote_callbacks`].
    pub(crate) fn fetch_options(&self) -> FetchOptions<'static> {
        let mut options = FetchOptions::new();
        options.remote_callbacks(self.remote_callbacks());
        options
    }
}
