//! Run configuration.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{MirrorError, Result};
use crate::git::GitAuth;
use crate::github::DEFAULT_API_URL;

/// Everything a mirroring run needs, built once at startup.
#[derive(Clone)]
pub struct SyncConfig {
    token: String,
    organization: String,
    destination: PathBuf,
    host_override: Option<String>,
    fail_fast: bool,
    api_url: String,
    auth: GitAuth,
}

impl SyncConfig {
    /// Creates a configuration with the required values and defaults for
    /// everything else. Call [`validate`](Self::validate) before use.
    pub fn new(
        token: impl Into<String>,
        organization: impl Into<String>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            token: token.into(),
            organization: organization.into(),
            destination: destination.into(),
            host_override: None,
            fail_fast: false,
            api_url: DEFAULT_API_URL.to_string(),
            auth: GitAuth::default(),
        }
    }

    /// Replace `github.com` in clone URLs with `host`. Empty means no rewrite.
    pub fn with_host_override(mut self, host: impl Into<String>) -> Self {
        let host = host.into();
        self.host_override = (!host.is_empty()).then_some(host);
        self
    }

    /// Stop at the first clone or update failure.
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Use a GitHub Enterprise API base URL.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Set the credentials used for git remote operations.
    pub fn with_auth(mut self, auth: GitAuth) -> Self {
        self.auth = auth;
        self
    }

    /// Checks that every required value is present.
    pub fn validate(&self) -> Result<()> {
        if self.token.is_empty() {
            return Err(MirrorError::Config("token must be provided".into()));
        }
        if self.organization.is_empty() {
            return Err(MirrorError::Config("org must be provided".into()));
        }
        if self.destination.as_os_str().is_empty() {
            return Err(MirrorError::Config("dest must be provided".into()));
        }
        if self.api_url.is_empty() {
            return Err(MirrorError::Config("api-url must not be empty".into()));
        }
        Ok(())
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn host_override(&self) -> Option<&str> {
        self.host_override.as_deref()
    }

    pub fn is_fail_fast(&self) -> bool {
        self.fail_fast
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn auth(&self) -> &GitAuth {
        &self.auth
    }
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("token", &"<redacted>")
            .field("organization", &self.organization)
            .field("destination", &self.destination)
            .field("host_override", &self.host_override)
            .field("fail_fast", &self.fail_fast)
            .field("api_url", &self.api_url)
            .field("auth", &self.auth)
            .finish()
    }
}
