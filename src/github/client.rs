//! GitHub API client.

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, LINK, USER_AGENT};
use url::Url;

use crate::error::{MirrorError, Result};

/// Default base URL of the public GitHub API.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Client for interacting with the GitHub API.
#[derive(Clone)]
pub struct GitHubClient {
    pub(crate) token: String,
    pub(crate) base_url: String,
    pub(crate) client: Client,
}

impl GitHubClient {
    /// Create a new GitHub client with the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_enterprise(token, DEFAULT_API_URL)
    }

    /// Create a client for GitHub Enterprise with a custom base URL.
    pub fn with_enterprise(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        let mut url = base_url.into();
        while url.ends_with('/') {
            url.pop();
        }
        Self {
            token: token.into(),
            base_url: url,
            client: Client::new(),
        }
    }

    /// Get the default headers for API requests.
    pub(crate) fn headers(&self) -> Result<HeaderMap> {
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.token)).map_err(|_| {
            MirrorError::Config("token contains characters not allowed in an HTTP header".into())
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("org-mirror"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Make a GET request and return the decoded body together with the
    /// page number advertised as `rel="next"` in the `Link` header.
    pub(crate) fn get_paged<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<(T, Option<u32>)> {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!(%url, "GET");

        let response = self.client.get(&url).headers(self.headers()?).send()?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(MirrorError::GitHub {
                message: format!("API request failed ({}): {}", status, body),
            });
        }

        let next = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(next_page);

        let body = response.json().map_err(|e| MirrorError::GitHub {
            message: format!("Failed to parse response: {}", e),
        })?;

        Ok((body, next))
    }
}

/// Extract the `page` query parameter of the `rel="next"` entry of a
/// `Link` header value.
pub(crate) fn next_page(link: &str) -> Option<u32> {
    link.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        let is_next = parts.any(|param| param.trim() == "rel=\"next\"");
        if !is_next {
            return None;
        }

        let target = target.strip_prefix('<')?.strip_suffix('>')?;
        let url = Url::parse(target).ok()?;
        url.query_pairs()
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.parse().ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_page_from_link_header() {
        let link = "<https://api.github.com/organizations/42/repos?per_page=100&page=3>; rel=\"next\", \
                    <https://api.github.com/organizations/42/repos?per_page=100&page=7>; rel=\"last\"";
        assert_eq!(next_page(link), Some(3));
    }

    #[test]
    fn test_next_page_absent_on_last_page() {
        let link = "<https://api.github.com/organizations/42/repos?per_page=100&page=1>; rel=\"first\", \
                    <https://api.github.com/organizations/42/repos?per_page=100&page=6>; rel=\"prev\"";
        assert_eq!(next_page(link), None);
    }

    #[test]
    fn test_next_page_ignores_malformed_entries() {
        assert_eq!(next_page(""), None);
        assert_eq!(next_page("garbage; rel=\"next\""), None);
        assert_eq!(
            next_page("<https://api.github.com/orgs/acme/repos?per_page=100>; rel=\"next\""),
            None
        );
    }

    #[test]
    fn test_enterprise_base_url_is_trimmed() {
        let client = GitHubClient::with_enterprise("t", "https://ghe.example.com/api/v3/");
        assert_eq!(client.base_url, "https://ghe.example.com/api/v3");

        let client = GitHubClient::new("t");
        assert_eq!(client.base_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_headers_reject_invalid_token() {
        let client = GitHubClient::new("bad\ntoken");
        assert!(matches!(client.headers(), Err(MirrorError::Config(_))));

        let headers = GitHubClient::new("ghp_abc").headers().unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer ghp_abc");
    }
}
