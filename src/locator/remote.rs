//! HEAD probe for remote media URLs.

use std::time::Duration;

use mediavault_common::{Error, Result};
use reqwest::{header, redirect, Client, Url};

use crate::config::RemoteConfig;

/// Parse `locator` as an absolute `http`/`https` URL.
pub fn parse_remote_url(locator: &str) -> Option<Url> {
    Url::parse(locator.trim())
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
}

/// Reads the `Content-Type` a remote host reports for a URL.
#[derive(Debug, Clone)]
pub struct RemoteProbe {
    client: Client,
}

impl RemoteProbe {
    /// Build a probe with a hard timeout, custom user-agent, and at most one
    /// redirect hop.
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.probe_timeout_secs))
            .user_agent(config.user_agent.clone())
            .redirect(redirect::Policy::limited(1))
            .build()
            .map_err(|e| Error::internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Issue a HEAD request and return the content type.
    ///
    /// Network errors, timeouts, non-2xx statuses and a missing header all
    /// yield `None`.
    pub async fn content_type(&self, url: &Url) -> Option<String> {
        let response = match self.client.head(url.clone()).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Remote probe failed");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!(url = %url, status = %response.status(), "Remote probe rejected");
            return None;
        }

        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_http_and_https_only() {
        assert!(parse_remote_url("https://cdn.example.com/a.mp3").is_some());
        assert!(parse_remote_url("http://cdn.example.com/a.mp3").is_some());
        assert!(parse_remote_url("ftp://cdn.example.com/a.mp3").is_none());
        assert!(parse_remote_url("file:///etc/passwd").is_none());
        assert!(parse_remote_url("song.mp3").is_none());
        assert!(parse_remote_url("/abs/song.mp3").is_none());
    }
}
