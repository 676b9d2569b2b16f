use anyhow::{Context, Result};
use std::path::PathBuf;
use crate::github::{GitHubClient, ReleaseListResponse};

/// Where a check gets its release list from.
pub enum ReleaseSource {
    GitHub { client: GitHubClient, limit: usize },
    /// A response saved from the JSONP endpoint, e.g. with
    /// `curl 'https://api.github.com/repos/o/r/releases?callback=cb'`.
    Jsonp { path: PathBuf, callback: String },
}

impl ReleaseSource {
    /// Never fails: anything that goes wrong comes back as a response
    /// without a success status.
    pub async fn fetch(&self) -> ReleaseListResponse {
        match self {
            ReleaseSource::GitHub { client, limit } => client.fetch_release_list(*limit).await,
            ReleaseSource::Jsonp { path, callback } => match Self::read_jsonp(path, callback).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "unusable JSONP response: {:#}", e);
                    ReleaseListResponse::failed(None)
                }
            },
        }
    }

    async fn read_jsonp(path: &PathBuf, callback: &str) -> Result<ReleaseListResponse> {
        let body = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        ReleaseListResponse::from_jsonp(&body, callback)
    }
}
