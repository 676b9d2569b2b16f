use anyhow::Result;
use octocrab::Octocrab;
use thiserror::Error;
use super::types::{ReleaseEntry, ReleaseListResponse};

/// GitHub caps `per_page` at 100.
pub const MAX_PER_PAGE: u8 = 100;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("GitHub answered with status {0}")]
    Status(u16),
    #[error(transparent)]
    Transport(#[from] octocrab::Error),
    #[error("Failed to parse release list: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    /// The HTTP status GitHub sent, when the failure got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status(status) => Some(*status),
            _ => None,
        }
    }
}

pub struct GitHubClient {
    client: Octocrab,
    owner: String,
    repo: String,
}

impl GitHubClient {
    pub fn new(token: Option<String>, api_base: Option<&str>, owner: String, repo: String) -> Result<Self> {
        let mut builder = Octocrab::builder();

        if let Some(token) = token {
            builder = builder.personal_token(token);
        }
        if let Some(base) = api_base {
            builder = builder.base_uri(base)?;
        }

        let client = builder.build()?;
        Ok(Self { client, owner, repo })
    }

    pub fn repository(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    pub async fn list_releases(&self, limit: usize) -> Result<Vec<ReleaseEntry>, FetchError> {
        let route = format!(
            "/repos/{}/{}/releases?per_page={}",
            self.owner,
            self.repo,
            limit.clamp(1, MAX_PER_PAGE as usize)
        );

        // Raw request so the status survives; the typed helpers fold it into the error message.
        let response = self.client._get(route).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = self.client.body_to_string(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetches the release list, folding any failure into the envelope's
    /// status so callers only ever see a response.
    pub async fn fetch_release_list(&self, limit: usize) -> ReleaseListResponse {
        match self.list_releases(limit).await {
            Ok(releases) => {
                tracing::debug!(repository = %self.repository(), count = releases.len(), "fetched releases");
                ReleaseListResponse::ok(releases)
            }
            Err(e) => {
                let status = e.status();
                tracing::warn!(repository = %self.repository(), ?status, "failed to fetch releases: {}", e);
                ReleaseListResponse::failed(status)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use pretty_assertions::assert_eq;

    const RELEASES: &str = r#"[
        {"tag_name": "v2.15.4.0", "draft": false, "prerelease": true,
         "html_url": "https://github.com/owner/plugin/releases/tag/v2.15.4.0"},
        {"tag_name": "v2.15.3.2", "draft": false, "prerelease": false,
         "html_url": "https://github.com/owner/plugin/releases/tag/v2.15.3.2",
         "name": "Bugfix", "published_at": "2018-01-12T10:00:00Z"}
    ]"#;

    fn client(server: &mockito::ServerGuard) -> GitHubClient {
        GitHubClient::new(None, Some(&server.url()), "owner".into(), "plugin".into()).unwrap()
    }

    #[tokio::test]
    async fn lists_releases_in_order() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex(r"^/repos/owner/plugin/releases".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(RELEASES)
            .create_async()
            .await;

        let releases = client(&server).list_releases(30).await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            releases.iter().map(|r| r.tag_name.as_str()).collect::<Vec<_>>(),
            vec!["v2.15.4.0", "v2.15.3.2"]
        );
        assert!(releases[0].prerelease);
        assert_eq!(releases[1].name.as_deref(), Some("Bugfix"));
    }

    #[tokio::test]
    async fn successful_fetch_is_status_200() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", Matcher::Regex(r"^/repos/owner/plugin/releases".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(RELEASES)
            .create_async()
            .await;

        let response = client(&server).fetch_release_list(30).await;

        assert!(response.is_success());
        assert_eq!(response.data.len(), 2);
    }

    #[tokio::test]
    async fn http_error_becomes_failed_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", Matcher::Regex(r"^/repos/owner/plugin/releases".into()))
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": "Not Found", "documentation_url": "https://docs.github.com/rest"}"#)
            .create_async()
            .await;

        let response = client(&server).fetch_release_list(30).await;

        assert!(!response.is_success());
        assert_eq!(response.meta.status, Some(404));
        assert!(response.data.is_empty());
    }

    #[tokio::test]
    async fn list_reports_server_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", Matcher::Regex(r"^/repos/owner/plugin/releases".into()))
            .with_status(403)
            .with_body(r#"{"message": "API rate limit exceeded"}"#)
            .create_async()
            .await;

        let err = client(&server).list_releases(30).await.unwrap_err();

        assert!(matches!(err, FetchError::Status(403)));
        assert_eq!(err.status(), Some(403));
    }

    #[tokio::test]
    async fn requests_capped_page_size() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex(r"^/repos/owner/plugin/releases".into()))
            .match_query(Matcher::UrlEncoded("per_page".into(), "100".into()))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let releases = client(&server).list_releases(500).await.unwrap();

        mock.assert_async().await;
        assert!(releases.is_empty());
    }

    #[tokio::test]
    async fn garbage_body_becomes_failed_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", Matcher::Regex(r"^/repos/owner/plugin/releases".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("<html>rate limited</html>")
            .create_async()
            .await;

        let response = client(&server).fetch_release_list(30).await;

        assert_eq!(response, ReleaseListResponse::failed(None));
    }
}
