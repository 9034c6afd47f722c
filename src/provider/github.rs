//! GitHub pull request provider using the REST API.
//!
//! Endpoints used:
//! - `POST /repos/{owner}/{repo}/pulls`
//! - `PUT /repos/{owner}/{repo}/pulls/{number}/merge`
//! - `DELETE /repos/{owner}/{repo}/git/refs/heads/{branch}`
//!
//! Errors are returned as-is; nothing is retried.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{PullRequestHandle, PullRequestProvider};
use crate::error::ProviderError;

/// Public GitHub API base URL.
const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Public GitHub web URL.
const GITHUB_WEB_URL: &str = "https://github.com";

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "gitopsctl";

/// GitHub provider for one repository.
pub struct GitHubProvider {
    client: Client,
    token: Option<String>,
    owner: String,
    repo: String,
    api_base: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitHubProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubProvider")
            .field("has_token", &self.token.is_some())
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct CreatePullBody<'a> {
    title: &'a str,
    body: &'a str,
    head: &'a str,
    base: &'a str,
}

#[derive(Serialize)]
struct MergePullBody<'a> {
    merge_method: &'a str,
}

#[derive(Deserialize)]
struct GitHubPullRequest {
    number: u64,
    html_url: String,
}

#[derive(Deserialize)]
struct GitHubErrorBody {
    message: Option<String>,
}

impl GitHubProvider {
    /// Creates a provider for `owner/repo` on public GitHub.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(
        token: Option<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ProviderError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            token,
            owner: owner.into(),
            repo: repo.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }

    /// Overrides the API base URL (GitHub Enterprise, tests).
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Derives the API base URL from the provider's web URL.
    ///
    /// `https://github.com` maps to `https://api.github.com`; any other host
    /// is treated as GitHub Enterprise (`<url>/api/v3`).
    #[must_use]
    pub fn api_base_for(provider_url: &str) -> String {
        let url = provider_url.trim_end_matches('/');
        if url == GITHUB_WEB_URL {
            DEFAULT_API_BASE.to_string()
        } else {
            format!("{url}/api/v3")
        }
    }

    fn repo_url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}/{path}", self.api_base, self.owner, self.repo)
    }

    fn headers(&self) -> Result<HeaderMap, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        if let Some(token) = &self.token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ProviderError::AuthFailed(String::from("invalid token format")))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    async fn check_status(response: Response, what: &str) -> Result<Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GitHubErrorBody>(&text)
            .ok()
            .and_then(|body| body.message)
            .unwrap_or(text);

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthFailed(message),
            StatusCode::NOT_FOUND => ProviderError::NotFound(what.to_string()),
            _ => ProviderError::api(status.as_u16(), message),
        })
    }
}

#[async_trait]
impl PullRequestProvider for GitHubProvider {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn create_pull_request(
        &self,
        source: &str,
        target: &str,
        title: &str,
        description: &str,
    ) -> Result<PullRequestHandle, ProviderError> {
        debug!("Creating pull request {source} -> {target} on {}/{}", self.owner, self.repo);

        let response = self
            .client
            .post(self.repo_url("pulls"))
            .headers(self.headers()?)
            .json(&CreatePullBody {
                title,
                body: description,
                head: source,
                base: target,
            })
            .send()
            .await
            .map_err(|e| ProviderError::network(format!("Request failed: {e}")))?;

        let response = Self::check_status(response, &format!("{}/{}", self.owner, self.repo)).await?;
        let pull: GitHubPullRequest = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(PullRequestHandle {
            number: pull.number,
            url: pull.html_url,
        })
    }

    async fn merge_pull_request(
        &self,
        pull_request: &PullRequestHandle,
    ) -> Result<(), ProviderError> {
        debug!("Merging pull request #{}", pull_request.number);

        let response = self
            .client
            .put(self.repo_url(&format!("pulls/{}/merge", pull_request.number)))
            .headers(self.headers()?)
            .json(&MergePullBody {
                merge_method: "merge",
            })
            .send()
            .await
            .map_err(|e| ProviderError::network(format!("Request failed: {e}")))?;

        Self::check_status(response, &format!("pull request #{}", pull_request.number)).await?;
        Ok(())
    }

    async fn delete_branch(&self, branch: &str) -> Result<(), ProviderError> {
        debug!("Deleting branch {branch}");

        let response = self
            .client
            .delete(self.repo_url(&format!("git/refs/heads/{branch}")))
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| ProviderError::network(format!("Request failed: {e}")))?;

        Self::check_status(response, &format!("branch {branch}")).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> GitHubProvider {
        GitHubProvider::new(Some(String::from("secret")), "team-org", "team-config")
            .unwrap()
            .with_api_base(server.uri())
    }

    #[test]
    fn test_api_base_for() {
        assert_eq!(GitHubProvider::api_base_for("https://github.com"), "https://api.github.com");
        assert_eq!(GitHubProvider::api_base_for("https://github.com/"), "https://api.github.com");
        assert_eq!(
            GitHubProvider::api_base_for("https://git.example.com"),
            "https://git.example.com/api/v3"
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let provider = GitHubProvider::new(Some(String::from("secret")), "o", "r").unwrap();
        let debug = format!("{provider:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("has_token: true"));
    }

    #[tokio::test]
    async fn test_create_pull_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/team-org/team-config/pulls"))
            .and(header("authorization", "Bearer secret"))
            .and(body_json(serde_json::json!({
                "title": "Updated values in values.yaml",
                "body": "desc",
                "head": "gitopscli-deploy-1234abcd",
                "base": "master",
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "number": 7,
                "html_url": "https://github.com/team-org/team-config/pull/7",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let handle = provider(&server)
            .create_pull_request(
                "gitopscli-deploy-1234abcd",
                "master",
                "Updated values in values.yaml",
                "desc",
            )
            .await
            .unwrap();

        assert_eq!(handle.number, 7);
        assert_eq!(
            provider(&server).pull_request_url(&handle),
            "https://github.com/team-org/team-config/pull/7"
        );
    }

    #[tokio::test]
    async fn test_merge_and_delete_branch() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/repos/team-org/team-config/pulls/7/merge"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "merged": true,
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/repos/team-org/team-config/git/refs/heads/gitopscli-deploy-1234abcd"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider(&server);
        let handle = PullRequestHandle {
            number: 7,
            url: String::from("https://github.com/team-org/team-config/pull/7"),
        };
        provider.merge_pull_request(&handle).await.unwrap();
        provider.delete_branch("gitopscli-deploy-1234abcd").await.unwrap();
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/repos/team-org/team-config/pulls/7/merge"))
            .respond_with(ResponseTemplate::new(405).set_body_json(serde_json::json!({
                "message": "Pull Request is not mergeable",
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/team-org/team-config/pulls"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "message": "Bad credentials",
            })))
            .mount(&server)
            .await;

        let provider = provider(&server);
        let handle = PullRequestHandle {
            number: 7,
            url: String::new(),
        };

        match provider.merge_pull_request(&handle).await.unwrap_err() {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 405);
                assert_eq!(message, "Pull Request is not mergeable");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            provider.create_pull_request("a", "b", "t", "d").await.unwrap_err(),
            ProviderError::AuthFailed(_)
        ));
    }
}
