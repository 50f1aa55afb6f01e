use log::debug;
use reqwest::{Client, Response};
use url::Url;

use crate::auth::Token;
use crate::error::{ReportError, Result};

use super::responses;
use super::types::{JobId, PipelineStatus};

const PRIVATE_TOKEN_HEADER: &str = "PRIVATE-TOKEN";

pub struct GitLabClient {
    client: Client,
    project_url: Url,
    token: Option<Token>,
}

impl GitLabClient {
    /// Creates a REST client scoped to one project.
    ///
    /// `project_id` may be a numeric id or a `group/project` path; it is
    /// percent-encoded into a single path segment.
    pub fn new(base_url: &str, project_id: &str, token: Option<Token>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("deploy-report/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ReportError::Config(format!("Failed to create HTTP client: {e}")))?;

        let mut project_url = Url::parse(base_url)
            .map_err(|e| ReportError::Config(format!("Invalid base URL: {e}")))?
            .join("api/v4/")
            .map_err(|e| ReportError::Config(format!("Invalid API base URL: {e}")))?;

        project_url
            .path_segments_mut()
            .map_err(|()| ReportError::Config(format!("Base URL cannot hold a path: {base_url}")))?
            .pop_if_empty()
            .push("projects")
            .push(project_id)
            .push("");

        Ok(Self {
            client,
            project_url,
            token,
        })
    }

    /// Helper to build authenticated requests
    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.token {
            request.header(PRIVATE_TOKEN_HEADER, token.as_str())
        } else {
            request
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.project_url
            .join(path)
            .map_err(|e| ReportError::Config(format!("Invalid endpoint URL {path}: {e}")))
    }

    async fn get(&self, path: &str) -> Result<Response> {
        let url = self.endpoint(path)?;
        debug!("GET {url}");

        let response = self.auth_request(self.client.get(url)).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(ReportError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    pub async fn latest_pipeline(&self) -> Result<PipelineStatus> {
        let response = self.get("pipelines/latest").await?;
        responses::pipeline_status(response).await
    }

    pub async fn latest_job_id(&self, pipeline_id: u64) -> Result<JobId> {
        let response = self.get(&format!("pipelines/{pipeline_id}/jobs")).await?;
        responses::latest_job_id(response).await
    }

    pub async fn job_log(&self, job_id: JobId) -> Result<String> {
        let response = self
            .get(&format!("jobs/{job_id}/artifacts/log.log"))
            .await?;
        responses::job_log(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_project_scoped_endpoints() {
        let client = GitLabClient::new("https://gitlab.com", "42", None).unwrap();
        assert_eq!(
            client.endpoint("pipelines/latest").unwrap().as_str(),
            "https://gitlab.com/api/v4/projects/42/pipelines/latest"
        );
        assert_eq!(
            client.endpoint("jobs/9/artifacts/log.log").unwrap().as_str(),
            "https://gitlab.com/api/v4/projects/42/jobs/9/artifacts/log.log"
        );
    }

    #[test]
    fn encodes_project_paths_as_one_segment() {
        let client = GitLabClient::new("https://gitlab.example.com/", "group/project", None).unwrap();
        assert_eq!(
            client.endpoint("pipelines/1/jobs").unwrap().as_str(),
            "https://gitlab.example.com/api/v4/projects/group%2Fproject/pipelines/1/jobs"
        );
    }

    #[test]
    fn rejects_invalid_base_url() {
        let result = GitLabClient::new("not a url", "42", None);
        assert!(matches!(result, Err(ReportError::Config(_))));
    }

    #[tokio::test]
    async fn fetches_latest_pipeline_with_private_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v4/projects/42/pipelines/latest")
            .match_header("private-token", "glpat-test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 123, "ref": "main", "status": "success"}"#)
            .create_async()
            .await;

        let client =
            GitLabClient::new(&server.url(), "42", Some(Token::from("glpat-test"))).unwrap();
        let status = client.latest_pipeline().await.unwrap();

        mock.assert_async().await;
        assert!(status.is_success);
        assert_eq!(status.pipeline_id, 123);
        assert_eq!(status.source_ref, "main");
    }

    #[tokio::test]
    async fn fetches_first_job_of_pipeline() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v4/projects/42/pipelines/123/jobs")
            .with_status(200)
            .with_body(r#"[{"id": 456, "name": "deploy"}, {"id": 455, "name": "build"}]"#)
            .create_async()
            .await;

        let client = GitLabClient::new(&server.url(), "42", None).unwrap();
        assert_eq!(client.latest_job_id(123).await.unwrap(), 456);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn returns_job_log_verbatim() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v4/projects/42/jobs/456/artifacts/log.log")
            .with_status(200)
            .with_body("| any text here")
            .create_async()
            .await;

        let client = GitLabClient::new(&server.url(), "42", None).unwrap();
        assert_eq!(client.job_log(456).await.unwrap(), "| any text here");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_an_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v4/projects/42/pipelines/latest")
            .with_status(401)
            .with_body(r#"{"message": "401 Unauthorized"}"#)
            .create_async()
            .await;

        let client = GitLabClient::new(&server.url(), "42", None).unwrap();
        match client.latest_pipeline().await {
            Err(ReportError::Api { status, message }) => {
                assert_eq!(status, 401);
                assert!(message.contains("Unauthorized"));
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_pipeline_body_is_a_parse_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v4/projects/42/pipelines/latest")
            .with_status(200)
            .with_body("any text")
            .create_async()
            .await;

        let client = GitLabClient::new(&server.url(), "42", None).unwrap();
        let err = client.latest_pipeline().await.unwrap_err();
        assert!(matches!(err, ReportError::Parse { .. }));
    }

    #[tokio::test]
    async fn connection_failure_is_a_network_error() {
        // Nothing listens on the discard port.
        let client = GitLabClient::new("http://127.0.0.1:9", "42", None).unwrap();
        let err = client.latest_pipeline().await.unwrap_err();
        assert!(matches!(err, ReportError::Network(_)));
    }
}
