//! Outbound HTTP client for the upstream OpenAI-compatible Responses API.

use openai_protocol::responses::ResponsesRequest;

use crate::error::{OrchestratorError, OrchestratorResult};

pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// POST `{base}/responses`; the caller drives the returned SSE response
    /// through [`crate::sse::UpstreamEventReader`]. `request.stream` must
    /// already be `true`.
    pub async fn stream(&self, request: &ResponsesRequest, auth_header: &str) -> OrchestratorResult<reqwest::Response> {
        let response = self
            .http
            .post(format!("{}/responses", self.base_url.trim_end_matches('/')))
            .header("Authorization", auth_header)
            .json(request)
            .send()
            .await
            .map_err(|e| OrchestratorError::TransportError(format!("connecting to upstream: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OrchestratorError::TransportError(format!(
                "upstream returned {status}: {body}"
            )));
        }

        Ok(response)
    }
}
