//! HTTP transport over reqwest.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Instant;
use tracing::{debug, warn};

use super::{ByteStream, WorkflowTransport};
use crate::config::ClientConfig;
use crate::core::{
    CommentRequest, CommentResponse, StartWorkflowRequest, StartWorkflowResponse,
    StreamRunRequest, WorkflowSnapshot,
};
use crate::errors::{Result as TriageResult, TransportError};
use std::time::Duration;

/// Workflow backend client speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: ClientConfig,
    timeout: Duration,
}

impl HttpTransport {
    /// Creates a transport from configuration.
    ///
    /// The configured timeout bounds connecting and every unary request. A
    /// run stream is only bounded while connecting since it stays open for as
    /// long as the run lasts.
    pub fn new(config: ClientConfig) -> TriageResult<Self> {
        let timeout = config.timeout()?;
        let client = Client::builder()
            .connect_timeout(timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| TransportError::network(format!("Could not build HTTP client: {e}")))?;
        Ok(Self {
            client,
            config,
            timeout,
        })
    }

    /// Creates a transport around an existing client.
    pub fn with_client(client: Client, config: ClientConfig) -> TriageResult<Self> {
        let timeout = config.timeout()?;
        Ok(Self {
            client,
            config,
            timeout,
        })
    }

    /// Gets the configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<Response, TransportError> {
        let started = Instant::now();
        let response = builder.send().await.map_err(|e| {
            warn!(url = %url, error = %e, "Request failed");
            TransportError::network(e.to_string())
        })?;

        let status = response.status();
        debug!(
            url = %url,
            status = status.as_u16(),
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "Request completed"
        );

        if status.is_success() {
            Ok(response)
        } else {
            Err(TransportError::status(status.as_u16()))
        }
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
        response
            .json::<T>()
            .await
            .map_err(|e| TransportError::network(format!("Invalid response body: {e}")))
    }
}

#[async_trait]
impl WorkflowTransport for HttpTransport {
    async fn start_workflow(
        &self,
        request: &StartWorkflowRequest,
    ) -> Result<StartWorkflowResponse, TransportError> {
        let url = self.config.endpoint("/workflow/start");
        let builder = self.client.post(&url).timeout(self.timeout).json(request);
        let response = self.send(builder, &url).await?;
        Self::read_json(response).await
    }

    async fn workflow_status(&self, workflow_id: &str) -> Result<WorkflowSnapshot, TransportError> {
        let url = self.config.endpoint(&format!("/workflow/{workflow_id}/status"));
        let builder = self.client.get(&url).timeout(self.timeout);
        let response = self.send(builder, &url).await?;
        Self::read_json(response).await
    }

    async fn open_run_stream(
        &self,
        request: &StreamRunRequest,
    ) -> Result<ByteStream, TransportError> {
        let url = self.config.endpoint("/run");
        let response = self.send(self.client.post(&url).json(request), &url).await?;
        let stream = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| TransportError::network(format!("Stream read failed: {e}")))
        });
        Ok(stream.boxed())
    }

    async fn post_comment(
        &self,
        request: &CommentRequest,
    ) -> Result<CommentResponse, TransportError> {
        let url = self.config.endpoint("/jira/post-comment");
        let builder = self.client.post(&url).timeout(self.timeout).json(request);
        let response = self.send(builder, &url).await?;
        Self::read_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_config() {
        let transport =
            HttpTransport::new(ClientConfig::new().with_base_url("http://backend:9000")).unwrap();
        assert_eq!(
            transport.config().endpoint("/workflow/wf-1/status"),
            "http://backend:9000/workflow/wf-1/status"
        );
    }

    #[test]
    fn test_invalid_timeout_is_rejected_before_building() {
        let err = HttpTransport::new(ClientConfig::new().with_timeout(-1.0)).unwrap_err();
        assert!(matches!(
            err,
            crate::errors::TriageflowError::Config(crate::errors::ConfigError::InvalidTimeout { .. })
        ));
    }
}
