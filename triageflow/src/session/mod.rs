//! Workflow sessions and progress sources.
//!
//! A `WorkflowSession` submits jobs and hands out progress sources. Two
//! sources exist, one per deployment mode, and both produce the same lazy,
//! non-restartable sequence of `ProgressEvent`s:
//! - `PollingSource` repeatedly fetches the full snapshot and yields the delta
//! - `StreamingSource` reads newline-delimited JSON as it arrives

mod cursor;
mod poll;
mod stream;

pub use cursor::StepCursor;
pub use poll::{PollingSource, DEFAULT_STATUS};
pub use stream::{decode_line, StreamingSource};

use futures::stream::BoxStream;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cancellation::CancellationToken;
use crate::config::ClientConfig;
use crate::core::{ProgressEvent, StartWorkflowRequest, StreamRunRequest, WorkflowHandle};
use crate::errors::{Result, TriageflowError};
use crate::transport::WorkflowTransport;

/// The lazy event sequence produced by a progress source.
pub type EventStream = BoxStream<'static, Result<ProgressEvent>>;

/// Capability shared by every way of following a workflow.
///
/// Consuming the source is the only way to get its events, so a sequence
/// cannot be restarted.
pub trait ProgressSource: Send {
    /// Converts into the event sequence.
    fn into_events(self: Box<Self>) -> EventStream;
}

/// Owns job submission and subscription for one page lifetime.
pub struct WorkflowSession {
    id: Uuid,
    transport: Arc<dyn WorkflowTransport>,
    poll_interval: Duration,
    token: Arc<CancellationToken>,
}

impl WorkflowSession {
    /// Creates a session over a transport.
    #[must_use]
    pub fn new(transport: Arc<dyn WorkflowTransport>, config: &ClientConfig) -> Self {
        Self::with_token(transport, config, Arc::new(CancellationToken::new()))
    }

    /// Creates a session sharing an existing cancellation token.
    #[must_use]
    pub fn with_token(
        transport: Arc<dyn WorkflowTransport>,
        config: &ClientConfig,
        token: Arc<CancellationToken>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            transport,
            poll_interval: config.poll_interval(),
            token,
        }
    }

    /// Creates a session talking HTTP to the configured backend.
    #[cfg(feature = "http")]
    pub fn http(config: &ClientConfig) -> Result<Self> {
        let transport = crate::transport::HttpTransport::new(config.clone())?;
        Ok(Self::new(Arc::new(transport), config))
    }

    /// Session id used in logs.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Submits a job. No handle is produced unless the backend accepts it.
    ///
    /// A blank JQL query is only accepted when mock feedback items are supplied.
    pub async fn start(&self, request: &StartWorkflowRequest) -> Result<WorkflowHandle> {
        self.ensure_active()?;
        if request.jql.trim().is_empty() && request.mock_feedback_items.is_empty() {
            return Err(TriageflowError::validation("Please enter a JQL query"));
        }

        let response = self.transport.start_workflow(request).await.map_err(|err| {
            warn!(session_id = %self.id, error = %err, "Workflow start failed");
            TriageflowError::from(err)
        })?;

        info!(
            session_id = %self.id,
            workflow_id = %response.workflow_id,
            mock_items = request.mock_feedback_items.len(),
            "Workflow started"
        );
        Ok(WorkflowHandle::new(response.workflow_id))
    }

    /// Follows a started job by polling. Consumes the handle.
    #[must_use]
    pub fn subscribe(&self, handle: WorkflowHandle) -> PollingSource {
        PollingSource::new(
            self.transport.clone(),
            handle,
            self.poll_interval,
            self.token.clone(),
        )
    }

    /// Prepares a streaming run. The request is sent when the source is first polled.
    pub fn stream_run(&self, request: StreamRunRequest) -> Result<StreamingSource> {
        self.ensure_active()?;
        if request.jira_url.trim().is_empty() {
            return Err(TriageflowError::validation("Please enter a JIRA URL"));
        }
        Ok(StreamingSource::new(
            self.transport.clone(),
            request,
            self.token.clone(),
        ))
    }

    /// Stops every source handed out by this session.
    pub fn cancel(&self, reason: impl Into<String>) {
        self.token.cancel(reason);
    }

    /// Whether the session has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The token shared with this session's sources.
    #[must_use]
    pub fn cancellation_token(&self) -> Arc<CancellationToken> {
        self.token.clone()
    }

    /// The transport behind this session.
    #[must_use]
    pub fn transport(&self) -> Arc<dyn WorkflowTransport> {
        self.transport.clone()
    }

    fn ensure_active(&self) -> Result<()> {
        if self.token.is_cancelled() {
            let reason = self.token.reason().unwrap_or_default();
            return Err(TriageflowError::Cancelled(reason));
        }
        Ok(())
    }
}

impl std::fmt::Debug for WorkflowSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowSession")
            .field("id", &self.id)
            .field("poll_interval", &self.poll_interval)
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StartWorkflowResponse;
    use crate::errors::TransportError;
    use crate::testing::{fixtures, ScriptedTransport, TransportCall};
    use crate::transport::MockWorkflowTransport;
    use futures::StreamExt;

    fn config() -> ClientConfig {
        ClientConfig::new().with_poll_interval(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_start_returns_handle() {
        let transport = Arc::new(ScriptedTransport::new().with_start_id("wf-42"));
        let session = WorkflowSession::new(transport.clone(), &config());

        let handle = session
            .start(&StartWorkflowRequest::new("project = UX"))
            .await
            .unwrap();

        assert_eq!(handle.as_str(), "wf-42");
        assert!(matches!(transport.calls().as_slice(), [TransportCall::Start(_)]));
    }

    #[tokio::test]
    async fn test_start_failure_produces_no_handle() {
        let mut mock = MockWorkflowTransport::new();
        mock.expect_start_workflow()
            .times(1)
            .returning(|_| Err(TransportError::status(500)));
        mock.expect_workflow_status().never();

        let session = WorkflowSession::new(Arc::new(mock), &config());
        let err = session
            .start(&StartWorkflowRequest::new("project = UX"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TriageflowError::Transport(TransportError { status: Some(500), .. })
        ));
    }

    #[tokio::test]
    async fn test_start_sends_request_body() {
        let mut mock = MockWorkflowTransport::new();
        mock.expect_start_workflow()
            .withf(|request| request.jql == "labels = feedback" && request.post_to_jira)
            .times(1)
            .returning(|_| {
                Ok(StartWorkflowResponse {
                    workflow_id: "wf-7".to_string(),
                })
            });

        let session = WorkflowSession::new(Arc::new(mock), &config());
        let request = StartWorkflowRequest::new("labels = feedback").with_post_to_jira(true);
        let handle = session.start(&request).await.unwrap();
        assert_eq!(handle.to_string(), "wf-7");
    }

    #[tokio::test]
    async fn test_subscribe_polls_the_issued_handle() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .with_start_id("wf-9")
                .push_snapshot(fixtures::snapshot(&["a"], true)),
        );
        let session = WorkflowSession::new(transport.clone(), &config());

        let handle = session.start(&StartWorkflowRequest::new("q")).await.unwrap();
        let events: Vec<_> = session.subscribe(handle).events().collect().await;

        assert_eq!(events.len(), 3);
        assert!(transport
            .calls()
            .contains(&TransportCall::Status("wf-9".to_string())));
    }

    #[tokio::test]
    async fn test_start_rejects_blank_jql_without_mock_items() {
        let transport = Arc::new(ScriptedTransport::new());
        let session = WorkflowSession::new(transport.clone(), &config());

        let err = session.start(&StartWorkflowRequest::new(" ")).await.unwrap_err();
        assert!(matches!(err, TriageflowError::Validation(_)));
        assert!(transport.calls().is_empty());

        let with_mocks =
            StartWorkflowRequest::new("").with_mock_feedback(crate::core::sample_mock_feedback());
        assert!(session.start(&with_mocks).await.is_ok());
    }

    #[tokio::test]
    async fn test_stream_run_rejects_blank_url() {
        let session = WorkflowSession::new(Arc::new(ScriptedTransport::new()), &config());
        let err = session.stream_run(StreamRunRequest::new("  ")).err().unwrap();
        assert!(matches!(err, TriageflowError::Validation(_)));
    }

    #[tokio::test]
    async fn test_cancelled_session_refuses_to_start() {
        let transport = Arc::new(ScriptedTransport::new());
        let session = WorkflowSession::new(transport.clone(), &config());
        session.cancel("navigated away");

        let err = session.start(&StartWorkflowRequest::new("q")).await.unwrap_err();
        assert!(matches!(err, TriageflowError::Cancelled(ref r) if r == "navigated away"));
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn test_sources_are_interchangeable() {
        let transport = Arc::new(ScriptedTransport::new());
        let session = WorkflowSession::new(transport, &config());

        let sources: Vec<Box<dyn ProgressSource>> = vec![
            Box::new(session.subscribe(WorkflowHandle::new("wf-1"))),
            Box::new(session.stream_run(StreamRunRequest::new("https://x")).unwrap()),
        ];
        assert_eq!(sources.len(), 2);
    }
}
