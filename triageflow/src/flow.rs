//! End-to-end triage flows.
//!
//! `TriageFlow` wires a session, an `IncrementalRenderer` and a
//! `ResultPresenter` to one display surface and applies the error policy:
//! - transport failures are shown as a blocking notice and halt the run
//! - undecodable stream lines are dropped inside the source
//! - action failures stay on the action that produced them

use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::cancellation::CancellationToken;
use crate::config::ClientConfig;
use crate::core::{ProgressEvent, ProgressStep, SequencedStep, StartWorkflowRequest, StreamRunRequest};
use crate::errors::{Result, TriageflowError};
use crate::present::{ActionOutcome, ExternalLinks, ResultCard, ResultPresenter};
use crate::render::IncrementalRenderer;
use crate::session::{EventStream, WorkflowSession};
use crate::surface::{DisplaySurface, Notice};
use crate::transport::WorkflowTransport;

/// Loading text shown while a job is submitted.
pub const INITIALIZING: &str = "Initializing agent...";

/// Loading text shown while a streamed run is in progress.
pub const STREAMING: &str = "Processing...";

/// Title of the step rendered when a streamed run fails.
pub const STREAM_ERROR_TITLE: &str = "Error";

/// Drives runs from submission to presented results.
///
/// One flow lives as long as its surface. Cancelling it stops the current run
/// and refuses later ones.
pub struct TriageFlow {
    transport: Arc<dyn WorkflowTransport>,
    surface: Arc<dyn DisplaySurface>,
    config: ClientConfig,
    token: Arc<CancellationToken>,
    renderer: IncrementalRenderer,
    presenter: ResultPresenter,
}

impl TriageFlow {
    /// Creates a flow over a transport and a surface.
    #[must_use]
    pub fn new(
        transport: Arc<dyn WorkflowTransport>,
        surface: Arc<dyn DisplaySurface>,
        config: ClientConfig,
    ) -> Self {
        let presenter = ResultPresenter::new(
            surface.clone(),
            transport.clone(),
            ExternalLinks::from_config(&config),
        );
        Self {
            renderer: IncrementalRenderer::new(surface.clone()),
            transport,
            surface,
            config,
            token: Arc::new(CancellationToken::new()),
            presenter,
        }
    }

    /// Creates a flow talking HTTP to the configured backend.
    #[cfg(feature = "http")]
    pub fn http(config: ClientConfig, surface: Arc<dyn DisplaySurface>) -> Result<Self> {
        let transport = crate::transport::HttpTransport::new(config.clone())?;
        Ok(Self::new(Arc::new(transport), surface, config))
    }

    /// Submits a job and follows it by polling until results are presented.
    ///
    /// Returns the presented cards, empty when the workflow produced none.
    #[instrument(skip_all, fields(jql = %request.jql))]
    pub async fn run_polling(&mut self, request: &StartWorkflowRequest) -> Result<Vec<ResultCard>> {
        self.begin();
        self.with_surface(|surface| surface.show_loading(INITIALIZING));

        let session = self.session();
        let handle = match session.start(request).await {
            Ok(handle) => handle,
            Err(err) => return Err(self.halt(err)),
        };
        info!(session_id = %session.id(), workflow_id = %handle, "Following workflow");

        let mut events = session.subscribe(handle).events();
        while let Some(event) = events.next().await {
            match event {
                Ok(ProgressEvent::Step(step)) => {
                    self.renderer.render(&step);
                }
                Ok(ProgressEvent::Status(status)) => {
                    self.with_surface(|surface| surface.show_loading(&status));
                }
                Ok(ProgressEvent::Completed(payload)) => {
                    self.with_surface(|surface| surface.hide_loading());
                    if !payload.has_results() {
                        info!("Workflow finished without results");
                        return Ok(Vec::new());
                    }
                    return Ok(self.presenter.present(&payload.results, &payload.tickets));
                }
                Err(err) => return Err(self.halt(err)),
            }
        }

        Err(self.cancelled())
    }

    /// Runs a streamed workflow for one ticket URL.
    ///
    /// Returns the number of steps rendered. A transport failure is rendered
    /// as a final error step and returned.
    #[instrument(skip_all, fields(jira_url = %jira_url))]
    pub async fn run_stream(&mut self, jira_url: &str) -> Result<usize> {
        let session = self.session();
        let source = match session.stream_run(StreamRunRequest::new(jira_url.trim())) {
            Ok(source) => source,
            Err(err) => {
                if matches!(err, TriageflowError::Validation(_)) {
                    self.with_surface(|surface| surface.notify(&Notice::error(err.to_string())));
                }
                return Err(err);
            }
        };

        self.begin();
        self.with_surface(|surface| surface.show_loading(STREAMING));
        let outcome = self.drive_stream(source.events()).await;
        self.with_surface(|surface| surface.hide_loading());

        match outcome {
            Ok(()) if self.token.is_cancelled() => Err(self.cancelled()),
            Ok(()) => {
                let rendered = self.renderer.rendered_position();
                info!(steps = rendered, "Streamed run finished");
                Ok(rendered)
            }
            Err(err) => {
                warn!(error = %err, "Streamed run failed");
                let step = ProgressStep::error(STREAM_ERROR_TITLE, err.to_string());
                let position = self.renderer.rendered_position() + 1;
                self.renderer.render(&SequencedStep::new(position, step));
                Err(err)
            }
        }
    }

    async fn drive_stream(&mut self, mut events: EventStream) -> Result<()> {
        while let Some(event) = events.next().await {
            match event? {
                ProgressEvent::Step(step) => {
                    self.renderer.render(&step);
                }
                ProgressEvent::Status(status) => {
                    self.with_surface(|surface| surface.show_loading(&status));
                }
                ProgressEvent::Completed(_) => {
                    debug!("Unexpected completion event on a stream");
                }
            }
        }
        Ok(())
    }

    /// Opens a ticket's page in the external tracker.
    pub fn open_external(&self, ticket_key: &str) -> Result<String> {
        self.presenter.open_external(ticket_key)
    }

    /// Posts the PM response of the card at `index` as a ticket comment.
    pub async fn post_comment(&self, index: usize) -> Result<ActionOutcome> {
        self.presenter.post_comment(index).await
    }

    /// The presenter holding the current cards.
    #[must_use]
    pub fn presenter(&self) -> &ResultPresenter {
        &self.presenter
    }

    /// Stops the current run and any later one.
    pub fn cancel(&self, reason: impl Into<String>) {
        self.token.cancel(reason);
    }

    /// The token shared by every run of this flow.
    #[must_use]
    pub fn cancellation_token(&self) -> Arc<CancellationToken> {
        self.token.clone()
    }

    fn session(&self) -> WorkflowSession {
        WorkflowSession::with_token(self.transport.clone(), &self.config, self.token.clone())
    }

    fn begin(&mut self) {
        self.renderer.restart();
        self.presenter.clear();
        self.with_surface(|surface| surface.reset());
    }

    fn halt(&self, err: TriageflowError) -> TriageflowError {
        warn!(error = %err, "Run halted");
        if !matches!(err, TriageflowError::Cancelled(_)) {
            self.with_surface(|surface| surface.notify(&Notice::error(format!("Error: {err}"))));
        }
        self.with_surface(|surface| surface.hide_loading());
        err
    }

    fn cancelled(&self) -> TriageflowError {
        let reason = self.token.reason().unwrap_or_default();
        debug!(reason = %reason, "Run cancelled");
        self.with_surface(|surface| surface.hide_loading());
        TriageflowError::Cancelled(reason)
    }

    fn with_surface(&self, write: impl FnOnce(&dyn DisplaySurface)) {
        if self.surface.is_attached() {
            write(self.surface.as_ref());
        }
    }
}

impl std::fmt::Debug for TriageFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriageFlow")
            .field("base_url", &self.config.base_url)
            .field("cancelled", &self.token.is_cancelled())
            .field("presenter", &self.presenter)
            .finish_non_exhaustive()
    }
}
