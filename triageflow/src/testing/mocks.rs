//! In-memory transport and surface doubles.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::core::{
    CommentRequest, CommentResponse, StartWorkflowRequest, StartWorkflowResponse,
    StreamRunRequest, WorkflowSnapshot,
};
use crate::errors::TransportError;
use crate::present::{ActionState, ResultCard};
use crate::render::StepNode;
use crate::surface::{DisplaySurface, Notice};
use crate::transport::{ByteStream, WorkflowTransport};

/// A call received by a `ScriptedTransport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    /// `start_workflow`.
    Start(StartWorkflowRequest),
    /// `workflow_status` with the polled id.
    Status(String),
    /// `open_run_stream`.
    OpenStream(StreamRunRequest),
    /// `post_comment`.
    Comment(CommentRequest),
}

type StreamScript = Result<Vec<Result<Vec<u8>, TransportError>>, TransportError>;

/// A transport that replays scripted responses.
///
/// Status responses are consumed in order; once they run out, polls fail.
/// Comment responses default to success when none are queued.
#[derive(Debug)]
pub struct ScriptedTransport {
    start: Mutex<Result<String, TransportError>>,
    snapshots: Mutex<VecDeque<Result<WorkflowSnapshot, TransportError>>>,
    stream: Mutex<Option<StreamScript>>,
    stream_held_open: bool,
    comments: Mutex<VecDeque<Result<CommentResponse, TransportError>>>,
    comment_delay: Duration,
    calls: Mutex<Vec<TransportCall>>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    /// Creates a transport issuing workflow id `wf-1`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: Mutex::new(Ok("wf-1".to_string())),
            snapshots: Mutex::new(VecDeque::new()),
            stream: Mutex::new(None),
            stream_held_open: false,
            comments: Mutex::new(VecDeque::new()),
            comment_delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Sets the id returned by `start_workflow`.
    #[must_use]
    pub fn with_start_id(mut self, id: impl Into<String>) -> Self {
        *self.start.get_mut() = Ok(id.into());
        self
    }

    /// Makes `start_workflow` fail.
    #[must_use]
    pub fn with_start_error(mut self, error: TransportError) -> Self {
        *self.start.get_mut() = Err(error);
        self
    }

    /// Queues a status snapshot.
    #[must_use]
    pub fn push_snapshot(mut self, snapshot: WorkflowSnapshot) -> Self {
        self.snapshots.get_mut().push_back(Ok(snapshot));
        self
    }

    /// Queues a failing status poll.
    #[must_use]
    pub fn push_status_error(mut self, error: TransportError) -> Self {
        self.snapshots.get_mut().push_back(Err(error));
        self
    }

    /// Scripts the run stream body as successful chunks.
    #[must_use]
    pub fn with_stream_chunks(self, chunks: Vec<Vec<u8>>) -> Self {
        self.with_stream_results(chunks.into_iter().map(Ok).collect())
    }

    /// Scripts the run stream body chunk by chunk, failures included.
    #[must_use]
    pub fn with_stream_results(mut self, chunks: Vec<Result<Vec<u8>, TransportError>>) -> Self {
        *self.stream.get_mut() = Some(Ok(chunks));
        self
    }

    /// Keeps the run stream open after its scripted chunks instead of ending.
    #[must_use]
    pub fn hold_stream_open(mut self) -> Self {
        self.stream_held_open = true;
        self
    }

    /// Makes `open_run_stream` fail.
    #[must_use]
    pub fn with_stream_open_error(mut self, error: TransportError) -> Self {
        *self.stream.get_mut() = Some(Err(error));
        self
    }

    /// Queues a comment response.
    #[must_use]
    pub fn push_comment(mut self, response: Result<CommentResponse, TransportError>) -> Self {
        self.comments.get_mut().push_back(response);
        self
    }

    /// Delays every comment response.
    #[must_use]
    pub fn with_comment_delay(mut self, delay: Duration) -> Self {
        self.comment_delay = delay;
        self
    }

    /// Every call received, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().clone()
    }

    /// Number of status polls received.
    #[must_use]
    pub fn status_calls(&self) -> usize {
        self.count(|call| matches!(call, TransportCall::Status(_)))
    }

    /// Number of comment posts received.
    #[must_use]
    pub fn comment_calls(&self) -> usize {
        self.count(|call| matches!(call, TransportCall::Comment(_)))
    }

    /// Comment requests received, in order.
    #[must_use]
    pub fn comments(&self) -> Vec<CommentRequest> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                TransportCall::Comment(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    fn count(&self, predicate: impl Fn(&TransportCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|&call| predicate(call)).count()
    }

    fn record(&self, call: TransportCall) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl WorkflowTransport for ScriptedTransport {
    async fn start_workflow(
        &self,
        request: &StartWorkflowRequest,
    ) -> Result<StartWorkflowResponse, TransportError> {
        self.record(TransportCall::Start(request.clone()));
        self.start
            .lock()
            .clone()
            .map(|workflow_id| StartWorkflowResponse { workflow_id })
    }

    async fn workflow_status(&self, workflow_id: &str) -> Result<WorkflowSnapshot, TransportError> {
        self.record(TransportCall::Status(workflow_id.to_string()));
        self.snapshots
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::network("No scripted status response")))
    }

    async fn open_run_stream(
        &self,
        request: &StreamRunRequest,
    ) -> Result<ByteStream, TransportError> {
        self.record(TransportCall::OpenStream(request.clone()));
        let chunks = self.stream.lock().take().unwrap_or_else(|| Ok(Vec::new()))?;
        let body = stream::iter(chunks);
        if self.stream_held_open {
            Ok(body.chain(stream::pending()).boxed())
        } else {
            Ok(body.boxed())
        }
    }

    async fn post_comment(&self, request: &CommentRequest) -> Result<CommentResponse, TransportError> {
        self.record(TransportCall::Comment(request.clone()));
        if !self.comment_delay.is_zero() {
            tokio::time::sleep(self.comment_delay).await;
        }
        self.comments.lock().pop_front().unwrap_or_else(|| {
            Ok(CommentResponse {
                success: true,
                message: None,
            })
        })
    }
}

/// A write received by a `RecordingSurface`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceOp {
    /// `reset`.
    Reset,
    /// `append_step`.
    Step(StepNode),
    /// `scroll_to_end`.
    ScrollToEnd,
    /// `show_loading`.
    ShowLoading(String),
    /// `hide_loading`.
    HideLoading,
    /// `show_result`.
    Result(ResultCard),
    /// `notify`.
    Notify(Notice),
    /// `open_url`.
    OpenUrl(String),
    /// `set_action_state`.
    ActionState {
        /// Ticket key.
        ticket_id: String,
        /// New state.
        state: ActionState,
        /// Inline message.
        message: Option<String>,
    },
}

/// A surface that records every write, including writes made after it was
/// detached, so callers' attachment checks can be verified.
#[derive(Debug)]
pub struct RecordingSurface {
    ops: Mutex<Vec<SurfaceOp>>,
    attached: AtomicBool,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSurface {
    /// Creates an attached surface.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ops: Mutex::new(Vec::new()),
            attached: AtomicBool::new(true),
        }
    }

    /// Marks the surface as torn down.
    pub fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
    }

    /// Every write, in order.
    #[must_use]
    pub fn ops(&self) -> Vec<SurfaceOp> {
        self.ops.lock().clone()
    }

    /// Number of writes matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&SurfaceOp) -> bool) -> usize {
        self.ops.lock().iter().filter(|&op| predicate(op)).count()
    }

    /// Appended step nodes.
    #[must_use]
    pub fn steps(&self) -> Vec<StepNode> {
        self.ops
            .lock()
            .iter()
            .filter_map(|op| match op {
                SurfaceOp::Step(node) => Some(node.clone()),
                _ => None,
            })
            .collect()
    }

    /// Titles of appended step nodes.
    #[must_use]
    pub fn step_titles(&self) -> Vec<String> {
        self.steps().into_iter().map(|node| node.title).collect()
    }

    /// Shown result cards.
    #[must_use]
    pub fn results(&self) -> Vec<ResultCard> {
        self.ops
            .lock()
            .iter()
            .filter_map(|op| match op {
                SurfaceOp::Result(card) => Some(card.clone()),
                _ => None,
            })
            .collect()
    }

    /// Shown notices.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.ops
            .lock()
            .iter()
            .filter_map(|op| match op {
                SurfaceOp::Notify(notice) => Some(notice.clone()),
                _ => None,
            })
            .collect()
    }

    /// Loading messages, in the order shown.
    #[must_use]
    pub fn loading_messages(&self) -> Vec<String> {
        self.ops
            .lock()
            .iter()
            .filter_map(|op| match op {
                SurfaceOp::ShowLoading(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    /// Whether the loading indicator is currently shown.
    #[must_use]
    pub fn loading_visible(&self) -> bool {
        self.ops
            .lock()
            .iter()
            .rev()
            .find_map(|op| match op {
                SurfaceOp::ShowLoading(_) => Some(true),
                SurfaceOp::HideLoading | SurfaceOp::Reset => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }

    fn record(&self, op: SurfaceOp) {
        self.ops.lock().push(op);
    }
}

impl DisplaySurface for RecordingSurface {
    fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.record(SurfaceOp::Reset);
    }

    fn append_step(&self, node: &StepNode) {
        self.record(SurfaceOp::Step(node.clone()));
    }

    fn scroll_to_end(&self) {
        self.record(SurfaceOp::ScrollToEnd);
    }

    fn show_loading(&self, message: &str) {
        self.record(SurfaceOp::ShowLoading(message.to_string()));
    }

    fn hide_loading(&self) {
        self.record(SurfaceOp::HideLoading);
    }

    fn show_result(&self, card: &ResultCard) {
        self.record(SurfaceOp::Result(card.clone()));
    }

    fn notify(&self, notice: &Notice) {
        self.record(SurfaceOp::Notify(notice.clone()));
    }

    fn open_url(&self, url: &str) {
        self.record(SurfaceOp::OpenUrl(url.to_string()));
    }

    fn set_action_state(&self, ticket_id: &str, state: ActionState, message: Option<&str>) {
        self.record(SurfaceOp::ActionState {
            ticket_id: ticket_id.to_string(),
            state,
            message: message.map(str::to_string),
        });
    }
}
