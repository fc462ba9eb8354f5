//! Transport layer for the workflow backend.
//!
//! This module provides:
//! - The `WorkflowTransport` trait every backend client implements
//! - An HTTP implementation over reqwest (feature `http`)
//! - Incremental newline splitting for streamed responses

#[cfg(feature = "http")]
mod http;
mod lines;

#[cfg(feature = "http")]
pub use http::HttpTransport;
pub use lines::{LineDecoder, RawLine, MAX_LINE_BYTES};

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::core::{
    CommentRequest, CommentResponse, StartWorkflowRequest, StartWorkflowResponse,
    StreamRunRequest, WorkflowSnapshot,
};
use crate::errors::TransportError;

/// Raw body chunks of a streamed response.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, TransportError>>;

/// Calls offered by the workflow backend.
///
/// Implementations report non-success statuses and network failures as
/// `TransportError`; they never retry on their own.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkflowTransport: Send + Sync {
    /// Starts a workflow and returns the issued id.
    async fn start_workflow(
        &self,
        request: &StartWorkflowRequest,
    ) -> Result<StartWorkflowResponse, TransportError>;

    /// Fetches the full snapshot of a workflow.
    async fn workflow_status(&self, workflow_id: &str) -> Result<WorkflowSnapshot, TransportError>;

    /// Starts a streaming run and returns its body.
    async fn open_run_stream(&self, request: &StreamRunRequest)
        -> Result<ByteStream, TransportError>;

    /// Posts a comment to a ticket.
    async fn post_comment(&self, request: &CommentRequest)
        -> Result<CommentResponse, TransportError>;
}
