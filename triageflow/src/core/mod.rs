//! Core domain model types for triageflow.
//!
//! This module contains the records exchanged with the workflow backend and
//! the progress events produced by a session:
//! - Workflow handles, steps and snapshots
//! - Terminal results and ticket references
//! - Progress events

mod event;
mod models;
pub mod timestamps;

pub use event::{ProgressEvent, TerminalPayload};
pub use models::{
    sample_mock_feedback, CommentRequest, CommentResponse, MockFeedbackItem, ProgressStep,
    SequencedStep, StartWorkflowRequest, StartWorkflowResponse, StepKind, StreamRunRequest,
    TerminalResult, TicketRef, UserStory, WorkflowHandle, WorkflowSnapshot,
};
pub use timestamps::Timestamp;
