//! # Triageflow
//!
//! Client for feedback-triage workflows.
//!
//! Triageflow submits a triage job to the workflow backend, follows its
//! progress and presents what it produced:
//!
//! - **Sessions**: start a job, then follow it by polling a status endpoint or
//!   by reading a newline-delimited JSON stream; both produce the same lazy
//!   sequence of progress events
//! - **Incremental rendering**: each step is appended to a display surface
//!   exactly once, in arrival order
//! - **Result presentation**: generated user stories joined with their
//!   tickets, plus the open-ticket and post-comment actions
//! - **Cancellation**: abandoning a flow stops polling and reading promptly
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use triageflow::prelude::*;
//!
//! let config = ClientConfig::from_env()?;
//! let surface = Arc::new(TranscriptSurface::stdout());
//! let mut flow = TriageFlow::http(config, surface)?;
//!
//! let cards = flow
//!     .run_polling(&StartWorkflowRequest::new("project = UX AND labels = feedback"))
//!     .await?;
//! if !cards.is_empty() {
//!     flow.post_comment(0).await?;
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod config;
pub mod core;
pub mod errors;
pub mod flow;
pub mod observability;
pub mod present;
pub mod render;
pub mod session;
pub mod surface;
pub mod testing;
pub mod transport;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::ClientConfig;
    pub use crate::core::{
        MockFeedbackItem, ProgressEvent, ProgressStep, SequencedStep, StartWorkflowRequest,
        StepKind, StreamRunRequest, TerminalResult, TicketRef, WorkflowHandle, WorkflowSnapshot,
    };
    pub use crate::errors::{
        ActionError, ConfigError, DecodeError, Result, TransportError, TriageflowError,
    };
    pub use crate::flow::TriageFlow;
    pub use crate::observability::{init_tracing, LogFormat};
    pub use crate::present::{
        ActionOutcome, ActionState, CommentAction, ExternalLinks, ResultCard, ResultPresenter,
    };
    pub use crate::render::{render_step, IncrementalRenderer, StepNode};
    pub use crate::session::{
        PollingSource, ProgressSource, StreamingSource, WorkflowSession,
    };
    pub use crate::surface::{DisplaySurface, Notice, TranscriptSurface};
    #[cfg(feature = "http")]
    pub use crate::transport::HttpTransport;
    pub use crate::transport::WorkflowTransport;
    pub use std::sync::Arc;
}
