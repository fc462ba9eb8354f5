//! Testing utilities for triageflow.
//!
//! This module provides:
//! - A scripted in-memory transport that records every call
//! - A display surface that records every write
//! - Fixtures for snapshots, results and stream lines

mod assertions;
pub mod fixtures;
mod mocks;

pub use assertions::{assert_loading_hidden, assert_notice, assert_step_positions};
pub use mocks::{RecordingSurface, ScriptedTransport, SurfaceOp, TransportCall};
