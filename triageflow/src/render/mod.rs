//! Incremental rendering of workflow progress.
//!
//! Rendering is split into a pure function from a step to a `StepNode` and
//! an `IncrementalRenderer` that appends nodes to a `DisplaySurface`.

mod node;
mod renderer;

pub use node::{canonical_json, render_step, NodeTone, StepBody, StepNode};
pub use renderer::IncrementalRenderer;
