//! Append-only rendering of progress steps.

use std::sync::Arc;
use tracing::{debug, trace};

use super::node::render_step;
use crate::core::SequencedStep;
use crate::surface::DisplaySurface;

/// Appends one node per new step and never touches earlier nodes.
///
/// The renderer is agnostic to how steps were sourced; it only relies on
/// positions increasing. A step at or below the last rendered position is
/// dropped, which makes redelivery harmless.
pub struct IncrementalRenderer {
    surface: Arc<dyn DisplaySurface>,
    rendered: usize,
}

impl IncrementalRenderer {
    /// Creates a renderer over a surface.
    #[must_use]
    pub fn new(surface: Arc<dyn DisplaySurface>) -> Self {
        Self {
            surface,
            rendered: 0,
        }
    }

    /// Renders a step. Returns whether a node was appended.
    pub fn render(&mut self, step: &SequencedStep) -> bool {
        if step.position <= self.rendered {
            debug!(
                position = step.position,
                rendered = self.rendered,
                "Step already rendered, skipping"
            );
            return false;
        }
        if !self.surface.is_attached() {
            trace!(position = step.position, "Surface detached, dropping step");
            return false;
        }

        let node = render_step(step);
        self.surface.append_step(&node);
        self.surface.scroll_to_end();
        self.rendered = step.position;
        true
    }

    /// Position of the last rendered step, 0 if none.
    #[must_use]
    pub fn rendered_position(&self) -> usize {
        self.rendered
    }

    /// Forgets rendered steps so a new job can start at position 1.
    ///
    /// The surface itself is reset by the caller.
    pub fn restart(&mut self) {
        self.rendered = 0;
    }
}
