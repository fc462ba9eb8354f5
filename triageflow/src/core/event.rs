//! Progress events yielded by a workflow session.

use super::models::{ProgressStep, SequencedStep, TerminalResult, TicketRef};

/// Final payload delivered when a workflow completes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TerminalPayload {
    /// One result per processed ticket.
    pub results: Vec<TerminalResult>,
    /// Ticket side-table joined against the results.
    pub tickets: Vec<TicketRef>,
}

impl TerminalPayload {
    /// Whether there is anything to present.
    #[must_use]
    pub fn has_results(&self) -> bool {
        !self.results.is_empty()
    }
}

/// One item of the lazy progress sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// A step not seen before.
    Step(SequencedStep),
    /// The backend's status line changed.
    Status(String),
    /// The workflow finished. Only polling sources produce it, as their last event.
    Completed(TerminalPayload),
}

impl ProgressEvent {
    /// Creates a step event.
    #[must_use]
    pub fn step(position: usize, step: ProgressStep) -> Self {
        Self::Step(SequencedStep::new(position, step))
    }

    /// Whether this event ends the sequence.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Returns the step, if this is a step event.
    #[must_use]
    pub fn as_step(&self) -> Option<&SequencedStep> {
        match self {
            Self::Step(step) => Some(step),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_detection() {
        assert!(ProgressEvent::Completed(TerminalPayload::default()).is_terminal());
        assert!(!ProgressEvent::Status("Processing...".into()).is_terminal());
    }

    #[test]
    fn test_as_step() {
        let event = ProgressEvent::step(2, ProgressStep::message("Hello", "world"));
        assert_eq!(event.as_step().map(|s| s.position), Some(2));
        assert!(ProgressEvent::Status("x".into()).as_step().is_none());
    }
}
