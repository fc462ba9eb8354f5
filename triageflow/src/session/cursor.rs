//! Delta computation for polled snapshots.

use tracing::warn;

use crate::core::{ProgressStep, SequencedStep};

/// Remembers how many steps have already been handed out.
///
/// Every snapshot carries the full step list; only the tail past the
/// remembered count is new. Re-delivering the same snapshot yields nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepCursor {
    seen: usize,
}

impl StepCursor {
    /// Creates a cursor that has seen nothing.
    #[must_use]
    pub const fn new() -> Self {
        Self { seen: 0 }
    }

    /// Number of steps already handed out.
    #[must_use]
    pub const fn seen(&self) -> usize {
        self.seen
    }

    /// Takes the full step list of a snapshot and returns the unseen tail.
    ///
    /// A list shorter than what was already seen is ignored.
    pub fn advance(&mut self, steps: Vec<ProgressStep>) -> Vec<SequencedStep> {
        let observed = steps.len();
        if observed < self.seen {
            warn!(
                seen = self.seen,
                observed,
                "Snapshot has fewer steps than already rendered, ignoring"
            );
            return Vec::new();
        }

        let start = self.seen;
        self.seen = observed;
        steps
            .into_iter()
            .skip(start)
            .enumerate()
            .map(|(offset, step)| SequencedStep::new(start + offset + 1, step))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn steps(titles: &[&str]) -> Vec<ProgressStep> {
        titles
            .iter()
            .map(|t| ProgressStep::message(*t, ""))
            .collect()
    }

    fn titles(fresh: &[SequencedStep]) -> Vec<(usize, String)> {
        fresh
            .iter()
            .map(|s| (s.position, s.step.title.clone()))
            .collect()
    }

    #[test]
    fn test_first_snapshot_yields_everything() {
        let mut cursor = StepCursor::new();
        let fresh = cursor.advance(steps(&["a", "b"]));
        assert_eq!(titles(&fresh), vec![(1, "a".to_string()), (2, "b".to_string())]);
        assert_eq!(cursor.seen(), 2);
    }

    #[test]
    fn test_duplicate_snapshot_yields_nothing() {
        let mut cursor = StepCursor::new();
        cursor.advance(steps(&["a", "b"]));
        assert!(cursor.advance(steps(&["a", "b"])).is_empty());
        assert!(cursor.advance(steps(&["a", "b"])).is_empty());
    }

    #[test]
    fn test_growth_yields_tail_only() {
        let mut cursor = StepCursor::new();
        cursor.advance(steps(&["a"]));
        let fresh = cursor.advance(steps(&["a", "b", "c"]));
        assert_eq!(titles(&fresh), vec![(2, "b".to_string()), (3, "c".to_string())]);
    }

    #[test]
    fn test_rewritten_seen_step_is_not_redelivered() {
        let mut cursor = StepCursor::new();
        cursor.advance(vec![ProgressStep::tool_call(
            "Tool Call: create_user_story",
            "create_user_story",
            serde_json::json!({}),
        )]);

        let updated = vec![ProgressStep::tool_call(
            "Tool Call: create_user_story",
            "create_user_story",
            serde_json::json!({}),
        )
        .with_result(serde_json::json!("User story created successfully"))];
        assert!(cursor.advance(updated).is_empty());
    }

    #[test]
    fn test_shrinking_snapshot_is_ignored() {
        let mut cursor = StepCursor::new();
        cursor.advance(steps(&["a", "b", "c"]));
        assert!(cursor.advance(steps(&["a"])).is_empty());
        assert_eq!(cursor.seen(), 3);

        let fresh = cursor.advance(steps(&["a", "b", "c", "d"]));
        assert_eq!(titles(&fresh), vec![(4, "d".to_string())]);
    }
}
