//! Test assertions over recorded surface writes.

use super::mocks::RecordingSurface;
use crate::surface::NoticeLevel;

/// Asserts that the surface received step nodes with exactly these positions.
pub fn assert_step_positions(surface: &RecordingSurface, expected: &[usize]) {
    let actual: Vec<usize> = surface.steps().iter().map(|node| node.position).collect();
    assert_eq!(
        actual, expected,
        "Expected step positions {expected:?}, got {actual:?}"
    );
}

/// Asserts that the loading indicator ended up hidden.
pub fn assert_loading_hidden(surface: &RecordingSurface) {
    assert!(
        !surface.loading_visible(),
        "Expected loading indicator to be hidden, ops: {:?}",
        surface.ops()
    );
}

/// Asserts that a notice with this level and message was shown.
pub fn assert_notice(surface: &RecordingSurface, level: NoticeLevel, message: &str) {
    let notices = surface.notices();
    assert!(
        notices
            .iter()
            .any(|notice| notice.level == level && notice.message == message),
        "Expected {level:?} notice '{message}', got {notices:?}"
    );
}
