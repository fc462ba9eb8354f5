//! Display surfaces.
//!
//! A surface is whatever the rendered output lands on. Renderers and
//! presenters only ever append to it or update transient indicators; a surface
//! that has been torn down reports itself detached and writes become no-ops.

mod transcript;

pub use transcript::TranscriptSurface;

use crate::present::{ActionState, ResultCard};
use crate::render::StepNode;

/// Severity of a user-visible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Confirmation.
    Info,
    /// Blocking error.
    Error,
}

/// A user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Text shown to the user.
    pub message: String,
}

impl Notice {
    /// Creates an informational notice.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    /// Creates an error notice.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Where progress and results are displayed.
///
/// Methods take `&self`; implementations use interior mutability so one
/// surface can be shared by the renderer and the presenter.
pub trait DisplaySurface: Send + Sync {
    /// Whether the surface can still be written to.
    fn is_attached(&self) -> bool {
        true
    }

    /// Clears steps, results and indicators before a new job.
    fn reset(&self);

    /// Appends a step node after every existing one.
    fn append_step(&self, node: &StepNode);

    /// Best-effort request to bring the newest node into view.
    fn scroll_to_end(&self) {}

    /// Shows or updates the loading indicator.
    fn show_loading(&self, message: &str);

    /// Hides the loading indicator.
    fn hide_loading(&self);

    /// Appends a result card.
    fn show_result(&self, card: &ResultCard);

    /// Shows a notification.
    fn notify(&self, notice: &Notice);

    /// Navigates to an external URL.
    fn open_url(&self, url: &str);

    /// Reflects the state of a ticket's comment action, with an inline
    /// message when the last attempt failed.
    fn set_action_state(&self, ticket_id: &str, state: ActionState, message: Option<&str>);
}
