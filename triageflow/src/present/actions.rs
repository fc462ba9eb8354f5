//! User-triggered follow-up actions on a presented result.

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::core::CommentRequest;
use crate::errors::{ActionError, ConfigError, Result};
use crate::surface::{DisplaySurface, Notice};
use crate::transport::WorkflowTransport;

/// Loading text shown while a comment is posted.
pub const POSTING_COMMENT: &str = "Posting comment to JIRA...";

/// State of a side-effecting action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionState {
    /// Can be triggered.
    #[default]
    Available,
    /// A request is outstanding; presses are ignored.
    InFlight,
    /// Done; the action stays disabled.
    Completed,
}

impl ActionState {
    /// Short label for display.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::InFlight => "posting",
            Self::Completed => "posted",
        }
    }
}

/// What a press did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The backend accepted the action.
    Completed {
        /// Server message, if any.
        message: Option<String>,
    },
    /// The press was ignored because the action was in flight or done.
    Ignored(ActionState),
}

/// Posts a result's PM response as a comment on its ticket.
///
/// `available -> in-flight -> completed` on success, back to `available` on
/// failure so the user can retry.
#[derive(Debug)]
pub struct CommentAction {
    request: CommentRequest,
    state: Mutex<ActionState>,
}

impl CommentAction {
    /// Creates an available action.
    #[must_use]
    pub fn new(ticket_id: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            request: CommentRequest {
                ticket_id: ticket_id.into(),
                comment: comment.into(),
            },
            state: Mutex::new(ActionState::Available),
        }
    }

    /// Ticket targeted by the action.
    #[must_use]
    pub fn ticket_id(&self) -> &str {
        &self.request.ticket_id
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ActionState {
        *self.state.lock()
    }

    fn try_begin(&self) -> std::result::Result<(), ActionState> {
        let mut state = self.state.lock();
        match *state {
            ActionState::Available => {
                *state = ActionState::InFlight;
                Ok(())
            }
            other => Err(other),
        }
    }

    fn settle(&self, state: ActionState) {
        *self.state.lock() = state;
    }

    /// Handles a press.
    ///
    /// Dropping the returned future before the backend answers returns the
    /// action to `available` and clears the loading indicator.
    pub async fn submit(
        &self,
        transport: &dyn WorkflowTransport,
        surface: &dyn DisplaySurface,
    ) -> Result<ActionOutcome> {
        if let Err(current) = self.try_begin() {
            debug!(ticket_id = %self.ticket_id(), state = current.label(), "Comment press ignored");
            return Ok(ActionOutcome::Ignored(current));
        }

        let attached = surface.is_attached();
        if attached {
            surface.set_action_state(self.ticket_id(), ActionState::InFlight, None);
            surface.show_loading(POSTING_COMMENT);
        }

        let guard = InFlightGuard {
            action: self,
            surface,
        };
        let response = transport.post_comment(&self.request).await;
        std::mem::forget(guard);

        let attached = attached && surface.is_attached();
        if attached {
            surface.hide_loading();
        }

        let failure = match response {
            Ok(response) if response.success => {
                self.settle(ActionState::Completed);
                info!(ticket_id = %self.ticket_id(), "Comment posted");
                if attached {
                    surface.set_action_state(self.ticket_id(), ActionState::Completed, None);
                    surface.notify(&Notice::info("Comment posted successfully!"));
                }
                return Ok(ActionOutcome::Completed {
                    message: response.message,
                });
            }
            Ok(response) => response
                .message
                .unwrap_or_else(|| "Comment was not posted".to_string()),
            Err(err) => err.to_string(),
        };

        self.settle(ActionState::Available);
        warn!(ticket_id = %self.ticket_id(), error = %failure, "Comment failed");
        if attached {
            surface.set_action_state(self.ticket_id(), ActionState::Available, Some(&failure));
        }
        Err(ActionError::new(self.ticket_id(), failure).into())
    }
}

/// Settles an abandoned submit back to `available`.
///
/// Forgotten once the backend has answered.
struct InFlightGuard<'a> {
    action: &'a CommentAction,
    surface: &'a dyn DisplaySurface,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.action.settle(ActionState::Available);
        warn!(ticket_id = %self.action.ticket_id(), "Comment abandoned before the backend answered");
        if self.surface.is_attached() {
            self.surface.hide_loading();
            self.surface
                .set_action_state(self.action.ticket_id(), ActionState::Available, None);
        }
    }
}

/// Builds links into the external ticket tracker.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExternalLinks {
    base_url: Option<String>,
}

impl ExternalLinks {
    /// Creates links under `base_url`; `None` disables navigation.
    #[must_use]
    pub fn new(base_url: Option<String>) -> Self {
        let base_url = base_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());
        Self { base_url }
    }

    /// Creates links from configuration.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.external_base_url.clone())
    }

    /// Whether a base URL is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    /// URL of a ticket's page.
    pub fn url_for(&self, ticket_key: &str) -> std::result::Result<String, ConfigError> {
        self.base_url
            .as_ref()
            .map(|base| format!("{base}/browse/{ticket_key}"))
            .ok_or(ConfigError::MissingExternalBaseUrl)
    }
}
