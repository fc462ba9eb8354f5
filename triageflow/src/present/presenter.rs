//! Presentation of terminal results and their actions.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::actions::{ActionOutcome, CommentAction, ExternalLinks};
use super::card::{ticket_lookup, ResultCard};
use crate::core::{TerminalResult, TicketRef};
use crate::errors::{Result, TriageflowError};
use crate::surface::{DisplaySurface, Notice};
use crate::transport::WorkflowTransport;

/// Joins results with their tickets and owns the per-result actions.
pub struct ResultPresenter {
    surface: Arc<dyn DisplaySurface>,
    transport: Arc<dyn WorkflowTransport>,
    links: ExternalLinks,
    presented: Vec<(ResultCard, Arc<CommentAction>)>,
}

impl ResultPresenter {
    /// Creates a presenter.
    #[must_use]
    pub fn new(
        surface: Arc<dyn DisplaySurface>,
        transport: Arc<dyn WorkflowTransport>,
        links: ExternalLinks,
    ) -> Self {
        Self {
            surface,
            transport,
            links,
            presented: Vec::new(),
        }
    }

    /// Shows one card per result, in result order.
    ///
    /// A result whose ticket is not in `tickets` still gets a card, with
    /// placeholder ticket details.
    pub fn present(&mut self, results: &[TerminalResult], tickets: &[TicketRef]) -> Vec<ResultCard> {
        let lookup = ticket_lookup(tickets);
        let attached = self.surface.is_attached();

        let cards: Vec<ResultCard> = results
            .iter()
            .map(|result| ResultCard::build(result, lookup.get(result.ticket_id.as_str()).copied()))
            .collect();

        for card in &cards {
            if !card.ticket_found {
                debug!(ticket_id = %card.ticket_id, "No ticket details for result");
            }
            if attached {
                self.surface.show_result(card);
            }
            let action = Arc::new(CommentAction::new(&card.ticket_id, &card.pm_response));
            self.presented.push((card.clone(), action));
        }

        info!(results = cards.len(), tickets = tickets.len(), "Results presented");
        cards
    }

    /// Navigates to a ticket's page in the external tracker.
    ///
    /// Without a configured base URL the user is told so and nothing opens.
    pub fn open_external(&self, ticket_key: &str) -> Result<String> {
        match self.links.url_for(ticket_key) {
            Ok(url) => {
                if self.surface.is_attached() {
                    self.surface.open_url(&url);
                }
                Ok(url)
            }
            Err(err) => {
                warn!(ticket_id = %ticket_key, "External link requested without base URL");
                if self.surface.is_attached() {
                    self.surface.notify(&Notice::error(err.to_string()));
                }
                Err(err.into())
            }
        }
    }

    /// The comment action of the card at `index`.
    #[must_use]
    pub fn comment_action(&self, index: usize) -> Option<Arc<CommentAction>> {
        self.presented.get(index).map(|(_, action)| action.clone())
    }

    /// Presses the comment action of the card at `index`.
    pub async fn post_comment(&self, index: usize) -> Result<ActionOutcome> {
        let action = self.comment_action(index).ok_or_else(|| {
            TriageflowError::validation(format!("No result at position {index}"))
        })?;
        action.submit(self.transport.as_ref(), self.surface.as_ref()).await
    }

    /// Cards presented so far.
    #[must_use]
    pub fn cards(&self) -> Vec<&ResultCard> {
        self.presented.iter().map(|(card, _)| card).collect()
    }

    /// Drops presented cards and their actions.
    pub fn clear(&mut self) {
        self.presented.clear();
    }
}

impl std::fmt::Debug for ResultPresenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultPresenter")
            .field("links", &self.links)
            .field("presented", &self.presented.len())
            .finish_non_exhaustive()
    }
}
