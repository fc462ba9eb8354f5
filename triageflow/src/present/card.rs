//! Result cards: a terminal result joined with its ticket.

use std::collections::HashMap;

use crate::core::{TerminalResult, TicketRef};

/// Summary shown when the ticket side-table has no entry for a result.
pub const TICKET_NOT_AVAILABLE: &str = "Ticket details not available";
/// Description shown when the ticket has none.
pub const NO_DESCRIPTION: &str = "No description provided";

/// One presented result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultCard {
    /// Ticket key.
    pub ticket_id: String,
    /// Whether ticket details were found.
    pub ticket_found: bool,
    /// Ticket summary or the not-available placeholder.
    pub ticket_summary: String,
    /// Ticket description; empty when the ticket is missing.
    pub ticket_description: String,
    /// User story title.
    pub story_title: String,
    /// User story description.
    pub story_description: String,
    /// Acceptance criteria in order.
    pub acceptance_criteria: Vec<String>,
    /// Suggested product-manager response.
    pub pm_response: String,
}

impl ResultCard {
    /// Joins a result with its ticket, if any.
    #[must_use]
    pub fn build(result: &TerminalResult, ticket: Option<&TicketRef>) -> Self {
        let (ticket_found, ticket_summary, ticket_description) = match ticket {
            Some(ticket) => (
                true,
                ticket.summary.clone(),
                ticket
                    .description
                    .as_deref()
                    .filter(|d| !d.trim().is_empty())
                    .unwrap_or(NO_DESCRIPTION)
                    .to_string(),
            ),
            None => (false, TICKET_NOT_AVAILABLE.to_string(), String::new()),
        };

        Self {
            ticket_id: result.ticket_id.clone(),
            ticket_found,
            ticket_summary,
            ticket_description,
            story_title: result.user_story.title.clone(),
            story_description: result.user_story.description.clone(),
            acceptance_criteria: result.user_story.acceptance_criteria.clone(),
            pm_response: result.pm_response.clone(),
        }
    }

    /// Plain-text lines for a terminal transcript.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("== {} ==", self.ticket_id),
            format!("Feedback: {}", self.ticket_summary),
        ];
        if !self.ticket_description.is_empty() {
            lines.push(format!("  {}", self.ticket_description));
        }
        lines.push(format!("User story: {}", self.story_title));
        if !self.story_description.is_empty() {
            lines.push(format!("  {}", self.story_description));
        }
        if !self.acceptance_criteria.is_empty() {
            lines.push("Acceptance criteria:".to_string());
            lines.extend(self.acceptance_criteria.iter().map(|c| format!("  - {c}")));
        }
        lines.push(format!("PM response: {}", self.pm_response));
        lines
    }
}

/// Builds a key to ticket lookup. Later duplicates replace earlier ones.
#[must_use]
pub fn ticket_lookup(tickets: &[TicketRef]) -> HashMap<&str, &TicketRef> {
    tickets.iter().map(|t| (t.key.as_str(), t)).collect()
}
