//! Test fixtures for workflow data.

use serde_json::json;

use crate::core::{ProgressStep, TerminalResult, UserStory, WorkflowSnapshot};

/// Status line used by `snapshot`.
pub const RUNNING_STATUS: &str = "Analyzing feedback...";

/// A snapshot holding one message step per title.
#[must_use]
pub fn snapshot(titles: &[&str], complete: bool) -> WorkflowSnapshot {
    WorkflowSnapshot {
        workflow_id: Some("wf-1".to_string()),
        steps: titles
            .iter()
            .map(|title| ProgressStep::message(*title, format!("{title} details")))
            .collect(),
        current_status: RUNNING_STATUS.to_string(),
        is_complete: complete,
        ..Default::default()
    }
}

/// A terminal result for `ticket_id`.
#[must_use]
pub fn terminal_result(ticket_id: &str) -> TerminalResult {
    TerminalResult {
        ticket_id: ticket_id.to_string(),
        user_story: UserStory {
            title: format!("Fix the issue reported in {ticket_id}"),
            description: "As a user, I want the page to load quickly so that I can finish checkout."
                .to_string(),
            acceptance_criteria: vec![
                "Page loads in under two seconds".to_string(),
                "No layout shift after load".to_string(),
            ],
        },
        pm_response: format!("Thanks for reporting {ticket_id}, we have added it to the backlog."),
    }
}

/// One NDJSON line for a message step, without the trailing newline.
#[must_use]
pub fn step_line(title: &str) -> String {
    json!({
        "type": "message",
        "title": title,
        "content": format!("{title} details"),
        "timestamp": 1_696_516_205.25,
    })
    .to_string()
}

/// One NDJSON line for a tool call step.
#[must_use]
pub fn tool_line(title: &str, tool_name: &str, args: serde_json::Value) -> String {
    json!({
        "type": "tool_call",
        "title": title,
        "tool_name": tool_name,
        "args": args,
    })
    .to_string()
}
