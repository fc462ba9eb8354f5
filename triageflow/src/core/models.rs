//! Wire and domain records exchanged with the workflow backend.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::timestamps::{self, Timestamp};

/// Opaque identifier issued by the backend when a workflow starts.
///
/// Handles are moved into the subscription that follows them, so a handle
/// cannot be followed twice.
#[derive(Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowHandle(String);

impl WorkflowHandle {
    /// Wraps a backend-issued identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkflowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of a progress step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Informational progress message.
    Info,
    /// The agent is reasoning.
    Thinking,
    /// A sub-task finished successfully.
    Success,
    /// A failure reported by the workflow.
    Error,
    /// A structured tool invocation record.
    ToolCall,
    /// Freeform message; also the fallback for unknown kinds.
    #[default]
    #[serde(other)]
    Message,
}

impl StepKind {
    /// Returns the wire name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Thinking => "thinking",
            Self::Success => "success",
            Self::Error => "error",
            Self::ToolCall => "tool_call",
            Self::Message => "message",
        }
    }
}

/// One unit of workflow progress.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProgressStep {
    /// Step kind.
    #[serde(rename = "type", default)]
    pub kind: StepKind,
    /// Short title.
    #[serde(default)]
    pub title: String,
    /// When the step was recorded.
    #[serde(
        default,
        deserialize_with = "timestamps::deserialize_flexible",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<Timestamp>,
    /// Freeform text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Tool name for tool calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    /// Tool arguments for tool calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<serde_json::Value>,
    /// Tool result; absent while the call is still pending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

impl ProgressStep {
    /// Creates a step of the given kind.
    #[must_use]
    pub fn new(kind: StepKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            ..Default::default()
        }
    }

    /// Creates a freeform message step.
    #[must_use]
    pub fn message(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(StepKind::Message, title).with_content(content)
    }

    /// Creates an error step.
    #[must_use]
    pub fn error(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(StepKind::Error, title).with_content(content)
    }

    /// Creates a tool call step.
    #[must_use]
    pub fn tool_call(
        title: impl Into<String>,
        tool_name: impl Into<String>,
        args: serde_json::Value,
    ) -> Self {
        Self {
            kind: StepKind::ToolCall,
            title: title.into(),
            tool_name: Some(tool_name.into()),
            args: Some(args),
            ..Default::default()
        }
    }

    /// Sets the content.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Sets the tool result.
    #[must_use]
    pub fn with_result(mut self, result: serde_json::Value) -> Self {
        self.result = Some(result);
        self
    }

    /// Sets the timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Whether this is a tool call.
    #[must_use]
    pub fn is_tool_call(&self) -> bool {
        self.kind == StepKind::ToolCall
    }
}

/// A step tagged with its 1-based arrival position.
#[derive(Debug, Clone, PartialEq)]
pub struct SequencedStep {
    /// Arrival position, starting at 1.
    pub position: usize,
    /// The step itself.
    pub step: ProgressStep,
}

impl SequencedStep {
    /// Creates a sequenced step.
    #[must_use]
    pub fn new(position: usize, step: ProgressStep) -> Self {
        Self { position, step }
    }
}

/// A generated user story.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserStory {
    /// Story title.
    #[serde(default)]
    pub title: String,
    /// Story body.
    #[serde(default)]
    pub description: String,
    /// Acceptance criteria in order.
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
}

/// Final artifact produced for one input ticket.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TerminalResult {
    /// Key of the ticket this result belongs to.
    pub ticket_id: String,
    /// Generated user story.
    #[serde(default)]
    pub user_story: UserStory,
    /// Suggested product-manager reply.
    #[serde(default)]
    pub pm_response: String,
}

/// Ticket details supplied alongside the results.
///
/// The backend sends the full ticket record; fields not listed here are
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TicketRef {
    /// Ticket key, e.g. `UX-101`.
    pub key: String,
    /// One-line summary.
    #[serde(default)]
    pub summary: String,
    /// Longer description; may be empty.
    #[serde(default)]
    pub description: Option<String>,
}

impl TicketRef {
    /// Creates a ticket reference.
    #[must_use]
    pub fn new(key: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            summary: summary.into(),
            description: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Full state of a workflow as returned by the status endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkflowSnapshot {
    /// Echo of the workflow id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    /// Every step observed so far, in order.
    #[serde(default)]
    pub steps: Vec<ProgressStep>,
    /// Human readable status line.
    #[serde(default)]
    pub current_status: String,
    /// Whether the workflow has finished.
    #[serde(default)]
    pub is_complete: bool,
    /// Terminal results, populated once complete.
    #[serde(default)]
    pub results: Vec<TerminalResult>,
    /// Ticket side-table for the results.
    #[serde(default)]
    pub tickets: Vec<TicketRef>,
}

/// A feedback item supplied inline instead of querying the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockFeedbackItem {
    /// Ticket key.
    pub key: String,
    /// Summary line.
    pub summary: String,
    /// Description.
    pub description: String,
    /// Labels.
    pub labels: Vec<String>,
}

impl MockFeedbackItem {
    /// Builds an item from raw form fields.
    ///
    /// `index` is the number of items already collected. Returns `None` when
    /// the summary is blank. Labels are comma-separated and default to
    /// `feedback`; a blank key becomes `UX-{101 + index}`.
    #[must_use]
    pub fn from_form(
        key: &str,
        summary: &str,
        description: &str,
        labels_text: &str,
        index: usize,
    ) -> Option<Self> {
        let summary = summary.trim();
        if summary.is_empty() {
            return None;
        }

        let labels_text = labels_text.trim();
        let labels = if labels_text.is_empty() {
            vec!["feedback".to_string()]
        } else {
            labels_text.split(',').map(|label| label.trim().to_string()).collect()
        };

        let key = key.trim();
        let key = if key.is_empty() {
            format!("UX-{}", 100 + index + 1)
        } else {
            key.to_string()
        };

        Some(Self {
            key,
            summary: summary.to_string(),
            description: description.trim().to_string(),
            labels,
        })
    }
}

/// Canned feedback items for trying the workflow without a tracker.
#[must_use]
pub fn sample_mock_feedback() -> Vec<MockFeedbackItem> {
    [
        (
            "UX-101",
            "Difficult to find the export button",
            "I was trying to export my data but couldn't find the button anywhere. After 5 minutes of searching, I found it hidden in a submenu. This should be more prominent.",
            "feedback, ui, export",
        ),
        (
            "UX-102",
            "Dashboard loads too slowly",
            "The dashboard takes over 10 seconds to load on my computer. This is frustrating when I need to quickly check my stats.",
            "feedback, performance",
        ),
        (
            "UX-103",
            "Love the new dark mode feature",
            "The dark mode is excellent! It's much easier on my eyes when working late at night. Would love to see more customization options though.",
            "feedback, ui, positive",
        ),
    ]
    .iter()
    .enumerate()
    .filter_map(|(index, (key, summary, description, labels))| {
        MockFeedbackItem::from_form(key, summary, description, labels, index)
    })
    .collect()
}

/// Request body for starting a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartWorkflowRequest {
    /// Tracker query selecting the feedback tickets.
    pub jql: String,
    /// Maximum number of tickets to process.
    pub max_results: u32,
    /// Keep the agent thread across requests.
    pub persist_thread: bool,
    /// Post the generated responses back to the tracker.
    pub post_to_jira: bool,
    /// Inline feedback items; when non-empty the query is not run.
    #[serde(default)]
    pub mock_feedback_items: Vec<MockFeedbackItem>,
}

impl StartWorkflowRequest {
    /// Creates a request with default options.
    #[must_use]
    pub fn new(jql: impl Into<String>) -> Self {
        Self {
            jql: jql.into(),
            max_results: 3,
            persist_thread: false,
            post_to_jira: false,
            mock_feedback_items: Vec::new(),
        }
    }

    /// Sets the maximum number of tickets.
    #[must_use]
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    /// Sets whether the thread is persisted.
    #[must_use]
    pub fn with_persist_thread(mut self, persist: bool) -> Self {
        self.persist_thread = persist;
        self
    }

    /// Sets whether responses are posted to the tracker.
    #[must_use]
    pub fn with_post_to_jira(mut self, post: bool) -> Self {
        self.post_to_jira = post;
        self
    }

    /// Sets the inline feedback items.
    #[must_use]
    pub fn with_mock_feedback(mut self, items: Vec<MockFeedbackItem>) -> Self {
        self.mock_feedback_items = items;
        self
    }
}

/// Response of the start endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartWorkflowResponse {
    /// Issued workflow id.
    pub workflow_id: String,
}

/// Request body for the streaming run endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRunRequest {
    /// Tracker URL the run should process.
    pub jira_url: String,
}

impl StreamRunRequest {
    /// Creates a stream run request.
    #[must_use]
    pub fn new(jira_url: impl Into<String>) -> Self {
        Self {
            jira_url: jira_url.into(),
        }
    }
}

/// Request body for posting a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRequest {
    /// Ticket to comment on.
    pub ticket_id: String,
    /// Comment body.
    pub comment: String,
}

/// Response of the comment endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommentResponse {
    /// Whether the comment was posted.
    #[serde(default)]
    pub success: bool,
    /// Server message.
    #[serde(default)]
    pub message: Option<String>,
}
