//! Pure step-to-node rendering.

use std::fmt;

use crate::core::timestamps::format_clock;
use crate::core::{SequencedStep, StepKind};

/// Visual tone of a step node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeTone {
    /// Informational message.
    Info,
    /// Agent reasoning.
    Thinking,
    /// Successful sub-task.
    Success,
    /// Plain message.
    Message,
    /// Failure; rendered distinctly but does not stop rendering.
    Error,
    /// Tool invocation.
    Tool,
}

impl From<StepKind> for NodeTone {
    fn from(kind: StepKind) -> Self {
        match kind {
            StepKind::Info => Self::Info,
            StepKind::Thinking => Self::Thinking,
            StepKind::Success => Self::Success,
            StepKind::Message => Self::Message,
            StepKind::Error => Self::Error,
            StepKind::ToolCall => Self::Tool,
        }
    }
}

/// Body of a step node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepBody {
    /// Freeform text.
    Text(String),
    /// Tool invocation with serialized arguments and optional result.
    ToolCall {
        /// Tool name.
        tool_name: String,
        /// Pretty-printed arguments.
        args: String,
        /// Pretty-printed result; `None` while the call is pending.
        result: Option<String>,
    },
}

/// One rendered progress step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepNode {
    /// Arrival position.
    pub position: usize,
    /// Badge text, e.g. `Step 3`.
    pub label: String,
    /// Tone.
    pub tone: NodeTone,
    /// Title.
    pub title: String,
    /// Wall-clock time, when the step carried a timestamp.
    pub time: Option<String>,
    /// Body.
    pub body: StepBody,
}

impl StepNode {
    /// Whether this node reports an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.tone == NodeTone::Error
    }

    /// Plain-text lines for a terminal transcript.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let mut header = format!("[{}] {}", self.label, self.title);
        if self.is_error() {
            header = format!("[{}] ERROR: {}", self.label, self.title);
        }
        if let Some(ref time) = self.time {
            header.push_str(&format!(" ({time})"));
        }

        let mut lines = vec![header];
        match &self.body {
            StepBody::Text(text) => {
                lines.extend(text.lines().map(|line| format!("    {line}")));
            }
            StepBody::ToolCall {
                tool_name,
                args,
                result,
            } => {
                lines.push(format!("    Tool: {tool_name}"));
                push_block(&mut lines, "Args", args);
                if let Some(result) = result {
                    push_block(&mut lines, "Result", result);
                }
            }
        }
        lines
    }
}

fn push_block(lines: &mut Vec<String>, label: &str, block: &str) {
    let mut block_lines = block.lines();
    let first = block_lines.next().unwrap_or_default();
    lines.push(format!("    {label}: {first}"));
    lines.extend(block_lines.map(|line| format!("    {line}")));
}

impl fmt::Display for StepNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join("\n"))
    }
}

/// Serializes a JSON value with sorted keys and two-space indentation.
#[must_use]
pub fn canonical_json(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Renders one step. Pure: the same step always yields the same node.
#[must_use]
pub fn render_step(sequenced: &SequencedStep) -> StepNode {
    let step = &sequenced.step;
    let body = match step.kind {
        StepKind::ToolCall => StepBody::ToolCall {
            tool_name: step.tool_name.clone().unwrap_or_else(|| "unknown".to_string()),
            args: step
                .args
                .as_ref()
                .map_or_else(|| "null".to_string(), canonical_json),
            result: step.result.as_ref().map(canonical_json),
        },
        _ => StepBody::Text(step.content.clone().unwrap_or_default()),
    };

    StepNode {
        position: sequenced.position,
        label: format!("Step {}", sequenced.position),
        tone: step.kind.into(),
        title: step.title.clone(),
        time: step.timestamp.as_ref().map(format_clock),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::timestamps::parse_unix_timestamp;
    use crate::core::ProgressStep;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_message_node() {
        let step = ProgressStep::message("Starting Workflow", "Starting analysis with JQL: x")
            .with_timestamp(parse_unix_timestamp(1_696_516_205.0).unwrap());
        let node = render_step(&SequencedStep::new(1, step));

        assert_eq!(node.label, "Step 1");
        assert_eq!(node.tone, NodeTone::Message);
        assert_eq!(node.time.as_deref(), Some("14:30:05"));
        assert_eq!(
            node.body,
            StepBody::Text("Starting analysis with JQL: x".to_string())
        );
    }

    #[test]
    fn test_tool_call_args_are_canonical() {
        let step = ProgressStep::tool_call(
            "Tool Call: get_jira_feedback",
            "get_jira_feedback",
            json!({"max_results": 3, "jql": "project = UX"}),
        );
        let node = render_step(&SequencedStep::new(2, step));

        match node.body {
            StepBody::ToolCall {
                tool_name,
                args,
                result,
            } => {
                assert_eq!(tool_name, "get_jira_feedback");
                assert_eq!(args, "{\n  \"jql\": \"project = UX\",\n  \"max_results\": 3\n}");
                assert!(result.is_none());
            }
            StepBody::Text(_) => panic!("expected a tool call body"),
        }
    }

    #[test]
    fn test_tool_call_with_result() {
        let step = ProgressStep::tool_call("t", "create_mock_feedback", json!({"count": 2}))
            .with_result(json!("Created 2 mock feedback items"));
        let node = render_step(&SequencedStep::new(3, step));

        assert_eq!(
            node.lines(),
            vec![
                "[Step 3] t".to_string(),
                "    Tool: create_mock_feedback".to_string(),
                "    Args: {".to_string(),
                "      \"count\": 2".to_string(),
                "    }".to_string(),
                "    Result: \"Created 2 mock feedback items\"".to_string(),
            ]
        );
    }

    #[test]
    fn test_error_node_is_distinct() {
        let node = render_step(&SequencedStep::new(
            4,
            ProgressStep::error("Error", "An error occurred: boom"),
        ));
        assert!(node.is_error());
        assert_eq!(node.lines()[0], "[Step 4] ERROR: Error");
    }

    #[test]
    fn test_missing_content_renders_empty() {
        let node = render_step(&SequencedStep::new(1, ProgressStep::default()));
        assert_eq!(node.body, StepBody::Text(String::new()));
        assert_eq!(node.lines().len(), 1);
    }
}
