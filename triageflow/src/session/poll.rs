//! Poll-based progress source.

use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::cursor::StepCursor;
use super::{EventStream, ProgressSource};
use crate::cancellation::CancellationToken;
use crate::core::{ProgressEvent, TerminalPayload, WorkflowHandle, WorkflowSnapshot};
use crate::errors::Result;
use crate::transport::WorkflowTransport;

/// Status shown when the backend reports none.
pub const DEFAULT_STATUS: &str = "Processing...";

/// Follows a workflow by polling its status endpoint.
///
/// Requests are strictly sequential: request, response, delay, next
/// request. The source ends after the completion event, after the first
/// error, or when its token is cancelled.
pub struct PollingSource {
    transport: Arc<dyn WorkflowTransport>,
    handle: WorkflowHandle,
    interval: Duration,
    token: Arc<CancellationToken>,
}

impl PollingSource {
    pub(crate) fn new(
        transport: Arc<dyn WorkflowTransport>,
        handle: WorkflowHandle,
        interval: Duration,
        token: Arc<CancellationToken>,
    ) -> Self {
        Self {
            transport,
            handle,
            interval,
            token,
        }
    }

    /// The workflow being followed.
    #[must_use]
    pub fn handle(&self) -> &WorkflowHandle {
        &self.handle
    }

    /// Converts into the event sequence.
    pub fn events(self) -> EventStream {
        Box::new(self).into_events()
    }
}

impl ProgressSource for PollingSource {
    fn into_events(self: Box<Self>) -> EventStream {
        let state = PollState {
            transport: self.transport,
            handle: self.handle,
            interval: self.interval,
            token: self.token,
            cursor: StepCursor::new(),
            last_status: None,
            pending: VecDeque::new(),
            polls: 0,
            finished: false,
        };
        stream::unfold(state, next_event).boxed()
    }
}

struct PollState {
    transport: Arc<dyn WorkflowTransport>,
    handle: WorkflowHandle,
    interval: Duration,
    token: Arc<CancellationToken>,
    cursor: StepCursor,
    last_status: Option<String>,
    pending: VecDeque<Result<ProgressEvent>>,
    polls: usize,
    finished: bool,
}

impl PollState {
    fn absorb(&mut self, snapshot: WorkflowSnapshot) {
        let WorkflowSnapshot {
            steps,
            current_status,
            is_complete,
            results,
            tickets,
            ..
        } = snapshot;

        for step in self.cursor.advance(steps) {
            self.pending.push_back(Ok(ProgressEvent::Step(step)));
        }

        let status = if current_status.trim().is_empty() {
            DEFAULT_STATUS.to_string()
        } else {
            current_status
        };
        if self.last_status.as_deref() != Some(status.as_str()) {
            self.last_status = Some(status.clone());
            self.pending.push_back(Ok(ProgressEvent::Status(status)));
        }

        if is_complete {
            info!(
                workflow_id = %self.handle,
                steps = self.cursor.seen(),
                results = results.len(),
                "Workflow complete"
            );
            self.finished = true;
            self.pending
                .push_back(Ok(ProgressEvent::Completed(TerminalPayload { results, tickets })));
        }
    }
}

async fn next_event(mut state: PollState) -> Option<(Result<ProgressEvent>, PollState)> {
    loop {
        if let Some(item) = state.pending.pop_front() {
            return Some((item, state));
        }
        if state.finished {
            return None;
        }

        let token = state.token.clone();
        if token.is_cancelled() {
            debug!(workflow_id = %state.handle, "Polling stopped by cancellation");
            return None;
        }

        if state.polls > 0 {
            tokio::select! {
                () = token.cancelled() => {
                    debug!(workflow_id = %state.handle, "Polling stopped by cancellation");
                    return None;
                }
                () = tokio::time::sleep(state.interval) => {}
            }
        }

        state.polls += 1;
        let fetched = tokio::select! {
            () = token.cancelled() => {
                debug!(workflow_id = %state.handle, "Polling stopped by cancellation");
                return None;
            }
            fetched = state.transport.workflow_status(state.handle.as_str()) => fetched,
        };

        match fetched {
            Ok(snapshot) => {
                debug!(
                    workflow_id = %state.handle,
                    poll = state.polls,
                    steps = snapshot.steps.len(),
                    "Polled workflow status"
                );
                state.absorb(snapshot);
            }
            Err(err) => {
                warn!(workflow_id = %state.handle, error = %err, "Polling failed");
                state.finished = true;
                state.pending.push_back(Err(err.into()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{TransportError, TriageflowError};
    use crate::testing::{fixtures, ScriptedTransport, TransportCall};
    use pretty_assertions::assert_eq;

    fn source(transport: Arc<ScriptedTransport>, token: Arc<CancellationToken>) -> PollingSource {
        PollingSource::new(
            transport,
            WorkflowHandle::new("wf-1"),
            Duration::from_millis(1),
            token,
        )
    }

    async fn collect(source: PollingSource) -> Vec<Result<ProgressEvent>> {
        source.events().collect().await
    }

    fn step_titles(events: &[Result<ProgressEvent>]) -> Vec<(usize, String)> {
        events
            .iter()
            .filter_map(|e| e.as_ref().ok().and_then(ProgressEvent::as_step))
            .map(|s| (s.position, s.step.title.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_duplicate_snapshots_emit_each_step_once() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .push_snapshot(fixtures::snapshot(&["a"], false))
                .push_snapshot(fixtures::snapshot(&["a"], false))
                .push_snapshot(fixtures::snapshot(&["a", "b"], false))
                .push_snapshot(fixtures::snapshot(&["a", "b"], false))
                .push_snapshot(fixtures::snapshot(&["a", "b", "c"], true)),
        );

        let events = collect(source(transport.clone(), Arc::default())).await;

        assert_eq!(
            step_titles(&events),
            vec![
                (1, "a".to_string()),
                (2, "b".to_string()),
                (3, "c".to_string())
            ]
        );
        assert!(events.last().unwrap().as_ref().unwrap().is_terminal());
        assert_eq!(transport.status_calls(), 5);
    }

    #[tokio::test]
    async fn test_status_changes_are_reported_once() {
        let mut first = fixtures::snapshot(&["a"], false);
        first.current_status = String::new();
        let mut second = fixtures::snapshot(&["a"], false);
        second.current_status = "Fetching JIRA tickets...".to_string();
        let mut third = fixtures::snapshot(&["a"], true);
        third.current_status = "Fetching JIRA tickets...".to_string();

        let transport = Arc::new(
            ScriptedTransport::new()
                .push_snapshot(first)
                .push_snapshot(second)
                .push_snapshot(third),
        );

        let statuses: Vec<String> = collect(source(transport, Arc::default()))
            .await
            .into_iter()
            .filter_map(|e| match e {
                Ok(ProgressEvent::Status(s)) => Some(s),
                _ => None,
            })
            .collect();

        assert_eq!(
            statuses,
            vec![DEFAULT_STATUS.to_string(), "Fetching JIRA tickets...".to_string()]
        );
    }

    #[tokio::test]
    async fn test_completion_carries_results() {
        let mut done = fixtures::snapshot(&["a"], true);
        done.results = vec![fixtures::terminal_result("UX-1")];
        done.tickets = vec![crate::core::TicketRef::new("UX-1", "S")];
        let transport = Arc::new(ScriptedTransport::new().push_snapshot(done));

        let events = collect(source(transport, Arc::default())).await;
        match events.last() {
            Some(Ok(ProgressEvent::Completed(payload))) => {
                assert_eq!(payload.results.len(), 1);
                assert_eq!(payload.tickets[0].summary, "S");
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transport_error_stops_polling() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .push_snapshot(fixtures::snapshot(&["a"], false))
                .push_status_error(TransportError::status(500))
                .push_snapshot(fixtures::snapshot(&["a", "b"], true)),
        );

        let events = collect(source(transport.clone(), Arc::default())).await;

        assert_eq!(step_titles(&events), vec![(1, "a".to_string())]);
        assert!(matches!(
            events.last(),
            Some(Err(TriageflowError::Transport(TransportError { status: Some(500), .. })))
        ));
        assert_eq!(transport.status_calls(), 2);
    }

    #[tokio::test]
    async fn test_cancel_during_delay_prevents_next_request() {
        let transport = Arc::new(
            ScriptedTransport::new().push_snapshot(fixtures::snapshot(&["a"], false)),
        );
        let token = Arc::new(CancellationToken::new());
        let polling = PollingSource::new(
            transport.clone(),
            WorkflowHandle::new("wf-1"),
            Duration::from_secs(60),
            token.clone(),
        );

        let mut events = polling.events();
        let first = events.next().await;
        assert!(matches!(first, Some(Ok(ProgressEvent::Step(_)))));
        let status = events.next().await;
        assert!(matches!(status, Some(Ok(ProgressEvent::Status(_)))));

        let canceller = {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                token.cancel("navigated away");
            })
        };

        let next = tokio::time::timeout(Duration::from_secs(5), events.next())
            .await
            .expect("cancellation should interrupt the delay");
        assert!(next.is_none());
        canceller.await.unwrap();

        assert_eq!(transport.status_calls(), 1);
        assert_eq!(
            transport.calls(),
            vec![TransportCall::Status("wf-1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_already_cancelled_issues_no_request() {
        let transport = Arc::new(ScriptedTransport::new());
        let token = Arc::new(CancellationToken::new());
        token.cancel("gone");

        let events = collect(source(transport.clone(), token)).await;
        assert!(events.is_empty());
        assert_eq!(transport.status_calls(), 0);
    }
}
