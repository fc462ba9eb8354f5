//! Stream-based progress source.

use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{EventStream, ProgressSource};
use crate::cancellation::CancellationToken;
use crate::core::{ProgressEvent, ProgressStep, StreamRunRequest};
use crate::errors::{DecodeError, Result};
use crate::transport::{ByteStream, LineDecoder, RawLine, WorkflowTransport};

/// Follows a run by reading its newline-delimited JSON response.
///
/// The request is only sent once the sequence is first polled. Lines that
/// fail to decode are logged and skipped; the sequence ends at end-of-stream.
pub struct StreamingSource {
    transport: Arc<dyn WorkflowTransport>,
    request: StreamRunRequest,
    token: Arc<CancellationToken>,
}

impl StreamingSource {
    pub(crate) fn new(
        transport: Arc<dyn WorkflowTransport>,
        request: StreamRunRequest,
        token: Arc<CancellationToken>,
    ) -> Self {
        Self {
            transport,
            request,
            token,
        }
    }

    /// Converts into the event sequence.
    pub fn events(self) -> EventStream {
        Box::new(self).into_events()
    }
}

impl ProgressSource for StreamingSource {
    fn into_events(self: Box<Self>) -> EventStream {
        let state = StreamState {
            transport: self.transport,
            request: self.request,
            token: self.token,
            phase: Phase::Opening,
            decoder: LineDecoder::new(),
            pending: VecDeque::new(),
            emitted: 0,
        };
        stream::unfold(state, next_event).boxed()
    }
}

/// Decodes one streamed line into a step.
///
/// Blank lines yield `None`. Every other line must hold a JSON object.
pub fn decode_line(line: &RawLine) -> Option<std::result::Result<ProgressStep, DecodeError>> {
    if line.is_blank() {
        return None;
    }
    let text = line.text.trim();
    if !text.starts_with('{') {
        return Some(Err(DecodeError::new(line.number, "expected a JSON object")));
    }
    Some(
        serde_json::from_str::<ProgressStep>(text)
            .map_err(|e| DecodeError::new(line.number, e.to_string())),
    )
}

enum Phase {
    Opening,
    Reading(ByteStream),
    Done,
}

struct StreamState {
    transport: Arc<dyn WorkflowTransport>,
    request: StreamRunRequest,
    token: Arc<CancellationToken>,
    phase: Phase,
    decoder: LineDecoder,
    pending: VecDeque<Result<ProgressEvent>>,
    emitted: usize,
}

impl StreamState {
    fn accept(&mut self, line: &RawLine) {
        match decode_line(line) {
            None => {}
            Some(Ok(step)) => {
                self.emitted += 1;
                self.pending
                    .push_back(Ok(ProgressEvent::step(self.emitted, step)));
            }
            Some(Err(err)) => {
                warn!(line = err.line, error = %err.message, "Skipping undecodable stream line");
            }
        }
    }
}

async fn next_event(mut state: StreamState) -> Option<(Result<ProgressEvent>, StreamState)> {
    loop {
        if let Some(item) = state.pending.pop_front() {
            return Some((item, state));
        }

        let token = state.token.clone();
        if token.is_cancelled() {
            debug!("Stream reading stopped by cancellation");
            return None;
        }

        let chunk = match &mut state.phase {
            Phase::Done => return None,
            Phase::Opening => None,
            Phase::Reading(body) => {
                tokio::select! {
                    () = token.cancelled() => {
                        debug!("Stream reading stopped by cancellation");
                        return None;
                    }
                    chunk = body.next() => Some(chunk),
                }
            }
        };

        match chunk {
            None => {
                // The state holds a non-Sync body stream, so nothing borrowed
                // from it may live across this await.
                let transport = state.transport.clone();
                let request = state.request.clone();
                let opened = tokio::select! {
                    () = token.cancelled() => return None,
                    opened = transport.open_run_stream(&request) => opened,
                };
                match opened {
                    Ok(body) => {
                        debug!(jira_url = %state.request.jira_url, "Run stream opened");
                        state.phase = Phase::Reading(body);
                    }
                    Err(err) => {
                        warn!(error = %err, "Could not open run stream");
                        state.phase = Phase::Done;
                        state.pending.push_back(Err(err.into()));
                    }
                }
            }
            Some(Some(Ok(bytes))) => {
                for line in state.decoder.push(&bytes) {
                    match line {
                        Ok(line) => state.accept(&line),
                        Err(err) => {
                            warn!(line = err.line, error = %err.message, "Skipping oversized stream line");
                        }
                    }
                }
            }
            Some(Some(Err(err))) => {
                warn!(error = %err, "Run stream failed");
                state.phase = Phase::Done;
                state.pending.push_back(Err(err.into()));
            }
            Some(None) => {
                if let Some(line) = state.decoder.finish() {
                    state.accept(&line);
                }
                debug!(
                    lines = state.decoder.lines_seen(),
                    steps = state.emitted,
                    "Run stream ended"
                );
                state.phase = Phase::Done;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{TransportError, TriageflowError};
    use crate::testing::{fixtures, ScriptedTransport};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn source(transport: Arc<ScriptedTransport>) -> StreamingSource {
        StreamingSource::new(
            transport,
            StreamRunRequest::new("https://acme.atlassian.net/browse/UX-1"),
            Arc::default(),
        )
    }

    fn titles(events: &[Result<ProgressEvent>]) -> Vec<(usize, String)> {
        events
            .iter()
            .filter_map(|e| e.as_ref().ok().and_then(ProgressEvent::as_step))
            .map(|s| (s.position, s.step.title.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_malformed_line_is_skipped() {
        let body = format!(
            "{}\n{{not json\n{}\n\n{}\n",
            fixtures::step_line("one"),
            fixtures::step_line("two"),
            fixtures::step_line("three"),
        );
        let transport = Arc::new(ScriptedTransport::new().with_stream_chunks(vec![body.into_bytes()]));

        let events: Vec<_> = source(transport).events().collect().await;

        assert!(events.iter().all(Result::is_ok));
        assert_eq!(
            titles(&events),
            vec![
                (1, "one".to_string()),
                (2, "two".to_string()),
                (3, "three".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_lines_split_across_chunks_keep_order() {
        let body = format!(
            "{}\n{}",
            fixtures::step_line("first"),
            fixtures::step_line("second")
        )
        .into_bytes();
        let chunks: Vec<Vec<u8>> = body.chunks(7).map(<[u8]>::to_vec).collect();
        let transport = Arc::new(ScriptedTransport::new().with_stream_chunks(chunks));

        let events: Vec<_> = source(transport).events().collect().await;
        assert_eq!(
            titles(&events),
            vec![(1, "first".to_string()), (2, "second".to_string())]
        );
    }

    #[tokio::test]
    async fn test_open_failure_yields_single_error() {
        let transport =
            Arc::new(ScriptedTransport::new().with_stream_open_error(TransportError::status(503)));

        let events: Vec<_> = source(transport).events().collect().await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Err(TriageflowError::Transport(_))));
    }

    #[tokio::test]
    async fn test_read_failure_ends_stream() {
        let transport = Arc::new(ScriptedTransport::new().with_stream_results(vec![
            Ok(format!("{}\n", fixtures::step_line("one")).into_bytes()),
            Err(TransportError::network("connection reset")),
            Ok(format!("{}\n", fixtures::step_line("never")).into_bytes()),
        ]));

        let events: Vec<_> = source(transport).events().collect().await;
        assert_eq!(titles(&events), vec![(1, "one".to_string())]);
        assert!(matches!(events.last(), Some(Err(TriageflowError::Transport(_)))));
    }

    #[tokio::test]
    async fn test_cancel_stops_reading_mid_body() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .with_stream_chunks(vec![format!("{}\n", fixtures::step_line("one")).into_bytes()])
                .hold_stream_open(),
        );
        let token = Arc::new(CancellationToken::new());
        let mut events = StreamingSource::new(
            transport,
            StreamRunRequest::new("https://acme.atlassian.net/browse/UX-1"),
            token.clone(),
        )
        .events();

        let first = events.next().await.unwrap().unwrap();
        assert_eq!(first.as_step().map(|s| s.step.title.as_str()), Some("one"));

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel("left page");
        });

        let next = tokio::time::timeout(Duration::from_secs(1), events.next())
            .await
            .expect("cancellation should end the stream");
        assert!(next.is_none());
    }

    #[test]
    fn test_array_line_is_malformed() {
        let line = RawLine {
            number: 2,
            text: " [] ".to_string(),
        };
        assert_eq!(decode_line(&line).unwrap().unwrap_err().line, 2);
    }

    #[tokio::test]
    async fn test_request_is_lazy() {
        let transport = Arc::new(ScriptedTransport::new().with_stream_chunks(Vec::new()));
        let pending = source(transport.clone()).events();
        assert!(transport.calls().is_empty());
        drop(pending);
    }

    #[test]
    fn test_decode_line() {
        let blank = RawLine {
            number: 1,
            text: "   ".to_string(),
        };
        assert!(decode_line(&blank).is_none());

        let bad = RawLine {
            number: 4,
            text: "{oops".to_string(),
        };
        assert_eq!(decode_line(&bad).unwrap().unwrap_err().line, 4);
    }
}
