//! Plain-text surface writing to any `Write`.

use parking_lot::Mutex;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

use super::{DisplaySurface, Notice, NoticeLevel};
use crate::present::{ActionState, ResultCard};
use crate::render::StepNode;

/// Writes a line-oriented transcript, e.g. to stdout.
///
/// Indicator updates are written as prefixed lines since a transcript cannot
/// change what it already printed.
pub struct TranscriptSurface<W: Write + Send> {
    out: Mutex<W>,
    attached: AtomicBool,
}

impl<W: Write + Send> TranscriptSurface<W> {
    /// Creates a surface writing to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            attached: AtomicBool::new(true),
        }
    }

    /// Tears the surface down; later writes are ignored.
    pub fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
    }

    /// Returns the writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn write_lines<I>(&self, lines: I)
    where
        I: IntoIterator<Item = String>,
    {
        if !self.is_attached() {
            return;
        }
        let mut out = self.out.lock();
        for line in lines {
            if let Err(e) = writeln!(out, "{line}") {
                warn!(error = %e, "Transcript write failed, detaching");
                self.detach();
                return;
            }
        }
        if let Err(e) = out.flush() {
            warn!(error = %e, "Transcript flush failed, detaching");
            self.detach();
        }
    }
}

impl TranscriptSurface<std::io::Stdout> {
    /// Creates a surface on standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> DisplaySurface for TranscriptSurface<W> {
    fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.write_lines(["".to_string()]);
    }

    fn append_step(&self, node: &StepNode) {
        self.write_lines(node.lines());
    }

    fn show_loading(&self, message: &str) {
        self.write_lines([format!("... {message}")]);
    }

    fn hide_loading(&self) {}

    fn show_result(&self, card: &ResultCard) {
        self.write_lines(card.lines());
    }

    fn notify(&self, notice: &Notice) {
        let prefix = match notice.level {
            NoticeLevel::Info => "!",
            NoticeLevel::Error => "!!",
        };
        self.write_lines([format!("{prefix} {}", notice.message)]);
    }

    fn open_url(&self, url: &str) {
        self.write_lines([format!("-> {url}")]);
    }

    fn set_action_state(&self, ticket_id: &str, state: ActionState, message: Option<&str>) {
        let line = match message {
            Some(message) => format!("[{ticket_id}] comment {}: {message}", state.label()),
            None => format!("[{ticket_id}] comment {}", state.label()),
        };
        self.write_lines([line]);
    }
}
