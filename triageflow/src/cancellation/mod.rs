//! Cooperative cancellation for sessions.
//!
//! Abandoning a session (for example when the user navigates away) cancels
//! its token; polling and stream reading stop at the next suspension point.

mod token;

pub use token::CancellationToken;
