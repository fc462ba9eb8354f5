//! Result presentation.
//!
//! This module provides:
//! - `ResultCard`, a terminal result joined with its ticket
//! - `CommentAction`, the guarded post-comment action
//! - `ExternalLinks` for ticket page URLs
//! - `ResultPresenter`, which wires the above to a surface

mod actions;
mod card;
mod presenter;

pub use actions::{ActionOutcome, ActionState, CommentAction, ExternalLinks, POSTING_COMMENT};
pub use card::{ticket_lookup, ResultCard, NO_DESCRIPTION, TICKET_NOT_AVAILABLE};
pub use presenter::ResultPresenter;
