//! [`tracing::Span`] constructors for election operations.
//!
//! Consistent span names and fields make traces easy to filter and correlate.

use tracing::{info_span, Span};

/// Span covering one dispatched operation.
pub fn operation_span(op: &str, caller: &str) -> Span {
    info_span!("operation", op = %op, caller = %caller)
}

/// Span covering a single ballot from validation to commit.
pub fn cast_vote_span(voter: &str) -> Span {
    info_span!("cast_vote", voter = %voter)
}

/// Span covering an independent recount.
pub fn audit_span(total_votes: u64) -> Span {
    info_span!("audit", total_votes = %total_votes)
}

/// Span covering a snapshot save or restore.
pub fn snapshot_span(direction: &str, path: &str) -> Span {
    info_span!("snapshot", direction = %direction, path = %path)
}

/// Span covering one step of a replayed operation script.
pub fn replay_step_span(step: usize) -> Span {
    info_span!("replay_step", step = %step)
}
