//! Phase as observed at a point in time.

use elect_types::{Phase, Timestamp};
use serde::{Deserialize, Serialize};

/// The stored phase adjusted for the voting deadline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectivePhase {
    NotStarted,
    RegistrationOpen,
    /// Voting is open and the deadline has not passed.
    VotingOpen,
    /// Stored phase is still VotingOpen but the deadline has passed.
    VotingExpired,
    Ended,
    Finalized,
}

/// Derive the effective phase from the stored phase, deadline and current time.
///
/// Pure: equal inputs always give equal outputs.
pub fn effective_phase(stored: Phase, deadline: Option<Timestamp>, now: Timestamp) -> EffectivePhase {
    match stored {
        Phase::NotStarted => EffectivePhase::NotStarted,
        Phase::RegistrationOpen => EffectivePhase::RegistrationOpen,
        Phase::VotingOpen => match deadline {
            Some(deadline) if now >= deadline => EffectivePhase::VotingExpired,
            _ => EffectivePhase::VotingOpen,
        },
        Phase::Ended => EffectivePhase::Ended,
        Phase::Finalized => EffectivePhase::Finalized,
    }
}
