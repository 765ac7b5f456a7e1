//! The election's lifecycle stage.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stored election phase. Transitions only move forward, one step at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Nothing has happened yet; candidates may be registered.
    NotStarted,
    /// Voters may register.
    RegistrationOpen,
    /// Ballots are accepted until the voting deadline.
    VotingOpen,
    /// Voting has been closed by the commission.
    Ended,
    /// Results are frozen. Terminal.
    Finalized,
}

impl Phase {
    /// The only phase this one may advance to.
    pub fn successor(&self) -> Option<Phase> {
        match self {
            Self::NotStarted => Some(Self::RegistrationOpen),
            Self::RegistrationOpen => Some(Self::VotingOpen),
            Self::VotingOpen => Some(Self::Ended),
            Self::Ended => Some(Self::Finalized),
            Self::Finalized => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized)
    }

    /// Whether the commission has closed voting (Ended or Finalized).
    pub fn has_ended(&self) -> bool {
        matches!(self, Self::Ended | Self::Finalized)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::RegistrationOpen => "registration_open",
            Self::VotingOpen => "voting_open",
            Self::Ended => "ended",
            Self::Finalized => "finalized",
        }
    }
}

impl Default for Phase {
    fn default() -> Self {
        Self::NotStarted
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
