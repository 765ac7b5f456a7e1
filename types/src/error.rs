//! The structured failure taxonomy shared by every component.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::{Address, CandidateId, Phase, Role};

/// Error returned by every engine operation.
///
/// Callers branch on [`ElectionError::kind`], never on the message text.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ElectionError {
    #[error("{caller} is not authorized to act as {role}")]
    Unauthorized { caller: Address, role: Role },

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("address {0} is already registered")]
    DuplicateAddress(Address),

    #[error("national id {0} is already registered")]
    DuplicateNationalId(String),

    #[error("candidate with national id {0} is already registered")]
    DuplicateCandidate(String),

    #[error("voter {0} is not registered")]
    VoterNotRegistered(Address),

    #[error("voter {0} has already voted")]
    AlreadyVoted(Address),

    #[error("candidate {0} is not a valid choice")]
    InvalidCandidate(CandidateId),

    #[error("cannot {action} while the election is {phase}")]
    PhaseViolation { phase: Phase, action: &'static str },

    #[error("voting period has not ended: {remaining_secs}s remaining")]
    VotingPeriodNotEnded { remaining_secs: u64 },

    #[error("voting period has ended")]
    VotingPeriodEnded,

    #[error("invalid voting duration: {0} minutes")]
    InvalidDuration(u64),

    #[error("results have not been finalized")]
    ResultsNotFinalized,

    #[error("election must be ended before finalizing results")]
    ElectionNotEnded,

    #[error("results already finalized")]
    AlreadyFinalized,

    #[error("{0} not found")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ElectionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::InvalidFormat(_) => ErrorKind::InvalidFormat,
            Self::DuplicateAddress(_) => ErrorKind::DuplicateAddress,
            Self::DuplicateNationalId(_) => ErrorKind::DuplicateNationalId,
            Self::DuplicateCandidate(_) => ErrorKind::DuplicateCandidate,
            Self::VoterNotRegistered(_) => ErrorKind::VoterNotRegistered,
            Self::AlreadyVoted(_) => ErrorKind::AlreadyVoted,
            Self::InvalidCandidate(_) => ErrorKind::InvalidCandidate,
            Self::PhaseViolation { .. } => ErrorKind::PhaseViolation,
            Self::VotingPeriodNotEnded { .. } => ErrorKind::VotingPeriodNotEnded,
            Self::VotingPeriodEnded => ErrorKind::VotingPeriodEnded,
            Self::InvalidDuration(_) => ErrorKind::InvalidDuration,
            Self::ResultsNotFinalized => ErrorKind::ResultsNotFinalized,
            Self::ElectionNotEnded => ErrorKind::ElectionNotEnded,
            Self::AlreadyFinalized => ErrorKind::AlreadyFinalized,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Internal(_) => ErrorKind::InternalError,
        }
    }
}

/// Discriminant of [`ElectionError`], stable across releases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Unauthorized,
    InvalidFormat,
    DuplicateAddress,
    DuplicateNationalId,
    DuplicateCandidate,
    VoterNotRegistered,
    AlreadyVoted,
    InvalidCandidate,
    PhaseViolation,
    VotingPeriodNotEnded,
    VotingPeriodEnded,
    InvalidDuration,
    ResultsNotFinalized,
    ElectionNotEnded,
    AlreadyFinalized,
    NotFound,
    InternalError,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 17] = [
        Self::Unauthorized,
        Self::InvalidFormat,
        Self::DuplicateAddress,
        Self::DuplicateNationalId,
        Self::DuplicateCandidate,
        Self::VoterNotRegistered,
        Self::AlreadyVoted,
        Self::InvalidCandidate,
        Self::PhaseViolation,
        Self::VotingPeriodNotEnded,
        Self::VotingPeriodEnded,
        Self::InvalidDuration,
        Self::ResultsNotFinalized,
        Self::ElectionNotEnded,
        Self::AlreadyFinalized,
        Self::NotFound,
        Self::InternalError,
    ];

    /// Snake-case label, used for metrics and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::InvalidFormat => "invalid_format",
            Self::DuplicateAddress => "duplicate_address",
            Self::DuplicateNationalId => "duplicate_national_id",
            Self::DuplicateCandidate => "duplicate_candidate",
            Self::VoterNotRegistered => "voter_not_registered",
            Self::AlreadyVoted => "already_voted",
            Self::InvalidCandidate => "invalid_candidate",
            Self::PhaseViolation => "phase_violation",
            Self::VotingPeriodNotEnded => "voting_period_not_ended",
            Self::VotingPeriodEnded => "voting_period_ended",
            Self::InvalidDuration => "invalid_duration",
            Self::ResultsNotFinalized => "results_not_finalized",
            Self::ElectionNotEnded => "election_not_ended",
            Self::AlreadyFinalized => "already_finalized",
            Self::NotFound => "not_found",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_unique() {
        let mut labels: Vec<_> = ErrorKind::ALL.iter().map(|k| k.as_str()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), ErrorKind::ALL.len());
    }

    #[test]
    fn phase_violation_message_names_phase() {
        let err = ElectionError::PhaseViolation {
            phase: Phase::Ended,
            action: "cast a vote",
        };
        assert_eq!(err.to_string(), "cannot cast a vote while the election is ended");
        assert_eq!(err.kind(), ErrorKind::PhaseViolation);
    }
}
