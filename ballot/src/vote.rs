//! Ballot records.

use elect_types::{Address, BallotHash, CandidateId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::hash::hash_ballot;

/// One cast ballot. Immutable once appended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// Position in the ledger, from 0.
    pub sequence: u64,
    pub voter: Address,
    pub candidate: CandidateId,
    pub timestamp: Timestamp,
    pub previous: BallotHash,
    pub hash: BallotHash,
}

impl Vote {
    pub(crate) fn new(
        sequence: u64,
        voter: Address,
        candidate: CandidateId,
        timestamp: Timestamp,
        previous: BallotHash,
    ) -> Self {
        let hash = hash_ballot(&previous, sequence, &voter, candidate, timestamp);
        Self {
            sequence,
            voter,
            candidate,
            timestamp,
            previous,
            hash,
        }
    }

    /// Recompute this ballot's digest from its fields.
    pub fn compute_hash(&self) -> BallotHash {
        hash_ballot(&self.previous, self.sequence, &self.voter, self.candidate, self.timestamp)
    }
}
