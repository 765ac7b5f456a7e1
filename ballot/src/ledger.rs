//! Append-only store of cast votes.

use std::collections::{BTreeMap, HashMap};

use elect_identity::IdentityRegistry;
use elect_phase::PhaseController;
use elect_types::{Address, BallotHash, CandidateId, ElectionError, Timestamp};
use serde::{Deserialize, Serialize};

use crate::vote::Vote;

/// Owns every cast ballot and the running per-candidate counters.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BallotLedger {
    votes: Vec<Vote>,
    /// Voter → index into `votes`.
    by_voter: HashMap<Address, usize>,
    /// Running counters, bumped on every committed ballot.
    counts: BTreeMap<CandidateId, u64>,
    head: BallotHash,
}

impl BallotLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cast `caller`'s single ballot for `candidate`.
    ///
    /// Preconditions are checked in order and the first failure wins:
    /// registered voter, not yet voted, voting open and unexpired, valid
    /// candidate. Nothing is mutated unless every check passes.
    pub fn cast_vote(
        &mut self,
        identity: &mut IdentityRegistry,
        phase: &PhaseController,
        caller: &Address,
        candidate: CandidateId,
        now: Timestamp,
    ) -> Result<&Vote, ElectionError> {
        if !identity.is_registered_voter(caller) {
            return Err(ElectionError::VoterNotRegistered(caller.clone()));
        }
        if identity.has_voted(caller) || self.by_voter.contains_key(caller) {
            return Err(ElectionError::AlreadyVoted(caller.clone()));
        }
        phase.require_voting_open(now)?;
        if !identity.is_valid_candidate(candidate) {
            return Err(ElectionError::InvalidCandidate(candidate));
        }

        // The flag flip is the only fallible commit step, so it goes first.
        identity.mark_voted(caller)?;

        let sequence = self.votes.len() as u64;
        let vote = Vote::new(sequence, caller.clone(), candidate, now, self.head);
        self.head = vote.hash;
        self.by_voter.insert(caller.clone(), self.votes.len());
        *self.counts.entry(candidate).or_insert(0) += 1;
        self.votes.push(vote);
        tracing::debug!(voter = %caller, %candidate, sequence, "ballot appended");
        Ok(&self.votes[self.votes.len() - 1])
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// All ballots in cast order.
    pub fn votes(&self) -> &[Vote] {
        &self.votes
    }

    pub fn vote_of(&self, voter: &Address) -> Option<&Vote> {
        self.by_voter.get(voter).and_then(|&i| self.votes.get(i))
    }

    /// Running count for `candidate` (zero if it has no ballots).
    pub fn vote_count(&self, candidate: CandidateId) -> u64 {
        self.counts.get(&candidate).copied().unwrap_or(0)
    }

    /// Running counts for every candidate with at least one ballot.
    pub fn counts(&self) -> &BTreeMap<CandidateId, u64> {
        &self.counts
    }

    pub fn total_votes(&self) -> u64 {
        self.votes.len() as u64
    }

    /// Hash of the latest ballot, or the zero hash for an empty ledger.
    pub fn head_hash(&self) -> BallotHash {
        self.head
    }

    /// Recompute the hash chain. Returns the sequence number of the first
    /// ballot whose stored hash, link, or position does not check out.
    pub fn verify_chain(&self) -> Option<u64> {
        let mut previous = BallotHash::ZERO;
        for (index, vote) in self.votes.iter().enumerate() {
            if vote.sequence != index as u64
                || vote.previous != previous
                || vote.compute_hash() != vote.hash
            {
                return Some(index as u64);
            }
            previous = vote.hash;
        }
        if previous != self.head {
            return Some(self.votes.len() as u64);
        }
        None
    }
}
