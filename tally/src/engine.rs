//! Derives results, winner and turnout.

use elect_ballot::BallotLedger;
use elect_identity::IdentityRegistry;
use elect_types::{CandidateId, ElectionError, Phase, Timestamp};
use serde::{Deserialize, Serialize};

use crate::result::{leader, ResultEntry};

/// Read-only view over the ballot ledger plus the frozen final results.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TallyEngine {
    /// Ascending by candidate id. Present iff results were finalized.
    frozen: Option<Vec<ResultEntry>>,
    finalized_at: Option<Timestamp>,
}

impl TallyEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Freeze the final results from the ledger's running counts.
    ///
    /// Called once, as part of the Finalized transition. Later calls are ignored
    /// so the snapshot stays immutable.
    pub fn freeze(&mut self, identity: &IdentityRegistry, ledger: &BallotLedger, now: Timestamp) {
        if self.frozen.is_some() {
            tracing::warn!("result snapshot already frozen; ignoring");
            return;
        }
        let results = Self::standings(identity, ledger);
        tracing::debug!(candidates = results.len(), "result snapshot frozen");
        self.frozen = Some(results);
        self.finalized_at = Some(now);
    }

    /// Final results ordered by ascending candidate id.
    pub fn all_results(&self, phase: Phase) -> Result<&[ResultEntry], ElectionError> {
        if phase != Phase::Finalized {
            return Err(ElectionError::ResultsNotFinalized);
        }
        self.frozen
            .as_deref()
            .ok_or_else(|| ElectionError::Internal("finalized without a result snapshot".into()))
    }

    /// The candidate with the most votes; ties go to the lowest id.
    pub fn winner(&self, phase: Phase) -> Result<&ResultEntry, ElectionError> {
        let results = self.all_results(phase)?;
        leader(results).ok_or_else(|| ElectionError::NotFound("winner (no candidates)".into()))
    }

    /// Stored final count for `candidate`, if results are frozen.
    pub fn frozen_count(&self, candidate: CandidateId) -> Option<u64> {
        self.frozen.as_ref().and_then(|results| {
            results
                .iter()
                .find(|r| r.candidate_id == candidate)
                .map(|r| r.vote_count)
        })
    }

    pub fn frozen_results(&self) -> Option<&[ResultEntry]> {
        self.frozen.as_deref()
    }

    pub fn finalized_at(&self) -> Option<Timestamp> {
        self.finalized_at
    }

    // ── Live reads (any phase) ──────────────────────────────────────────

    /// Integer percentage of registered voters who cast a ballot, rounded half
    /// up. Zero when nobody is registered.
    pub fn voter_turnout(identity: &IdentityRegistry, ledger: &BallotLedger) -> u64 {
        let registered = identity.total_voters();
        if registered == 0 {
            return 0;
        }
        let cast = ledger.total_votes() as u128;
        let registered = registered as u128;
        ((cast * 100 + registered / 2) / registered) as u64
    }

    /// Running count for a registered candidate.
    pub fn vote_count(
        identity: &IdentityRegistry,
        ledger: &BallotLedger,
        candidate: CandidateId,
    ) -> Result<u64, ElectionError> {
        identity.candidate(candidate)?;
        Ok(ledger.vote_count(candidate))
    }

    /// Provisional standings: every candidate with its running count, ascending
    /// by id.
    pub fn standings(identity: &IdentityRegistry, ledger: &BallotLedger) -> Vec<ResultEntry> {
        identity
            .candidates()
            .map(|c| ResultEntry::for_candidate(c, ledger.vote_count(c.id)))
            .collect()
    }
}
