//! One election: the five components composed behind a single surface.

use std::path::Path;

use elect_audit::{AuditRegistry, AuditReport, Auditor, VerificationRecord};
use elect_ballot::{BallotLedger, Vote};
use elect_identity::{Candidate, CandidateApplication, IdentityRegistry, Voter, VoterApplication};
use elect_phase::{EffectivePhase, PhaseController};
use elect_tally::{ResultEntry, TallyEngine};
use elect_types::{AccessPolicy, Address, CandidateId, ElectionError, Phase, Timestamp};
use serde::{Deserialize, Serialize};

use crate::config::ElectionConfig;
use crate::NodeError;

/// Bumped whenever the persisted layout changes.
pub const SNAPSHOT_VERSION: u32 = 1;

/// All election state.
///
/// Every mutating method checks its preconditions in full before touching any
/// store, so a failed call leaves the election exactly as it was.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Election {
    name: String,
    policy: AccessPolicy,
    identity: IdentityRegistry,
    phase: PhaseController,
    ledger: BallotLedger,
    tally: TallyEngine,
    audit: AuditRegistry,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    election: &'a Election,
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    election: Election,
}

impl Election {
    pub fn new(name: impl Into<String>, policy: AccessPolicy, national_id_length: usize) -> Self {
        Self {
            name: name.into(),
            identity: IdentityRegistry::new(policy.clone(), national_id_length),
            phase: PhaseController::new(policy.clone()),
            ledger: BallotLedger::new(),
            tally: TallyEngine::new(),
            audit: AuditRegistry::new(policy.clone()),
            policy,
        }
    }

    pub fn from_config(config: &ElectionConfig) -> Result<Self, NodeError> {
        config.validate()?;
        Ok(Self::new(
            config.election_name.trim(),
            config.access_policy()?,
            config.national_id_length,
        ))
    }

    // ── Identity ────────────────────────────────────────────────────────

    pub fn register_candidate(
        &mut self,
        caller: &Address,
        application: CandidateApplication,
        now: Timestamp,
    ) -> Result<CandidateId, ElectionError> {
        self.identity
            .register_candidate(caller, self.phase.phase(), application, now)
    }

    pub fn self_register_candidate(
        &mut self,
        caller: &Address,
        application: CandidateApplication,
        now: Timestamp,
    ) -> Result<CandidateId, ElectionError> {
        self.identity
            .self_register_candidate(caller, self.phase.phase(), application, now)
    }

    pub fn register_voter(
        &mut self,
        caller: &Address,
        address: &Address,
        application: VoterApplication,
        now: Timestamp,
    ) -> Result<(), ElectionError> {
        self.identity
            .register_voter(caller, self.phase.phase(), address, application, now)
    }

    pub fn self_register_voter(
        &mut self,
        caller: &Address,
        application: VoterApplication,
        now: Timestamp,
    ) -> Result<(), ElectionError> {
        self.identity
            .self_register_voter(caller, self.phase.phase(), application, now)
    }

    // ── Phase ───────────────────────────────────────────────────────────

    pub fn start_registration(&mut self, caller: &Address, now: Timestamp) -> Result<(), ElectionError> {
        self.phase.start_registration(caller, now)
    }

    pub fn start_voting(
        &mut self,
        caller: &Address,
        duration_minutes: u64,
        now: Timestamp,
    ) -> Result<Timestamp, ElectionError> {
        self.phase.start_voting(caller, duration_minutes, now)
    }

    pub fn end_election(&mut self, caller: &Address, now: Timestamp) -> Result<(), ElectionError> {
        self.phase.end_election(caller, now)
    }

    /// Ended → Finalized, freezing the result snapshot in the same step.
    pub fn finalize_results(&mut self, caller: &Address, now: Timestamp) -> Result<(), ElectionError> {
        self.phase.finalize(caller, now)?;
        self.tally.freeze(&self.identity, &self.ledger, now);
        Ok(())
    }

    // ── Ballots ─────────────────────────────────────────────────────────

    pub fn cast_vote(
        &mut self,
        caller: &Address,
        candidate: CandidateId,
        now: Timestamp,
    ) -> Result<Vote, ElectionError> {
        self.ledger
            .cast_vote(&mut self.identity, &self.phase, caller, candidate, now)
            .cloned()
    }

    // ── Audit ───────────────────────────────────────────────────────────

    pub fn approve_auditor(
        &mut self,
        caller: &Address,
        address: &Address,
        organization: &str,
        now: Timestamp,
    ) -> Result<(), ElectionError> {
        self.audit.approve_auditor(caller, address, organization, now)
    }

    pub fn submit_verification(
        &mut self,
        caller: &Address,
        comments: &str,
        verification_passed: bool,
        now: Timestamp,
    ) -> Result<VerificationRecord, ElectionError> {
        self.audit
            .submit_verification(caller, comments, verification_passed, now)
            .cloned()
    }

    pub fn check_vote_by_national_id(&self, caller: &Address, national_id: &str) -> Result<bool, ElectionError> {
        self.audit
            .check_vote_by_national_id(caller, &self.identity, national_id)
    }

    pub fn verify_vote_counts(&self) -> bool {
        elect_audit::verify_vote_counts(&self.identity, &self.ledger, &self.tally)
    }

    pub fn audit_report(&self) -> AuditReport {
        elect_audit::audit_report(&self.identity, &self.ledger, &self.tally)
    }

    // ── Results ─────────────────────────────────────────────────────────

    pub fn all_results(&self) -> Result<&[ResultEntry], ElectionError> {
        self.tally.all_results(self.phase.phase())
    }

    pub fn winner(&self) -> Result<&ResultEntry, ElectionError> {
        self.tally.winner(self.phase.phase())
    }

    pub fn voter_turnout(&self) -> u64 {
        TallyEngine::voter_turnout(&self.identity, &self.ledger)
    }

    pub fn vote_count(&self, candidate: CandidateId) -> Result<u64, ElectionError> {
        TallyEngine::vote_count(&self.identity, &self.ledger, candidate)
    }

    pub fn live_counts(&self) -> Vec<ResultEntry> {
        TallyEngine::standings(&self.identity, &self.ledger)
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn phase(&self) -> Phase {
        self.phase.phase()
    }

    pub fn effective_phase(&self, now: Timestamp) -> EffectivePhase {
        self.phase.effective(now)
    }

    pub fn remaining_voting_time(&self, now: Timestamp) -> Option<u64> {
        self.phase.remaining_voting_time(now)
    }

    pub fn voting_deadline(&self) -> Option<Timestamp> {
        self.phase.voting_deadline()
    }

    pub fn candidate(&self, id: CandidateId) -> Result<&Candidate, ElectionError> {
        self.identity.candidate(id)
    }

    pub fn voter(&self, address: &Address) -> Result<&Voter, ElectionError> {
        self.identity.voter(address)
    }

    pub fn auditor(&self, address: &Address) -> Result<&Auditor, ElectionError> {
        self.audit.auditor(address)
    }

    /// The latest timestamp recorded anywhere in the election, if any.
    pub fn last_activity(&self) -> Option<Timestamp> {
        let voters = self.identity.voters().map(|v| v.registered_at);
        let candidates = self.identity.candidates().map(|c| c.registered_at);
        let transitions = self.phase.history().iter().map(|t| t.at);
        let votes = self.ledger.votes().iter().map(|v| v.timestamp);
        let auditors = self.audit.all_auditors().map(|a| a.approved_at);
        let records = self.audit.all_verification_records().iter().map(|r| r.timestamp);
        voters
            .chain(candidates)
            .chain(transitions)
            .chain(votes)
            .chain(auditors)
            .chain(records)
            .max()
    }

    pub fn identity(&self) -> &IdentityRegistry {
        &self.identity
    }

    pub fn phase_controller(&self) -> &PhaseController {
        &self.phase
    }

    pub fn ledger(&self) -> &BallotLedger {
        &self.ledger
    }

    pub fn tally(&self) -> &TallyEngine {
        &self.tally
    }

    pub fn audit(&self) -> &AuditRegistry {
        &self.audit
    }

    // ── Persistence ─────────────────────────────────────────────────────

    /// Serialize the full election state.
    pub fn snapshot(&self) -> Result<Vec<u8>, NodeError> {
        bincode::serialize(&SnapshotRef {
            version: SNAPSHOT_VERSION,
            election: self,
        })
        .map_err(|e| NodeError::Snapshot(e.to_string()))
    }

    /// Rebuild an election from [`Election::snapshot`] bytes.
    ///
    /// Rejects snapshots whose ballot chain or stored counts do not survive an
    /// independent recount.
    pub fn restore(bytes: &[u8]) -> Result<Self, NodeError> {
        let snapshot: Snapshot =
            bincode::deserialize(bytes).map_err(|e| NodeError::Snapshot(e.to_string()))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(NodeError::Snapshot(format!(
                "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                snapshot.version
            )));
        }
        let election = snapshot.election;
        let report = election.audit_report();
        if let Some(sequence) = report.first_broken_sequence {
            return Err(NodeError::Snapshot(format!("ballot chain broken at sequence {sequence}")));
        }
        if !report.counts_match {
            return Err(NodeError::Snapshot(format!(
                "stored counts disagree with recount ({} discrepancies)",
                report.discrepancies.len()
            )));
        }
        Ok(election)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), NodeError> {
        let bytes = self.snapshot()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self, NodeError> {
        let bytes = std::fs::read(path)?;
        Self::restore(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elect_types::ErrorKind;

    fn commission() -> Address {
        Address::from_bytes([0; 20])
    }

    fn addr(seed: u8) -> Address {
        Address::from_bytes([seed; 20])
    }

    fn t(secs: u64) -> Timestamp {
        Timestamp::new(secs)
    }

    fn election() -> Election {
        Election::new("Test", AccessPolicy::new(commission()), 6)
    }

    fn with_votes() -> Election {
        let mut e = election();
        e.register_candidate(&commission(), CandidateApplication::new("200001", "Alice", "A", ""), t(0))
            .unwrap();
        e.register_candidate(&commission(), CandidateApplication::new("200002", "Bob", "B", ""), t(0))
            .unwrap();
        e.start_registration(&commission(), t(0)).unwrap();
        for seed in 1..=3u8 {
            e.self_register_voter(&addr(seed), VoterApplication::new(format!("10000{seed}"), "V"), t(1))
                .unwrap();
        }
        e.start_voting(&commission(), 1, t(2)).unwrap();
        e.cast_vote(&addr(1), CandidateId::new(2), t(3)).unwrap();
        e.cast_vote(&addr(2), CandidateId::new(2), t(4)).unwrap();
        e.cast_vote(&addr(3), CandidateId::new(1), t(5)).unwrap();
        e
    }

    #[test]
    fn finalization_freezes_results() {
        let mut e = with_votes();
        assert_eq!(e.all_results().unwrap_err().kind(), ErrorKind::ResultsNotFinalized);
        e.end_election(&commission(), t(62)).unwrap();
        e.finalize_results(&commission(), t(63)).unwrap();
        let winner = e.winner().unwrap();
        assert_eq!(winner.name, "Bob");
        assert_eq!(winner.vote_count, 2);
        assert_eq!(e.voter_turnout(), 100);
        assert!(e.verify_vote_counts());
    }

    #[test]
    fn failed_finalize_does_not_freeze() {
        let mut e = with_votes();
        assert_eq!(
            e.finalize_results(&commission(), t(10)).unwrap_err().kind(),
            ErrorKind::ElectionNotEnded
        );
        assert!(e.tally().frozen_results().is_none());
    }

    #[test]
    fn registration_closes_after_end() {
        let mut e = with_votes();
        e.end_election(&commission(), t(62)).unwrap();
        let err = e
            .self_register_voter(&addr(9), VoterApplication::new("100009", "Late"), t(70))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PhaseViolation);
    }

    #[test]
    fn snapshot_round_trips() {
        let mut e = with_votes();
        e.approve_auditor(&commission(), &addr(7), "Observers", t(6)).unwrap();
        e.submit_verification(&addr(7), "ok", true, t(7)).unwrap();
        let restored = Election::restore(&e.snapshot().unwrap()).unwrap();
        assert_eq!(restored.name(), "Test");
        assert_eq!(restored.ledger().head_hash(), e.ledger().head_hash());
        assert_eq!(restored.ledger().total_votes(), 3);
        assert_eq!(restored.audit().verification_count(), 1);
        assert!(restored.identity().has_voted(&addr(1)));
        assert_eq!(restored.phase(), Phase::VotingOpen);
    }

    #[test]
    fn snapshot_with_cleared_voted_flag_rejected() {
        let e = with_votes();
        let mut value = serde_json::to_value(&e).unwrap();
        value["identity"]["voters"][addr(2).to_string()]["has_voted"] = serde_json::json!(false);
        let tampered: Election = serde_json::from_value(value).unwrap();
        assert!(!tampered.verify_vote_counts());
        assert!(matches!(
            Election::restore(&tampered.snapshot().unwrap()),
            Err(NodeError::Snapshot(_))
        ));
    }

    #[test]
    fn last_activity_tracks_latest_record() {
        assert_eq!(election().last_activity(), None);
        let mut e = with_votes();
        assert_eq!(e.last_activity(), Some(t(5)));
        e.approve_auditor(&commission(), &addr(7), "Observers", t(40)).unwrap();
        assert_eq!(e.last_activity(), Some(t(40)));
    }

    #[test]
    fn garbage_snapshot_rejected() {
        assert!(matches!(Election::restore(b"not a snapshot"), Err(NodeError::Snapshot(_))));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.bin");
        let e = with_votes();
        e.save_to_file(&path).unwrap();
        let loaded = Election::load_from_file(&path).unwrap();
        assert_eq!(loaded.vote_count(CandidateId::new(2)).unwrap(), 2);
    }
}
