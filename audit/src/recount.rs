//! Independent recount from the raw ballot list.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use elect_ballot::BallotLedger;
use elect_identity::IdentityRegistry;
use elect_tally::TallyEngine;
use elect_types::CandidateId;
use serde::{Deserialize, Serialize};

/// A candidate whose recorded totals disagree with the recount.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discrepancy {
    pub candidate_id: CandidateId,
    pub recomputed: u64,
    /// The ledger's running counter.
    pub running: u64,
    /// The frozen final count, once results are finalized.
    pub frozen: Option<u64>,
}

/// Full outcome of an audit pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub counts_match: bool,
    pub chain_intact: bool,
    pub first_broken_sequence: Option<u64>,
    pub recomputed_total: u64,
    /// Voters whose `has_voted` flag is set, counted from the voter records.
    pub recorded_voters: u64,
    /// Ballots naming a candidate that is not registered.
    pub unknown_candidate_votes: u64,
    /// Ballots whose voter is unknown, unregistered, or not flagged as voted.
    pub unflagged_ballots: u64,
    /// Ballots from a voter who already has an earlier ballot.
    pub duplicate_ballots: u64,
    pub discrepancies: Vec<Discrepancy>,
}

/// Whether every stored count agrees with a recount of the raw ballots.
pub fn verify_vote_counts(identity: &IdentityRegistry, ledger: &BallotLedger, tally: &TallyEngine) -> bool {
    audit_report(identity, ledger, tally).counts_match
}

pub fn audit_report(identity: &IdentityRegistry, ledger: &BallotLedger, tally: &TallyEngine) -> AuditReport {
    let mut recomputed: BTreeMap<CandidateId, u64> = BTreeMap::new();
    let mut unknown_candidate_votes = 0u64;
    let mut unflagged_ballots = 0u64;
    let mut duplicate_ballots = 0u64;
    let mut seen = HashSet::new();
    for vote in ledger.votes() {
        if !identity.is_valid_candidate(vote.candidate) {
            unknown_candidate_votes += 1;
        }
        let flagged = identity
            .voter(&vote.voter)
            .is_ok_and(|v| v.is_registered && v.has_voted);
        if !flagged {
            unflagged_ballots += 1;
        }
        if !seen.insert(&vote.voter) {
            duplicate_ballots += 1;
        }
        *recomputed.entry(vote.candidate).or_insert(0) += 1;
    }
    let recomputed_total: u64 = recomputed.values().sum();

    let mut ids: BTreeSet<CandidateId> = identity.candidate_ids().into_iter().collect();
    ids.extend(recomputed.keys().copied());
    ids.extend(ledger.counts().keys().copied());
    if let Some(frozen) = tally.frozen_results() {
        ids.extend(frozen.iter().map(|r| r.candidate_id));
    }

    let discrepancies: Vec<Discrepancy> = ids
        .into_iter()
        .filter_map(|id| {
            let recount = recomputed.get(&id).copied().unwrap_or(0);
            let running = ledger.vote_count(id);
            let frozen = tally.frozen_results().map(|_| tally.frozen_count(id).unwrap_or(0));
            let agrees = running == recount && frozen.map_or(true, |f| f == recount);
            (!agrees).then_some(Discrepancy {
                candidate_id: id,
                recomputed: recount,
                running,
                frozen,
            })
        })
        .collect();

    let recorded_voters = identity.voters().filter(|v| v.has_voted).count() as u64;
    let first_broken_sequence = ledger.verify_chain();
    let counts_match = discrepancies.is_empty()
        && unknown_candidate_votes == 0
        && unflagged_ballots == 0
        && duplicate_ballots == 0
        && recomputed_total == recorded_voters;

    if counts_match {
        tracing::debug!(total = recomputed_total, "recount matches stored counts");
    } else {
        tracing::warn!(
            total = recomputed_total,
            recorded_voters,
            unknown_candidate_votes,
            unflagged_ballots,
            duplicate_ballots,
            discrepancies = discrepancies.len(),
            "recount does not match stored counts"
        );
    }

    AuditReport {
        counts_match,
        chain_intact: first_broken_sequence.is_none(),
        first_broken_sequence,
        recomputed_total,
        recorded_voters,
        unknown_candidate_votes,
        unflagged_ballots,
        duplicate_ballots,
        discrepancies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elect_identity::{CandidateApplication, VoterApplication};
    use elect_phase::PhaseController;
    use elect_types::{AccessPolicy, Address, Phase, Timestamp};

    fn addr(seed: u8) -> Address {
        Address::from_bytes([seed; 20])
    }

    fn t(secs: u64) -> Timestamp {
        Timestamp::new(secs)
    }

    /// Two candidates, three voters; voters 1 and 2 pick candidate 1, voter 3
    /// picks candidate 2. Voting still open.
    fn voted() -> (IdentityRegistry, PhaseController, BallotLedger) {
        let policy = AccessPolicy::new(addr(0));
        let mut identity = IdentityRegistry::new(policy.clone(), 6);
        let mut phase = PhaseController::new(policy);
        for id in ["200001", "200002"] {
            identity
                .register_candidate(&addr(0), Phase::NotStarted, CandidateApplication::new(id, "C", "P", ""), t(0))
                .unwrap();
        }
        phase.start_registration(&addr(0), t(0)).unwrap();
        for seed in 1..=3u8 {
            identity
                .self_register_voter(
                    &addr(seed),
                    Phase::RegistrationOpen,
                    VoterApplication::new(format!("10000{seed}"), "V"),
                    t(0),
                )
                .unwrap();
        }
        phase.start_voting(&addr(0), 1, t(0)).unwrap();
        let mut ledger = BallotLedger::new();
        for (seed, candidate) in [(1u8, 1u32), (2, 1), (3, 2)] {
            ledger
                .cast_vote(&mut identity, &phase, &addr(seed), CandidateId::new(candidate), t(5))
                .unwrap();
        }
        (identity, phase, ledger)
    }

    fn finalized() -> (IdentityRegistry, BallotLedger, TallyEngine) {
        let (identity, mut phase, ledger) = voted();
        phase.end_election(&addr(0), t(60)).unwrap();
        phase.finalize(&addr(0), t(61)).unwrap();
        let mut tally = TallyEngine::new();
        tally.freeze(&identity, &ledger, t(61));
        (identity, ledger, tally)
    }

    #[test]
    fn honest_election_verifies() {
        let (identity, _, ledger) = voted();
        let tally = TallyEngine::new();
        assert!(verify_vote_counts(&identity, &ledger, &tally));

        let (identity, ledger, tally) = finalized();
        let report = audit_report(&identity, &ledger, &tally);
        assert!(report.counts_match);
        assert!(report.chain_intact);
        assert_eq!(report.recomputed_total, 3);
        assert_eq!(report.recorded_voters, 3);
        assert!(report.discrepancies.is_empty());
    }

    #[test]
    fn empty_election_verifies() {
        let identity = IdentityRegistry::new(AccessPolicy::new(addr(0)), 6);
        let report = audit_report(&identity, &BallotLedger::new(), &TallyEngine::new());
        assert!(report.counts_match);
        assert_eq!(report.recomputed_total, 0);
    }

    #[test]
    fn tampered_snapshot_is_detected() {
        let (identity, ledger, tally) = finalized();
        let mut value = serde_json::to_value(&tally).unwrap();
        value["frozen"][1]["vote_count"] = serde_json::json!(7);
        let tampered: TallyEngine = serde_json::from_value(value).unwrap();

        let report = audit_report(&identity, &ledger, &tampered);
        assert!(!report.counts_match);
        assert_eq!(
            report.discrepancies,
            vec![Discrepancy {
                candidate_id: CandidateId::new(2),
                recomputed: 1,
                running: 1,
                frozen: Some(7),
            }]
        );
        // The ballots themselves were untouched.
        assert!(report.chain_intact);
    }

    #[test]
    fn rewritten_ballot_is_detected() {
        let (identity, ledger, tally) = finalized();
        let mut value = serde_json::to_value(&ledger).unwrap();
        value["votes"][0]["candidate"] = serde_json::json!(2);
        let tampered: BallotLedger = serde_json::from_value(value).unwrap();

        let report = audit_report(&identity, &tampered, &tally);
        assert!(!report.counts_match);
        assert!(!report.chain_intact);
        assert_eq!(report.first_broken_sequence, Some(0));
        let ids: Vec<_> = report.discrepancies.iter().map(|d| d.candidate_id.get()).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn cleared_voted_flag_is_detected() {
        let (identity, ledger, tally) = finalized();
        let mut value = serde_json::to_value(&identity).unwrap();
        value["voters"][addr(1).to_string()]["has_voted"] = serde_json::json!(false);
        let tampered: IdentityRegistry = serde_json::from_value(value).unwrap();

        let report = audit_report(&tampered, &ledger, &tally);
        assert!(!report.counts_match);
        assert_eq!(report.recorded_voters, 2);
        assert_eq!(report.recomputed_total, 3);
        assert_eq!(report.unflagged_ballots, 1);
        assert!(report.discrepancies.is_empty());
    }

    #[test]
    fn voted_flag_without_ballot_is_detected() {
        let (mut identity, _, ledger) = voted();
        identity
            .self_register_voter(&addr(4), Phase::VotingOpen, VoterApplication::new("100004", "V"), t(6))
            .unwrap();
        identity.mark_voted(&addr(4)).unwrap();

        let report = audit_report(&identity, &ledger, &TallyEngine::new());
        assert!(!report.counts_match);
        assert_eq!(report.recorded_voters, 4);
        assert_eq!(report.recomputed_total, 3);
        assert_eq!(report.unflagged_ballots, 0);
    }

    #[test]
    fn second_ballot_from_one_voter_is_detected() {
        let (identity, _, ledger) = voted();
        let mut value = serde_json::to_value(&ledger).unwrap();
        value["votes"][1]["voter"] = serde_json::json!(addr(1).to_string());
        let tampered: BallotLedger = serde_json::from_value(value).unwrap();

        let report = audit_report(&identity, &tampered, &TallyEngine::new());
        assert!(!report.counts_match);
        assert_eq!(report.duplicate_ballots, 1);
        assert_eq!(report.recorded_voters, 3);
    }

    #[test]
    fn ballot_for_unknown_candidate_is_flagged() {
        let (identity, _, ledger) = voted();
        let mut value = serde_json::to_value(&ledger).unwrap();
        value["votes"][2]["candidate"] = serde_json::json!(9);
        let tampered: BallotLedger = serde_json::from_value(value).unwrap();

        let report = audit_report(&identity, &tampered, &TallyEngine::new());
        assert_eq!(report.unknown_candidate_votes, 1);
        assert!(!report.counts_match);
    }
}
