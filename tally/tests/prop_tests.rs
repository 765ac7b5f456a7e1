use proptest::prelude::*;

use elect_ballot::BallotLedger;
use elect_identity::{CandidateApplication, IdentityRegistry, VoterApplication};
use elect_phase::PhaseController;
use elect_tally::result::leader;
use elect_tally::{ResultEntry, TallyEngine};
use elect_types::{AccessPolicy, Address, CandidateId, NationalId, Phase, Timestamp};

fn entry(id: u32, votes: u64) -> ResultEntry {
    ResultEntry {
        candidate_id: CandidateId::new(id),
        national_id: NationalId::parse(&format!("{:06}", id), 6).unwrap(),
        name: format!("C{id}"),
        party: String::new(),
        vote_count: votes,
    }
}

fn addr(seed: u16) -> Address {
    let mut bytes = [0u8; 20];
    bytes[18..].copy_from_slice(&seed.to_be_bytes());
    Address::from_bytes(bytes)
}

proptest! {
    /// The leader has the maximum count and the lowest id among those tied for it,
    /// whatever order the rows arrive in.
    #[test]
    fn leader_is_max_then_lowest_id(counts in prop::collection::vec(0u64..5, 1..12), rotate in 0usize..12) {
        let mut entries: Vec<ResultEntry> = counts
            .iter()
            .enumerate()
            .map(|(i, &c)| entry(i as u32 + 1, c))
            .collect();
        let shift = rotate % entries.len();
        entries.rotate_left(shift);

        let best = leader(&entries).unwrap();
        let max = *counts.iter().max().unwrap();
        let first_max = counts.iter().position(|&c| c == max).unwrap() as u32 + 1;
        prop_assert_eq!(best.vote_count, max);
        prop_assert_eq!(best.candidate_id, CandidateId::new(first_max));
    }

    /// Turnout stays within 0..=100 and matches the half-up formula.
    #[test]
    fn turnout_matches_formula(voters in 1u16..40, cast_ratio in 0u16..=100) {
        let commission = addr(0);
        let policy = AccessPolicy::new(commission.clone());
        let mut identity = IdentityRegistry::new(policy.clone(), 6);
        let mut phase = PhaseController::new(policy);
        let t0 = Timestamp::new(0);

        identity
            .register_candidate(&commission, Phase::NotStarted, CandidateApplication::new("900000", "Solo", "", ""), t0)
            .unwrap();
        phase.start_registration(&commission, t0).unwrap();
        for seed in 1..=voters {
            identity
                .self_register_voter(&addr(seed), Phase::RegistrationOpen, VoterApplication::new(format!("{:06}", seed), "V"), t0)
                .unwrap();
        }
        phase.start_voting(&commission, 10, t0).unwrap();

        let cast = voters as u64 * cast_ratio as u64 / 100;
        let mut ledger = BallotLedger::new();
        for seed in 1..=cast as u16 {
            ledger
                .cast_vote(&mut identity, &phase, &addr(seed), CandidateId::new(1), Timestamp::new(1))
                .unwrap();
        }

        let turnout = TallyEngine::voter_turnout(&identity, &ledger);
        let expected = (cast * 100 + voters as u64 / 2) / voters as u64;
        prop_assert!(turnout <= 100);
        prop_assert_eq!(turnout, expected);
    }
}
