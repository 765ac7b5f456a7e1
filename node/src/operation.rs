//! Operations and outcomes as data.
//!
//! An [`Operation`] is one call against an [`Election`], in a form an external
//! transport can deliver (JSON, tagged by `op`). Mutations are routed by
//! `ElectionNode::apply`; reads run through [`Operation::query`] and return an
//! [`Outcome`].

use elect_audit::{AuditReport, Auditor, VerificationRecord};
use elect_identity::{Candidate, Voter};
use elect_phase::EffectivePhase;
use elect_tally::ResultEntry;
use elect_types::{Address, BallotHash, CandidateId, ElectionError, Phase, Timestamp};
use serde::{Deserialize, Serialize};

use crate::election::Election;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    RegisterCandidate {
        caller: Address,
        national_id: String,
        name: String,
        #[serde(default)]
        party: String,
        #[serde(default)]
        manifesto: String,
    },
    SelfRegisterCandidate {
        caller: Address,
        national_id: String,
        name: String,
        #[serde(default)]
        party: String,
        #[serde(default)]
        manifesto: String,
    },
    RegisterVoter {
        caller: Address,
        address: Address,
        national_id: String,
        name: String,
    },
    SelfRegisterVoter {
        caller: Address,
        national_id: String,
        name: String,
    },
    StartRegistration {
        caller: Address,
    },
    StartVoting {
        caller: Address,
        duration_minutes: u64,
    },
    EndElection {
        caller: Address,
    },
    FinalizeResults {
        caller: Address,
    },
    CastVote {
        caller: Address,
        candidate_id: CandidateId,
    },
    ApproveAuditor {
        caller: Address,
        address: Address,
        organization: String,
    },
    SubmitVerification {
        caller: Address,
        #[serde(default)]
        comments: String,
        verification_passed: bool,
    },
    CheckVoteByNationalId {
        caller: Address,
        national_id: String,
    },

    // Reads
    AllResults,
    Winner,
    VoterTurnout,
    VoteCount {
        candidate_id: CandidateId,
    },
    LiveCounts,
    VerifyVoteCounts,
    AuditReport,
    Phase,
    Candidate {
        candidate_id: CandidateId,
    },
    Voter {
        address: Address,
    },
    HasVoted {
        address: Address,
    },
    AllAuditors,
    AllVerificationRecords,
    VerificationRecord {
        index: u64,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum Outcome {
    Done,
    CandidateRegistered(CandidateId),
    VotingOpened { deadline: Timestamp },
    VoteCast { sequence: u64, hash: BallotHash },
    VerificationRecorded(VerificationRecord),
    Results(Vec<ResultEntry>),
    Winner(ResultEntry),
    Turnout(u64),
    Count(u64),
    Flag(bool),
    Report(AuditReport),
    Phase {
        stored: Phase,
        effective: EffectivePhase,
        remaining_secs: Option<u64>,
    },
    Candidate(Candidate),
    Voter(Voter),
    Auditors(Vec<Auditor>),
    VerificationRecords(Vec<VerificationRecord>),
}

impl Operation {
    /// Stable snake-case name, used for spans and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RegisterCandidate { .. } => "register_candidate",
            Self::SelfRegisterCandidate { .. } => "self_register_candidate",
            Self::RegisterVoter { .. } => "register_voter",
            Self::SelfRegisterVoter { .. } => "self_register_voter",
            Self::StartRegistration { .. } => "start_registration",
            Self::StartVoting { .. } => "start_voting",
            Self::EndElection { .. } => "end_election",
            Self::FinalizeResults { .. } => "finalize_results",
            Self::CastVote { .. } => "cast_vote",
            Self::ApproveAuditor { .. } => "approve_auditor",
            Self::SubmitVerification { .. } => "submit_verification",
            Self::CheckVoteByNationalId { .. } => "check_vote_by_national_id",
            Self::AllResults => "all_results",
            Self::Winner => "winner",
            Self::VoterTurnout => "voter_turnout",
            Self::VoteCount { .. } => "vote_count",
            Self::LiveCounts => "live_counts",
            Self::VerifyVoteCounts => "verify_vote_counts",
            Self::AuditReport => "audit_report",
            Self::Phase => "phase",
            Self::Candidate { .. } => "candidate",
            Self::Voter { .. } => "voter",
            Self::HasVoted { .. } => "has_voted",
            Self::AllAuditors => "all_auditors",
            Self::AllVerificationRecords => "all_verification_records",
            Self::VerificationRecord { .. } => "verification_record",
        }
    }

    /// The authenticated caller, for operations that have one.
    pub fn caller(&self) -> Option<&Address> {
        match self {
            Self::RegisterCandidate { caller, .. }
            | Self::SelfRegisterCandidate { caller, .. }
            | Self::RegisterVoter { caller, .. }
            | Self::SelfRegisterVoter { caller, .. }
            | Self::StartRegistration { caller }
            | Self::StartVoting { caller, .. }
            | Self::EndElection { caller }
            | Self::FinalizeResults { caller }
            | Self::CastVote { caller, .. }
            | Self::ApproveAuditor { caller, .. }
            | Self::SubmitVerification { caller, .. }
            | Self::CheckVoteByNationalId { caller, .. } => Some(caller),
            _ => None,
        }
    }

    /// Run a read-only operation.
    ///
    /// Mutations passed here fail with `InternalError` without side effects.
    pub fn query(&self, election: &Election, now: Timestamp) -> Result<Outcome, ElectionError> {
        match self {
            Self::CheckVoteByNationalId {
                caller,
                national_id,
            } => election
                .check_vote_by_national_id(caller, national_id)
                .map(Outcome::Flag),
            Self::AllResults => election.all_results().map(|r| Outcome::Results(r.to_vec())),
            Self::Winner => election.winner().map(|w| Outcome::Winner(w.clone())),
            Self::VoterTurnout => Ok(Outcome::Turnout(election.voter_turnout())),
            Self::VoteCount { candidate_id } => election.vote_count(*candidate_id).map(Outcome::Count),
            Self::LiveCounts => Ok(Outcome::Results(election.live_counts())),
            Self::VerifyVoteCounts => Ok(Outcome::Flag(election.verify_vote_counts())),
            Self::AuditReport => Ok(Outcome::Report(election.audit_report())),
            Self::Phase => Ok(Outcome::Phase {
                stored: election.phase(),
                effective: election.effective_phase(now),
                remaining_secs: election.remaining_voting_time(now),
            }),
            Self::Candidate { candidate_id } => election
                .candidate(*candidate_id)
                .map(|c| Outcome::Candidate(c.clone())),
            Self::Voter { address } => election.voter(address).map(|v| Outcome::Voter(v.clone())),
            Self::HasVoted { address } => Ok(Outcome::Flag(election.identity().has_voted(address))),
            Self::AllAuditors => Ok(Outcome::Auditors(election.audit().all_auditors().cloned().collect())),
            Self::AllVerificationRecords => Ok(Outcome::VerificationRecords(
                election.audit().all_verification_records().to_vec(),
            )),
            Self::VerificationRecord { index } => election
                .audit()
                .verification_record(*index)
                .map(|r| Outcome::VerificationRecorded(r.clone())),
            mutation => Err(ElectionError::Internal(format!(
                "{} cannot run as a read",
                mutation.name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elect_types::AccessPolicy;

    fn commission() -> Address {
        Address::from_bytes([0; 20])
    }

    #[test]
    fn parses_tagged_json() {
        let op: Operation = serde_json::from_str(
            r#"{"op":"cast_vote","caller":"0x0101010101010101010101010101010101010101","candidate_id":2}"#,
        )
        .unwrap();
        assert_eq!(
            op,
            Operation::CastVote {
                caller: Address::from_bytes([1; 20]),
                candidate_id: CandidateId::new(2),
            }
        );
        assert_eq!(op.name(), "cast_vote");
        assert_eq!(op.caller(), Some(&Address::from_bytes([1; 20])));
    }

    #[test]
    fn optional_fields_default() {
        let op: Operation = serde_json::from_str(
            r#"{"op":"register_candidate","caller":"0x0000000000000000000000000000000000000000","national_id":"200001","name":"Alice"}"#,
        )
        .unwrap();
        match op {
            Operation::RegisterCandidate { party, manifesto, .. } => {
                assert!(party.is_empty());
                assert!(manifesto.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn malformed_caller_rejected_at_parse() {
        let parsed: Result<Operation, _> =
            serde_json::from_str(r#"{"op":"start_registration","caller":"commission"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn reads_do_not_need_a_caller() {
        let op: Operation = serde_json::from_str(r#"{"op":"voter_turnout"}"#).unwrap();
        assert!(op.caller().is_none());
    }

    #[test]
    fn query_answers_reads() {
        let election = Election::new("T", AccessPolicy::new(commission()), 6);
        let now = Timestamp::new(0);
        assert_eq!(Operation::VoterTurnout.query(&election, now).unwrap(), Outcome::Turnout(0));
        assert_eq!(
            Operation::Phase.query(&election, now).unwrap(),
            Outcome::Phase {
                stored: Phase::NotStarted,
                effective: EffectivePhase::NotStarted,
                remaining_secs: None,
            }
        );
        let err = Operation::AllResults.query(&election, now).unwrap_err();
        assert_eq!(err.kind(), elect_types::ErrorKind::ResultsNotFinalized);
    }

    #[test]
    fn mutation_as_query_is_internal_error() {
        let election = Election::new("T", AccessPolicy::new(commission()), 6);
        let err = Operation::EndElection { caller: commission() }
            .query(&election, Timestamp::new(0))
            .unwrap_err();
        assert_eq!(err.kind(), elect_types::ErrorKind::InternalError);
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let json = serde_json::to_value(Outcome::Turnout(67)).unwrap();
        assert_eq!(json, serde_json::json!({"outcome": "turnout", "value": 67}));
    }
}
