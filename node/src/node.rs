//! The shared, concurrent election service.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::Mutex;
use tracing::Instrument;

use elect_audit::VerificationRecord;
use elect_ballot::Vote;
use elect_identity::{CandidateApplication, VoterApplication};
use elect_types::{Address, CandidateId, Clock, ElectionError, Phase, Timestamp};

use crate::config::ElectionConfig;
use crate::election::Election;
use crate::events::{ElectionEvent, EventBus};
use crate::metrics::ElectionMetrics;
use crate::operation::{Operation, Outcome};
use crate::tracing_spans;
use crate::NodeError;

/// Owns the election and publishes an immutable view of it after every commit.
///
/// Mutations validate and commit while holding the writer lock, so concurrent
/// calls are serialized. Reads clone the published view and never wait for a
/// pending mutation; they see the last committed state, never a partial one.
pub struct ElectionNode {
    election: Mutex<Election>,
    published: RwLock<Arc<Election>>,
    clock: Arc<dyn Clock>,
    metrics: Option<Arc<ElectionMetrics>>,
    events: EventBus,
}

impl ElectionNode {
    pub fn new(config: &ElectionConfig, clock: Arc<dyn Clock>) -> Result<Self, NodeError> {
        let election = Election::from_config(config)?;
        Self::with_election(config, election, clock)
    }

    /// Resume from a snapshot file written by [`ElectionNode::save_snapshot`].
    ///
    /// The snapshot must name the configured commission.
    pub fn restore(config: &ElectionConfig, path: &Path, clock: Arc<dyn Clock>) -> Result<Self, NodeError> {
        let _span = tracing_spans::snapshot_span("restore", &path.display().to_string()).entered();
        let election = Election::load_from_file(path)?;
        if election.policy() != &config.access_policy()? {
            return Err(NodeError::Snapshot(format!(
                "snapshot commission {} does not match configured {}",
                election.policy().commission(),
                config.commission
            )));
        }
        tracing::info!(
            name = election.name(),
            phase = %election.phase(),
            votes = election.ledger().total_votes(),
            "election restored"
        );
        Self::with_election(config, election, clock)
    }

    fn with_election(config: &ElectionConfig, election: Election, clock: Arc<dyn Clock>) -> Result<Self, NodeError> {
        let metrics = if config.enable_metrics {
            Some(Arc::new(ElectionMetrics::new()?))
        } else {
            None
        };
        if let Some(metrics) = &metrics {
            Self::refresh_gauges(metrics, &election);
        }
        Ok(Self {
            published: RwLock::new(Arc::new(election.clone())),
            election: Mutex::new(election),
            clock,
            metrics,
            events: EventBus::new(),
        })
    }

    /// Register an event listener. Listeners must be added before the node is
    /// shared.
    pub fn subscribe(&mut self, listener: Box<dyn Fn(&ElectionEvent) + Send + Sync>) {
        self.events.subscribe(listener);
    }

    pub fn metrics(&self) -> Option<&ElectionMetrics> {
        self.metrics.as_deref()
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    // ── Mutations ───────────────────────────────────────────────────────

    pub async fn register_candidate(
        &self,
        caller: &Address,
        application: CandidateApplication,
    ) -> Result<CandidateId, ElectionError> {
        self.mutate("register_candidate", caller, |e, now| {
            let id = e.register_candidate(caller, application, now)?;
            Ok((id, vec![ElectionEvent::CandidateRegistered { id, registrant: None }]))
        })
        .await
    }

    pub async fn self_register_candidate(
        &self,
        caller: &Address,
        application: CandidateApplication,
    ) -> Result<CandidateId, ElectionError> {
        self.mutate("self_register_candidate", caller, |e, now| {
            let id = e.self_register_candidate(caller, application, now)?;
            let event = ElectionEvent::CandidateRegistered {
                id,
                registrant: Some(caller.clone()),
            };
            Ok((id, vec![event]))
        })
        .await
    }

    pub async fn register_voter(
        &self,
        caller: &Address,
        address: &Address,
        application: VoterApplication,
    ) -> Result<(), ElectionError> {
        self.mutate("register_voter", caller, |e, now| {
            e.register_voter(caller, address, application, now)?;
            let event = ElectionEvent::VoterRegistered {
                address: address.clone(),
                self_registered: false,
            };
            Ok(((), vec![event]))
        })
        .await
    }

    pub async fn self_register_voter(
        &self,
        caller: &Address,
        application: VoterApplication,
    ) -> Result<(), ElectionError> {
        self.mutate("self_register_voter", caller, |e, now| {
            e.self_register_voter(caller, application, now)?;
            let event = ElectionEvent::VoterRegistered {
                address: caller.clone(),
                self_registered: true,
            };
            Ok(((), vec![event]))
        })
        .await
    }

    pub async fn start_registration(&self, caller: &Address) -> Result<(), ElectionError> {
        self.mutate("start_registration", caller, |e, now| {
            e.start_registration(caller, now)?;
            Ok(((), Self::last_transition(e)))
        })
        .await
    }

    pub async fn start_voting(&self, caller: &Address, duration_minutes: u64) -> Result<Timestamp, ElectionError> {
        self.mutate("start_voting", caller, |e, now| {
            let deadline = e.start_voting(caller, duration_minutes, now)?;
            Ok((deadline, Self::last_transition(e)))
        })
        .await
    }

    pub async fn end_election(&self, caller: &Address) -> Result<(), ElectionError> {
        self.mutate("end_election", caller, |e, now| {
            e.end_election(caller, now)?;
            Ok(((), Self::last_transition(e)))
        })
        .await
    }

    pub async fn finalize_results(&self, caller: &Address) -> Result<(), ElectionError> {
        self.mutate("finalize_results", caller, |e, now| {
            e.finalize_results(caller, now)?;
            let mut events = Self::last_transition(e);
            events.push(ElectionEvent::ResultsFinalized {
                winner: e.winner().ok().map(|w| w.candidate_id),
                total_votes: e.ledger().total_votes(),
            });
            Ok(((), events))
        })
        .await
    }

    pub async fn cast_vote(&self, caller: &Address, candidate: CandidateId) -> Result<Vote, ElectionError> {
        self.mutate("cast_vote", caller, |e, now| {
            let vote = e.cast_vote(caller, candidate, now)?;
            let event = ElectionEvent::VoteCast {
                voter: caller.clone(),
                sequence: vote.sequence,
                hash: vote.hash,
            };
            Ok((vote, vec![event]))
        })
        .instrument(tracing_spans::cast_vote_span(caller.as_str()))
        .await
    }

    pub async fn approve_auditor(
        &self,
        caller: &Address,
        address: &Address,
        organization: &str,
    ) -> Result<(), ElectionError> {
        self.mutate("approve_auditor", caller, |e, now| {
            e.approve_auditor(caller, address, organization, now)?;
            let event = ElectionEvent::AuditorApproved {
                address: address.clone(),
                organization: organization.trim().to_string(),
            };
            Ok(((), vec![event]))
        })
        .await
    }

    pub async fn submit_verification(
        &self,
        caller: &Address,
        comments: &str,
        verification_passed: bool,
    ) -> Result<VerificationRecord, ElectionError> {
        self.mutate("submit_verification", caller, |e, now| {
            let record = e.submit_verification(caller, comments, verification_passed, now)?;
            let event = ElectionEvent::VerificationSubmitted {
                auditor: caller.clone(),
                passed: verification_passed,
            };
            Ok((record, vec![event]))
        })
        .await
    }

    // ── Reads ───────────────────────────────────────────────────────────

    /// Run `f` against the last committed state.
    pub async fn read<T>(&self, f: impl FnOnce(&Election, Timestamp) -> T) -> T {
        let view = self.view();
        f(&view, self.clock.now())
    }

    /// The last committed state. Later commits do not change it.
    pub fn view(&self) -> Arc<Election> {
        let published = self.published.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*published)
    }

    pub async fn phase(&self) -> Phase {
        self.read(|e, _| e.phase()).await
    }

    pub async fn has_voted(&self, address: &Address) -> bool {
        self.read(|e, _| e.identity().has_voted(address)).await
    }

    pub async fn voter_turnout(&self) -> u64 {
        self.read(|e, _| e.voter_turnout()).await
    }

    pub async fn verify_vote_counts(&self) -> bool {
        self.read(|e, _| {
            let _span = tracing_spans::audit_span(e.ledger().total_votes()).entered();
            e.verify_vote_counts()
        })
        .await
    }

    // ── Dispatch ────────────────────────────────────────────────────────

    /// Run an [`Operation`]: mutations through the typed methods above, reads
    /// against the published view.
    pub async fn apply(&self, op: Operation) -> Result<Outcome, ElectionError> {
        let caller = op.caller().map(|c| c.to_string()).unwrap_or_default();
        let span = tracing_spans::operation_span(op.name(), &caller);
        self.dispatch(op).instrument(span).await
    }

    async fn dispatch(&self, op: Operation) -> Result<Outcome, ElectionError> {
        match op {
            Operation::RegisterCandidate {
                caller,
                national_id,
                name,
                party,
                manifesto,
            } => self
                .register_candidate(&caller, CandidateApplication::new(national_id, name, party, manifesto))
                .await
                .map(Outcome::CandidateRegistered),
            Operation::SelfRegisterCandidate {
                caller,
                national_id,
                name,
                party,
                manifesto,
            } => self
                .self_register_candidate(&caller, CandidateApplication::new(national_id, name, party, manifesto))
                .await
                .map(Outcome::CandidateRegistered),
            Operation::RegisterVoter {
                caller,
                address,
                national_id,
                name,
            } => self
                .register_voter(&caller, &address, VoterApplication::new(national_id, name))
                .await
                .map(|()| Outcome::Done),
            Operation::SelfRegisterVoter {
                caller,
                national_id,
                name,
            } => self
                .self_register_voter(&caller, VoterApplication::new(national_id, name))
                .await
                .map(|()| Outcome::Done),
            Operation::StartRegistration { caller } => {
                self.start_registration(&caller).await.map(|()| Outcome::Done)
            }
            Operation::StartVoting {
                caller,
                duration_minutes,
            } => self
                .start_voting(&caller, duration_minutes)
                .await
                .map(|deadline| Outcome::VotingOpened { deadline }),
            Operation::EndElection { caller } => self.end_election(&caller).await.map(|()| Outcome::Done),
            Operation::FinalizeResults { caller } => {
                self.finalize_results(&caller).await.map(|()| Outcome::Done)
            }
            Operation::CastVote {
                caller,
                candidate_id,
            } => self
                .cast_vote(&caller, candidate_id)
                .await
                .map(|vote| Outcome::VoteCast {
                    sequence: vote.sequence,
                    hash: vote.hash,
                }),
            Operation::ApproveAuditor {
                caller,
                address,
                organization,
            } => self
                .approve_auditor(&caller, &address, &organization)
                .await
                .map(|()| Outcome::Done),
            Operation::SubmitVerification {
                caller,
                comments,
                verification_passed,
            } => self
                .submit_verification(&caller, &comments, verification_passed)
                .await
                .map(Outcome::VerificationRecorded),
            read => {
                let result = self.read(|e, now| read.query(e, now)).await;
                if let Err(err) = &result {
                    self.record_rejection(read.name(), err);
                }
                result
            }
        }
    }

    // ── Persistence ─────────────────────────────────────────────────────

    /// Write the current state to `path`.
    pub async fn save_snapshot(&self, path: &Path) -> Result<(), NodeError> {
        let span = tracing_spans::snapshot_span("save", &path.display().to_string());
        async {
            let bytes = self.view().snapshot()?;
            tokio::fs::write(path, &bytes).await?;
            tracing::info!(bytes = bytes.len(), path = %path.display(), "snapshot saved");
            Ok(())
        }
        .instrument(span)
        .await
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    async fn mutate<T>(
        &self,
        action: &'static str,
        caller: &Address,
        f: impl FnOnce(&mut Election, Timestamp) -> Result<(T, Vec<ElectionEvent>), ElectionError>,
    ) -> Result<T, ElectionError> {
        let mut election = self.election.lock().await;
        let now = self.clock.now();
        match f(&mut *election, now) {
            Ok((value, events)) => {
                self.publish(&election);
                tracing::info!(action, caller = %caller, at = %now, "committed");
                if let Some(metrics) = &self.metrics {
                    for event in &events {
                        Self::count_event(metrics, event);
                    }
                    Self::refresh_gauges(metrics, &*election);
                }
                for event in &events {
                    self.events.emit(event);
                }
                Ok(value)
            }
            Err(err) => {
                self.record_rejection(action, &err);
                Err(err)
            }
        }
    }

    fn publish(&self, election: &Election) {
        let view = Arc::new(election.clone());
        *self.published.write().unwrap_or_else(PoisonError::into_inner) = view;
    }

    fn record_rejection(&self, action: &'static str, err: &ElectionError) {
        tracing::debug!(action, kind = %err.kind(), error = %err, "rejected");
        if let Some(metrics) = &self.metrics {
            metrics.record_rejection(err.kind());
        }
    }

    fn last_transition(election: &Election) -> Vec<ElectionEvent> {
        election
            .phase_controller()
            .history()
            .last()
            .map(|t| ElectionEvent::PhaseChanged {
                from: t.from,
                to: t.to,
                at: t.at,
            })
            .into_iter()
            .collect()
    }

    fn count_event(metrics: &ElectionMetrics, event: &ElectionEvent) {
        match event {
            ElectionEvent::CandidateRegistered { .. } => metrics.candidate_registrations.inc(),
            ElectionEvent::VoterRegistered { .. } => metrics.voter_registrations.inc(),
            ElectionEvent::PhaseChanged { .. } => metrics.phase_transitions.inc(),
            ElectionEvent::VoteCast { .. } => metrics.votes_cast.inc(),
            ElectionEvent::VerificationSubmitted { .. } => metrics.verification_records.inc(),
            ElectionEvent::AuditorApproved { .. } | ElectionEvent::ResultsFinalized { .. } => {}
        }
    }

    fn refresh_gauges(metrics: &ElectionMetrics, election: &Election) {
        metrics
            .registered_voters
            .set(election.identity().total_voters() as i64);
        metrics
            .registered_candidates
            .set(election.identity().total_candidates() as i64);
        metrics
            .approved_auditors
            .set(election.audit().total_auditors() as i64);
        metrics.phase.set(election.phase() as i64);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use elect_nullables::NullClock;

    fn commission() -> Address {
        Address::from_bytes([0xC0; 20])
    }

    fn node() -> ElectionNode {
        let config = ElectionConfig {
            commission: commission().to_string(),
            ..ElectionConfig::default()
        };
        ElectionNode::new(&config, Arc::new(NullClock::new(0))).unwrap()
    }

    #[tokio::test]
    async fn reads_proceed_while_a_writer_holds_the_lock() {
        let node = node();
        node.start_registration(&commission()).await.unwrap();

        let writer = node.election.lock().await;
        let phase = tokio::time::timeout(Duration::from_secs(1), node.phase())
            .await
            .expect("read waited for the writer");
        assert_eq!(phase, Phase::RegistrationOpen);
        drop(writer);
    }

    #[tokio::test]
    async fn views_are_immutable_snapshots() {
        let node = node();
        let before = node.view();
        node.start_registration(&commission()).await.unwrap();

        assert_eq!(before.phase(), Phase::NotStarted);
        assert_eq!(node.view().phase(), Phase::RegistrationOpen);
    }

    #[tokio::test]
    async fn rejected_mutation_leaves_view_untouched() {
        let node = node();
        let before = node.view();
        let err = node.start_voting(&commission(), 5).await.unwrap_err();
        assert_eq!(err.kind(), elect_types::ErrorKind::PhaseViolation);
        assert!(Arc::ptr_eq(&before, &node.view()));
    }
}
