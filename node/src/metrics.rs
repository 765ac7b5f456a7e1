//! Prometheus metrics for the election node.
//!
//! [`ElectionMetrics`] owns a dedicated [`Registry`]; [`ElectionMetrics::encode`]
//! renders it in the Prometheus text exposition format.

use prometheus::{
    register_int_counter_vec_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

use elect_types::ErrorKind;

use crate::NodeError;

pub struct ElectionMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Ballots committed to the ledger.
    pub votes_cast: IntCounter,
    /// Voter registrations, self-service and commission-led.
    pub voter_registrations: IntCounter,
    pub candidate_registrations: IntCounter,
    pub phase_transitions: IntCounter,
    pub verification_records: IntCounter,
    /// Operations rejected, labelled by error kind.
    pub rejected_operations: IntCounterVec,

    // ── Gauges ──────────────────────────────────────────────────────────
    pub registered_voters: IntGauge,
    pub registered_candidates: IntGauge,
    pub approved_auditors: IntGauge,
    /// Current stored phase as its lifecycle index (0 = NotStarted).
    pub phase: IntGauge,
}

impl ElectionMetrics {
    pub fn new() -> Result<Self, NodeError> {
        let registry = Registry::new();

        let votes_cast = register_int_counter_with_registry!(
            Opts::new("election_votes_cast_total", "Ballots committed to the ledger"),
            registry
        )?;
        let voter_registrations = register_int_counter_with_registry!(
            Opts::new("election_voter_registrations_total", "Voters registered"),
            registry
        )?;
        let candidate_registrations = register_int_counter_with_registry!(
            Opts::new("election_candidate_registrations_total", "Candidates registered"),
            registry
        )?;
        let phase_transitions = register_int_counter_with_registry!(
            Opts::new("election_phase_transitions_total", "Committed phase transitions"),
            registry
        )?;
        let verification_records = register_int_counter_with_registry!(
            Opts::new("election_verification_records_total", "Auditor verification records filed"),
            registry
        )?;
        let rejected_operations = register_int_counter_vec_with_registry!(
            Opts::new("election_rejected_operations_total", "Operations rejected by precondition"),
            &["kind"],
            registry
        )?;

        let registered_voters = register_int_gauge_with_registry!(
            Opts::new("election_registered_voters", "Current number of registered voters"),
            registry
        )?;
        let registered_candidates = register_int_gauge_with_registry!(
            Opts::new("election_registered_candidates", "Current number of registered candidates"),
            registry
        )?;
        let approved_auditors = register_int_gauge_with_registry!(
            Opts::new("election_approved_auditors", "Current number of approved auditors"),
            registry
        )?;
        let phase = register_int_gauge_with_registry!(
            Opts::new("election_phase", "Stored election phase (0 = not started, 4 = finalized)"),
            registry
        )?;

        Ok(Self {
            registry,
            votes_cast,
            voter_registrations,
            candidate_registrations,
            phase_transitions,
            verification_records,
            rejected_operations,
            registered_voters,
            registered_candidates,
            approved_auditors,
            phase,
        })
    }

    pub fn record_rejection(&self, kind: ErrorKind) {
        self.rejected_operations.with_label_values(&[kind.as_str()]).inc();
    }

    /// Render every metric in the Prometheus text format.
    pub fn encode(&self) -> Result<String, NodeError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| NodeError::Config(format!("metrics encoding: {e}")))
    }
}
