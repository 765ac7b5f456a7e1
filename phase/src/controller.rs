//! The phase state machine.

use elect_types::{AccessPolicy, Address, ElectionError, Phase, Timestamp};
use serde::{Deserialize, Serialize};

use crate::effective::{effective_phase, EffectivePhase};

/// One committed phase change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: Phase,
    pub to: Phase,
    pub at: Timestamp,
}

/// Owns the election phase and the voting deadline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PhaseController {
    policy: AccessPolicy,
    phase: Phase,
    /// Set once, on entering VotingOpen.
    voting_deadline: Option<Timestamp>,
    history: Vec<PhaseTransition>,
}

impl PhaseController {
    pub fn new(policy: AccessPolicy) -> Self {
        Self {
            policy,
            phase: Phase::NotStarted,
            voting_deadline: None,
            history: Vec::new(),
        }
    }

    /// NotStarted → RegistrationOpen.
    pub fn start_registration(&mut self, caller: &Address, now: Timestamp) -> Result<(), ElectionError> {
        self.policy.require_commission(caller)?;
        self.require_phase(Phase::NotStarted, "open registration")?;
        self.advance(Phase::RegistrationOpen, now);
        Ok(())
    }

    /// RegistrationOpen → VotingOpen, with the deadline `duration_minutes` from now.
    pub fn start_voting(
        &mut self,
        caller: &Address,
        duration_minutes: u64,
        now: Timestamp,
    ) -> Result<Timestamp, ElectionError> {
        self.policy.require_commission(caller)?;
        self.require_phase(Phase::RegistrationOpen, "open voting")?;
        if duration_minutes == 0 {
            return Err(ElectionError::InvalidDuration(duration_minutes));
        }
        let deadline = elect_utils::minutes_to_secs(duration_minutes)
            .and_then(|secs| now.checked_add_secs(secs))
            .ok_or(ElectionError::InvalidDuration(duration_minutes))?;

        self.voting_deadline = Some(deadline);
        self.advance(Phase::VotingOpen, now);
        tracing::debug!(
            %deadline,
            duration = %elect_utils::format_duration(deadline.elapsed_since(now)),
            "voting opened"
        );
        Ok(deadline)
    }

    /// VotingOpen → Ended, only once the deadline has passed.
    pub fn end_election(&mut self, caller: &Address, now: Timestamp) -> Result<(), ElectionError> {
        self.policy.require_commission(caller)?;
        self.require_phase(Phase::VotingOpen, "end the election")?;
        if let Some(deadline) = self.voting_deadline {
            if now < deadline {
                return Err(ElectionError::VotingPeriodNotEnded {
                    remaining_secs: deadline.remaining_from(now),
                });
            }
        }
        self.advance(Phase::Ended, now);
        Ok(())
    }

    /// Ended → Finalized.
    pub fn finalize(&mut self, caller: &Address, now: Timestamp) -> Result<(), ElectionError> {
        self.policy.require_commission(caller)?;
        match self.phase {
            Phase::Ended => {}
            Phase::Finalized => return Err(ElectionError::AlreadyFinalized),
            _ => return Err(ElectionError::ElectionNotEnded),
        }
        self.advance(Phase::Finalized, now);
        Ok(())
    }

    /// Gate for ballot casting: Ok only while voting is open and unexpired.
    pub fn require_voting_open(&self, now: Timestamp) -> Result<(), ElectionError> {
        match self.effective(now) {
            EffectivePhase::VotingOpen => Ok(()),
            EffectivePhase::VotingExpired => Err(ElectionError::VotingPeriodEnded),
            _ => Err(ElectionError::PhaseViolation {
                phase: self.phase,
                action: "cast a vote",
            }),
        }
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// The stored phase. Gating should use [`PhaseController::effective`].
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn effective(&self, now: Timestamp) -> EffectivePhase {
        effective_phase(self.phase, self.voting_deadline, now)
    }

    pub fn voting_deadline(&self) -> Option<Timestamp> {
        self.voting_deadline
    }

    /// Seconds until the deadline while voting is open; `None` in other phases.
    pub fn remaining_voting_time(&self, now: Timestamp) -> Option<u64> {
        match (self.phase, self.voting_deadline) {
            (Phase::VotingOpen, Some(deadline)) => Some(deadline.remaining_from(now)),
            _ => None,
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Every committed transition, oldest first.
    pub fn history(&self) -> &[PhaseTransition] {
        &self.history
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    fn require_phase(&self, expected: Phase, action: &'static str) -> Result<(), ElectionError> {
        if self.phase != expected {
            return Err(ElectionError::PhaseViolation {
                phase: self.phase,
                action,
            });
        }
        Ok(())
    }

    fn advance(&mut self, to: Phase, now: Timestamp) {
        debug_assert_eq!(self.phase.successor(), Some(to));
        self.history.push(PhaseTransition {
            from: self.phase,
            to,
            at: now,
        });
        self.phase = to;
    }
}
