//! Notifications emitted after each committed mutation.

use elect_types::{Address, BallotHash, CandidateId, Phase, Timestamp};

/// Election-level events that observers can subscribe to via the [`EventBus`].
///
/// Emitted only after the mutation has been committed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ElectionEvent {
    CandidateRegistered {
        id: CandidateId,
        /// Set when the candidate nominated themselves.
        registrant: Option<Address>,
    },
    VoterRegistered {
        address: Address,
        self_registered: bool,
    },
    PhaseChanged {
        from: Phase,
        to: Phase,
        at: Timestamp,
    },
    VoteCast {
        voter: Address,
        sequence: u64,
        hash: BallotHash,
    },
    AuditorApproved {
        address: Address,
        organization: String,
    },
    VerificationSubmitted {
        auditor: Address,
        passed: bool,
    },
    ResultsFinalized {
        winner: Option<CandidateId>,
        total_votes: u64,
    },
}

/// Synchronous fan-out event bus.
///
/// Listeners run inline while the election write lock is held; keep them fast.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&ElectionEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&ElectionEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &ElectionEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn voter() -> Address {
        Address::from_bytes([1; 20])
    }

    #[test]
    fn emit_calls_all_listeners() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut bus = EventBus::new();

        let c1 = Arc::clone(&counter);
        bus.subscribe(Box::new(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        }));
        let c2 = Arc::clone(&counter);
        bus.subscribe(Box::new(move |_| {
            c2.fetch_add(10, Ordering::SeqCst);
        }));

        bus.emit(&ElectionEvent::VoterRegistered {
            address: voter(),
            self_registered: true,
        });
        assert_eq!(counter.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn emit_with_no_listeners_is_noop() {
        let bus = EventBus::new();
        bus.emit(&ElectionEvent::ResultsFinalized {
            winner: None,
            total_votes: 0,
        });
    }

    #[test]
    fn listener_sees_the_variant() {
        let votes = Arc::new(AtomicUsize::new(0));
        let mut bus = EventBus::new();
        let v = Arc::clone(&votes);
        bus.subscribe(Box::new(move |event| {
            if let ElectionEvent::VoteCast { .. } = event {
                v.fetch_add(1, Ordering::SeqCst);
            }
        }));

        bus.emit(&ElectionEvent::VoteCast {
            voter: voter(),
            sequence: 0,
            hash: BallotHash::ZERO,
        });
        bus.emit(&ElectionEvent::PhaseChanged {
            from: Phase::NotStarted,
            to: Phase::RegistrationOpen,
            at: Timestamp::new(0),
        });
        assert_eq!(votes.load(Ordering::SeqCst), 1);
    }
}
