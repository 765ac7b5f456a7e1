//! Election phase control.
//!
//! Lifecycle: NotStarted → RegistrationOpen → VotingOpen → Ended → Finalized.
//! Each transition is a commission-only step from exactly one predecessor.
//!
//! Gating never reads the stored phase directly; it goes through
//! [`effective_phase`], which treats an open vote whose deadline has passed as
//! expired even before the commission calls `end_election`.

pub mod controller;
pub mod effective;

pub use controller::{PhaseController, PhaseTransition};
pub use effective::{effective_phase, EffectivePhase};
