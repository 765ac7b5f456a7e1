//! Voter and candidate identity for the election engine.
//!
//! The [`IdentityRegistry`] owns every [`Voter`] and [`Candidate`] record and
//! enforces the uniqueness rules:
//! - a national id appears at most once among voters, and at most once among
//!   candidates (the two namespaces are independent)
//! - an address registers as a voter at most once
//!
//! Records are write-once. The only mutable field is a voter's `has_voted` flag,
//! flipped by the ballot path through [`IdentityRegistry::mark_voted`].

pub mod candidate;
pub mod registry;
pub mod voter;

pub use candidate::{Candidate, CandidateApplication};
pub use registry::IdentityRegistry;
pub use voter::{Voter, VoterApplication};
