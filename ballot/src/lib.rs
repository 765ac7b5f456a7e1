//! The ballot ledger.
//!
//! Votes are appended, never edited or removed. Each vote is chained to its
//! predecessor with a Blake2b digest, so rewriting any stored ballot is
//! detectable by recomputing the chain.

pub mod hash;
pub mod ledger;
pub mod vote;

pub use ledger::BallotLedger;
pub use vote::Vote;
