//! Fundamental types for the election engine.
//!
//! This crate defines the value types shared by every other crate in the workspace:
//! caller addresses, national identifiers, candidate ids, timestamps and clocks, the
//! election phase, access roles, ballot hashes, and the error taxonomy.

pub mod address;
pub mod clock;
pub mod error;
pub mod hash;
pub mod identifier;
pub mod phase;
pub mod role;
pub mod time;

pub use address::Address;
pub use clock::{Clock, SystemClock};
pub use error::{ElectionError, ErrorKind};
pub use hash::BallotHash;
pub use identifier::{CandidateId, NationalId};
pub use phase::Phase;
pub use role::{AccessPolicy, Role};
pub use time::Timestamp;
