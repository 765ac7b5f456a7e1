//! Voter records.

use elect_types::{Address, NationalId, Timestamp};
use serde::{Deserialize, Serialize};

/// A registered voter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    pub address: Address,
    pub national_id: NationalId,
    pub name: String,
    pub is_registered: bool,
    /// Set exactly once, when the voter's ballot is committed.
    pub has_voted: bool,
    pub registered_at: Timestamp,
    /// Whether the voter registered themself rather than through the commission.
    pub self_registered: bool,
}

/// The caller-supplied part of a voter registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterApplication {
    pub national_id: String,
    pub name: String,
}

impl VoterApplication {
    pub fn new(national_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            national_id: national_id.into(),
            name: name.into(),
        }
    }
}
