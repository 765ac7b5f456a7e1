//! Candidate records.

use elect_types::{Address, CandidateId, NationalId, Timestamp};
use serde::{Deserialize, Serialize};

/// A registered candidate. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub national_id: NationalId,
    pub name: String,
    pub party: String,
    pub manifesto: String,
    pub is_registered: bool,
    /// The caller that nominated themself, `None` for commission registrations.
    pub registrant: Option<Address>,
    pub registered_at: Timestamp,
}

/// The caller-supplied part of a candidate registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateApplication {
    pub national_id: String,
    pub name: String,
    pub party: String,
    pub manifesto: String,
}

impl CandidateApplication {
    pub fn new(
        national_id: impl Into<String>,
        name: impl Into<String>,
        party: impl Into<String>,
        manifesto: impl Into<String>,
    ) -> Self {
        Self {
            national_id: national_id.into(),
            name: name.into(),
            party: party.into(),
            manifesto: manifesto.into(),
        }
    }
}
