//! Citizen and candidate identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ElectionError;

/// A national identification number: a fixed-length string of ASCII digits.
///
/// The length is a deployment setting; [`NationalId::DEFAULT_LENGTH`] matches the
/// citizen database format.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NationalId(String);

impl NationalId {
    pub const DEFAULT_LENGTH: usize = 6;

    /// Validate `raw` against the canonical pattern (`length` ASCII digits).
    pub fn parse(raw: &str, length: usize) -> Result<Self, ElectionError> {
        if raw.len() != length || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ElectionError::InvalidFormat(format!(
                "national id {raw:?} must be exactly {length} digits"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NationalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sequential candidate identifier, assigned from 1 upwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CandidateId(u32);

impl CandidateId {
    pub const FIRST: Self = Self(1);

    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    /// The id following this one, or `None` if the id space is exhausted.
    pub fn next(&self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
