//! Auditor and verification log records.

use elect_types::{Address, Timestamp};
use serde::{Deserialize, Serialize};

/// An independent observer approved by the commission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auditor {
    pub address: Address,
    pub organization: String,
    pub approved: bool,
    /// Time of the most recent approval.
    pub approved_at: Timestamp,
}

/// One auditor's attestation. Append-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub auditor: Address,
    pub timestamp: Timestamp,
    pub comments: String,
    pub verification_passed: bool,
}
