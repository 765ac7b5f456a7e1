//! Access roles and the single-authority policy.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Address, ElectionError};

/// A privileged capability a caller may be required to hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// The single election authority: registers candidates, drives phases,
    /// approves auditors.
    Commission,
    /// A commission-approved identity that may file verification reports.
    Auditor,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Commission => f.write_str("commission"),
            Self::Auditor => f.write_str("auditor"),
        }
    }
}

/// Who holds [`Role::Commission`]. Injected from configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    commission: Address,
}

impl AccessPolicy {
    pub fn new(commission: Address) -> Self {
        Self { commission }
    }

    pub fn commission(&self) -> &Address {
        &self.commission
    }

    pub fn is_commission(&self, caller: &Address) -> bool {
        &self.commission == caller
    }

    /// Fail with `Unauthorized` unless `caller` is the commission.
    pub fn require_commission(&self, caller: &Address) -> Result<(), ElectionError> {
        if self.is_commission(caller) {
            Ok(())
        } else {
            Err(ElectionError::Unauthorized {
                caller: caller.clone(),
                role: Role::Commission,
            })
        }
    }
}
