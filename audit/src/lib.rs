//! Independent audit of the election.
//!
//! The commission approves auditors; approved auditors append verification
//! records. The recount in [`recount`] rebuilds every per-candidate total from
//! the raw ballot list and compares it against what the ledger and the frozen
//! result snapshot claim.

pub mod auditor;
pub mod recount;
pub mod registry;

pub use auditor::{Auditor, VerificationRecord};
pub use recount::{audit_report, verify_vote_counts, AuditReport, Discrepancy};
pub use registry::AuditRegistry;
