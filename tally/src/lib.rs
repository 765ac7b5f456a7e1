//! Vote tallying.
//!
//! The [`TallyEngine`] only reads the ballot ledger and identity registry. Its
//! one piece of owned state is the result snapshot frozen at finalization,
//! after which results are immutable.

pub mod engine;
pub mod result;

pub use engine::TallyEngine;
pub use result::ResultEntry;
