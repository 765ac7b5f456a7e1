//! Nullable infrastructure for deterministic testing.
//!
//! External dependencies of the engine are abstracted behind traits in
//! `elect-types`. This crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the host clock
//!
//! Usage: inject a nullable in place of the real implementation.

pub mod clock;

pub use clock::NullClock;
