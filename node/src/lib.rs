//! Election node: composes the identity, phase, ballot, tally, and audit
//! components into one service.
//!
//! - [`Election`] is the synchronous composition and the unit of persistence.
//! - [`ElectionNode`] wraps it in an async read/write lock with an injected
//!   clock, metrics, and an event bus.
//! - [`Operation`] / [`Outcome`] carry calls and results as data.

pub mod config;
pub mod election;
pub mod error;
pub mod events;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod operation;
pub mod tracing_spans;

pub use config::ElectionConfig;
pub use election::{Election, SNAPSHOT_VERSION};
pub use error::NodeError;
pub use events::{ElectionEvent, EventBus};
pub use logging::{init_logging, LogFormat};
pub use metrics::ElectionMetrics;
pub use node::ElectionNode;
pub use operation::{Operation, Outcome};
