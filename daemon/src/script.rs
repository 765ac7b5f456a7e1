//! Operation scripts: a JSON list of timed operations replayed against a node.

use elect_node::{tracing_spans, ElectionNode, Operation, Outcome};
use elect_nullables::NullClock;
use elect_types::{ErrorKind, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

/// One scripted call. `at` moves the replay clock forward before the call.
#[derive(Debug, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub at: Option<u64>,
    #[serde(flatten)]
    pub op: Operation,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepResult {
    Ok(Outcome),
    Error { kind: ErrorKind, message: String },
}

#[derive(Debug, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub op: &'static str,
    pub at: Timestamp,
    #[serde(flatten)]
    pub result: StepResult,
}

impl StepReport {
    pub fn is_ok(&self) -> bool {
        matches!(self.result, StepResult::Ok(_))
    }
}

pub fn parse(json: &str) -> serde_json::Result<Vec<Step>> {
    serde_json::from_str(json)
}

/// Move `clock` up to the latest time recorded in the node's election, so a
/// resumed replay never stamps records earlier than those it already holds.
pub fn resume_clock(node: &ElectionNode, clock: &NullClock) {
    if let Some(last) = node.view().last_activity() {
        clock.set(last.as_secs());
    }
}

/// Replay `steps` in order. A failing step is reported and replay continues.
///
/// With a `clock`, each step's `at` is applied before it runs; without one the
/// node's own clock is used and `at` is ignored.
pub async fn replay(node: &ElectionNode, clock: Option<&NullClock>, steps: Vec<Step>) -> Vec<StepReport> {
    let mut reports = Vec::with_capacity(steps.len());
    for (index, step) in steps.into_iter().enumerate() {
        if let (Some(clock), Some(at)) = (clock, step.at) {
            clock.set(at);
        }
        let name = step.op.name();
        let at = node.now();
        let result = match node
            .apply(step.op)
            .instrument(tracing_spans::replay_step_span(index))
            .await
        {
            Ok(outcome) => StepResult::Ok(outcome),
            Err(err) => StepResult::Error {
                kind: err.kind(),
                message: err.to_string(),
            },
        };
        reports.push(StepReport {
            step: index,
            op: name,
            at,
            result,
        });
    }
    reports
}
