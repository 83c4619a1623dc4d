//! Diagnostic trace of a computation
//!
//! One [`TraceEntry`] is recorded per rule target, in evaluation order. It
//! shows how the published value was reached: which rules contributed,
//! which were dropped and why.

use persona_expr::EvalError;
use serde::{Serialize, Serializer};

use crate::rule::RuleResult;
use crate::target::Target;

/// How a target's value was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Weighted combination of successful rule results
    Computed,
    /// Target is part of a dependency cycle and got its base default
    CycleDefault,
    /// No usable rule results; the anchor value or base default was kept
    Fallback,
}

/// A rule that failed to evaluate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedRule {
    pub description: String,
    pub source: String,
    #[serde(serialize_with = "serialize_error")]
    pub error: EvalError,
}

/// Record of how one target was resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceEntry {
    pub target: Target,
    pub resolution: Resolution,
    pub results: Vec<RuleResult>,
    pub dropped: Vec<DroppedRule>,
    /// Published, normalized value
    pub value: f64,
}

fn serialize_error<S: Serializer>(error: &EvalError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}
