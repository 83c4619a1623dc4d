//! Composition rules
//!
//! A composition rule is a named, weighted expression that contributes to
//! one target's value. The expression text is parsed when the rule is
//! created, so a stored rule always holds a valid expression.

use std::collections::BTreeMap;

use persona_expr::{parse, Expression};
use serde::Serialize;

use crate::deps::Dependency;
use crate::error::RuleConstructionError;
use crate::target::Target;

/// Default weight of a rule
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// A parsed, weighted expression contributing to a target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositionRule {
    pub target: Target,
    pub description: String,
    /// Expression text as written
    pub source: String,
    pub expression: Expression,
    pub weight: f64,
}

impl CompositionRule {
    /// Parse `source` into a rule for `target`
    pub fn new(
        target: Target,
        description: impl Into<String>,
        source: impl Into<String>,
        weight: f64,
    ) -> Result<Self, RuleConstructionError> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(RuleConstructionError::InvalidWeight {
                target: target.to_string(),
                weight,
            });
        }

        let source = source.into();
        let expression = parse(&source).map_err(|err| RuleConstructionError::Expression {
            target: target.to_string(),
            source: err,
        })?;

        Ok(Self {
            target,
            description: description.into(),
            source,
            expression,
            weight,
        })
    }

    pub fn dependency(&self) -> Dependency {
        Dependency::new(self.target.clone(), &self.expression)
    }
}

/// Create a rule from a `namespace.name` target string
///
/// Fails without producing a rule if the target, the weight or the
/// expression text is invalid.
pub fn create_rule(
    target: &str,
    description: impl Into<String>,
    source: impl Into<String>,
    weight: f64,
) -> Result<CompositionRule, RuleConstructionError> {
    CompositionRule::new(target.parse()?, description, source, weight)
}

/// A rule together with what it evaluated to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleResult {
    pub rule: CompositionRule,
    pub value: f64,
}

/// Weighted average of rule results
///
/// Returns `None` when there are no results. If every weight is zero the
/// results are averaged with equal weight.
pub fn combine_weighted(results: &[RuleResult]) -> Option<f64> {
    if results.is_empty() {
        return None;
    }

    let total_weight: f64 = results.iter().map(|r| r.rule.weight).sum();
    if total_weight == 0.0 {
        let sum: f64 = results.iter().map(|r| r.value).sum();
        return Some(sum / results.len() as f64);
    }

    let weighted: f64 = results.iter().map(|r| r.rule.weight * r.value).sum();
    Some(weighted / total_weight)
}

/// Rules grouped by target
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RuleCollection {
    rules: BTreeMap<Target, Vec<CompositionRule>>,
}

impl RuleCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, rule: CompositionRule) {
        self.rules.entry(rule.target.clone()).or_default().push(rule);
    }

    /// Rules for a target, in insertion order
    pub fn get(&self, target: &Target) -> &[CompositionRule] {
        self.rules.get(target).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.rules.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompositionRule> {
        self.rules.values().flatten()
    }

    /// One dependency entry per rule
    pub fn dependencies(&self) -> Vec<Dependency> {
        self.iter().map(CompositionRule::dependency).collect()
    }

    /// Total number of rules
    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Extend<CompositionRule> for RuleCollection {
    fn extend<I: IntoIterator<Item = CompositionRule>>(&mut self, iter: I) {
        for rule in iter {
            self.add(rule);
        }
    }
}

impl FromIterator<CompositionRule> for RuleCollection {
    fn from_iter<I: IntoIterator<Item = CompositionRule>>(iter: I) -> Self {
        let mut collection = Self::new();
        collection.extend(iter);
        collection
    }
}
