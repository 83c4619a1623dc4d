//! Rule engine
//!
//! Evaluates composition rules target by target in dependency order,
//! publishing each target's normalized value into the context before any
//! dependent target is evaluated.

use std::collections::BTreeMap;

use persona_expr::{parse, EvalError, EvaluationContext, Evaluator, Expression};
use serde::Serialize;

use crate::anchors::Anchors;
use crate::config::{EngineConfig, RuleFailurePolicy};
use crate::deps::{analyze_dependencies, DependencyAnalysis};
use crate::error::{Result, RuleConstructionError};
use crate::rule::{combine_weighted, create_rule, CompositionRule, RuleCollection, RuleResult};
use crate::target::{Target, TargetType};
use crate::trace::{DroppedRule, Resolution, TraceEntry};

/// Output of [`RuleEngine::compute_final_values`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputationResult {
    /// Every valued attribute after computation, anchors included
    pub values: BTreeMap<Target, f64>,
    /// Final evaluation context
    #[serde(skip)]
    pub context: EvaluationContext,
    /// Order in which rule targets were evaluated
    pub order: Vec<Target>,
    pub cycles: Vec<Vec<Target>>,
    pub trace: Vec<TraceEntry>,
}

impl ComputationResult {
    pub fn value(&self, target: &Target) -> Option<f64> {
        self.values.get(target).copied()
    }
}

/// Evaluates rule collections against anchor values
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    config: EngineConfig,
}

impl RuleEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Create a rule; see [`create_rule`]
    pub fn create_rule(
        &self,
        target: &str,
        description: impl Into<String>,
        source: impl Into<String>,
        weight: f64,
    ) -> std::result::Result<CompositionRule, RuleConstructionError> {
        create_rule(target, description, source, weight)
    }

    /// Dependency-first order of the collection's targets, with cycles
    pub fn rule_evaluation_order(&self, rules: &RuleCollection) -> DependencyAnalysis {
        analyze_dependencies(&rules.dependencies())
    }

    /// Configured base default for a target type
    pub fn base_value(&self, kind: TargetType) -> f64 {
        self.config.base_value(kind)
    }

    /// Evaluate an expression with the configured comparison tolerance
    pub fn evaluate(
        &self,
        expression: &Expression,
        context: &EvaluationContext,
    ) -> std::result::Result<f64, EvalError> {
        Evaluator::new(context)
            .with_tolerance(self.config.comparison_tolerance)
            .evaluate(expression)
    }

    /// Parse and evaluate expression text
    pub fn evaluate_str(&self, text: &str, context: &EvaluationContext) -> Result<f64> {
        let expression = parse(text)?;
        Ok(self.evaluate(&expression, context)?)
    }

    /// Compute every rule target for one person
    ///
    /// Targets are visited in dependency order. Each target's rules see the
    /// anchors plus every value published so far, with `$base` set to the
    /// target type's base default and `$current` to the target's anchor
    /// value when it has one. Rules that fail to evaluate are handled
    /// according to [`EngineConfig::rule_failure`]. Cycle members get
    /// their base default without evaluating any rule.
    pub fn compute_final_values(&self, rules: &RuleCollection, anchors: &Anchors) -> ComputationResult {
        let analysis = self.rule_evaluation_order(rules);
        let mut context = anchors.context();
        let mut trace = Vec::with_capacity(analysis.order.len());

        for target in &analysis.order {
            let kind = target.kind;
            let base = self.base_value(kind);

            let entry = if analysis.in_cycle(target) {
                TraceEntry {
                    target: target.clone(),
                    resolution: Resolution::CycleDefault,
                    results: Vec::new(),
                    dropped: Vec::new(),
                    value: kind.normalize(base),
                }
            } else {
                self.resolve_target(target, rules.get(target), &context, anchors, base)
            };

            tracing::debug!(
                "Published {} = {} ({:?})",
                target,
                entry.value,
                entry.resolution
            );
            context = context.with_value(target.namespace(), target.name.as_str(), entry.value);
            trace.push(entry);
        }

        ComputationResult {
            values: collect_values(&context),
            context,
            order: analysis.order,
            cycles: analysis.cycles,
            trace,
        }
    }

    fn resolve_target(
        &self,
        target: &Target,
        rules: &[CompositionRule],
        context: &EvaluationContext,
        anchors: &Anchors,
        base: f64,
    ) -> TraceEntry {
        let current = context.get(target.namespace(), &target.name);
        let scoped = context.clone().with_base(base).with_current(current);

        let mut results = Vec::with_capacity(rules.len());
        let mut dropped = Vec::new();
        for rule in rules {
            match self.evaluate(&rule.expression, &scoped) {
                Ok(value) => results.push(RuleResult {
                    rule: rule.clone(),
                    value,
                }),
                Err(error) => {
                    tracing::warn!(
                        "Dropping rule '{}' for {}: {}",
                        rule.description,
                        target,
                        error
                    );
                    dropped.push(DroppedRule {
                        description: rule.description.clone(),
                        source: rule.source.clone(),
                        error,
                    });
                }
            }
        }

        let combined = match self.config.rule_failure {
            RuleFailurePolicy::FailTarget if !dropped.is_empty() => None,
            _ => combine_weighted(&results),
        };

        let (resolution, value) = match combined {
            Some(value) => (Resolution::Computed, value),
            None => (
                Resolution::Fallback,
                anchors.get(target).unwrap_or(base),
            ),
        };

        TraceEntry {
            target: target.clone(),
            resolution,
            results,
            dropped,
            value: target.kind.normalize(value),
        }
    }
}

/// Every valued attribute in a context
fn collect_values(context: &EvaluationContext) -> BTreeMap<Target, f64> {
    TargetType::ALL
        .into_iter()
        .flat_map(|kind| {
            context
                .entries(kind.namespace())
                .map(move |(name, value)| (Target::new(kind, name), value))
        })
        .collect()
}
