//! persona-engine - Rule resolution for persona attributes
//!
//! Turns a person's anchor values and a library of attribute definitions
//! into final attribute values, quirks and phrases:
//!
//! - **Target**: namespaced attribute (`trait.caution`) with its value range and base default
//! - **Rule**: parsed, weighted composition rules grouped by target
//! - **Deps**: dependency graph, cycle report and evaluation order
//! - **Engine**: dependency-ordered evaluation, weighted combination and normalization
//! - **Condition**: `any_of` / `all_of` blocks for quirks and phrases
//! - **Definitions**: serde records for attributes, quirks and phrases
//! - **Person**: full persona computation
//! - **Trace**: per-target record of how each value was reached
//! - **Config**: comparison tolerance, base defaults and rule failure policy
//!
//! # Example
//!
//! ```
//! use persona_engine::{create_rule, Anchors, RuleCollection, RuleEngine, Target};
//!
//! let rules: RuleCollection = [
//!     create_rule("skill.debugging", "careful debuggers", "trait.caution * 0.5 + 40", 1.0).unwrap(),
//!     create_rule("trait.caution", "patience", "trait.patience", 1.0).unwrap(),
//! ]
//! .into_iter()
//! .collect();
//!
//! let patience: Target = "trait.patience".parse().unwrap();
//! let anchors = Anchors::new().with_value(&patience, 60.0);
//!
//! let result = RuleEngine::default().compute_final_values(&rules, &anchors);
//! assert_eq!(result.value(&"skill.debugging".parse().unwrap()), Some(70.0));
//! ```

pub mod anchors;
pub mod condition;
pub mod config;
pub mod definitions;
pub mod deps;
pub mod engine;
pub mod error;
pub mod person;
pub mod rule;
pub mod target;
pub mod trace;

pub use anchors::Anchors;
pub use condition::{matches_condition, ConditionBlock, ConditionMatcher};
pub use config::{BaseValues, EngineConfig, RuleFailurePolicy};
pub use definitions::{
    AttributeDefinition, AttributeLibrary, PhraseDefinition, QuirkDefinition, RuleDefinition,
};
pub use deps::{analyze_dependencies, extract_references, Dependency, DependencyAnalysis};
pub use engine::{ComputationResult, RuleEngine};
pub use error::{ConfigError, EngineError, Result, RuleConstructionError};
pub use person::ComputedPerson;
pub use rule::{combine_weighted, create_rule, CompositionRule, RuleCollection, RuleResult};
pub use target::{target_type, Target, TargetType};
pub use trace::{DroppedRule, Resolution, TraceEntry};
