//! Configuration for persona-engine
//!
//! Engine settings are plain data handed to [`crate::RuleEngine::new`]; there
//! is no global configuration. Settings can be loaded from TOML:
//!
//! ```toml
//! comparison_tolerance = 0.0001
//! rule_failure = "drop_rule"
//!
//! [bases]
//! trait = 0
//! skill = 20
//! experience = 20
//! stack = 20
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::target::TargetType;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Absolute difference below which `==` treats two values as equal
    pub comparison_tolerance: f64,
    /// Defaults for targets without a computable value
    pub bases: BaseValues,
    /// What happens to a target when one of its rules fails to evaluate
    pub rule_failure: RuleFailurePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            comparison_tolerance: persona_expr::DEFAULT_TOLERANCE,
            bases: BaseValues::default(),
            rule_failure: RuleFailurePolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML configuration
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every setting is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.comparison_tolerance.is_finite() || self.comparison_tolerance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "comparison_tolerance must be finite and non-negative, got {}",
                self.comparison_tolerance
            )));
        }

        for kind in TargetType::ALL {
            let base = self.bases.get(kind);
            let (min, max) = kind.bounds();
            if !(min..=max).contains(&base) {
                return Err(ConfigError::Invalid(format!(
                    "{} base {} is outside [{}, {}]",
                    kind, base, min, max
                )));
            }
        }

        Ok(())
    }

    /// Base default for a target type
    pub fn base_value(&self, kind: TargetType) -> f64 {
        self.bases.get(kind)
    }
}

/// Per-type base defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseValues {
    #[serde(rename = "trait")]
    pub traits: f64,
    #[serde(rename = "skill")]
    pub skills: f64,
    pub experience: f64,
    #[serde(rename = "stack")]
    pub stacks: f64,
}

impl Default for BaseValues {
    fn default() -> Self {
        Self {
            traits: TargetType::Trait.default_base(),
            skills: TargetType::Skill.default_base(),
            experience: TargetType::Experience.default_base(),
            stacks: TargetType::Stack.default_base(),
        }
    }
}

impl BaseValues {
    pub fn get(&self, kind: TargetType) -> f64 {
        match kind {
            TargetType::Trait => self.traits,
            TargetType::Skill => self.skills,
            TargetType::Experience => self.experience,
            TargetType::Stack => self.stacks,
        }
    }
}

/// Handling of rules that fail to evaluate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleFailurePolicy {
    /// Leave the failed rule out of its target's weighted combination
    #[default]
    DropRule,
    /// Resolve the whole target as if none of its rules had succeeded
    FailTarget,
}
