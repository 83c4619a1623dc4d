//! Rule targets and their value types
//!
//! A target is a namespaced attribute name such as `trait.caution` or
//! `experience.years`. Its namespace determines the value range every
//! published value is clamped to and the base default used when a value
//! cannot be computed.

use std::fmt;
use std::str::FromStr;

use persona_expr::Namespace;
use serde::{Deserialize, Serialize};

use crate::error::RuleConstructionError;

/// Value type of a computed attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    /// Personality trait, in [-100, 100]
    Trait,
    /// Skill level, in [0, 100]
    Skill,
    /// Experience level, in [0, 100]
    Experience,
    /// Technology stack familiarity, in [0, 100]
    Stack,
}

impl TargetType {
    pub const ALL: [TargetType; 4] = [
        TargetType::Trait,
        TargetType::Skill,
        TargetType::Experience,
        TargetType::Stack,
    ];

    /// Value type for a namespace; quirks are not valued targets
    pub fn from_namespace(namespace: Namespace) -> Option<Self> {
        match namespace {
            Namespace::Trait => Some(TargetType::Trait),
            Namespace::Skill => Some(TargetType::Skill),
            Namespace::Experience => Some(TargetType::Experience),
            Namespace::Stack => Some(TargetType::Stack),
            Namespace::Quirk => None,
        }
    }

    pub fn namespace(&self) -> Namespace {
        match self {
            TargetType::Trait => Namespace::Trait,
            TargetType::Skill => Namespace::Skill,
            TargetType::Experience => Namespace::Experience,
            TargetType::Stack => Namespace::Stack,
        }
    }

    /// Inclusive (min, max) bounds
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            TargetType::Trait => (-100.0, 100.0),
            TargetType::Skill | TargetType::Experience | TargetType::Stack => (0.0, 100.0),
        }
    }

    /// Clamp a value into this type's range
    ///
    /// NaN normalizes to the lower bound.
    pub fn normalize(&self, value: f64) -> f64 {
        let (min, max) = self.bounds();
        value.max(min).min(max)
    }

    /// Neutral default: 0 for traits, baseline familiarity of 20 otherwise
    pub fn default_base(&self) -> f64 {
        match self {
            TargetType::Trait => 0.0,
            TargetType::Skill | TargetType::Experience | TargetType::Stack => 20.0,
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.namespace().as_str())
    }
}

/// Derive the value type from a target string's namespace prefix
pub fn target_type(target: &str) -> Result<TargetType, RuleConstructionError> {
    target.parse::<Target>().map(|t| t.kind)
}

/// A computed attribute, e.g. `trait.caution`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Target {
    pub kind: TargetType,
    pub name: String,
}

impl Target {
    pub fn new(kind: TargetType, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn namespace(&self) -> Namespace {
        self.kind.namespace()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.kind, self.name)
    }
}

impl FromStr for Target {
    type Err = RuleConstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, name) = s
            .split_once('.')
            .filter(|(prefix, name)| !prefix.is_empty() && !name.is_empty())
            .ok_or_else(|| RuleConstructionError::MalformedTarget(s.to_string()))?;

        let kind = Namespace::from_prefix(prefix)
            .and_then(TargetType::from_namespace)
            .ok_or_else(|| RuleConstructionError::UnknownTargetNamespace(s.to_string()))?;

        Ok(Target::new(kind, name))
    }
}

impl From<Target> for String {
    fn from(target: Target) -> Self {
        target.to_string()
    }
}

impl TryFrom<String> for Target {
    type Error = RuleConstructionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
