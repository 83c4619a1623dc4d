//! Evaluation context - the attribute values an expression can read

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EvalError;

/// Attribute namespaces addressable from expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Trait,
    Skill,
    #[serde(alias = "exp")]
    Experience,
    Stack,
    Quirk,
}

impl Namespace {
    pub const ALL: [Namespace; 5] = [
        Namespace::Trait,
        Namespace::Skill,
        Namespace::Experience,
        Namespace::Stack,
        Namespace::Quirk,
    ];

    /// Look up a namespace by the prefix used in expressions; `exp` is
    /// accepted for experience
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "trait" => Some(Namespace::Trait),
            "skill" => Some(Namespace::Skill),
            "exp" | "experience" => Some(Namespace::Experience),
            "stack" => Some(Namespace::Stack),
            "quirk" => Some(Namespace::Quirk),
            _ => None,
        }
    }

    /// Canonical prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Trait => "trait",
            Namespace::Skill => "skill",
            Namespace::Experience => "experience",
            Namespace::Stack => "stack",
            Namespace::Quirk => "quirk",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Namespace {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_prefix(s).ok_or_else(|| EvalError::UnknownNamespace(s.to_string()))
    }
}

/// Read-only view of a person's attribute values during evaluation
///
/// Contexts are extended by value: every `with_*` call consumes the context
/// and returns the extended one, so a context that has been shared with an
/// evaluation never changes underneath it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationContext {
    traits: BTreeMap<String, f64>,
    skills: BTreeMap<String, f64>,
    experience: BTreeMap<String, f64>,
    stacks: BTreeMap<String, f64>,
    quirks: BTreeSet<String>,
    current: Option<f64>,
    base: f64,
}

impl EvaluationContext {
    /// Create an empty context with a base of 0
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trait(self, name: impl Into<String>, value: f64) -> Self {
        self.with_value(Namespace::Trait, name, value)
    }

    pub fn with_skill(self, name: impl Into<String>, value: f64) -> Self {
        self.with_value(Namespace::Skill, name, value)
    }

    pub fn with_experience(self, name: impl Into<String>, value: f64) -> Self {
        self.with_value(Namespace::Experience, name, value)
    }

    pub fn with_stack(self, name: impl Into<String>, value: f64) -> Self {
        self.with_value(Namespace::Stack, name, value)
    }

    /// Activate a quirk
    pub fn with_quirk(mut self, name: impl Into<String>) -> Self {
        self.quirks.insert(name.into());
        self
    }

    /// Set a value in any valued namespace
    ///
    /// A non-zero value for [`Namespace::Quirk`] activates the quirk; zero
    /// deactivates it.
    pub fn with_value(mut self, namespace: Namespace, name: impl Into<String>, value: f64) -> Self {
        let name = name.into();
        match namespace {
            Namespace::Trait => {
                self.traits.insert(name, value);
            }
            Namespace::Skill => {
                self.skills.insert(name, value);
            }
            Namespace::Experience => {
                self.experience.insert(name, value);
            }
            Namespace::Stack => {
                self.stacks.insert(name, value);
            }
            Namespace::Quirk => {
                if value != 0.0 {
                    self.quirks.insert(name);
                } else {
                    self.quirks.remove(&name);
                }
            }
        }
        self
    }

    /// Set the in-progress value of the attribute under computation
    pub fn with_current(mut self, current: Option<f64>) -> Self {
        self.current = current;
        self
    }

    /// Set the default for the attribute type under computation
    pub fn with_base(mut self, base: f64) -> Self {
        self.base = base;
        self
    }

    /// Look up a value; quirks read as 1 when active and 0 otherwise
    pub fn get(&self, namespace: Namespace, name: &str) -> Option<f64> {
        match namespace {
            Namespace::Quirk => Some(if self.quirks.contains(name) { 1.0 } else { 0.0 }),
            _ => self.map(namespace).and_then(|m| m.get(name).copied()),
        }
    }

    /// All values in a namespace, in name order; one `1` per active quirk
    pub fn values(&self, namespace: Namespace) -> Vec<f64> {
        match namespace {
            Namespace::Quirk => vec![1.0; self.quirks.len()],
            _ => self
                .map(namespace)
                .map(|m| m.values().copied().collect())
                .unwrap_or_default(),
        }
    }

    /// Name/value pairs of a valued namespace
    pub fn entries(&self, namespace: Namespace) -> impl Iterator<Item = (&str, f64)> {
        self.map(namespace)
            .into_iter()
            .flat_map(|m| m.iter().map(|(k, v)| (k.as_str(), *v)))
    }

    pub fn has_quirk(&self, name: &str) -> bool {
        self.quirks.contains(name)
    }

    pub fn quirks(&self) -> impl Iterator<Item = &str> {
        self.quirks.iter().map(String::as_str)
    }

    pub fn current(&self) -> Option<f64> {
        self.current
    }

    pub fn base(&self) -> f64 {
        self.base
    }

    fn map(&self, namespace: Namespace) -> Option<&BTreeMap<String, f64>> {
        match namespace {
            Namespace::Trait => Some(&self.traits),
            Namespace::Skill => Some(&self.skills),
            Namespace::Experience => Some(&self.experience),
            Namespace::Stack => Some(&self.stacks),
            Namespace::Quirk => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_prefixes() {
        assert_eq!(Namespace::from_prefix("exp"), Some(Namespace::Experience));
        assert_eq!(Namespace::from_prefix("experience"), Some(Namespace::Experience));
        assert_eq!(Namespace::from_prefix("mood"), None);
        for ns in Namespace::ALL {
            assert_eq!(ns.as_str().parse::<Namespace>().unwrap(), ns);
        }
        assert!(matches!(
            "mood".parse::<Namespace>(),
            Err(EvalError::UnknownNamespace(ref s)) if s == "mood"
        ));
    }

    #[test]
    fn test_quirk_lookup_never_fails() {
        let ctx = EvaluationContext::new().with_quirk("night-owl");
        assert_eq!(ctx.get(Namespace::Quirk, "night-owl"), Some(1.0));
        assert_eq!(ctx.get(Namespace::Quirk, "early-bird"), Some(0.0));
        assert_eq!(ctx.values(Namespace::Quirk), vec![1.0]);
    }

    #[test]
    fn test_values_in_name_order() {
        let ctx = EvaluationContext::new()
            .with_trait("patience", 40.0)
            .with_trait("caution", 60.0)
            .with_skill("rust", 90.0);
        assert_eq!(ctx.values(Namespace::Trait), vec![60.0, 40.0]);
        assert_eq!(ctx.get(Namespace::Skill, "rust"), Some(90.0));
        assert_eq!(ctx.get(Namespace::Skill, "go"), None);
        assert!(ctx.values(Namespace::Stack).is_empty());
    }

    #[test]
    fn test_extension_leaves_original_untouched() {
        let original = EvaluationContext::new().with_trait("caution", 60.0);
        let extended = original.clone().with_trait("curiosity", 80.0);
        assert_eq!(original.get(Namespace::Trait, "curiosity"), None);
        assert_eq!(extended.get(Namespace::Trait, "curiosity"), Some(80.0));
    }

    #[test]
    fn test_quirk_value_toggles() {
        let ctx = EvaluationContext::new()
            .with_value(Namespace::Quirk, "pedant", 1.0)
            .with_value(Namespace::Quirk, "pedant", 0.0);
        assert!(!ctx.has_quirk("pedant"));
    }
}
