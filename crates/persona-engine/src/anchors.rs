//! Per-person anchor values

use std::collections::{BTreeMap, BTreeSet};

use persona_expr::EvaluationContext;
use serde::{Deserialize, Serialize};

use crate::target::{Target, TargetType};

/// Starting values supplied directly for a person
///
/// Anchors seed the evaluation context before any rule runs. Values are
/// normalized to their type's range on the way in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Anchors {
    pub traits: BTreeMap<String, f64>,
    pub skills: BTreeMap<String, f64>,
    pub experience: BTreeMap<String, f64>,
    pub stacks: BTreeMap<String, f64>,
    /// Explicitly assigned quirks
    pub quirks: BTreeSet<String>,
}

impl Anchors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, target: &Target, value: f64) -> Self {
        self.values_mut(target.kind).insert(target.name.clone(), value);
        self
    }

    pub fn with_quirk(mut self, name: impl Into<String>) -> Self {
        self.quirks.insert(name.into());
        self
    }

    /// Normalized anchor value for a target
    pub fn get(&self, target: &Target) -> Option<f64> {
        self.values(target.kind)
            .get(&target.name)
            .map(|&v| target.kind.normalize(v))
    }

    /// Context holding every normalized anchor and explicit quirk
    pub fn context(&self) -> EvaluationContext {
        let mut context = EvaluationContext::new();
        for kind in TargetType::ALL {
            for (name, &value) in self.values(kind) {
                context = context.with_value(kind.namespace(), name.as_str(), kind.normalize(value));
            }
        }
        self.quirks
            .iter()
            .fold(context, |context, quirk| context.with_quirk(quirk.as_str()))
    }

    fn values(&self, kind: TargetType) -> &BTreeMap<String, f64> {
        match kind {
            TargetType::Trait => &self.traits,
            TargetType::Skill => &self.skills,
            TargetType::Experience => &self.experience,
            TargetType::Stack => &self.stacks,
        }
    }

    fn values_mut(&mut self, kind: TargetType) -> &mut BTreeMap<String, f64> {
        match kind {
            TargetType::Trait => &mut self.traits,
            TargetType::Skill => &mut self.skills,
            TargetType::Experience => &mut self.experience,
            TargetType::Stack => &mut self.stacks,
        }
    }
}
