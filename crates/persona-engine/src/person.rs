//! Full persona computation: values, quirks and phrases

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::anchors::Anchors;
use crate::condition::ConditionMatcher;
use crate::definitions::AttributeLibrary;
use crate::engine::RuleEngine;
use crate::error::Result;
use crate::target::Target;
use crate::trace::TraceEntry;

/// A fully computed persona
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputedPerson {
    pub values: BTreeMap<Target, f64>,
    /// Explicit and auto-assigned quirks
    pub quirks: BTreeSet<String>,
    /// Ids of the selected phrases, in library order
    pub phrases: Vec<String>,
    pub order: Vec<Target>,
    pub cycles: Vec<Vec<Target>>,
    pub trace: Vec<TraceEntry>,
}

impl ComputedPerson {
    pub fn value(&self, target: &Target) -> Option<f64> {
        self.values.get(target).copied()
    }

    pub fn has_quirk(&self, name: &str) -> bool {
        self.quirks.contains(name)
    }
}

impl RuleEngine {
    /// Compute a persona from its anchors
    ///
    /// Runs the library's rules, then adds every quirk whose auto-assignment
    /// block matches the computed values, then selects the phrases whose
    /// conditions match with all quirks in place. Auto-assignment is judged
    /// against the explicit quirks only, so the result does not depend on
    /// the order quirks are defined in.
    pub fn compute_person(&self, library: &AttributeLibrary, anchors: &Anchors) -> Result<ComputedPerson> {
        let rules = library.rules()?;
        let computed = self.compute_final_values(&rules, anchors);
        let matcher = ConditionMatcher::new(self.config().comparison_tolerance);

        let auto_assigned: Vec<&str> = library
            .quirks
            .iter()
            .filter(|quirk| !anchors.quirks.contains(&quirk.id))
            .filter(|quirk| matcher.quirk_auto_assigns(quirk.auto_assign.as_ref(), &computed.context))
            .map(|quirk| quirk.id.as_str())
            .collect();
        for quirk in &auto_assigned {
            tracing::debug!("Auto-assigned quirk {}", quirk);
        }

        let context = auto_assigned
            .iter()
            .fold(computed.context, |context, quirk| context.with_quirk(*quirk));

        let phrases = library
            .phrases
            .iter()
            .filter(|phrase| matcher.phrase_matches(phrase.conditions.as_ref(), &context))
            .map(|phrase| phrase.id.clone())
            .collect();

        Ok(ComputedPerson {
            values: computed.values,
            quirks: context.quirks().map(str::to_string).collect(),
            phrases,
            order: computed.order,
            cycles: computed.cycles,
            trace: computed.trace,
        })
    }
}
