//! Attribute definition records
//!
//! Definitions describe the attributes a persona can have: the valued
//! attributes with their composition rules, quirks with optional
//! auto-assignment conditions, and phrases with optional selection
//! conditions. The records are plain serde data and can be read from any
//! serde format. In TOML a library looks like:
//!
//! ```toml
//! [[trait]]
//! id = "caution"
//! name = "Caution"
//!
//! [[trait.rules]]
//! expression = "trait.patience * 0.6 + 20"
//! weight = 2.0
//! description = "patient people are careful"
//!
//! [[quirk]]
//! id = "pedant"
//! description = "Corrects everyone"
//! auto_assign = { any_of = ["trait.detail-focus > 70"] }
//!
//! [[phrase]]
//! id = "actually"
//! text = "Well, actually..."
//! conditions = { all_of = ["quirk.pedant"] }
//! ```

use serde::{Deserialize, Serialize};

use crate::condition::ConditionBlock;
use crate::error::RuleConstructionError;
use crate::rule::{create_rule, RuleCollection, DEFAULT_WEIGHT};
use crate::target::TargetType;

fn default_weight() -> f64 {
    DEFAULT_WEIGHT
}

/// A composition rule as written in a definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub expression: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub description: Option<String>,
}

/// Definition of a trait, skill, experience or stack attribute
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuirkDefinition {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Assign the quirk automatically when this block matches
    #[serde(default)]
    pub auto_assign: Option<ConditionBlock>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhraseDefinition {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub conditions: Option<ConditionBlock>,
}

/// Every attribute, quirk and phrase definition known to the engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeLibrary {
    #[serde(rename = "trait")]
    pub traits: Vec<AttributeDefinition>,
    #[serde(rename = "skill")]
    pub skills: Vec<AttributeDefinition>,
    pub experience: Vec<AttributeDefinition>,
    #[serde(rename = "stack")]
    pub stacks: Vec<AttributeDefinition>,
    #[serde(rename = "quirk")]
    pub quirks: Vec<QuirkDefinition>,
    #[serde(rename = "phrase")]
    pub phrases: Vec<PhraseDefinition>,
}

impl AttributeLibrary {
    pub fn definitions(&self, kind: TargetType) -> &[AttributeDefinition] {
        match kind {
            TargetType::Trait => &self.traits,
            TargetType::Skill => &self.skills,
            TargetType::Experience => &self.experience,
            TargetType::Stack => &self.stacks,
        }
    }

    /// Compile every definition's rules
    ///
    /// Fails on the first invalid rule; no partial collection is returned.
    pub fn rules(&self) -> Result<RuleCollection, RuleConstructionError> {
        let mut collection = RuleCollection::new();
        for kind in TargetType::ALL {
            for definition in self.definitions(kind) {
                let target = format!("{}.{}", kind, definition.id);
                for (i, rule) in definition.rules.iter().enumerate() {
                    let description = rule
                        .description
                        .clone()
                        .unwrap_or_else(|| format!("{} rule {}", target, i + 1));
                    collection.add(create_rule(
                        &target,
                        description,
                        rule.expression.as_str(),
                        rule.weight,
                    )?);
                }
            }
        }
        Ok(collection)
    }
}
