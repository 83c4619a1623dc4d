//! Condition blocks for quirk auto-assignment and phrase selection
//!
//! A block holds two lists of expressions. A clause is satisfied when it
//! evaluates to a value greater than zero.
//!
//! - `any_of`: satisfied when at least one clause is. A clause that fails
//!   to parse or evaluate counts as unsatisfied.
//! - `all_of`: satisfied when every clause is. A clause that fails fails
//!   the whole group.
//!
//! A list left out of the block places no requirement on it. A list that is
//! present but empty follows the usual quantifier rules: an empty `any_of`
//! is never satisfied, an empty `all_of` always is.

use persona_expr::{parse, EvaluationContext, Evaluator, DEFAULT_TOLERANCE};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// `any_of` / `all_of` expression lists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_of: Option<Vec<String>>,
}

impl ConditionBlock {
    pub fn any_of<I, S>(clauses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            any_of: Some(clauses.into_iter().map(Into::into).collect()),
            all_of: None,
        }
    }

    pub fn all_of<I, S>(clauses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            any_of: None,
            all_of: Some(clauses.into_iter().map(Into::into).collect()),
        }
    }

    /// True when the block holds no clause in either list
    pub fn is_empty(&self) -> bool {
        self.any_of.as_ref().map_or(true, Vec::is_empty)
            && self.all_of.as_ref().map_or(true, Vec::is_empty)
    }
}

/// Evaluates condition blocks with a fixed comparison tolerance
#[derive(Debug, Clone, Copy)]
pub struct ConditionMatcher {
    tolerance: f64,
}

impl Default for ConditionMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl ConditionMatcher {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Whether every list present in a block is satisfied
    pub fn matches(&self, block: &ConditionBlock, context: &EvaluationContext) -> bool {
        let any = block
            .any_of
            .as_deref()
            .map_or(true, |clauses| self.any_satisfied(clauses, context));
        any && block
            .all_of
            .as_deref()
            .map_or(true, |clauses| self.all_satisfied(clauses, context))
    }

    /// Quirks are only auto-assigned by a block with at least one clause
    pub fn quirk_auto_assigns(&self, block: Option<&ConditionBlock>, context: &EvaluationContext) -> bool {
        match block {
            Some(block) if !block.is_empty() => self.matches(block, context),
            _ => false,
        }
    }

    /// Phrases without conditions always match
    pub fn phrase_matches(&self, block: Option<&ConditionBlock>, context: &EvaluationContext) -> bool {
        match block {
            Some(block) => self.matches(block, context),
            None => true,
        }
    }

    fn any_satisfied(&self, clauses: &[String], context: &EvaluationContext) -> bool {
        clauses
            .iter()
            .any(|clause| self.clause(clause, context).unwrap_or(false))
    }

    fn all_satisfied(&self, clauses: &[String], context: &EvaluationContext) -> bool {
        for clause in clauses {
            match self.clause(clause, context) {
                Ok(true) => {}
                Ok(false) => return false,
                Err(e) => {
                    tracing::warn!("Condition '{}' failed, all_of group unsatisfied: {}", clause, e);
                    return false;
                }
            }
        }
        true
    }

    fn clause(&self, text: &str, context: &EvaluationContext) -> Result<bool> {
        let expression = parse(text)?;
        let value = Evaluator::new(context)
            .with_tolerance(self.tolerance)
            .evaluate(&expression)?;
        Ok(value > 0.0)
    }
}

/// Match a block with the default comparison tolerance
pub fn matches_condition(block: &ConditionBlock, context: &EvaluationContext) -> bool {
    ConditionMatcher::default().matches(block, context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn detail(value: f64) -> EvaluationContext {
        EvaluationContext::new().with_trait("detail-focus", value)
    }

    #[rstest]
    #[case(80.0, true)]
    #[case(50.0, false)]
    #[case(70.0, false)]
    fn test_any_of_threshold(#[case] value: f64, #[case] expected: bool) {
        let block = ConditionBlock::any_of(["trait.detail-focus > 70"]);
        assert_eq!(matches_condition(&block, &detail(value)), expected);
    }

    #[test]
    fn test_any_of_absorbs_failures() {
        let block = ConditionBlock::any_of(["trait.missing > 1", "1 / 0", "(", "trait.detail-focus > 70"]);
        assert!(matches_condition(&block, &detail(80.0)));

        let block = ConditionBlock::any_of(["trait.missing > 1", "1 / 0"]);
        assert!(!matches_condition(&block, &detail(80.0)));
    }

    #[test]
    fn test_all_of() {
        let ctx = detail(80.0).with_quirk("pedant");
        assert!(matches_condition(
            &ConditionBlock::all_of(["trait.detail-focus > 70", "quirk.pedant"]),
            &ctx
        ));
        assert!(!matches_condition(
            &ConditionBlock::all_of(["trait.detail-focus > 70", "quirk.night-owl"]),
            &ctx
        ));
    }

    #[test]
    fn test_all_of_failure_fails_group() {
        let block = ConditionBlock::all_of(["trait.detail-focus > 70", "trait.missing > 0"]);
        assert!(!matches_condition(&block, &detail(80.0)));
    }

    #[test]
    fn test_both_lists_required() {
        let block = ConditionBlock {
            any_of: Some(vec!["quirk.pedant".into(), "trait.detail-focus > 90".into()]),
            all_of: Some(vec!["trait.detail-focus > 70".into()]),
        };
        assert!(!matches_condition(&block, &detail(80.0)));
        assert!(matches_condition(&block, &detail(80.0).with_quirk("pedant")));
    }

    #[test]
    fn test_asymmetric_defaults() {
        let matcher = ConditionMatcher::default();
        let ctx = EvaluationContext::new();
        assert!(matcher.phrase_matches(None, &ctx));
        assert!(matcher.phrase_matches(Some(&ConditionBlock::default()), &ctx));
        assert!(!matcher.quirk_auto_assigns(None, &ctx));
        assert!(!matcher.quirk_auto_assigns(Some(&ConditionBlock::default()), &ctx));
    }

    #[test]
    fn test_tolerance() {
        let block = ConditionBlock::all_of(["trait.detail-focus == 80.3"]);
        assert!(!ConditionMatcher::default().matches(&block, &detail(80.0)));
        assert!(ConditionMatcher::new(0.5).matches(&block, &detail(80.0)));
    }

    #[test]
    fn test_deserialize_block() {
        let block: ConditionBlock = serde_json::from_str(r#"{"all_of": ["skill.rust > 50"]}"#).unwrap();
        assert_eq!(block.any_of, None);
        assert_eq!(block.all_of, Some(vec!["skill.rust > 50".to_string()]));

        let block: ConditionBlock = toml::from_str("any_of = []").unwrap();
        assert_eq!(block.any_of, Some(Vec::new()));
        assert_eq!(block.all_of, None);
    }

    #[rstest]
    #[case::phrase_any_of("any_of = []", false)]
    #[case::phrase_all_of("all_of = []", true)]
    #[case::phrase_both("any_of = []\nall_of = [\"1 > 0\"]", false)]
    #[case::phrase_no_lists("", true)]
    fn test_empty_lists_on_phrases(#[case] text: &str, #[case] expected: bool) {
        let block: ConditionBlock = toml::from_str(text).unwrap();
        let matcher = ConditionMatcher::default();
        assert_eq!(matcher.phrase_matches(Some(&block), &detail(80.0)), expected);
        assert_eq!(matcher.matches(&block, &detail(80.0)), expected);
    }

    #[rstest]
    #[case::any_of(ConditionBlock::any_of(Vec::<String>::new()))]
    #[case::all_of(ConditionBlock::all_of(Vec::<String>::new()))]
    #[case::both(ConditionBlock { any_of: Some(Vec::new()), all_of: Some(Vec::new()) })]
    fn test_empty_lists_never_assign_quirks(#[case] block: ConditionBlock) {
        assert!(block.is_empty());
        assert!(!ConditionMatcher::default().quirk_auto_assigns(Some(&block), &detail(80.0)));
    }

    #[test]
    fn test_absent_lists_are_not_serialized() {
        let json = serde_json::to_value(ConditionBlock::all_of(["quirk.pedant"])).unwrap();
        assert_eq!(json, serde_json::json!({ "all_of": ["quirk.pedant"] }));
    }
}
