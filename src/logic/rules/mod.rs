pub mod bark;
pub mod chips;
pub mod defective;
pub mod engine;
pub mod logistics;
pub mod sawdust;
pub mod scraps;

pub use engine::RulesEngine;

use crate::models::{Conclusion, ConclusionKind, FactSnapshot, Predicate};
use std::collections::BTreeSet;

/// Material family a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Family {
    Bark,
    Sawdust,
    Chips,
    Scraps,
    Defective,
    Logistics,
}

impl Family {
    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Bark => "Corteza",
            Family::Sawdust => "Aserrín",
            Family::Chips => "Chips",
            Family::Scraps => "Retazos",
            Family::Defective => "Madera con fallas",
            Family::Logistics => "Logística",
        }
    }
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for byproduct classification rules
pub trait Rule: Send + Sync {
    /// Stable identifier, e.g. `R07`
    fn id(&self) -> &'static str;

    /// Human-readable name
    fn name(&self) -> &'static str;

    fn family(&self) -> Family;

    fn kind(&self) -> ConclusionKind;

    fn conclusion(&self) -> Conclusion;

    /// Whether the condition holds. Must never panic on missing facts.
    fn holds(&self, ctx: &RuleContext) -> bool;
}

/// A rule defined as a row of the rule table.
pub struct RuleDef {
    pub id: &'static str,
    pub name: &'static str,
    pub family: Family,
    pub kind: ConclusionKind,
    pub conclusion: Conclusion,
    pub condition: fn(&RuleContext) -> bool,
}

impl Rule for RuleDef {
    fn id(&self) -> &'static str {
        self.id
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn family(&self) -> Family {
        self.family
    }

    fn kind(&self) -> ConclusionKind {
        self.kind
    }

    fn conclusion(&self) -> Conclusion {
        self.conclusion
    }

    fn holds(&self, ctx: &RuleContext) -> bool {
        (self.condition)(ctx)
    }
}

/// Read-only view a condition is evaluated against.
///
/// Every comparison against an unset predicate is false, so negating a
/// condition that reads an unknown fact yields true (negation as failure).
pub struct RuleContext<'a> {
    facts: &'a FactSnapshot,
    partials: &'a BTreeSet<Conclusion>,
}

impl<'a> RuleContext<'a> {
    pub fn new(facts: &'a FactSnapshot, partials: &'a BTreeSet<Conclusion>) -> Self {
        Self { facts, partials }
    }

    pub fn is(&self, predicate: Predicate, atom: &str) -> bool {
        self.facts.atom(predicate) == Some(atom)
    }

    pub fn is_any(&self, predicate: Predicate, atoms: &[&str]) -> bool {
        self.facts
            .atom(predicate)
            .is_some_and(|value| atoms.contains(&value))
    }

    pub fn num(&self, predicate: Predicate) -> Option<f64> {
        self.facts.number(predicate)
    }

    /// `value >= threshold`
    pub fn at_least(&self, predicate: Predicate, threshold: f64) -> bool {
        self.num(predicate).is_some_and(|v| v >= threshold)
    }

    /// `value > threshold`
    pub fn above(&self, predicate: Predicate, threshold: f64) -> bool {
        self.num(predicate).is_some_and(|v| v > threshold)
    }

    /// `value < threshold`
    pub fn below(&self, predicate: Predicate, threshold: f64) -> bool {
        self.num(predicate).is_some_and(|v| v < threshold)
    }

    /// `value <= threshold`
    pub fn at_most(&self, predicate: Predicate, threshold: f64) -> bool {
        self.num(predicate).is_some_and(|v| v <= threshold)
    }

    /// Membership in the partial conclusions derived by the first pass.
    pub fn partial(&self, conclusion: Conclusion) -> bool {
        self.partials.contains(&conclusion)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::Facts;
    use super::*;

    #[test]
    fn comparisons_against_unknown_facts_fail() {
        let facts = Facts::new();
        let ctx = RuleContext::new(&facts.facts, &facts.partials);
        assert!(!ctx.is(Predicate::Tipo, "chips"));
        assert!(!ctx.at_least(Predicate::Volumen, 0.0));
        assert!(!ctx.below(Predicate::Humedad, 100.0));
        assert!(!ctx.partial(Conclusion::ProducirChips));
    }

    #[test]
    fn threshold_inclusivity() {
        let facts = Facts::new().num(Predicate::Humedad, 9.0);
        let ctx = RuleContext::new(&facts.facts, &facts.partials);
        assert!(!ctx.below(Predicate::Humedad, 9.0));
        assert!(ctx.at_most(Predicate::Humedad, 9.0));
        assert!(ctx.at_least(Predicate::Humedad, 9.0));
        assert!(!ctx.above(Predicate::Humedad, 9.0));
    }

    #[test]
    fn atoms_and_numbers_do_not_mix() {
        let facts = Facts::new().atom(Predicate::Volumen, "alto");
        let ctx = RuleContext::new(&facts.facts, &facts.partials);
        assert!(!ctx.at_least(Predicate::Volumen, 0.0));
        assert!(ctx.is(Predicate::Volumen, "alto"));
    }
}
