use super::{bark, chips, defective, logistics, sawdust, scraps, Family, Rule, RuleContext};
use crate::models::{Conclusion, ConclusionKind, FactSnapshot, Recommendation};
use std::collections::BTreeSet;

/// Bumped whenever a rule, threshold or cascade order changes.
pub const RULE_BASE_VERSION: &str = "2024.11";

/// Result of one evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    pub recommendations: Vec<Recommendation>,
    /// Ids of every rule whose condition held, in firing order.
    pub fired: Vec<&'static str>,
}

pub struct RulesEngine {
    rules: Vec<Box<dyn Rule>>,
}

impl RulesEngine {
    pub fn new() -> Self {
        let rules: Vec<Box<dyn Rule>> = [
            bark::rules(),
            sawdust::rules(),
            chips::rules(),
            scraps::rules(),
            defective::rules(),
            logistics::rules(),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self { rules }
    }

    /// Runs both passes over one snapshot.
    ///
    /// Pass 1 fires every partial rule against the facts alone. Pass 2 fires
    /// priority and optimal rules with the partial set visible. Nothing is
    /// kept between calls.
    pub fn evaluate(&self, facts: &FactSnapshot) -> Evaluation {
        let mut evaluation = Evaluation::default();
        let mut seen: BTreeSet<(ConclusionKind, Conclusion)> = BTreeSet::new();

        let partials = self.partials(facts, Some(&mut evaluation));
        for conclusion in &partials {
            seen.insert((ConclusionKind::Partial, *conclusion));
        }

        let ctx = RuleContext::new(facts, &partials);
        for rule in self.rules.iter().filter(|r| r.kind() != ConclusionKind::Partial) {
            if !rule.holds(&ctx) {
                continue;
            }
            tracing::debug!(rule = rule.id(), conclusion = %rule.conclusion(), "Rule fired");
            evaluation.fired.push(rule.id());
            if seen.insert((rule.kind(), rule.conclusion())) {
                evaluation
                    .recommendations
                    .push(Recommendation::new(rule.kind(), rule.conclusion()));
            }
        }

        evaluation
    }

    /// Pass 1. Records firings into `evaluation` when given one.
    fn partials(
        &self,
        facts: &FactSnapshot,
        mut evaluation: Option<&mut Evaluation>,
    ) -> BTreeSet<Conclusion> {
        let empty = BTreeSet::new();
        let ctx = RuleContext::new(facts, &empty);
        let mut partials = BTreeSet::new();

        for rule in self.rules.iter().filter(|r| r.kind() == ConclusionKind::Partial) {
            if !rule.holds(&ctx) {
                continue;
            }
            let fresh = partials.insert(rule.conclusion());
            if let Some(evaluation) = evaluation.as_deref_mut() {
                tracing::debug!(rule = rule.id(), conclusion = %rule.conclusion(), "Rule fired");
                evaluation.fired.push(rule.id());
                if fresh {
                    evaluation
                        .recommendations
                        .push(Recommendation::new(ConclusionKind::Partial, rule.conclusion()));
                }
            }
        }

        partials
    }

    /// Evaluates a single rule. Staged rules see the full Pass-1 partial set.
    #[cfg(test)]
    pub fn evaluate_rule(&self, rule_id: &str, facts: &FactSnapshot) -> Option<Recommendation> {
        let rule = self.rules.iter().find(|r| r.id() == rule_id)?;
        let partials = if rule.kind() == ConclusionKind::Partial {
            BTreeSet::new()
        } else {
            self.partials(facts, None)
        };

        rule.holds(&RuleContext::new(facts, &partials))
            .then(|| Recommendation::new(rule.kind(), rule.conclusion()))
    }

    pub fn list_rules(&self) -> Vec<RuleInfo> {
        self.rules
            .iter()
            .map(|r| RuleInfo {
                id: r.id(),
                name: r.name(),
                family: r.family(),
                kind: r.kind(),
                conclusion: r.conclusion(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub family: Family,
    pub kind: ConclusionKind,
    pub conclusion: Conclusion,
}
