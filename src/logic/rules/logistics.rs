use super::{Family, Rule, RuleContext, RuleDef};
use crate::models::{Conclusion, ConclusionKind, Predicate};

/// Freight that eats the whole margin makes shipping pointless, whatever the material.
pub(crate) fn freight_exceeds_margin(ctx: &RuleContext) -> bool {
    match (
        ctx.num(Predicate::CostoFlete),
        ctx.num(Predicate::MargenGanancia),
    ) {
        (Some(freight), Some(margin)) => freight >= margin,
        _ => false,
    }
}

pub fn rules() -> Vec<Box<dyn Rule>> {
    vec![Box::new(RuleDef {
        id: "R24",
        name: "Freight exceeds margin",
        family: Family::Logistics,
        kind: ConclusionKind::Optimal,
        conclusion: Conclusion::VenderEnPlantaDescartar,
        condition: freight_exceeds_margin,
    })]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::rules::testing::Facts;

    #[test]
    fn boundary_is_inclusive() {
        let at = |freight| {
            Facts::new()
                .num(Predicate::CostoFlete, freight)
                .num(Predicate::MargenGanancia, 20.0)
        };
        assert!(at(20.0).holds(freight_exceeds_margin));
        assert!(at(35.0).holds(freight_exceeds_margin));
        assert!(!at(19.99).holds(freight_exceeds_margin));
    }

    #[test]
    fn unknown_margin_never_fires() {
        let facts = Facts::new().num(Predicate::CostoFlete, 1000.0);
        assert!(!facts.holds(freight_exceeds_margin));
    }
}
