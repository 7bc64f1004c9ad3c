//! Defective wood rules.
//!
//! Severe defects leave the lot fit only for chipping. Without a chipper the
//! lot goes to the boiler when biomass is short, and is discarded otherwise.
//! Mild defects can be reworked into second-grade stock.

use super::{Family, Rule, RuleContext, RuleDef};
use crate::models::{Conclusion, ConclusionKind, Predicate};

const SEVERE_DEFECTS: &[&str] = &["grieta_profunda", "pudricion_parcial", "pudricion"];
const MILD_DEFECTS: &[&str] = &["curvatura_leve", "nudo_estetico"];

fn is_defective(ctx: &RuleContext) -> bool {
    ctx.is(Predicate::Tipo, "madera_fallas")
}

fn chips_only(ctx: &RuleContext) -> bool {
    is_defective(ctx) && ctx.partial(Conclusion::AptoSoloChips)
}

pub(crate) fn severe(ctx: &RuleContext) -> bool {
    is_defective(ctx) && ctx.is_any(Predicate::Falla, SEVERE_DEFECTS)
}

pub(crate) fn second_grade(ctx: &RuleContext) -> bool {
    is_defective(ctx)
        && ctx.is_any(Predicate::Falla, MILD_DEFECTS)
        && ctx.is(Predicate::MaqReprocesadora, "si")
}

pub(crate) fn chip_it(ctx: &RuleContext) -> bool {
    chips_only(ctx) && ctx.is(Predicate::MaqChipeadora, "si")
}

pub(crate) fn burn_it(ctx: &RuleContext) -> bool {
    chips_only(ctx) && !chip_it(ctx) && ctx.is(Predicate::StockBiomasa, "bajo")
}

pub(crate) fn discard(ctx: &RuleContext) -> bool {
    chips_only(ctx) && !chip_it(ctx) && !burn_it(ctx)
}

pub(crate) fn straighten(ctx: &RuleContext) -> bool {
    is_defective(ctx)
        && ctx.partial(Conclusion::AptoSegundaCalidad)
        && ctx.is(Predicate::Falla, "curvatura_leve")
}

pub fn rules() -> Vec<Box<dyn Rule>> {
    let row = |id, name, kind, conclusion, condition| -> Box<dyn Rule> {
        Box::new(RuleDef {
            id,
            name,
            family: Family::Defective,
            kind,
            conclusion,
            condition,
        })
    };
    use ConclusionKind::{Optimal, Partial, Priority};

    vec![
        row("R14", "Severe defect, chips only", Partial, Conclusion::AptoSoloChips, severe),
        row("R22", "Mild defect, second grade", Partial, Conclusion::AptoSegundaCalidad, second_grade),
        row("R14C", "Chip defective wood", Optimal, Conclusion::ProducirChips, chip_it),
        row("R14D", "Burn defective wood", Optimal, Conclusion::SuministrarCaldera, burn_it),
        row("R14E", "Discard defective wood", Optimal, Conclusion::DescartarMaterial, discard),
        row("R23", "Straighten and rework", Priority, Conclusion::RectificarReprocesar, straighten),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::rules::testing::Facts;

    fn defect(falla: &str) -> Facts {
        Facts::new()
            .atom(Predicate::Tipo, "madera_fallas")
            .atom(Predicate::Falla, falla)
    }

    #[test]
    fn severe_defects() {
        for falla in SEVERE_DEFECTS {
            assert!(defect(falla).holds(severe), "{}", falla);
        }
        assert!(!defect("curvatura_leve").holds(severe));
        assert!(!Facts::new().atom(Predicate::Tipo, "madera_fallas").holds(severe));
    }

    #[test]
    fn severe_outcomes_are_exclusive() {
        let outcomes: [(&str, fn(&RuleContext) -> bool); 3] =
            [("chip", chip_it), ("burn", burn_it), ("discard", discard)];
        let cases = [
            ("si", "bajo", "chip"),
            ("si", "suficiente", "chip"),
            ("no", "bajo", "burn"),
            ("no", "suficiente", "discard"),
        ];
        for (chipper, stock, expected) in cases {
            let facts = defect("pudricion")
                .partial(Conclusion::AptoSoloChips)
                .atom(Predicate::MaqChipeadora, chipper)
                .atom(Predicate::StockBiomasa, stock);
            let held: Vec<&str> = outcomes
                .iter()
                .filter(|(_, condition)| facts.holds(*condition))
                .map(|(name, _)| *name)
                .collect();
            assert_eq!(held, [expected], "chipper={} stock={}", chipper, stock);
        }
    }

    #[test]
    fn no_chipper_and_low_stock_feeds_boiler() {
        let facts = defect("pudricion_parcial")
            .partial(Conclusion::AptoSoloChips)
            .atom(Predicate::MaqChipeadora, "no")
            .atom(Predicate::StockBiomasa, "bajo");
        assert!(facts.holds(burn_it));
        assert!(!facts.holds(discard));

        // Without the partial from pass 1 nothing is burned.
        let unstaged = defect("pudricion_parcial")
            .atom(Predicate::MaqChipeadora, "no")
            .atom(Predicate::StockBiomasa, "bajo");
        assert!(!unstaged.holds(burn_it));
    }

    #[test]
    fn no_chipper_and_stock_discards() {
        let facts = defect("grieta_profunda")
            .partial(Conclusion::AptoSoloChips)
            .atom(Predicate::MaqChipeadora, "no")
            .atom(Predicate::StockBiomasa, "suficiente");
        assert!(facts.holds(discard));
        assert!(!facts.holds(chip_it));
    }

    #[test]
    fn mild_defect_needs_reprocessor() {
        assert!(!defect("nudo_estetico").holds(second_grade));
        assert!(defect("nudo_estetico")
            .atom(Predicate::MaqReprocesadora, "si")
            .holds(second_grade));
    }

    #[test]
    fn only_warp_is_straightened() {
        let warp = defect("curvatura_leve").partial(Conclusion::AptoSegundaCalidad);
        assert!(warp.holds(straighten));
        let knot = defect("nudo_estetico").partial(Conclusion::AptoSegundaCalidad);
        assert!(!knot.holds(straighten));
    }
}
