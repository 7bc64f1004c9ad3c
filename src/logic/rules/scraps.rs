//! Scrap and offcut rules (finger-joint and board sales).

use super::{Family, Rule, RuleContext, RuleDef};
use crate::models::{Conclusion, ConclusionKind, Predicate};

/// Finger-joint pays off when its price beats chips by this factor.
pub const FINGER_PREMIUM: f64 = 1.5;

fn is_scrap(ctx: &RuleContext) -> bool {
    ctx.is_any(Predicate::Tipo, &["retazos", "despuntes"])
}

/// Finger-joint price above the chip price times the premium.
fn finger_pays(ctx: &RuleContext) -> bool {
    match (
        ctx.num(Predicate::PrecioFinger),
        ctx.num(Predicate::PrecioChipsNum),
    ) {
        (Some(finger), Some(chips)) => finger > FINGER_PREMIUM * chips,
        _ => false,
    }
}

pub(crate) fn finger_grade(ctx: &RuleContext) -> bool {
    is_scrap(ctx)
        && ctx.at_least(Predicate::Largo, 50.0)
        && ctx.at_least(Predicate::Ancho, 5.0)
        && ctx.below(Predicate::Humedad, 18.0)
        && ctx.is_any(Predicate::Especie, &["pino", "eucalipto"])
}

pub(crate) fn board_grade(ctx: &RuleContext) -> bool {
    is_scrap(ctx) && ctx.at_least(Predicate::Volumen, 50.0) && !finger_grade(ctx)
}

pub(crate) fn long_pieces(ctx: &RuleContext) -> bool {
    is_scrap(ctx) && ctx.above(Predicate::Largo, 60.0) && finger_pays(ctx)
}

pub(crate) fn produce_finger(ctx: &RuleContext) -> bool {
    is_scrap(ctx)
        && ctx.partial(Conclusion::AptoFingerJoint)
        && finger_pays(ctx)
        && ctx.is(Predicate::MaqFinger, "si")
}

pub fn rules() -> Vec<Box<dyn Rule>> {
    let row = |id, name, kind, conclusion, condition| -> Box<dyn Rule> {
        Box::new(RuleDef {
            id,
            name,
            family: Family::Scraps,
            kind,
            conclusion,
            condition,
        })
    };
    use ConclusionKind::{Optimal, Partial, Priority};

    vec![
        row("R21", "Finger-joint grade", Partial, Conclusion::AptoFingerJoint, finger_grade),
        row("R11", "Board-mill grade", Partial, Conclusion::AptoVentaTableros, board_grade),
        row("R12", "Long pieces to finger-joint or molding", Priority, Conclusion::FingerJointOMoldura, long_pieces),
        row("R20", "Produce finger-joint", Optimal, Conclusion::ProducirFingerJoint, produce_finger),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::rules::testing::Facts;

    fn offcuts(length: f64, width: f64, humidity: f64) -> Facts {
        Facts::new()
            .atom(Predicate::Tipo, "retazos")
            .atom(Predicate::Especie, "pino")
            .num(Predicate::Largo, length)
            .num(Predicate::Ancho, width)
            .num(Predicate::Humedad, humidity)
    }

    #[test]
    fn finger_grade_boundaries() {
        assert!(offcuts(50.0, 5.0, 17.9).holds(finger_grade));
        assert!(!offcuts(49.9, 5.0, 12.0).holds(finger_grade));
        assert!(!offcuts(50.0, 4.9, 12.0).holds(finger_grade));
        assert!(!offcuts(50.0, 5.0, 18.0).holds(finger_grade));
    }

    #[test]
    fn trimmings_count_as_scraps() {
        let facts = offcuts(80.0, 8.0, 10.0).atom(Predicate::Tipo, "despuntes");
        assert!(facts.holds(finger_grade));
    }

    #[test]
    fn boards_only_when_not_finger_grade() {
        let facts = offcuts(80.0, 8.0, 10.0).num(Predicate::Volumen, 60.0);
        assert!(!facts.holds(board_grade));

        let wet = facts.num(Predicate::Humedad, 25.0);
        assert!(wet.holds(board_grade));
    }

    #[test]
    fn finger_premium_is_strict() {
        let priced = |finger| {
            offcuts(70.0, 8.0, 10.0)
                .num(Predicate::PrecioFinger, finger)
                .num(Predicate::PrecioChipsNum, 50.0)
        };
        assert!(!priced(75.0).holds(long_pieces));
        assert!(priced(75.1).holds(long_pieces));
    }

    #[test]
    fn production_needs_the_machine() {
        let facts = offcuts(70.0, 8.0, 10.0)
            .num(Predicate::PrecioFinger, 100.0)
            .num(Predicate::PrecioChipsNum, 30.0)
            .partial(Conclusion::AptoFingerJoint);
        assert!(!facts.holds(produce_finger));
        assert!(facts.atom(Predicate::MaqFinger, "si").holds(produce_finger));
    }
}
