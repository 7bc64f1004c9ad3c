//! Sawdust rules.
//!
//! Pelletizing viability is a partial conclusion with two entry paths: a
//! large dry lot with strong pellet demand, or any lot above the floor that
//! is dry enough for the press on its own. Storage decisions only apply to
//! lots that were found pelletizable.

use super::{Family, Rule, RuleContext, RuleDef};
use crate::models::{Conclusion, ConclusionKind, Predicate};

/// Lots below this volume are not worth handling.
pub const VOLUME_FLOOR: f64 = 5.0;
/// Occupancy percent above which pellets must be sold instead of stored.
pub const STORAGE_LIMIT: f64 = 90.0;

fn is_sawdust(ctx: &RuleContext) -> bool {
    ctx.is(Predicate::Tipo, "aserrin")
}

fn above_floor(ctx: &RuleContext) -> bool {
    is_sawdust(ctx) && ctx.at_least(Predicate::Volumen, VOLUME_FLOOR)
}

fn pelletizable(ctx: &RuleContext) -> bool {
    is_sawdust(ctx) && ctx.partial(Conclusion::AptoPelletizacion)
}

pub(crate) fn bulk_pellets(ctx: &RuleContext) -> bool {
    is_sawdust(ctx)
        && ctx.at_least(Predicate::Volumen, 200.0)
        && ctx.is(Predicate::DemandaPellets, "alta")
        && ctx.is(Predicate::MaqPelletizadora, "si")
        && ctx.below(Predicate::Humedad, 15.0)
}

pub(crate) fn dry_pellets(ctx: &RuleContext) -> bool {
    above_floor(ctx)
        && ctx.is(Predicate::MaqPelletizadora, "si")
        && ctx.below(Predicate::Humedad, 9.0)
}

pub(crate) fn sell_raw(ctx: &RuleContext) -> bool {
    above_floor(ctx)
        && !ctx.partial(Conclusion::AptoPelletizacion)
        && ctx.is(Predicate::DemandaPellets, "alta")
}

pub(crate) fn discard_no_demand(ctx: &RuleContext) -> bool {
    above_floor(ctx)
        && !ctx.partial(Conclusion::AptoPelletizacion)
        && ctx.is(Predicate::DemandaPellets, "baja")
}

pub(crate) fn discard_small(ctx: &RuleContext) -> bool {
    is_sawdust(ctx) && ctx.below(Predicate::Volumen, VOLUME_FLOOR)
}

pub(crate) fn sell_on_price_spike(ctx: &RuleContext) -> bool {
    above_floor(ctx)
        && ctx.is(Predicate::PrecioPellet, "alto")
        && ctx.is(Predicate::VolatilidadPellet, "alta")
}

pub(crate) fn storage_full(ctx: &RuleContext) -> bool {
    pelletizable(ctx) && ctx.above(Predicate::CapacidadAlmacenamiento, STORAGE_LIMIT)
}

pub(crate) fn storage_free(ctx: &RuleContext) -> bool {
    pelletizable(ctx) && ctx.at_most(Predicate::CapacidadAlmacenamiento, STORAGE_LIMIT)
}

pub fn rules() -> Vec<Box<dyn Rule>> {
    let row = |id, name, kind, conclusion, condition| -> Box<dyn Rule> {
        Box::new(RuleDef {
            id,
            name,
            family: Family::Sawdust,
            kind,
            conclusion,
            condition,
        })
    };
    use ConclusionKind::{Optimal, Partial};

    vec![
        row("R06", "Bulk pelletizing", Partial, Conclusion::AptoPelletizacion, bulk_pellets),
        row("R07", "Dry sawdust pelletizing", Partial, Conclusion::AptoPelletizacion, dry_pellets),
        row("R08", "Sell raw sawdust", Optimal, Conclusion::VenderAserrin, sell_raw),
        row("R08B", "Discard without demand", Optimal, Conclusion::DescartarAserrin, discard_no_demand),
        row("R08C", "Discard small lot", Optimal, Conclusion::DescartarAserrin, discard_small),
        row("R09", "Sell on pellet price spike", Optimal, Conclusion::VenderAserrin, sell_on_price_spike),
        row("R10", "Storage full, sell pellets", Optimal, Conclusion::ForzarVentaInmediata, storage_full),
        row("R10B", "Store pellets", Optimal, Conclusion::AlmacenarPellet, storage_free),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::rules::testing::Facts;

    fn sawdust(volume: f64, humidity: f64) -> Facts {
        Facts::new()
            .atom(Predicate::Tipo, "aserrin")
            .num(Predicate::Volumen, volume)
            .num(Predicate::Humedad, humidity)
    }

    #[test]
    fn dry_lot_with_press_is_pelletizable() {
        let facts = sawdust(10.0, 8.0).atom(Predicate::MaqPelletizadora, "si");
        assert!(facts.holds(dry_pellets));
        assert!(!facts.holds(bulk_pellets));
    }

    #[test]
    fn humidity_cutoff_is_strict() {
        let facts = sawdust(10.0, 9.0).atom(Predicate::MaqPelletizadora, "si");
        assert!(!facts.holds(dry_pellets));
    }

    #[test]
    fn bulk_path_tolerates_more_moisture() {
        let facts = sawdust(200.0, 14.0)
            .atom(Predicate::MaqPelletizadora, "si")
            .atom(Predicate::DemandaPellets, "alta");
        assert!(facts.holds(bulk_pellets));
        assert!(!facts.holds(dry_pellets));

        let facts = sawdust(199.0, 14.0)
            .atom(Predicate::MaqPelletizadora, "si")
            .atom(Predicate::DemandaPellets, "alta");
        assert!(!facts.holds(bulk_pellets));
    }

    #[test]
    fn no_press_means_no_pellets() {
        let facts = sawdust(500.0, 5.0)
            .atom(Predicate::MaqPelletizadora, "no")
            .atom(Predicate::DemandaPellets, "alta");
        assert!(!facts.holds(bulk_pellets));
        assert!(!facts.holds(dry_pellets));
        assert!(facts.holds(sell_raw));
    }

    #[test]
    fn volume_floor_is_inclusive() {
        assert!(sawdust(4.99, 20.0).holds(discard_small));
        assert!(!sawdust(5.0, 20.0).holds(discard_small));
        assert!(sawdust(5.0, 20.0)
            .atom(Predicate::DemandaPellets, "baja")
            .holds(discard_no_demand));
    }

    #[test]
    fn pelletizable_lots_are_not_sold_raw() {
        let facts = sawdust(50.0, 5.0)
            .atom(Predicate::DemandaPellets, "alta")
            .partial(Conclusion::AptoPelletizacion);
        assert!(!facts.holds(sell_raw));
        assert!(!facts.holds(discard_no_demand));
    }

    #[test]
    fn storage_limit_boundary() {
        let at = |capacity| {
            sawdust(50.0, 5.0)
                .num(Predicate::CapacidadAlmacenamiento, capacity)
                .partial(Conclusion::AptoPelletizacion)
        };
        assert!(at(90.0).holds(storage_free));
        assert!(!at(90.0).holds(storage_full));
        assert!(at(90.5).holds(storage_full));
        assert!(!at(90.5).holds(storage_free));
    }

    #[test]
    fn price_spike_sells() {
        let facts = sawdust(5.0, 30.0)
            .atom(Predicate::PrecioPellet, "alto")
            .atom(Predicate::VolatilidadPellet, "alta");
        assert!(facts.holds(sell_on_price_spike));
        assert!(!facts
            .atom(Predicate::VolatilidadPellet, "baja")
            .holds(sell_on_price_spike));
    }
}
