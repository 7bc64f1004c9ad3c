//! Chip rules.

use super::{Family, Rule, RuleContext, RuleDef};
use crate::models::{Conclusion, ConclusionKind, Predicate};

/// Minimum volume for chip production.
pub const VOLUME_FLOOR: f64 = 10.0;

const PULP_SPECIES: &[&str] = &["pino", "eucalipto"];

fn is_chips(ctx: &RuleContext) -> bool {
    ctx.is(Predicate::Tipo, "chips")
}

fn above_floor(ctx: &RuleContext) -> bool {
    is_chips(ctx) && ctx.at_least(Predicate::Volumen, VOLUME_FLOOR)
}

fn staged(ctx: &RuleContext, conclusion: Conclusion) -> bool {
    is_chips(ctx) && ctx.partial(conclusion)
}

pub(crate) fn produce(ctx: &RuleContext) -> bool {
    above_floor(ctx)
}

pub(crate) fn discard(ctx: &RuleContext) -> bool {
    is_chips(ctx) && ctx.below(Predicate::Volumen, VOLUME_FLOOR)
}

pub(crate) fn contract_sale(ctx: &RuleContext) -> bool {
    staged(ctx, Conclusion::ProducirChips)
        && ctx.is_any(Predicate::PrecioChips, &["medio", "alto"])
        && ctx.is(Predicate::VolatilidadChips, "baja")
}

/// Clean, debarked softwood or eucalyptus chips can go to pulp mills.
pub(crate) fn pulpable(ctx: &RuleContext) -> bool {
    above_floor(ctx)
        && ctx.is(Predicate::Corteza, "no")
        && ctx.is(Predicate::Contaminacion, "ninguna")
        && ctx.is_any(Predicate::Especie, PULP_SPECIES)
}

pub(crate) fn not_pulpable(ctx: &RuleContext) -> bool {
    above_floor(ctx) && !pulpable(ctx)
}

pub(crate) fn biomass_supply(ctx: &RuleContext) -> bool {
    staged(ctx, Conclusion::ChipNoPulpable)
        && ctx.is(Predicate::DemandaBiomasa, "alta")
        && ctx.is(Predicate::StockBiomasa, "bajo")
}

pub(crate) fn biomass_stocked(ctx: &RuleContext) -> bool {
    staged(ctx, Conclusion::ChipNoPulpable) && ctx.is(Predicate::StockBiomasa, "suficiente")
}

pub(crate) fn feed_boiler(ctx: &RuleContext) -> bool {
    staged(ctx, Conclusion::ProducirChips)
        && ctx.is(Predicate::Caldera, "encendida")
        && ctx.is(Predicate::StockBiomasa, "bajo")
}

pub(crate) fn sell_pulp(ctx: &RuleContext) -> bool {
    staged(ctx, Conclusion::ChipPulpable) && ctx.is(Predicate::StockBiomasa, "suficiente")
}

pub(crate) fn sell(ctx: &RuleContext) -> bool {
    staged(ctx, Conclusion::ProducirChips) && !feed_boiler(ctx)
}

pub fn rules() -> Vec<Box<dyn Rule>> {
    let row = |id, name, kind, conclusion, condition| -> Box<dyn Rule> {
        Box::new(RuleDef {
            id,
            name,
            family: Family::Chips,
            kind,
            conclusion,
            condition,
        })
    };
    use ConclusionKind::{Optimal, Partial, Priority};

    vec![
        row("R13", "Produce chips", Partial, Conclusion::ProducirChips, produce),
        row("R13B", "Discard small chip lot", Optimal, Conclusion::DescartarChips, discard),
        row("R15", "Lock in contract sale", Priority, Conclusion::AsegurarVentaContrato, contract_sale),
        row("R16", "Pulp-grade chips", Partial, Conclusion::ChipPulpable, pulpable),
        row("R17", "Fuel-grade chips", Partial, Conclusion::ChipNoPulpable, not_pulpable),
        row("R18", "Supply biomass market", Optimal, Conclusion::SuministroCaldera, biomass_supply),
        row("R18B", "Biomass already stocked", Optimal, Conclusion::NoSuministrarCaldera, biomass_stocked),
        row("R19", "Feed own boiler", Priority, Conclusion::SuministrarChipCaldera, feed_boiler),
        row("R19B", "Sell pulp chips", Optimal, Conclusion::VenderChipPulpable, sell_pulp),
        row("R19C", "Sell chips", Optimal, Conclusion::VenderChips, sell),
    ]
}
