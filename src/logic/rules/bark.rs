//! Bark rules.
//!
//! A cascade: each rule negates every earlier one, so at most one bark
//! conclusion fires per lot. Substrate wins unless the lot is pine with
//! strong compost demand, which goes to the acidophilic substrate line.

use super::{Family, Rule, RuleContext, RuleDef};
use crate::models::{Conclusion, ConclusionKind, Predicate};

fn is_bark(ctx: &RuleContext) -> bool {
    ctx.is(Predicate::Tipo, "corteza")
}

fn pine_for_compost(ctx: &RuleContext) -> bool {
    ctx.is(Predicate::Especie, "pino") && ctx.is(Predicate::DemandaCompost, "alta")
}

pub(crate) fn substrate(ctx: &RuleContext) -> bool {
    is_bark(ctx) && ctx.is(Predicate::DemandaSustrato, "alta") && !pine_for_compost(ctx)
}

pub(crate) fn compost(ctx: &RuleContext) -> bool {
    is_bark(ctx)
        && !substrate(ctx)
        && ctx.is(Predicate::MercadoCompost, "verdadero")
        && ctx.is(Predicate::Contaminacion, "ninguna")
        && ctx.is(Predicate::DemandaCompost, "alta")
}

pub(crate) fn acidophilic(ctx: &RuleContext) -> bool {
    is_bark(ctx) && !substrate(ctx) && !compost(ctx) && pine_for_compost(ctx)
}

pub(crate) fn store(ctx: &RuleContext) -> bool {
    is_bark(ctx)
        && !substrate(ctx)
        && !compost(ctx)
        && !acidophilic(ctx)
        && ctx.is(Predicate::DemandaCompost, "baja")
        && ctx.is(Predicate::EspacioCompost, "limitado")
}

pub(crate) fn gardening(ctx: &RuleContext) -> bool {
    is_bark(ctx)
        && !substrate(ctx)
        && !compost(ctx)
        && !acidophilic(ctx)
        && !store(ctx)
        && ctx.is(Predicate::DemandaJardineria, "alta")
}

pub fn rules() -> Vec<Box<dyn Rule>> {
    let row = |id, name, conclusion, condition| -> Box<dyn Rule> {
        Box::new(RuleDef {
            id,
            name,
            family: Family::Bark,
            kind: ConclusionKind::Optimal,
            conclusion,
            condition,
        })
    };

    vec![
        row("R01", "Bark to nursery substrate", Conclusion::ProducirSustrato, substrate),
        row("R02", "Bark to compost", Conclusion::ProducirCompostaje, compost),
        row(
            "R03",
            "Pine bark to acidophilic compost",
            Conclusion::CompostajeOSustratoAcidofilo,
            acidophilic,
        ),
        row("R04", "Store bark temporarily", Conclusion::AlmacenarTemporalmente, store),
        row("R05", "Bark to gardening substrate", Conclusion::SustratoJardineria, gardening),
    ]
}
