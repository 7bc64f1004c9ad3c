//! Fact normalization.
//!
//! Turns a raw lot/market request plus the set of available machine types
//! into the canonical single-valued fact snapshot the rule base reads.

use crate::config::EngineConfig;
use crate::error::InputError;
use crate::models::{
    canonical_symbol, coerce_number, is_blank, is_truthy, parse_number, AnalysisRequest,
    FactSnapshot, FactValue, MachineAvailability, MachineType, Predicate,
};
use serde_json::Value;

/// Qualitative price levels and their representative numeric values.
const PRICE_LEVELS: [(&str, f64); 3] = [("bajo", 30.0), ("medio", 50.0), ("alto", 70.0)];

/// Numeric prices below this band are `bajo`.
const PRICE_BAND_LOW: f64 = 40.0;
/// Numeric prices below this band (and not `bajo`) are `medio`.
const PRICE_BAND_HIGH: f64 = 60.0;

/// Canonical family names keyed by the normalized category labels that map to them.
const FAMILY_ALIASES: [(&str, &[&str]); 6] = [
    ("corteza", &["corteza", "cortezas"]),
    ("aserrin", &["aserrin", "aserrines", "viruta", "virutas"]),
    ("chips", &["chips", "chip", "astillas", "astilla"]),
    ("retazos", &["retazos", "retazo"]),
    ("despuntes", &["despuntes", "despunte"]),
    (
        "madera_fallas",
        &["madera_con_fallas", "madera_fallas", "madera_defectuosa"],
    ),
];

/// Builds fact snapshots. Holds only configuration, never request state.
#[derive(Debug, Clone)]
pub struct Normalizer {
    engine: EngineConfig,
}

impl Normalizer {
    pub fn new(engine: EngineConfig) -> Self {
        Self { engine }
    }

    /// Normalizes one request.
    ///
    /// `machines` is the availability set; when `None` the request's own
    /// `machines.available_types` list is used, and an absent list means no
    /// machine is available.
    pub fn normalize(
        &self,
        request: &AnalysisRequest,
        machines: Option<&MachineAvailability>,
    ) -> Result<FactSnapshot, InputError> {
        let category = request
            .category()
            .ok_or(InputError::MissingField("lot.category"))?;

        let from_request;
        let machines = match machines {
            Some(m) => m,
            None => {
                from_request = request
                    .machines
                    .as_ref()
                    .map(|m| MachineAvailability::from_codes(&m.available_types))
                    .unwrap_or_default();
                &from_request
            }
        };

        let mut facts = FactSnapshot::new();
        self.lot_facts(&mut facts, request, category);
        self.market_facts(&mut facts, request);
        machine_facts(&mut facts, request, machines);

        tracing::debug!(
            category = %category,
            tipo = ?facts.atom(Predicate::Tipo),
            facts = facts.len(),
            machines = ?machines.codes(),
            "Normalized lot"
        );

        Ok(facts)
    }

    fn lot_facts(&self, facts: &mut FactSnapshot, request: &AnalysisRequest, category: &str) {
        let lot = &request.lot;
        let categoria = canonical_symbol(category);

        facts.assert_atom(Predicate::Categoria, &categoria);
        facts.assert_atom(
            Predicate::Tipo,
            family_of(&categoria).unwrap_or(categoria.as_str()),
        );

        if let Some(species) = lot.species.as_deref().filter(|s| !s.trim().is_empty()) {
            facts.assert_atom(Predicate::Especie, species);
        }

        facts.assert_number(Predicate::Volumen, coerce_number(&lot.volume));
        facts.assert_number(Predicate::Humedad, coerce_number(&lot.humidity));
        facts.assert_atom(
            Predicate::Contaminacion,
            if is_truthy(&lot.chemical_contamination) {
                "si"
            } else {
                "ninguna"
            },
        );
        facts.assert_atom(
            Predicate::Corteza,
            if is_truthy(&lot.has_bark) { "si" } else { "no" },
        );

        let (length, width) = lot
            .dimensions
            .as_ref()
            .map(|d| (coerce_number(&d.length), coerce_number(&d.width)))
            .unwrap_or((0.0, 0.0));
        facts.assert_number(Predicate::Largo, length);
        facts.assert_number(Predicate::Ancho, width);

        if let Some(defect) = lot.defect_type.as_deref().filter(|d| !d.trim().is_empty()) {
            facts.assert_atom(Predicate::Falla, defect);
        }
    }

    fn market_facts(&self, facts: &mut FactSnapshot, request: &AnalysisRequest) {
        let market = &request.market;

        facts.assert_atom(
            Predicate::DemandaSustrato,
            level(&market.demanda_sustrato, "alta", "baja"),
        );
        if self.engine.assume_compost_market {
            facts.assert_atom(Predicate::MercadoCompost, "verdadero");
        }
        facts.assert_atom(
            Predicate::DemandaCompost,
            level(&market.demanda_compost, "alta", "baja"),
        );
        facts.assert_atom(
            Predicate::EspacioCompost,
            level(&market.espacio_compost, "disponible", "limitado"),
        );
        if self.engine.assume_gardening_demand {
            facts.assert_atom(Predicate::DemandaJardineria, "alta");
        }

        facts.assert_atom(
            Predicate::DemandaPellets,
            level(&market.demanda_pellets, "alta", "baja"),
        );
        price_facts(
            facts,
            &market.precio_pellets,
            Predicate::PrecioPellet,
            Predicate::PrecioPelletNum,
        );
        facts.assert_atom(
            Predicate::VolatilidadPellet,
            level(&market.volatilidad_pellets, "alta", "baja"),
        );
        facts.assert_number(
            Predicate::CapacidadAlmacenamiento,
            coerce_number(&market.capacidad_almacenamiento),
        );

        price_facts(
            facts,
            &market.precio_chips,
            Predicate::PrecioChips,
            Predicate::PrecioChipsNum,
        );
        facts.assert_atom(
            Predicate::VolatilidadChips,
            level(&market.volatilidad_chips, "alta", "baja"),
        );
        facts.assert_atom(
            Predicate::DemandaBiomasa,
            level(&market.demanda_biomasa, "alta", "baja"),
        );
        facts.assert_atom(
            Predicate::StockBiomasa,
            level(&market.stock_biomasa, "suficiente", "bajo"),
        );

        facts.assert_number(Predicate::PrecioFinger, coerce_number(&market.precio_finger));
        facts.assert_number(Predicate::CostoFlete, coerce_number(&market.costo_flete));
        facts.assert_number(Predicate::MargenGanancia, self.engine.profit_margin);
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// Checks numeric text strictly, for callers that want malformed numbers
/// rejected instead of coerced to zero. Blank values are allowed.
pub fn validate_strict(request: &AnalysisRequest) -> Result<(), InputError> {
    if request.category().is_none() {
        return Err(InputError::MissingField("lot.category"));
    }

    for (field, value) in request.numeric_fields() {
        if !is_blank(value) && parse_number(value).is_none() {
            return Err(InputError::NotANumber {
                field,
                value: value.to_string(),
            });
        }
    }

    // Prices may also be given as a level.
    for (field, value) in request.price_fields() {
        if !is_blank(value) && parse_number(value).is_none() && price_level(value).is_none() {
            return Err(InputError::NotANumber {
                field,
                value: value.to_string(),
            });
        }
    }

    Ok(())
}

fn family_of(categoria: &str) -> Option<&'static str> {
    FAMILY_ALIASES
        .iter()
        .find(|(_, labels)| labels.contains(&categoria))
        .map(|(family, _)| *family)
}

fn level(flag: &Value, on: &'static str, off: &'static str) -> &'static str {
    if is_truthy(flag) {
        on
    } else {
        off
    }
}

/// Asserts both the qualitative and the numeric form of a price.
///
/// Qualitative input maps through [`PRICE_LEVELS`]; numeric input is kept as
/// given and banded into a level. Anything else falls back to zero, which
/// bands as `bajo`.
fn price_facts(facts: &mut FactSnapshot, raw: &Value, qualitative: Predicate, numeric: Predicate) {
    if let Some((name, value)) = price_level(raw) {
        facts.assert_atom(qualitative, name);
        facts.assert_number(numeric, value);
        return;
    }

    let value = coerce_number(raw);
    facts.assert(qualitative, FactValue::Atom(price_band(value).to_string()));
    facts.assert_number(numeric, value);
}

fn price_level(raw: &Value) -> Option<(&'static str, f64)> {
    let Value::String(text) = raw else {
        return None;
    };
    let symbol = canonical_symbol(text);
    PRICE_LEVELS.into_iter().find(|(name, _)| *name == symbol)
}

fn price_band(value: f64) -> &'static str {
    if value < PRICE_BAND_LOW {
        "bajo"
    } else if value < PRICE_BAND_HIGH {
        "medio"
    } else {
        "alto"
    }
}

fn machine_facts(facts: &mut FactSnapshot, request: &AnalysisRequest, machines: &MachineAvailability) {
    let yes_no = |machine_type| {
        if machines.contains(machine_type) {
            "si"
        } else {
            "no"
        }
    };

    facts.assert_atom(Predicate::MaqChipeadora, yes_no(MachineType::Chipeadora));
    facts.assert_atom(Predicate::MaqFinger, yes_no(MachineType::FingerJoint));
    facts.assert_atom(Predicate::MaqReprocesadora, yes_no(MachineType::Reprocesadora));
    facts.assert_atom(Predicate::MaqPelletizadora, yes_no(MachineType::Pelletizadora));
    facts.assert_atom(Predicate::MaqDescortezadora, yes_no(MachineType::Descortezadora));

    // Running only counts when a boiler is actually available.
    let running = is_truthy(&request.market.estado_caldera) && machines.contains(MachineType::Caldera);
    facts.assert_atom(
        Predicate::Caldera,
        if running { "encendida" } else { "apagada" },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: serde_json::Value) -> AnalysisRequest {
        serde_json::from_value(value).unwrap()
    }

    fn normalize(value: serde_json::Value) -> FactSnapshot {
        Normalizer::default().normalize(&request(value), None).unwrap()
    }

    #[test]
    fn missing_category_is_rejected() {
        let err = Normalizer::default()
            .normalize(&request(json!({"lot": {"species": "Pino"}})), None)
            .unwrap_err();
        assert_eq!(err, InputError::MissingField("lot.category"));
    }

    #[test]
    fn defective_wood_gets_family_alias() {
        let facts = normalize(json!({
            "lot": {"category": "Madera con Fallas", "defectType": "Curvatura Leve"}
        }));
        assert_eq!(facts.atom(Predicate::Tipo), Some("madera_fallas"));
        assert_eq!(facts.atom(Predicate::Categoria), Some("madera_con_fallas"));
        assert_eq!(facts.atom(Predicate::Falla), Some("curvatura_leve"));
    }

    #[test]
    fn singular_labels_map_to_family() {
        assert_eq!(
            normalize(json!({"lot": {"category": "Chip"}})).atom(Predicate::Tipo),
            Some("chips")
        );
        assert_eq!(
            normalize(json!({"lot": {"category": "Retazo"}})).atom(Predicate::Tipo),
            Some("retazos")
        );
        assert_eq!(
            normalize(json!({"lot": {"category": "Aserrín"}})).atom(Predicate::Tipo),
            Some("aserrin")
        );
        assert_eq!(
            normalize(json!({"lot": {"category": "Lodo"}})).atom(Predicate::Tipo),
            Some("lodo")
        );
    }

    #[test]
    fn malformed_numbers_default_to_zero() {
        let facts = normalize(json!({
            "lot": {
                "category": "Retazos",
                "volume": "mucho",
                "humidity": null,
                "dimensions": {"length": "", "width": "6"}
            },
            "market": {"costoFlete": "n/a"}
        }));
        assert_eq!(facts.number(Predicate::Volumen), Some(0.0));
        assert_eq!(facts.number(Predicate::Humedad), Some(0.0));
        assert_eq!(facts.number(Predicate::Largo), Some(0.0));
        assert_eq!(facts.number(Predicate::Ancho), Some(6.0));
        assert_eq!(facts.number(Predicate::CostoFlete), Some(0.0));
    }

    #[test]
    fn flags_become_qualitative_facts() {
        let facts = normalize(json!({
            "lot": {"category": "Chips", "hasBark": true, "chemicalContamination": false},
            "market": {
                "demandaPellets": true,
                "stockBiomasa": false,
                "espacioCompost": true,
                "volatilidadChips": false
            }
        }));
        assert_eq!(facts.atom(Predicate::Corteza), Some("si"));
        assert_eq!(facts.atom(Predicate::Contaminacion), Some("ninguna"));
        assert_eq!(facts.atom(Predicate::DemandaPellets), Some("alta"));
        assert_eq!(facts.atom(Predicate::StockBiomasa), Some("bajo"));
        assert_eq!(facts.atom(Predicate::EspacioCompost), Some("disponible"));
        assert_eq!(facts.atom(Predicate::VolatilidadChips), Some("baja"));
        assert_eq!(facts.atom(Predicate::MercadoCompost), Some("verdadero"));
        assert_eq!(facts.atom(Predicate::DemandaJardineria), Some("alta"));
        assert_eq!(facts.number(Predicate::MargenGanancia), Some(20.0));
    }

    #[test]
    fn qualitative_prices_assert_both_forms() {
        let facts = normalize(json!({
            "lot": {"category": "Chips"},
            "market": {"precioChips": "Medio", "precioPellets": "Alto"}
        }));
        assert_eq!(facts.atom(Predicate::PrecioChips), Some("medio"));
        assert_eq!(facts.number(Predicate::PrecioChipsNum), Some(50.0));
        assert_eq!(facts.atom(Predicate::PrecioPellet), Some("alto"));
        assert_eq!(facts.number(Predicate::PrecioPelletNum), Some(70.0));
    }

    #[test]
    fn numeric_prices_are_banded() {
        let facts = normalize(json!({
            "lot": {"category": "Chips"},
            "market": {"precioChips": 45, "precioPellets": "120"}
        }));
        assert_eq!(facts.atom(Predicate::PrecioChips), Some("medio"));
        assert_eq!(facts.number(Predicate::PrecioChipsNum), Some(45.0));
        assert_eq!(facts.atom(Predicate::PrecioPellet), Some("alto"));
        assert_eq!(facts.number(Predicate::PrecioPelletNum), Some(120.0));

        let facts = normalize(json!({
            "lot": {"category": "Chips"},
            "market": {"precioChips": 40}
        }));
        assert_eq!(facts.atom(Predicate::PrecioChips), Some("medio"));
    }

    #[test]
    fn machine_facts_come_from_availability_only() {
        let machines = MachineAvailability::new()
            .with(MachineType::Chipeadora)
            .with(MachineType::Caldera);
        let facts = Normalizer::default()
            .normalize(
                &request(json!({
                    "lot": {"category": "Chips"},
                    "market": {"estadoCaldera": true},
                    "machines": {"available_types": ["finger_joint"]}
                })),
                Some(&machines),
            )
            .unwrap();

        assert_eq!(facts.atom(Predicate::MaqChipeadora), Some("si"));
        assert_eq!(facts.atom(Predicate::MaqFinger), Some("no"));
        assert_eq!(facts.atom(Predicate::MaqPelletizadora), Some("no"));
        assert_eq!(facts.atom(Predicate::Caldera), Some("encendida"));
    }

    #[test]
    fn boiler_needs_availability_to_be_running() {
        let facts = normalize(json!({
            "lot": {"category": "Chips"},
            "market": {"estadoCaldera": true}
        }));
        assert_eq!(facts.atom(Predicate::Caldera), Some("apagada"));

        let facts = normalize(json!({
            "lot": {"category": "Chips"},
            "market": {"estadoCaldera": false},
            "machines": {"available_types": ["caldera"]}
        }));
        assert_eq!(facts.atom(Predicate::Caldera), Some("apagada"));
    }

    #[test]
    fn engine_config_controls_constant_facts() {
        let normalizer = Normalizer::new(EngineConfig {
            profit_margin: 12.5,
            assume_compost_market: false,
            assume_gardening_demand: false,
        });
        let facts = normalizer
            .normalize(&request(json!({"lot": {"category": "Corteza"}})), None)
            .unwrap();
        assert_eq!(facts.number(Predicate::MargenGanancia), Some(12.5));
        assert_eq!(facts.get(Predicate::MercadoCompost), None);
        assert_eq!(facts.get(Predicate::DemandaJardineria), None);
    }

    #[test]
    fn strict_validation_rejects_numeric_garbage() {
        let ok = request(json!({
            "lot": {"category": "Chips", "volume": "12", "dimensions": {"length": "", "width": ""}}
        }));
        assert!(validate_strict(&ok).is_ok());

        let bad = request(json!({"lot": {"category": "Chips", "volume": "doce"}}));
        assert_eq!(
            validate_strict(&bad),
            Err(InputError::NotANumber {
                field: "lot.volume",
                value: "\"doce\"".into()
            })
        );
    }

    #[test]
    fn strict_validation_checks_prices() {
        let ok = request(json!({
            "lot": {"category": "Chips"},
            "market": {"precioPellets": "Medio", "precioChips": "42,5"}
        }));
        assert!(validate_strict(&ok).is_ok());

        let blank = request(json!({
            "lot": {"category": "Chips"},
            "market": {"precioPellets": "", "precioChips": 55}
        }));
        assert!(validate_strict(&blank).is_ok());

        let bad = request(json!({
            "lot": {"category": "Chips"},
            "market": {"precioPellets": "alto", "precioChips": "caro"}
        }));
        assert_eq!(
            validate_strict(&bad),
            Err(InputError::NotANumber {
                field: "market.precioChips",
                value: "\"caro\"".into()
            })
        );
    }
}
