use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One analysis request as received from the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub lot: LotDescriptor,
    #[serde(default)]
    pub market: MarketDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machines: Option<MachinesInput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MachinesInput {
    #[serde(default)]
    pub available_types: Vec<String>,
}

/// Lot attributes. Numeric fields stay raw so the normalizer can coerce them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotDescriptor {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub species: Option<String>,
    #[serde(default)]
    pub volume: Value,
    #[serde(default)]
    pub humidity: Value,
    #[serde(default)]
    pub chemical_contamination: Value,
    #[serde(default)]
    pub has_bark: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defect_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dimensions {
    #[serde(default)]
    pub length: Value,
    #[serde(default)]
    pub width: Value,
}

/// Market conditions. Field names follow the request wire format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketDescriptor {
    #[serde(default)]
    pub demanda_pellets: Value,
    #[serde(default)]
    pub precio_pellets: Value,
    #[serde(default)]
    pub volatilidad_pellets: Value,
    #[serde(default)]
    pub precio_chips: Value,
    #[serde(default)]
    pub volatilidad_chips: Value,
    #[serde(default)]
    pub demanda_biomasa: Value,
    #[serde(default)]
    pub estado_caldera: Value,
    #[serde(default)]
    pub stock_biomasa: Value,
    #[serde(default)]
    pub costo_flete: Value,
    #[serde(default)]
    pub precio_finger: Value,
    #[serde(default)]
    pub capacidad_almacenamiento: Value,
    #[serde(default)]
    pub demanda_compost: Value,
    #[serde(default)]
    pub espacio_compost: Value,
    #[serde(default)]
    pub demanda_sustrato: Value,
}

/// Lenient numeric coercion: numbers pass through, numeric text is parsed
/// (comma decimals accepted), everything else is zero.
pub fn coerce_number(value: &Value) -> f64 {
    parse_number(value).unwrap_or(0.0)
}

/// Strict numeric parse: `None` for anything that is not a finite number
/// or numeric text.
pub fn parse_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        Value::Bool(_) | Value::Null | Value::Array(_) | Value::Object(_) => None,
    };
    parsed.filter(|n| n.is_finite())
}

/// Null or whitespace-only text.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Truthiness of a flag field. Accepts booleans, 0/1 and common yes/no text.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => matches!(
            super::fact::canonical_symbol(s).as_str(),
            "true" | "si" | "yes" | "1" | "alta" | "alto" | "on"
        ),
        Value::Null | Value::Array(_) | Value::Object(_) => false,
    }
}

impl AnalysisRequest {
    /// The raw category label, if one was supplied and is not blank.
    pub fn category(&self) -> Option<&str> {
        self.lot
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Numeric fields as (wire name, value) pairs, for strict validation.
    pub fn numeric_fields(&self) -> Vec<(&'static str, &Value)> {
        let mut fields = vec![
            ("lot.volume", &self.lot.volume),
            ("lot.humidity", &self.lot.humidity),
            ("market.costoFlete", &self.market.costo_flete),
            ("market.precioFinger", &self.market.precio_finger),
            (
                "market.capacidadAlmacenamiento",
                &self.market.capacidad_almacenamiento,
            ),
        ];
        if let Some(dims) = &self.lot.dimensions {
            fields.push(("lot.dimensions.length", &dims.length));
            fields.push(("lot.dimensions.width", &dims.width));
        }
        fields
    }

    /// Price fields, which accept a qualitative level as well as a number.
    pub fn price_fields(&self) -> [(&'static str, &Value); 2] {
        [
            ("market.precioPellets", &self.market.precio_pellets),
            ("market.precioChips", &self.market.precio_chips),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerce_number_is_lenient() {
        assert_eq!(coerce_number(&json!(12)), 12.0);
        assert_eq!(coerce_number(&json!(8.5)), 8.5);
        assert_eq!(coerce_number(&json!("14")), 14.0);
        assert_eq!(coerce_number(&json!(" 7,5 ")), 7.5);
        assert_eq!(coerce_number(&json!("")), 0.0);
        assert_eq!(coerce_number(&json!("abc")), 0.0);
        assert_eq!(coerce_number(&Value::Null), 0.0);
        assert_eq!(coerce_number(&json!(true)), 0.0);
    }

    #[test]
    fn truthy_flags() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("Sí")));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!("no")));
        assert!(!is_truthy(&Value::Null));
    }

    #[test]
    fn deserializes_wire_payload_with_blank_dimensions() {
        let request: AnalysisRequest = serde_json::from_value(json!({
            "lot": {
                "category": "Chips",
                "species": "Pino",
                "volume": 5,
                "humidity": 20,
                "chemicalContamination": false,
                "dimensions": {"length": "", "width": ""},
                "defectType": "Curvatura Leve",
                "hasBark": true
            },
            "market": {
                "precioPellets": "Medio",
                "stockBiomasa": true,
                "costoFlete": 5
            }
        }))
        .unwrap();

        assert_eq!(request.category(), Some("Chips"));
        assert_eq!(request.lot.defect_type.as_deref(), Some("Curvatura Leve"));
        assert!(request.machines.is_none());
        assert_eq!(coerce_number(&request.market.costo_flete), 5.0);
        assert!(is_blank(&request.lot.dimensions.unwrap().length));
    }

    #[test]
    fn blank_category_is_missing() {
        let request: AnalysisRequest =
            serde_json::from_value(json!({"lot": {"category": "   "}})).unwrap();
        assert_eq!(request.category(), None);
    }
}
