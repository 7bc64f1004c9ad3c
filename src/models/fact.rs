use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Canonical symbol form of a free-text value.
///
/// Lower-cases, strips Spanish diacritics and collapses whitespace, hyphens
/// and dots into single underscores, so "Curvatura Leve", "curvatura_leve"
/// and "  CURVATURA   leve " all become `curvatura_leve`.
pub fn canonical_symbol(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;

    for ch in raw.trim().chars() {
        if ch.is_whitespace() || ch == '_' || ch == '-' || ch == '.' {
            pending_sep = !out.is_empty();
            continue;
        }
        if pending_sep {
            out.push('_');
            pending_sep = false;
        }
        for lower in ch.to_lowercase() {
            out.push(fold_accent(lower));
        }
    }

    out
}

fn fold_accent(ch: char) -> char {
    match ch {
        'á' | 'à' | 'ä' | 'â' | 'ã' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

/// The closed vocabulary of fact predicates the rule base reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    // Lot
    Tipo,
    Categoria,
    Especie,
    Volumen,
    Humedad,
    Contaminacion,
    Corteza,
    Falla,
    Largo,
    Ancho,

    // Market
    DemandaSustrato,
    MercadoCompost,
    DemandaCompost,
    EspacioCompost,
    DemandaJardineria,
    DemandaPellets,
    PrecioPellet,
    PrecioPelletNum,
    VolatilidadPellet,
    CapacidadAlmacenamiento,
    PrecioChips,
    PrecioChipsNum,
    VolatilidadChips,
    DemandaBiomasa,
    Caldera,
    StockBiomasa,
    PrecioFinger,
    CostoFlete,
    MargenGanancia,

    // Machinery
    MaqChipeadora,
    MaqFinger,
    MaqReprocesadora,
    MaqPelletizadora,
    MaqDescortezadora,
}

impl Predicate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Predicate::Tipo => "tipo",
            Predicate::Categoria => "categoria",
            Predicate::Especie => "especie",
            Predicate::Volumen => "volumen",
            Predicate::Humedad => "humedad",
            Predicate::Contaminacion => "contaminacion",
            Predicate::Corteza => "corteza",
            Predicate::Falla => "falla",
            Predicate::Largo => "largo",
            Predicate::Ancho => "ancho",
            Predicate::DemandaSustrato => "demanda_sustrato",
            Predicate::MercadoCompost => "mercado_compost",
            Predicate::DemandaCompost => "demanda_compost",
            Predicate::EspacioCompost => "espacio_compost",
            Predicate::DemandaJardineria => "demanda_jardineria",
            Predicate::DemandaPellets => "demanda_pellets",
            Predicate::PrecioPellet => "precio_pellet",
            Predicate::PrecioPelletNum => "precio_pellet_num",
            Predicate::VolatilidadPellet => "volatilidad_pellet",
            Predicate::CapacidadAlmacenamiento => "capacidad_almacenamiento",
            Predicate::PrecioChips => "precio_chips",
            Predicate::PrecioChipsNum => "precio_chips_num",
            Predicate::VolatilidadChips => "volatilidad_chips",
            Predicate::DemandaBiomasa => "demanda_biomasa",
            Predicate::Caldera => "caldera",
            Predicate::StockBiomasa => "stock_biomasa",
            Predicate::PrecioFinger => "precio_finger",
            Predicate::CostoFlete => "costo_flete",
            Predicate::MargenGanancia => "margen_ganancia",
            Predicate::MaqChipeadora => "maq_chipeadora",
            Predicate::MaqFinger => "maq_finger",
            Predicate::MaqReprocesadora => "maq_reprocesadora",
            Predicate::MaqPelletizadora => "maq_pelletizadora",
            Predicate::MaqDescortezadora => "maq_descortezadora",
        }
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A fact value: either a canonical atom or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    Number(f64),
    Atom(String),
}

impl FactValue {
    /// Builds an atom, normalizing the text to its canonical symbol form.
    pub fn atom(raw: &str) -> Self {
        FactValue::Atom(canonical_symbol(raw))
    }

    pub fn as_atom(&self) -> Option<&str> {
        match self {
            FactValue::Atom(s) => Some(s),
            FactValue::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FactValue::Number(n) => Some(*n),
            FactValue::Atom(_) => None,
        }
    }
}

impl std::fmt::Display for FactValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FactValue::Number(n) => write!(f, "{}", n),
            FactValue::Atom(s) => write!(f, "{}", s),
        }
    }
}

/// Single-valued predicate → value map built for one evaluation.
///
/// Asserting a predicate twice overwrites the earlier binding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactSnapshot {
    facts: BTreeMap<Predicate, FactValue>,
}

impl FactSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assert(&mut self, predicate: Predicate, value: FactValue) {
        self.facts.insert(predicate, value);
    }

    pub fn assert_atom(&mut self, predicate: Predicate, raw: &str) {
        self.assert(predicate, FactValue::atom(raw));
    }

    pub fn assert_number(&mut self, predicate: Predicate, value: f64) {
        self.assert(predicate, FactValue::Number(value));
    }

    pub fn get(&self, predicate: Predicate) -> Option<&FactValue> {
        self.facts.get(&predicate)
    }

    pub fn atom(&self, predicate: Predicate) -> Option<&str> {
        self.get(predicate).and_then(FactValue::as_atom)
    }

    pub fn number(&self, predicate: Predicate) -> Option<f64> {
        self.get(predicate).and_then(FactValue::as_number)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Predicate, &FactValue)> {
        self.facts.iter()
    }
}
