use super::fact::FactSnapshot;
use serde::{Deserialize, Serialize};

/// Conclusion category. Partial conclusions feed the second evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConclusionKind {
    Optimal,
    Priority,
    Partial,
}

impl ConclusionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConclusionKind::Optimal => "optimal",
            ConclusionKind::Priority => "priority",
            ConclusionKind::Partial => "partial",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConclusionKind::Optimal => "Recomendación Óptima",
            ConclusionKind::Priority => "Acción Prioritaria",
            ConclusionKind::Partial => "Viabilidad Parcial",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ConclusionKind::Optimal => "✓",
            ConclusionKind::Priority => "!",
            ConclusionKind::Partial => "~",
        }
    }
}

impl std::fmt::Display for ConclusionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Every conclusion symbol the rule base can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    // Bark
    ProducirSustrato,
    ProducirCompostaje,
    CompostajeOSustratoAcidofilo,
    AlmacenarTemporalmente,
    SustratoJardineria,

    // Sawdust
    AptoPelletizacion,
    VenderAserrin,
    DescartarAserrin,
    ForzarVentaInmediata,
    AlmacenarPellet,

    // Chips
    ProducirChips,
    DescartarChips,
    AsegurarVentaContrato,
    ChipPulpable,
    ChipNoPulpable,
    SuministroCaldera,
    NoSuministrarCaldera,
    SuministrarChipCaldera,
    VenderChipPulpable,
    VenderChips,

    // Scraps
    AptoFingerJoint,
    AptoVentaTableros,
    FingerJointOMoldura,
    ProducirFingerJoint,

    // Defective wood
    AptoSoloChips,
    AptoSegundaCalidad,
    SuministrarCaldera,
    DescartarMaterial,
    RectificarReprocesar,

    // Logistics
    VenderEnPlantaDescartar,
}

impl Conclusion {
    #[cfg(test)]
    pub const ALL: [Conclusion; 30] = [
        Conclusion::ProducirSustrato,
        Conclusion::ProducirCompostaje,
        Conclusion::CompostajeOSustratoAcidofilo,
        Conclusion::AlmacenarTemporalmente,
        Conclusion::SustratoJardineria,
        Conclusion::AptoPelletizacion,
        Conclusion::VenderAserrin,
        Conclusion::DescartarAserrin,
        Conclusion::ForzarVentaInmediata,
        Conclusion::AlmacenarPellet,
        Conclusion::ProducirChips,
        Conclusion::DescartarChips,
        Conclusion::AsegurarVentaContrato,
        Conclusion::ChipPulpable,
        Conclusion::ChipNoPulpable,
        Conclusion::SuministroCaldera,
        Conclusion::NoSuministrarCaldera,
        Conclusion::SuministrarChipCaldera,
        Conclusion::VenderChipPulpable,
        Conclusion::VenderChips,
        Conclusion::AptoFingerJoint,
        Conclusion::AptoVentaTableros,
        Conclusion::FingerJointOMoldura,
        Conclusion::ProducirFingerJoint,
        Conclusion::AptoSoloChips,
        Conclusion::AptoSegundaCalidad,
        Conclusion::SuministrarCaldera,
        Conclusion::DescartarMaterial,
        Conclusion::RectificarReprocesar,
        Conclusion::VenderEnPlantaDescartar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Conclusion::ProducirSustrato => "producir_sustrato",
            Conclusion::ProducirCompostaje => "producir_compostaje",
            Conclusion::CompostajeOSustratoAcidofilo => "compostaje_o_sustrato_acidofilo",
            Conclusion::AlmacenarTemporalmente => "almacenar_temporalmente",
            Conclusion::SustratoJardineria => "sustrato_jardineria",
            Conclusion::AptoPelletizacion => "apto_pelletizacion",
            Conclusion::VenderAserrin => "vender_aserrin",
            Conclusion::DescartarAserrin => "descartar_aserrin",
            Conclusion::ForzarVentaInmediata => "forzar_venta_inmediata",
            Conclusion::AlmacenarPellet => "almacenar_pellet",
            Conclusion::ProducirChips => "producir_chips",
            Conclusion::DescartarChips => "descartar_chips",
            Conclusion::AsegurarVentaContrato => "asegurar_venta_contrato",
            Conclusion::ChipPulpable => "chip_pulpable",
            Conclusion::ChipNoPulpable => "chip_no_pulpable",
            Conclusion::SuministroCaldera => "suministro_caldera",
            Conclusion::NoSuministrarCaldera => "no_suministrar_caldera",
            Conclusion::SuministrarChipCaldera => "suministrar_chip_caldera",
            Conclusion::VenderChipPulpable => "vender_chip_pulpable",
            Conclusion::VenderChips => "vender_chips",
            Conclusion::AptoFingerJoint => "apto_finger_joint",
            Conclusion::AptoVentaTableros => "apto_venta_tableros",
            Conclusion::FingerJointOMoldura => "finger_joint_o_moldura",
            Conclusion::ProducirFingerJoint => "producir_finger_joint",
            Conclusion::AptoSoloChips => "apto_solo_chips",
            Conclusion::AptoSegundaCalidad => "apto_segunda_calidad",
            Conclusion::SuministrarCaldera => "suministrar_caldera",
            Conclusion::DescartarMaterial => "descartar_material",
            Conclusion::RectificarReprocesar => "rectificar_reprocesar",
            Conclusion::VenderEnPlantaDescartar => "vender_en_planta_descartar",
        }
    }

    /// Human label shown next to the symbol.
    pub fn label(&self) -> &'static str {
        match self {
            Conclusion::ProducirSustrato => "Producir sustrato para viveros",
            Conclusion::ProducirCompostaje => "Producir compostaje",
            Conclusion::CompostajeOSustratoAcidofilo => "Compostaje o sustrato acidófilo",
            Conclusion::AlmacenarTemporalmente => "Almacenar temporalmente",
            Conclusion::SustratoJardineria => "Sustrato para jardinería",
            Conclusion::AptoPelletizacion => "Apto para pelletización",
            Conclusion::VenderAserrin => "Vender aserrín",
            Conclusion::DescartarAserrin => "Descartar aserrín",
            Conclusion::ForzarVentaInmediata => "Forzar venta inmediata de pellets",
            Conclusion::AlmacenarPellet => "Almacenar pellets",
            Conclusion::ProducirChips => "Producir chips",
            Conclusion::DescartarChips => "Descartar chips",
            Conclusion::AsegurarVentaContrato => "Asegurar venta por contrato",
            Conclusion::ChipPulpable => "Chip pulpable",
            Conclusion::ChipNoPulpable => "Chip no pulpable",
            Conclusion::SuministroCaldera => "Suministro a caldera",
            Conclusion::NoSuministrarCaldera => "No suministrar a caldera",
            Conclusion::SuministrarChipCaldera => "Suministrar chip a caldera",
            Conclusion::VenderChipPulpable => "Vender chip pulpable",
            Conclusion::VenderChips => "Vender chips",
            Conclusion::AptoFingerJoint => "Apto para finger-joint",
            Conclusion::AptoVentaTableros => "Apto para venta a tableros",
            Conclusion::FingerJointOMoldura => "Finger-joint o moldura",
            Conclusion::ProducirFingerJoint => "Producir finger-joint",
            Conclusion::AptoSoloChips => "Apto solo para chips",
            Conclusion::AptoSegundaCalidad => "Apto para segunda calidad",
            Conclusion::SuministrarCaldera => "Suministrar a caldera",
            Conclusion::DescartarMaterial => "Descartar material",
            Conclusion::RectificarReprocesar => "Rectificar y reprocesar",
            Conclusion::VenderEnPlantaDescartar => "Vender en planta o descartar",
        }
    }
}

impl std::fmt::Display for Conclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One fired conclusion as returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: ConclusionKind,
    pub value: Conclusion,
    pub desc: String,
}

impl Recommendation {
    pub fn new(kind: ConclusionKind, value: Conclusion) -> Self {
        Self {
            kind,
            value,
            desc: value.label().to_string(),
        }
    }
}

/// The two response shapes a caller can receive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisResponse {
    Success {
        success: bool,
        recommendations: Vec<Recommendation>,
        facts: FactSnapshot,
    },
    Failure {
        success: bool,
        error: String,
    },
}

impl AnalysisResponse {
    pub fn success(recommendations: Vec<Recommendation>, facts: FactSnapshot) -> Self {
        AnalysisResponse::Success {
            success: true,
            recommendations,
            facts,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        AnalysisResponse::Failure {
            success: false,
            error: error.into(),
        }
    }

    /// True only for a well-formed success.
    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisResponse::Success { success: true, .. })
    }

    /// Shape check for responses read back from a worker.
    pub fn is_well_formed(&self) -> bool {
        match self {
            AnalysisResponse::Success { success, .. } => *success,
            AnalysisResponse::Failure { success, .. } => !*success,
        }
    }

    pub fn recommendations(&self) -> &[Recommendation] {
        match self {
            AnalysisResponse::Success {
                recommendations, ..
            } => recommendations,
            AnalysisResponse::Failure { .. } => &[],
        }
    }

    #[cfg(test)]
    pub fn error(&self) -> Option<&str> {
        match self {
            AnalysisResponse::Failure { error, .. } => Some(error),
            AnalysisResponse::Success { .. } => None,
        }
    }

    #[cfg(test)]
    pub fn contains(&self, kind: ConclusionKind, value: Conclusion) -> bool {
        self.recommendations()
            .iter()
            .any(|r| r.kind == kind && r.value == value)
    }

    /// Headline conclusion: first optimal, then first priority, then first partial.
    pub fn headline(&self) -> Option<&Recommendation> {
        let recs = self.recommendations();
        [
            ConclusionKind::Optimal,
            ConclusionKind::Priority,
            ConclusionKind::Partial,
        ]
        .iter()
        .find_map(|kind| recs.iter().find(|r| r.kind == *kind))
    }
}
