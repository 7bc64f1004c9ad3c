use super::recommendation::{AnalysisResponse, Recommendation};
use super::AnalysisRequest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored analysis, written once after a successful evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: Option<i64>,
    pub category: String,
    pub species: Option<String>,
    pub volume: f64,
    pub input: serde_json::Value,
    pub recommendations: Vec<Recommendation>,
    pub headline: Option<String>,
    pub justification: String,
    pub created_at: DateTime<Utc>,
}

impl AnalysisRecord {
    /// Builds a record from the payload as received, the request decoded from
    /// it, and the response. Returns `None` for failures, which are never
    /// written to history.
    pub fn from_outcome(
        payload: &serde_json::Value,
        request: &AnalysisRequest,
        response: &AnalysisResponse,
    ) -> Option<Self> {
        if !response.is_success() {
            return None;
        }

        let recommendations = response.recommendations().to_vec();
        let headline = response.headline().map(|r| r.value.as_str().to_string());
        let justification = justify(&recommendations);

        Some(Self {
            id: None,
            category: request.category().unwrap_or_default().to_string(),
            species: request.lot.species.clone(),
            volume: super::lot::coerce_number(&request.lot.volume),
            input: payload.clone(),
            recommendations,
            headline,
            justification,
            created_at: Utc::now(),
        })
    }
}

fn justify(recommendations: &[Recommendation]) -> String {
    if recommendations.is_empty() {
        return "Ninguna regla aplicable al lote".to_string();
    }
    recommendations
        .iter()
        .map(|r| format!("{}: {}", r.kind.label(), r.desc))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Conclusion, ConclusionKind, FactSnapshot};

    fn payload() -> serde_json::Value {
        serde_json::json!({
            "lot": {"category": "Aserrín", "species": "Pino", "volume": "10"}
        })
    }

    fn request() -> AnalysisRequest {
        serde_json::from_value(payload()).unwrap()
    }

    #[test]
    fn failures_are_not_recorded() {
        let response = AnalysisResponse::failure("worker crashed");
        assert!(AnalysisRecord::from_outcome(&payload(), &request(), &response).is_none());
    }

    #[test]
    fn input_is_stored_as_received() {
        let payload = serde_json::json!({
            "lot": {"category": "Chips", "volume": 5, "notes": "lote norte"},
            "market": {"costoFlete": 5}
        });
        let request: AnalysisRequest = serde_json::from_value(payload.clone()).unwrap();
        let response = AnalysisResponse::success(Vec::new(), FactSnapshot::new());

        let record = AnalysisRecord::from_outcome(&payload, &request, &response).unwrap();
        assert_eq!(record.input, payload);
        assert_eq!(record.input["lot"]["notes"], "lote norte");
        assert!(record.input["lot"].get("humidity").is_none());
        assert!(record.input["market"].get("precioPellets").is_none());
        assert_eq!(record.justification, "Ninguna regla aplicable al lote");
    }

    #[test]
    fn record_captures_headline_and_justification() {
        let response = AnalysisResponse::success(
            vec![
                Recommendation::new(ConclusionKind::Partial, Conclusion::AptoPelletizacion),
                Recommendation::new(ConclusionKind::Optimal, Conclusion::AlmacenarPellet),
            ],
            FactSnapshot::new(),
        );

        let record = AnalysisRecord::from_outcome(&payload(), &request(), &response).unwrap();
        assert_eq!(record.category, "Aserrín");
        assert_eq!(record.volume, 10.0);
        assert_eq!(record.headline.as_deref(), Some("almacenar_pellet"));
        assert!(record.justification.contains("Almacenar pellets"));
        assert_eq!(record.recommendations.len(), 2);
    }
}
