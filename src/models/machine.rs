use super::fact::canonical_symbol;
use chrono::{DateTime, Utc};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Canonical machine capability classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineType {
    Chipeadora,
    Reprocesadora,
    FingerJoint,
    Caldera,
    Pelletizadora,
    Descortezadora,
}

impl MachineType {
    #[cfg(test)]
    pub const ALL: [MachineType; 6] = [
        MachineType::Chipeadora,
        MachineType::Reprocesadora,
        MachineType::FingerJoint,
        MachineType::Caldera,
        MachineType::Pelletizadora,
        MachineType::Descortezadora,
    ];

    /// Stable code used in requests and in the catalog.
    pub fn code(&self) -> &'static str {
        match self {
            MachineType::Chipeadora => "chipeadora",
            MachineType::Reprocesadora => "reprocesadora",
            MachineType::FingerJoint => "finger_joint",
            MachineType::Caldera => "caldera",
            MachineType::Pelletizadora => "pelletizadora",
            MachineType::Descortezadora => "descortezadora",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MachineType::Chipeadora => "Chipeadora",
            MachineType::Reprocesadora => "Reprocesadora",
            MachineType::FingerJoint => "Finger-Joint",
            MachineType::Caldera => "Caldera",
            MachineType::Pelletizadora => "Peletizadora",
            MachineType::Descortezadora => "Descortezadora",
        }
    }

    /// Parses a stable code. Case and accents are ignored.
    pub fn from_code(code: &str) -> Option<Self> {
        match canonical_symbol(code).as_str() {
            "chipeadora" => Some(MachineType::Chipeadora),
            "reprocesadora" => Some(MachineType::Reprocesadora),
            "finger_joint" | "fingerjoint" | "finger" => Some(MachineType::FingerJoint),
            "caldera" => Some(MachineType::Caldera),
            "pelletizadora" | "peletizadora" => Some(MachineType::Pelletizadora),
            "descortezadora" => Some(MachineType::Descortezadora),
            _ => None,
        }
    }

    /// Best-effort classification of a display name into the vocabulary.
    ///
    /// Only used for catalog records that carry no stable code. Machine nouns
    /// are tried before product nouns, so "Caldera de chips" is a boiler.
    pub fn classify_name(name: &str) -> Option<Self> {
        let name = canonical_symbol(name);
        name_classes()
            .iter()
            .find(|(re, _)| re.is_match(&name))
            .map(|(_, machine_type)| *machine_type)
    }
}

fn name_classes() -> &'static [(Regex, MachineType)] {
    static CLASSES: OnceLock<Vec<(Regex, MachineType)>> = OnceLock::new();
    CLASSES.get_or_init(|| {
        [
            (r"descortez", MachineType::Descortezadora),
            (r"caldera|boiler|horno", MachineType::Caldera),
            (r"reproces|cepill|moldur|rectific", MachineType::Reprocesadora),
            (r"finger", MachineType::FingerJoint),
            (r"pel+eti?z|pellet", MachineType::Pelletizadora),
            (r"chip|astill", MachineType::Chipeadora),
        ]
        .into_iter()
        .filter_map(|(pattern, machine_type)| {
            Regex::new(pattern).ok().map(|re| (re, machine_type))
        })
        .collect()
    })
}

impl std::fmt::Display for MachineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Set of machine types currently available on the plant floor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MachineAvailability {
    types: BTreeSet<MachineType>,
}

impl MachineAvailability {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the set from raw codes, dropping anything outside the vocabulary.
    pub fn from_codes<S: AsRef<str>>(codes: &[S]) -> Self {
        let types = codes
            .iter()
            .filter_map(|code| {
                let code = code.as_ref();
                MachineType::from_code(code).or_else(|| {
                    tracing::warn!(code = %code, "Unknown machine type code, ignoring");
                    None
                })
            })
            .collect();
        Self { types }
    }

    #[cfg(test)]
    pub fn with(mut self, machine_type: MachineType) -> Self {
        self.types.insert(machine_type);
        self
    }

    pub fn contains(&self, machine_type: MachineType) -> bool {
        self.types.contains(&machine_type)
    }

    pub fn codes(&self) -> Vec<&'static str> {
        self.types.iter().map(MachineType::code).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl FromIterator<MachineType> for MachineAvailability {
    fn from_iter<I: IntoIterator<Item = MachineType>>(iter: I) -> Self {
        Self {
            types: iter.into_iter().collect(),
        }
    }
}

/// A machine type record in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineTypeRecord {
    pub id: Option<i64>,
    pub code: Option<String>,
    pub name: String,
    pub description: String,
}

impl MachineTypeRecord {
    /// Resolves the capability class: stable code first, display name second.
    pub fn resolve(&self) -> Option<MachineType> {
        self.code
            .as_deref()
            .and_then(MachineType::from_code)
            .or_else(|| MachineType::classify_name(&self.name))
    }
}

/// An individual machine on the plant floor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    pub id: Option<i64>,
    pub name: String,
    pub machine_type: MachineTypeRecord,
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

impl Machine {
    pub fn new(name: impl Into<String>, machine_type: MachineTypeRecord) -> Self {
        Self {
            id: None,
            name: name.into(),
            machine_type,
            available: true,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_code_accepts_canonical_vocabulary() {
        for machine_type in MachineType::ALL {
            assert_eq!(MachineType::from_code(machine_type.code()), Some(machine_type));
        }
        assert_eq!(MachineType::from_code("Finger Joint"), Some(MachineType::FingerJoint));
        assert_eq!(MachineType::from_code("Peletizadora"), Some(MachineType::Pelletizadora));
        assert_eq!(MachineType::from_code("torno"), None);
    }

    #[test]
    fn classify_name_uses_keywords() {
        assert_eq!(
            MachineType::classify_name("Chipeadora Vermeer BC1000"),
            Some(MachineType::Chipeadora)
        );
        assert_eq!(
            MachineType::classify_name("Línea Finger-Joint #2"),
            Some(MachineType::FingerJoint)
        );
        assert_eq!(
            MachineType::classify_name("Peletizadora de anillo"),
            Some(MachineType::Pelletizadora)
        );
        assert_eq!(
            MachineType::classify_name("Caldera de biomasa"),
            Some(MachineType::Caldera)
        );
        assert_eq!(
            MachineType::classify_name("Cepilladora moldurera"),
            Some(MachineType::Reprocesadora)
        );
        assert_eq!(MachineType::classify_name("Montacargas"), None);
    }

    #[test]
    fn machine_nouns_win_over_product_nouns() {
        assert_eq!(
            MachineType::classify_name("Caldera de chips"),
            Some(MachineType::Caldera)
        );
        assert_eq!(
            MachineType::classify_name("Horno para pellets"),
            Some(MachineType::Caldera)
        );
        assert_eq!(
            MachineType::classify_name("Cepilladora de astillas"),
            Some(MachineType::Reprocesadora)
        );
        assert_eq!(
            MachineType::classify_name("Astilladora móvil"),
            Some(MachineType::Chipeadora)
        );
    }

    #[test]
    fn type_record_prefers_code_over_name() {
        let record = MachineTypeRecord {
            id: None,
            code: Some("reprocesadora".into()),
            name: "Chipeadora vieja".into(),
            description: String::new(),
        };
        assert_eq!(record.resolve(), Some(MachineType::Reprocesadora));

        let uncoded = MachineTypeRecord {
            code: None,
            ..record
        };
        assert_eq!(uncoded.resolve(), Some(MachineType::Chipeadora));
    }

    #[test]
    fn availability_ignores_unknown_codes() {
        let set = MachineAvailability::from_codes(&["chipeadora", "laser", "CALDERA"]);
        assert!(set.contains(MachineType::Chipeadora));
        assert!(set.contains(MachineType::Caldera));
        assert!(!set.contains(MachineType::FingerJoint));
        assert_eq!(set.codes(), vec!["chipeadora", "caldera"]);
    }
}
