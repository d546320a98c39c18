//! Immutable filtering policies.
//!
//! Policies are plain values built once (from defaults or from a
//! [`ConsolidationConfig`]) and passed into the filter functions, so tests
//! can substitute their own without touching global state.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::{ConfigError, ConsolidationConfig};
use crate::models::{Alert, AlertType, SourceDocumentType};
use crate::pipeline::helpers::fold_accents;

// ═══════════════════════════════════════════
// Alert policy
// ═══════════════════════════════════════════

/// Alert types eligible on every document type that carries clinical content.
pub const WHITELIST: &[AlertType] = &[
    AlertType::CriticalValue,
    AlertType::FormatIncorrect,
    AlertType::DiagnosticInconsistency,
    AlertType::InvalidDate,
];

/// Keywords identifying an alert about vital signs (fitness concepts never
/// report vital signs, so their absence is not a finding).
pub const VITAL_SIGN_KEYWORDS: &[&str] = &[
    "signos_vitales",
    "signos vitales",
    "vitalsigns",
    "vital_signs",
    "presion",
    "frecuencia",
    "temperatura",
    "saturacion",
    "peso",
    "talla",
    "imc",
];

/// Top-level field names of the vital-signs block.
const VITAL_SIGN_FIELDS: &[&str] = &["vitalsigns", "signos_vitales", "vital_signs"];

static VITAL_SIGN_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    let words: Vec<String> = VITAL_SIGN_KEYWORDS.iter().map(|k| regex::escape(k)).collect();
    Regex::new(&format!(r"\b(?:{})\b", words.join("|"))).unwrap()
});

static DEFAULT_ADMINISTRATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:eps|arl|afiliacion|empresa|company|area|department|cargo|jobtitle|antiguedad|edad|age|sexo|fecha_nacimiento)\b",
    )
    .unwrap()
});

/// What one document type may carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentAlertRule {
    /// Alert types kept as-is.
    pub eligible: Vec<AlertType>,
    /// Whether `dato_faltante` alerts are eligible at all.
    pub missing_data: bool,
}

impl DocumentAlertRule {
    pub fn allows(&self, alert_type: AlertType) -> bool {
        self.eligible.contains(&alert_type)
    }
}

/// Alert eligibility keyed by source document type.
///
/// Adding a document type is a table entry in [`AlertPolicy::default`].
#[derive(Debug, Clone)]
pub struct AlertPolicy {
    rules: HashMap<SourceDocumentType, DocumentAlertRule>,
    administrative: Option<Regex>,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        let whitelist = WHITELIST.to_vec();
        let rules = HashMap::from([
            (
                SourceDocumentType::SpecificExam,
                DocumentAlertRule {
                    eligible: vec![AlertType::CriticalValue, AlertType::FormatIncorrect],
                    missing_data: false,
                },
            ),
            (
                SourceDocumentType::MedicalFitnessConcept,
                DocumentAlertRule {
                    eligible: whitelist.clone(),
                    missing_data: false,
                },
            ),
            (
                SourceDocumentType::FullClinicalRecord,
                DocumentAlertRule {
                    eligible: whitelist.clone(),
                    missing_data: false,
                },
            ),
            (
                SourceDocumentType::Consolidated,
                DocumentAlertRule {
                    eligible: whitelist,
                    missing_data: true,
                },
            ),
        ]);
        Self {
            rules,
            administrative: Some(DEFAULT_ADMINISTRATIVE.clone()),
        }
    }
}

impl AlertPolicy {
    /// Default rule table with the administrative field list from config.
    pub fn from_config(config: &ConsolidationConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            administrative: administrative_regex(&config.administrative_fields)?,
            ..Self::default()
        })
    }

    /// Replace the rule for one document type.
    pub fn with_rule(mut self, doc_type: SourceDocumentType, rule: DocumentAlertRule) -> Self {
        self.rules.insert(doc_type, rule);
        self
    }

    pub fn rule(&self, doc_type: SourceDocumentType) -> Option<&DocumentAlertRule> {
        self.rules.get(&doc_type)
    }

    /// Word-boundary match of an administrative field name in the alert's
    /// affected field or message.
    pub fn is_administrative(&self, alert: &Alert) -> bool {
        let haystack = fold_accents(&format!("{} {}", alert.field, alert.message)).to_lowercase();
        self.administrative
            .as_ref()
            .is_some_and(|re| re.is_match(&haystack))
    }
}

fn administrative_regex(fields: &[String]) -> Result<Option<Regex>, ConfigError> {
    let names: Vec<String> = fields
        .iter()
        .map(|f| regex::escape(&fold_accents(f.trim()).to_lowercase()))
        .filter(|f| !f.is_empty())
        .collect();
    if names.is_empty() {
        return Ok(None);
    }
    Regex::new(&format!(r"\b(?:{})\b", names.join("|")))
        .map(Some)
        .map_err(|e| ConfigError::Invalid {
            field: "administrative_fields".into(),
            reason: e.to_string(),
        })
}

/// Word-boundary match of a vital-sign keyword in the alert's affected
/// field or message ("sobrepeso" does not mention "peso").
pub fn mentions_vital_signs(alert: &Alert) -> bool {
    let haystack = fold_accents(&format!("{} {}", alert.field, alert.message)).to_lowercase();
    VITAL_SIGN_WORDS.is_match(&haystack)
}

/// Whether an affected field path lies inside the vital-signs block
/// ("vitalSigns", "signos_vitales.peso_kg").
pub fn is_vital_signs_field(field: &str) -> bool {
    let head = field
        .split(|c: char| c == '.' || c == '[')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();
    VITAL_SIGN_FIELDS.contains(&head.as_str())
}

// ═══════════════════════════════════════════
// Recommendation policy
// ═══════════════════════════════════════════

/// Exam names that, standing alone, are not a recommendation.
pub const EXAM_NAME_TERMS: &[&str] = &[
    "espirometria",
    "audiometria",
    "optometria",
    "visiometria",
    "laboratorio",
    "laboratorios",
    "radiografia",
    "ecografia",
    "electrocardiograma",
    "ecg",
    "ekg",
    "rayos x",
    "rx",
    "tomografia",
    "resonancia",
    "parcial de orina",
    "hemograma",
    "glicemia",
    "colesterol",
    "trigliceridos",
    "cuadro hematico",
    "coprologico",
    "vdrl",
    "vih",
    "hepatitis",
    "control periodico",
    "control ocupacional",
    "control anual",
];

/// Boilerplate phrases, matched as substrings of the folded text.
pub const GENERIC_KEYWORDS: &[&str] = &[
    "capacitacion",
    "educacion en",
    "habitos saludables",
    "estilo de vida saludable",
    "pausas activas",
    "adherir lineamientos",
    "control segun pve",
    "lineamientos del ministerio",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationPolicy {
    pub exam_name_terms: Vec<String>,
    pub generic_keywords: Vec<String>,
}

fn folded_list(items: impl IntoIterator<Item = impl AsRef<str>>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| fold_accents(s.as_ref().trim()).to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Default for RecommendationPolicy {
    fn default() -> Self {
        Self {
            exam_name_terms: folded_list(EXAM_NAME_TERMS),
            generic_keywords: folded_list(GENERIC_KEYWORDS),
        }
    }
}

impl RecommendationPolicy {
    pub fn from_config(config: &ConsolidationConfig) -> Self {
        let defaults = Self::default();
        Self {
            exam_name_terms: config
                .exam_name_terms
                .as_ref()
                .map(folded_list)
                .unwrap_or(defaults.exam_name_terms),
            generic_keywords: config
                .generic_keywords
                .as_ref()
                .map(folded_list)
                .unwrap_or(defaults.generic_keywords),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AlertSeverity;

    #[test]
    fn default_table_covers_every_document_type() {
        let policy = AlertPolicy::default();
        for doc_type in SourceDocumentType::all() {
            assert!(policy.rule(*doc_type).is_some(), "{doc_type}");
        }
        assert!(policy.rule(SourceDocumentType::Consolidated).unwrap().missing_data);
        assert!(!policy.rule(SourceDocumentType::FullClinicalRecord).unwrap().missing_data);
        assert!(!policy
            .rule(SourceDocumentType::SpecificExam)
            .unwrap()
            .allows(AlertType::DiagnosticInconsistency));
    }

    #[test]
    fn administrative_matching_is_word_bounded() {
        let policy = AlertPolicy::default();
        let eps = Alert::missing_data("employeeData.eps", "EPS no registrada");
        let cargo = Alert::missing_data("employeeData.jobTitle", "Cargo no registrado");
        let fitness = Alert::missing_data("workFitness", "Concepto de aptitud ausente");
        // "separado" contains "area" only as a substring
        let substring = Alert::missing_data("examDate", "Campo separado sin fecha");
        assert!(policy.is_administrative(&eps));
        assert!(policy.is_administrative(&cargo));
        assert!(!policy.is_administrative(&fitness));
        assert!(!policy.is_administrative(&substring));
    }

    #[test]
    fn administrative_list_from_config() {
        let config = ConsolidationConfig {
            administrative_fields: vec!["sede".into()],
            ..ConsolidationConfig::default()
        };
        let policy = AlertPolicy::from_config(&config).unwrap();
        assert!(policy.is_administrative(&Alert::missing_data("sede", "Sede no registrada")));
        assert!(!policy.is_administrative(&Alert::missing_data("eps", "EPS no registrada")));
    }

    #[test]
    fn empty_administrative_list_matches_nothing() {
        let config = ConsolidationConfig {
            administrative_fields: vec![],
            ..ConsolidationConfig::default()
        };
        let policy = AlertPolicy::from_config(&config).unwrap();
        assert!(!policy.is_administrative(&Alert::missing_data("eps", "EPS")));
    }

    #[test]
    fn vital_sign_detection() {
        let alert = Alert::new(
            AlertType::MissingData,
            AlertSeverity::Medium,
            "signos_vitales",
            "No se registraron signos vitales",
        );
        assert!(mentions_vital_signs(&alert));
        let bp = Alert::missing_data("vitalSigns.bloodPressure", "Sin dato");
        assert!(mentions_vital_signs(&bp));
        let dx = Alert::missing_data("diagnoses", "Sin diagnósticos");
        assert!(!mentions_vital_signs(&dx));
    }

    #[test]
    fn vital_sign_keywords_are_word_bounded() {
        let overweight = Alert::format_incorrect(
            "workFitness.outcome",
            "Concepto de aptitud no reconocido: 'Apto con sobrepeso'",
        );
        let detailed = Alert::format_incorrect(
            "workFitness.outcome",
            "Concepto de aptitud no reconocido: 'requiere valoración detallada'",
        );
        assert!(!mentions_vital_signs(&overweight));
        assert!(!mentions_vital_signs(&detailed));
        let weight = Alert::missing_data("peso", "Peso no registrado");
        assert!(mentions_vital_signs(&weight));
    }

    #[test]
    fn vital_sign_field_paths() {
        assert!(is_vital_signs_field("vitalSigns"));
        assert!(is_vital_signs_field("vitalSigns.bmi"));
        assert!(is_vital_signs_field("signos_vitales.peso_kg"));
        assert!(!is_vital_signs_field("workFitness.outcome"));
        assert!(!is_vital_signs_field("diagnoses[0]"));
    }

    #[test]
    fn recommendation_catalog_override() {
        let config = ConsolidationConfig {
            generic_keywords: Some(vec!["Señalización".into()]),
            ..ConsolidationConfig::default()
        };
        let policy = RecommendationPolicy::from_config(&config);
        assert_eq!(policy.generic_keywords, vec!["senalizacion"]);
        assert_eq!(policy.exam_name_terms, RecommendationPolicy::default().exam_name_terms);
    }
}
