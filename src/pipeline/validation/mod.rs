pub mod clinical;
pub mod coherence;
pub mod dates;
pub mod icd10;
pub mod ranges;

pub use clinical::*;
pub use coherence::*;
pub use dates::*;
pub use icd10::*;
pub use ranges::*;

use chrono::NaiveDate;

use crate::config::ConsolidationConfig;
use crate::models::{Alert, ConsolidatedRecord, StructuredRecord};

/// Thresholds and field lists for validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationPolicy {
    /// `None` resolves to the local date when validation runs.
    pub reference_date: Option<NaiveDate>,
    pub horizon_years: u32,
    pub low_confidence_threshold: f32,
    pub required_fields: Vec<String>,
    pub administrative_fields: Vec<String>,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self::from_config(&ConsolidationConfig::default())
    }
}

impl ValidationPolicy {
    pub fn from_config(config: &ConsolidationConfig) -> Self {
        Self {
            reference_date: config.reference_date,
            horizon_years: config.date_horizon_years,
            low_confidence_threshold: config.low_confidence_threshold,
            required_fields: config.required_clinical_fields.clone(),
            administrative_fields: config.administrative_fields.clone(),
        }
    }

    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

/// Checks that hold for any single record, merged or not.
fn field_checks(record: &StructuredRecord, policy: &ValidationPolicy) -> Vec<Alert> {
    let mut alerts = validate_icd10_codes(&record.diagnoses);
    alerts.extend(validate_dates(record, policy.today(), policy.horizon_years));
    if let Some(vitals) = &record.vital_signs {
        alerts.extend(critical_vital_signs(vitals));
    }
    alerts.extend(range_inconsistencies(&record.exams));
    alerts.extend(low_confidence_diagnoses(
        &record.diagnoses,
        policy.low_confidence_threshold,
    ));
    alerts
}

/// Per-document checks run at ingestion: code format, dates, critical
/// values, reference-range agreement. No cross-field or completeness checks.
pub fn validate_document(record: &StructuredRecord, policy: &ValidationPolicy) -> Vec<Alert> {
    field_checks(record, policy)
}

/// Full candidate alert set for a merged record. Output still has to pass
/// the alert filter.
pub fn validate(consolidated: &ConsolidatedRecord, policy: &ValidationPolicy) -> Vec<Alert> {
    let record = &consolidated.record;
    let mut alerts = field_checks(record, policy);
    alerts.extend(unsupported_diagnoses(record));
    alerts.extend(missing_principal_diagnosis(record));
    alerts.extend(fitness_coherence(record));
    alerts.extend(missing_required_fields(
        record,
        &policy.required_fields,
        &policy.administrative_fields,
    ));
    tracing::debug!(
        consolidation_id = %consolidated.consolidation_id,
        candidates = alerts.len(),
        "Validation complete"
    );
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AlertType, Diagnosis, DiagnosisCategory, DuplicatesRemoved, Lenient, SourceDocumentType, WorkFitness,
        WorkFitnessOutcome,
    };

    fn policy() -> ValidationPolicy {
        ValidationPolicy::default().with_reference_date(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap())
    }

    fn wrap(record: StructuredRecord) -> ConsolidatedRecord {
        let sources = vec!["a.pdf".to_string()];
        ConsolidatedRecord {
            record,
            consolidation_id: ConsolidatedRecord::derive_id(&sources),
            source_documents: sources,
            document_count: 1,
            duplicates_removed: DuplicatesRemoved::default(),
        }
    }

    #[test]
    fn defaults_follow_config() {
        let p = ValidationPolicy::default();
        assert_eq!(p.horizon_years, 5);
        assert_eq!(p.low_confidence_threshold, 0.7);
        assert_eq!(p.required_fields, vec!["workFitness", "examDate"]);
    }

    #[test]
    fn document_validation_skips_completeness() {
        let record = StructuredRecord {
            source_document_type: Some(SourceDocumentType::SpecificExam),
            ..StructuredRecord::default()
        };
        assert!(validate_document(&record, &policy()).is_empty());
    }

    #[test]
    fn consolidated_validation_reports_missing_required() {
        let alerts = validate(&wrap(StructuredRecord::default()), &policy());
        let missing: Vec<&str> = alerts
            .iter()
            .filter(|a| a.alert_type == AlertType::MissingData)
            .map(|a| a.field.as_str())
            .collect();
        assert_eq!(missing, vec!["workFitness", "examDate"]);
    }

    #[test]
    fn complete_coherent_record_has_no_alerts() {
        let record = StructuredRecord {
            exam_date: Some("2025-01-10".into()),
            diagnoses: vec![Diagnosis {
                icd10_code: "M54.5".into(),
                description: "Lumbalgia".into(),
                category: Some(DiagnosisCategory::Principal),
                work_related: false,
                confidence: 0.9,
            }],
            physical_exam_findings: Some("Lumbalgia leve a la flexión".into()),
            work_fitness: Some(WorkFitness {
                outcome: Some(Lenient::Known(WorkFitnessOutcome::FitWithRecommendations)),
                ..WorkFitness::default()
            }),
            ..StructuredRecord::default()
        };
        assert!(validate(&wrap(record), &policy()).is_empty());
    }

    #[test]
    fn merged_diagnoses_without_principal_flagged() {
        let record = StructuredRecord {
            exam_date: Some("2025-01-10".into()),
            diagnoses: vec![Diagnosis {
                icd10_code: "M54.5".into(),
                description: "Lumbalgia".into(),
                category: Some(DiagnosisCategory::Secondary),
                work_related: false,
                confidence: 0.9,
            }],
            physical_exam_findings: Some("Lumbalgia leve a la flexión".into()),
            work_fitness: Some(WorkFitness {
                outcome: Some(Lenient::Known(WorkFitnessOutcome::Fit)),
                ..WorkFitness::default()
            }),
            ..StructuredRecord::default()
        };
        let alerts = validate(&wrap(record), &policy());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::DiagnosticInconsistency);
        assert_eq!(alerts[0].field, "diagnoses");
    }

    #[test]
    fn low_confidence_diagnosis_is_not_missing_data() {
        let record = StructuredRecord {
            diagnoses: vec![Diagnosis {
                icd10_code: "M54.5".into(),
                description: "Lumbalgia".into(),
                category: Some(DiagnosisCategory::Principal),
                work_related: false,
                confidence: 0.5,
            }],
            ..StructuredRecord::default()
        };
        let alerts = validate_document(&record, &policy());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].field, "diagnoses[0]");
        assert_ne!(alerts[0].alert_type, AlertType::MissingData);
    }
}
