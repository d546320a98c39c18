//! Per-document field normalizer.
//!
//! `normalize` is pure and total: every step takes a record by value and
//! returns the cleaned record, recording anything it had to coerce as an
//! alert. Running it twice yields the same record as running it once.

pub mod fitness;
pub mod leaves;
pub mod programs;
pub mod relocation;
pub mod vitals;

pub use fitness::*;
pub use leaves::*;
pub use programs::*;
pub use relocation::*;
pub use vitals::*;

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Alert, AlertType, SourceDocumentType, StructuredRecord};
use crate::pipeline::filters::policy::is_vital_signs_field;
use crate::pipeline::helpers::{is_iso_date, parse_date_lenient};

/// "H903" → "H90.3"
static RE_UNDOTTED_ICD10: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]\d{2})(\d)$").unwrap());

/// Run every normalization step in order.
pub fn normalize(record: StructuredRecord) -> StructuredRecord {
    let is_cmo = record.source_document_type == Some(SourceDocumentType::MedicalFitnessConcept);

    let record = normalize_fitness(record);
    let record = relocate_misclassified(record);
    let record = normalize_programs(record);
    let record = normalize_vitals(record, !is_cmo);
    let record = normalize_diagnoses(record);
    let record = normalize_dates(record);
    let record = normalize_leaves_and_referrals(record);
    let mut record = clamp_confidences(record);

    // fitness concepts do not report vitals, so their absence is no finding
    if is_cmo {
        record
            .alerts
            .retain(|a| !(a.alert_type == AlertType::MissingData && is_vital_signs_field(&a.field)));
    }
    record
}

/// Canonical ICD-10 spelling: no whitespace, upper case, dotted subcategory.
pub fn canonical_icd10(raw: &str) -> String {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    let compact = compact.trim_end_matches('.');
    RE_UNDOTTED_ICD10.replace(compact, "$1.$2").into_owned()
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Canonicalize codes, clamp confidences, and drop diagnoses without a
/// description (flagged, since a bare code cannot be reviewed).
pub fn normalize_diagnoses(mut record: StructuredRecord) -> StructuredRecord {
    let mut kept = Vec::with_capacity(record.diagnoses.len());
    for mut dx in std::mem::take(&mut record.diagnoses) {
        dx.icd10_code = canonical_icd10(&dx.icd10_code);
        dx.description = dx.description.trim().to_string();
        dx.confidence = clamp_unit(dx.confidence);
        if dx.description.is_empty() {
            record.alerts.push(Alert::format_incorrect(
                "diagnoses",
                format!("Diagnóstico '{}' sin descripción descartado", dx.icd10_code),
            ));
            continue;
        }
        kept.push(dx);
    }
    record.diagnoses = kept;
    record
}

fn canonical_date(raw: Option<String>) -> Option<String> {
    let raw = raw?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if is_iso_date(trimmed) {
        return Some(trimmed.to_string());
    }
    // unparseable dates are kept verbatim and flagged by validation
    Some(match parse_date_lenient(trimmed) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => trimmed.to_string(),
    })
}

pub fn normalize_dates(mut record: StructuredRecord) -> StructuredRecord {
    record.exam_date = canonical_date(record.exam_date.take());
    for exam in &mut record.exams {
        exam.date = canonical_date(exam.date.take());
    }
    record
}

fn clamp_confidences(mut record: StructuredRecord) -> StructuredRecord {
    record.extraction_confidence = clamp_unit(record.extraction_confidence);
    for exam in &mut record.exams {
        exam.confidence = clamp_unit(exam.confidence);
    }
    record
}
