use std::collections::HashSet;

use crate::models::{Alert, AlertType, SourceDocumentType, StructuredRecord};
use crate::pipeline::helpers::is_blank;

use super::policy::{mentions_vital_signs, AlertPolicy};

/// Keep only the alerts `doc_type` is allowed to carry, collapsing exact repeats.
///
/// `dato_faltante` is eligible only where the rule enables it, never for an
/// administrative field, and never about vital signs on a fitness concept.
/// A document type missing from the policy keeps nothing.
pub fn filter_alerts(
    alerts: Vec<Alert>,
    doc_type: SourceDocumentType,
    policy: &AlertPolicy,
) -> Vec<Alert> {
    let Some(rule) = policy.rule(doc_type) else {
        tracing::warn!(doc_type = %doc_type, "No alert rule for document type, dropping all alerts");
        return Vec::new();
    };

    let total = alerts.len();
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(total);
    for alert in alerts {
        let eligible = match alert.alert_type {
            AlertType::MissingData => {
                rule.missing_data
                    && !policy.is_administrative(&alert)
                    && !(doc_type == SourceDocumentType::MedicalFitnessConcept
                        && mentions_vital_signs(&alert))
            }
            other => rule.allows(other),
        };
        if !eligible {
            tracing::debug!(
                doc_type = %doc_type,
                alert_type = %alert.alert_type,
                field = %alert.field,
                "Alert filtered by policy"
            );
            continue;
        }
        let key = (alert.alert_type, alert.field.clone(), alert.message.clone());
        if seen.insert(key) {
            kept.push(alert);
        }
    }

    tracing::debug!(doc_type = %doc_type, total, kept = kept.len(), "Alert filter");
    kept
}

/// Canonical top-level field name for an alert's affected field:
/// "diagnoses[2].icd10Code" → "diagnoses", Spanish names mapped.
fn field_root(field: &str) -> String {
    let head = field
        .split(|c: char| c == '.' || c == '[')
        .next()
        .unwrap_or("")
        .trim();
    match head {
        "aptitud_laboral" | "concepto_aptitud" => "workFitness".into(),
        "fecha_emo" | "fecha_examen" => "examDate".into(),
        "tipo_emo" => "examType".into(),
        "signos_vitales" => "vitalSigns".into(),
        "diagnosticos" => "diagnoses".into(),
        "examenes" => "exams".into(),
        "antecedentes" => "antecedents".into(),
        "recomendaciones" => "recommendations".into(),
        "programas_sve" => "surveillancePrograms".into(),
        "incapacidades" => "sickLeaves".into(),
        "remisiones" => "referrals".into(),
        "datos_empleado" => "employeeData".into(),
        other => other.to_string(),
    }
}

fn employee_field_populated(record: &StructuredRecord, field: &str) -> Option<bool> {
    let sub = field.split_once('.').map(|(_, rest)| rest)?;
    let data = &record.employee_data;
    Some(match sub {
        "fullName" | "nombre_completo" => !is_blank(data.full_name.as_deref()),
        "nationalId" | "documento" => data.national_id_number().is_some(),
        "age" | "edad" => data.age.is_some(),
        "jobTitle" | "cargo" => !is_blank(data.job_title.as_deref()),
        "company" | "empresa" => !is_blank(data.company.as_deref()),
        "department" | "area" => !is_blank(data.department.as_deref()),
        _ => return None,
    })
}

fn vitals_field_populated(record: &StructuredRecord, field: &str) -> bool {
    let Some(vitals) = record.vital_signs.as_ref() else {
        return false;
    };
    let Some((_, sub)) = field.split_once('.') else {
        return !vitals.is_empty();
    };
    match sub {
        "bmi" | "imc" => vitals.bmi.is_some(),
        "weightKg" | "peso_kg" | "peso" => vitals.weight_kg.is_some(),
        "heightCm" | "talla_cm" | "talla" => vitals.height_cm.is_some(),
        "bloodPressure" | "presion_arterial" => !is_blank(vitals.blood_pressure.as_deref()),
        "heartRate" | "frecuencia_cardiaca" => vitals.heart_rate.is_some(),
        "respiratoryRate" | "frecuencia_respiratoria" => vitals.respiratory_rate.is_some(),
        "temperature" | "temperatura" => vitals.temperature.is_some(),
        "oxygenSaturation" | "saturacion_oxigeno" => vitals.oxygen_saturation.is_some(),
        _ => false,
    }
}

/// Whether the record actually holds a value for an alert's affected field.
///
/// Element-level fields ("diagnoses[0]") and unknown fields report `false`:
/// those alerts are about the element, not about an absent collection.
pub fn field_is_populated(record: &StructuredRecord, field: &str) -> bool {
    if field.contains('[') {
        return false;
    }
    match field_root(field).as_str() {
        "workFitness" => record.fitness_outcome().is_some(),
        "examDate" => !is_blank(record.exam_date.as_deref()),
        "examType" => record.exam_type.is_some(),
        "vitalSigns" => vitals_field_populated(record, field),
        "diagnoses" => !record.diagnoses.is_empty(),
        "exams" => !record.exams.is_empty(),
        "antecedents" => !record.antecedents.is_empty(),
        "recommendations" => !record.recommendations.is_empty(),
        "surveillancePrograms" => !record.surveillance_programs.is_empty(),
        "sickLeaves" => !record.sick_leaves.is_empty(),
        "referrals" => !record.referrals.is_empty(),
        "physicalExamFindings" => !is_blank(record.physical_exam_findings.as_deref()),
        "employeeData" => employee_field_populated(record, field).unwrap_or(false),
        _ => false,
    }
}

/// [`filter_alerts`] keyed on the record's own document type, then drop
/// `dato_faltante` alerts whose field the record does hold.
///
/// A record without a document type is filtered with the strictest rule
/// (specific exam).
pub fn filter_alerts_for_record(
    alerts: Vec<Alert>,
    record: &StructuredRecord,
    policy: &AlertPolicy,
) -> Vec<Alert> {
    let doc_type = record
        .source_document_type
        .unwrap_or(SourceDocumentType::SpecificExam);
    let mut kept = filter_alerts(alerts, doc_type, policy);
    kept.retain(|alert| {
        let covered =
            alert.alert_type == AlertType::MissingData && field_is_populated(record, &alert.field);
        if covered {
            tracing::debug!(field = %alert.field, "Missing-data alert covered by merged record");
        }
        !covered
    });
    kept
}
