//! Cross-field checks that only make sense on a merged record: whether
//! each diagnosis is corroborated, whether the fitness outcome agrees with
//! its restrictions, and whether required clinical fields are present.

use crate::models::{
    Alert, AlertSeverity, AlertType, Diagnosis, DiagnosisCategory, ExamKind, Interpretation, StructuredRecord,
    WorkFitnessOutcome,
};
use crate::pipeline::filters::field_is_populated;
use crate::pipeline::helpers::{fold_accents, normalize_text, significant_words};

// ═══════════════════════════════════════════
// Diagnosis support
// ═══════════════════════════════════════════

/// What corroborates a family of ICD-10 codes.
struct SupportRule {
    prefixes: &'static [&'static str],
    exam_kinds: &'static [ExamKind],
    keywords: &'static [&'static str],
    measurement: Option<fn(&StructuredRecord) -> bool>,
}

fn elevated_blood_pressure(record: &StructuredRecord) -> bool {
    record
        .vital_signs
        .as_ref()
        .and_then(|v| v.parsed_blood_pressure())
        .is_some_and(|(sys, dia)| sys >= 140 || dia >= 90)
}

fn obese_bmi(record: &StructuredRecord) -> bool {
    record
        .vital_signs
        .as_ref()
        .and_then(|v| v.bmi)
        .is_some_and(|bmi| bmi >= 30.0)
}

const SUPPORT_RULES: &[SupportRule] = &[
    SupportRule {
        prefixes: &["H83", "H90", "H91", "H93"],
        exam_kinds: &[ExamKind::Audiometry],
        keywords: &["audiometr", "hipoacusia", "trauma acustico", "perdida auditiva"],
        measurement: None,
    },
    SupportRule {
        prefixes: &["H52", "H53", "H54"],
        exam_kinds: &[ExamKind::Optometry],
        keywords: &["optometr", "visiometr", "agudeza visual", "miopia", "astigmatismo", "hipermetropia", "presbicia"],
        measurement: None,
    },
    SupportRule {
        prefixes: &["J"],
        exam_kinds: &[ExamKind::Spirometry, ExamKind::Imaging],
        keywords: &["espirometr", "patron restrictivo", "patron obstructivo", "radiografia de torax", "disnea", "sibilancias"],
        measurement: None,
    },
    SupportRule {
        prefixes: &["I10", "I11", "I12", "I13", "I15"],
        exam_kinds: &[ExamKind::Electrocardiogram],
        keywords: &["hipertension", "presion arterial elevada", "antihipertensivo"],
        measurement: Some(elevated_blood_pressure),
    },
    SupportRule {
        prefixes: &["E66"],
        exam_kinds: &[],
        keywords: &["obesidad", "sobrepeso"],
        measurement: Some(obese_bmi),
    },
    SupportRule {
        prefixes: &["E78"],
        exam_kinds: &[ExamKind::Laboratory],
        keywords: &["colesterol", "triglicerid", "dislipidemia", "hdl", "ldl"],
        measurement: None,
    },
    SupportRule {
        prefixes: &["E10", "E11", "E14", "R73"],
        exam_kinds: &[ExamKind::Laboratory],
        keywords: &["glicemia", "glucosa", "diabetes", "hba1c", "hemoglobina glicosilada"],
        measurement: None,
    },
    SupportRule {
        prefixes: &[
            "D50", "D51", "D52", "D53", "D55", "D56", "D57", "D58", "D59", "D60", "D61", "D62",
            "D63", "D64",
        ],
        exam_kinds: &[ExamKind::Laboratory],
        keywords: &["hemoglobina", "hemograma", "hematocrito", "anemia", "ferritina"],
        measurement: None,
    },
];

/// Folded text of everything that can corroborate a diagnosis: exams,
/// physical findings, antecedents.
fn evidence_text(record: &StructuredRecord) -> String {
    let mut parts: Vec<String> = record.exams.iter().map(|e| e.searchable_text()).collect();
    parts.extend(record.physical_exam_findings.clone());
    parts.extend(record.antecedents.iter().map(|a| a.description.clone()));
    normalize_text(&parts.join(" \n "))
}

fn rule_supports(rule: &SupportRule, record: &StructuredRecord, evidence: &str) -> bool {
    let exam_of_kind = record.exams.iter().any(|e| {
        rule.exam_kinds.contains(&e.kind) && e.interpretation != Some(Interpretation::Normal)
    });
    exam_of_kind
        || rule.keywords.iter().any(|k| evidence.contains(k))
        || rule.measurement.is_some_and(|check| check(record))
}

/// A diagnosis is supported when a rule for its code family finds
/// corroborating exams, text or measurements, or when a content word of its
/// description appears in the evidence.
pub fn is_supported(dx: &Diagnosis, record: &StructuredRecord, evidence: &str) -> bool {
    let code = dx.icd10_code.as_str();
    let by_rule = SUPPORT_RULES
        .iter()
        .filter(|rule| rule.prefixes.iter().any(|p| code.starts_with(p)))
        .any(|rule| rule_supports(rule, record, evidence));
    if by_rule {
        return true;
    }
    let padded = format!(" {} ", evidence.replace(|c: char| !c.is_alphanumeric(), " "));
    significant_words(&dx.description)
        .iter()
        .any(|w| padded.contains(&format!(" {w} ")))
}

pub fn unsupported_diagnoses(record: &StructuredRecord) -> Vec<Alert> {
    let evidence = evidence_text(record);
    record
        .diagnoses
        .iter()
        .enumerate()
        .filter(|(_, dx)| !is_supported(dx, record, &evidence))
        .map(|(i, dx)| {
            Alert::inconsistency(
                format!("diagnoses[{i}]"),
                format!(
                    "Diagnóstico {} ({}) sin examen ni hallazgo que lo respalde",
                    dx.icd10_code, dx.description
                ),
            )
            .with_action("Verificar soporte clínico del diagnóstico")
        })
        .collect()
}

/// At least one merged diagnosis must be the principal one.
pub fn missing_principal_diagnosis(record: &StructuredRecord) -> Option<Alert> {
    if record.diagnoses.is_empty()
        || record
            .diagnoses
            .iter()
            .any(|dx| dx.category == Some(DiagnosisCategory::Principal))
    {
        return None;
    }
    Some(
        Alert::inconsistency("diagnoses", "No se identificó ningún diagnóstico principal")
            .with_action("Verificar cuál diagnóstico debe ser el principal"),
    )
}

// ═══════════════════════════════════════════
// Fitness / restriction coherence
// ═══════════════════════════════════════════

/// Restriction entries that actually restrict; deferral notes are excluded.
pub fn substantive_restrictions(record: &StructuredRecord) -> Vec<&str> {
    record
        .restrictions_text()
        .map(|text| {
            text.split("; ")
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .filter(|r| !fold_accents(r).to_lowercase().starts_with("aplazad"))
                .collect()
        })
        .unwrap_or_default()
}

pub fn fitness_coherence(record: &StructuredRecord) -> Vec<Alert> {
    let restrictions = substantive_restrictions(record);
    let mut alerts = Vec::new();

    match record.fitness_outcome() {
        Some(WorkFitnessOutcome::FitWithRestrictions) if restrictions.is_empty() => {
            alerts.push(Alert::inconsistency(
                "workFitness.restrictions",
                "Concepto 'apto con restricciones' sin restricciones especificadas",
            ));
        }
        Some(WorkFitnessOutcome::Fit) if !restrictions.is_empty() => {
            alerts.push(Alert::inconsistency(
                "workFitness",
                format!(
                    "Concepto 'apto' con restricciones registradas: {}",
                    restrictions.join("; ")
                ),
            ));
        }
        _ => {}
    }

    if !restrictions.is_empty() && record.diagnoses.is_empty() {
        alerts.push(
            Alert::inconsistency(
                "workFitness.restrictions",
                "Se especifican restricciones pero no hay diagnósticos que las justifiquen",
            )
            .with_action("Verificar diagnósticos asociados a las restricciones"),
        );
    }
    alerts
}

// ═══════════════════════════════════════════
// Completeness
// ═══════════════════════════════════════════

/// `dato_faltante` for each required clinical field the merged record lacks.
/// Administrative fields are skipped by name even if listed as required.
pub fn missing_required_fields(
    record: &StructuredRecord,
    required: &[String],
    administrative: &[String],
) -> Vec<Alert> {
    required
        .iter()
        .filter(|field| !administrative.iter().any(|a| a.eq_ignore_ascii_case(field)))
        .filter(|field| !field_is_populated(record, field))
        .map(|field| {
            Alert::new(
                AlertType::MissingData,
                AlertSeverity::High,
                field.as_str(),
                format!("Campo '{field}' ausente en todos los documentos fuente"),
            )
        })
        .collect()
}
