use serde::{Deserialize, Serialize};

use super::alert::Alert;
use super::enums::{
    AntecedentCategory, DiagnosisCategory, EmoType, ExamKind, Interpretation, Priority,
    RecommendationCategory, SickLeaveKind, SourceDocumentType, SurveillanceProgram,
    WorkFitnessOutcome,
};

/// A value that is either one of a closed vocabulary or the raw literal
/// the extractor produced. Only the normalizer resolves the raw form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Lenient<T> {
    Known(T),
    Unrecognized(String),
}

impl<T: Copy> Lenient<T> {
    pub fn known(&self) -> Option<T> {
        match self {
            Self::Known(v) => Some(*v),
            Self::Unrecognized(_) => None,
        }
    }
}

fn default_confidence() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}

// ═══════════════════════════════════════════
// Employee
// ═══════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NationalId {
    #[serde(rename = "type", alias = "tipo", default)]
    pub id_type: Option<String>,
    #[serde(alias = "numero", default)]
    pub number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmployeeData {
    #[serde(alias = "nombre_completo", skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(alias = "documento", skip_serializing_if = "Option::is_none")]
    pub national_id: Option<NationalId>,
    #[serde(alias = "edad", skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(alias = "cargo", skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(alias = "empresa", skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(alias = "area", skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

impl EmployeeData {
    pub fn national_id_number(&self) -> Option<&str> {
        self.national_id
            .as_ref()
            .and_then(|id| id.number.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}

// ═══════════════════════════════════════════
// Clinical content
// ═══════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    #[serde(alias = "codigo_cie10", alias = "code", default)]
    pub icd10_code: String,
    #[serde(alias = "descripcion", default)]
    pub description: String,
    #[serde(alias = "tipo", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<DiagnosisCategory>,
    #[serde(alias = "relacionado_trabajo", default)]
    pub work_related: bool,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    #[serde(rename = "type", alias = "tipo")]
    pub kind: ExamKind,
    #[serde(alias = "nombre", default)]
    pub name: String,
    #[serde(alias = "fecha", default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(alias = "resultado", default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(alias = "valor_numerico", default, skip_serializing_if = "Option::is_none")]
    pub numeric_value: Option<f64>,
    #[serde(alias = "unidad", default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(alias = "rango_referencia", default, skip_serializing_if = "Option::is_none")]
    pub reference_range: Option<String>,
    #[serde(alias = "hallazgos_clave", default, skip_serializing_if = "Option::is_none")]
    pub key_findings: Option<String>,
    #[serde(alias = "interpretacion", default, skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<Interpretation>,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

impl Exam {
    /// Result, findings and name concatenated for keyword matching.
    pub fn searchable_text(&self) -> String {
        [
            Some(self.name.as_str()),
            self.result.as_deref(),
            self.key_findings.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Antecedent {
    #[serde(alias = "tipo")]
    pub category: AntecedentCategory,
    #[serde(alias = "descripcion", default)]
    pub description: String,
    #[serde(alias = "fecha_aproximada", default, skip_serializing_if = "Option::is_none")]
    pub approximate_date: Option<String>,
    #[serde(alias = "activo", default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VitalSigns {
    #[serde(alias = "imc", skip_serializing_if = "Option::is_none")]
    pub bmi: Option<f64>,
    #[serde(alias = "peso_kg", skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    #[serde(alias = "talla_cm", skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,
    #[serde(alias = "presion_arterial", skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<String>,
    #[serde(alias = "frecuencia_cardiaca", skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<f64>,
    #[serde(alias = "frecuencia_respiratoria", skip_serializing_if = "Option::is_none")]
    pub respiratory_rate: Option<f64>,
    #[serde(alias = "temperatura", skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(alias = "saturacion_oxigeno", skip_serializing_if = "Option::is_none")]
    pub oxygen_saturation: Option<f64>,
}

impl VitalSigns {
    pub fn is_empty(&self) -> bool {
        self.bmi.is_none()
            && self.weight_kg.is_none()
            && self.height_cm.is_none()
            && self.blood_pressure.as_deref().map_or(true, |bp| bp.trim().is_empty())
            && self.heart_rate.is_none()
            && self.respiratory_rate.is_none()
            && self.temperature.is_none()
            && self.oxygen_saturation.is_none()
    }

    /// Parse "120/80" (spaces and a trailing unit tolerated) into systolic/diastolic.
    pub fn parsed_blood_pressure(&self) -> Option<(u32, u32)> {
        let raw = self.blood_pressure.as_deref()?;
        let (sys, dia) = raw.split_once('/')?;
        let sys = sys.trim().parse().ok()?;
        let dia: String = dia.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
        Some((sys, dia.parse().ok()?))
    }
}

// ═══════════════════════════════════════════
// Fitness and recommendations
// ═══════════════════════════════════════════

/// Work-fitness concept. Accepts either a bare outcome literal or a
/// detail object on input; always serializes as the object form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "WorkFitnessRepr", rename_all = "camelCase")]
pub struct WorkFitness {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Lenient<WorkFitnessOutcome>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<String>,
}

impl WorkFitness {
    pub fn known_outcome(&self) -> Option<WorkFitnessOutcome> {
        self.outcome.as_ref().and_then(Lenient::known)
    }

    /// Restrictions text, `None` when absent or blank.
    pub fn restrictions_text(&self) -> Option<&str> {
        self.restrictions
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }

    /// Append a restriction, separated by "; " from any existing text.
    /// Appending text that is already present is a no-op.
    pub fn push_restriction(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        match self.restrictions_text() {
            Some(existing) if existing.split("; ").any(|r| r == text) => {}
            Some(existing) => self.restrictions = Some(format!("{existing}; {text}")),
            None => self.restrictions = Some(text.to_string()),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WorkFitnessRepr {
    Bare(Lenient<WorkFitnessOutcome>),
    Detail {
        #[serde(alias = "resultado", alias = "concepto", default)]
        outcome: Option<Lenient<WorkFitnessOutcome>>,
        #[serde(alias = "recomendaciones", default)]
        recommendations: Option<String>,
        #[serde(alias = "restricciones", default)]
        restrictions: Option<String>,
    },
}

impl From<WorkFitnessRepr> for WorkFitness {
    fn from(repr: WorkFitnessRepr) -> Self {
        match repr {
            WorkFitnessRepr::Bare(outcome) => Self {
                outcome: Some(outcome),
                ..Self::default()
            },
            WorkFitnessRepr::Detail {
                outcome,
                recommendations,
                restrictions,
            } => Self {
                outcome,
                recommendations,
                restrictions,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(alias = "tipo", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<RecommendationCategory>,
    #[serde(alias = "descripcion", default)]
    pub description: String,
    #[serde(alias = "especialidad", default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(alias = "prioridad", default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl Recommendation {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            category: None,
            description: description.into(),
            specialty: None,
            priority: None,
        }
    }
}

// ═══════════════════════════════════════════
// Sick leaves and referrals
// ═══════════════════════════════════════════

/// A certified sick leave. Dates are text as extracted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SickLeave {
    #[serde(alias = "fecha_inicio", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(alias = "fecha_fin", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// Inclusive day count; derived from the dates when absent.
    #[serde(alias = "dias_totales", skip_serializing_if = "Option::is_none")]
    pub total_days: Option<u32>,
    #[serde(alias = "tipo", skip_serializing_if = "Option::is_none")]
    pub kind: Option<Lenient<SickLeaveKind>>,
    #[serde(alias = "prorroga")]
    pub extension: bool,
    /// ICD-10 code of the diagnosis that caused the leave.
    #[serde(alias = "diagnostico_asociado", skip_serializing_if = "Option::is_none")]
    pub related_diagnosis: Option<String>,
}

impl SickLeave {
    /// Kind as written on the wire, known or not.
    pub fn kind_literal(&self) -> &str {
        match &self.kind {
            Some(Lenient::Known(kind)) => kind.as_str(),
            Some(Lenient::Unrecognized(raw)) => raw.trim(),
            None => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Referral {
    #[serde(alias = "especialidad", default)]
    pub specialty: String,
    #[serde(alias = "motivo", default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(alias = "requiere_seguimiento", default = "default_true")]
    pub follow_up_required: bool,
    #[serde(alias = "fecha_planeada", default, skip_serializing_if = "Option::is_none")]
    pub planned_date: Option<String>,
    #[serde(alias = "observaciones", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Referral {
    pub fn new(specialty: impl Into<String>, reason: Option<&str>) -> Self {
        Self {
            specialty: specialty.into(),
            reason: reason.map(String::from),
            follow_up_required: true,
            planned_date: None,
            notes: None,
        }
    }
}

// ═══════════════════════════════════════════
// Record
// ═══════════════════════════════════════════

/// One structured extraction: per source document, or per person after merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StructuredRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    #[serde(alias = "tipo_documento_fuente", skip_serializing_if = "Option::is_none")]
    pub source_document_type: Option<SourceDocumentType>,
    #[serde(alias = "datos_empleado")]
    pub employee_data: EmployeeData,
    #[serde(alias = "tipo_emo", skip_serializing_if = "Option::is_none")]
    pub exam_type: Option<EmoType>,
    #[serde(alias = "fecha_emo", skip_serializing_if = "Option::is_none")]
    pub exam_date: Option<String>,
    #[serde(alias = "diagnosticos")]
    pub diagnoses: Vec<Diagnosis>,
    #[serde(alias = "examenes")]
    pub exams: Vec<Exam>,
    #[serde(alias = "antecedentes")]
    pub antecedents: Vec<Antecedent>,
    #[serde(alias = "signos_vitales", skip_serializing_if = "Option::is_none")]
    pub vital_signs: Option<VitalSigns>,
    #[serde(alias = "hallazgos_examen_fisico", skip_serializing_if = "Option::is_none")]
    pub physical_exam_findings: Option<String>,
    #[serde(alias = "aptitud_laboral", skip_serializing_if = "Option::is_none")]
    pub work_fitness: Option<WorkFitness>,
    #[serde(alias = "recomendaciones")]
    pub recommendations: Vec<Recommendation>,
    #[serde(alias = "incapacidades")]
    pub sick_leaves: Vec<SickLeave>,
    #[serde(alias = "remisiones")]
    pub referrals: Vec<Referral>,
    #[serde(alias = "programas_sve")]
    pub surveillance_programs: Vec<Lenient<SurveillanceProgram>>,
    #[serde(alias = "alertas_validacion")]
    pub alerts: Vec<Alert>,
    #[serde(alias = "confianza_extraccion")]
    pub extraction_confidence: f32,
}

impl StructuredRecord {
    pub fn fitness_outcome(&self) -> Option<WorkFitnessOutcome> {
        self.work_fitness.as_ref().and_then(WorkFitness::known_outcome)
    }

    pub fn restrictions_text(&self) -> Option<&str> {
        self.work_fitness.as_ref().and_then(WorkFitness::restrictions_text)
    }

    /// Programs that resolved to the closed vocabulary.
    pub fn known_programs(&self) -> Vec<SurveillanceProgram> {
        self.surveillance_programs
            .iter()
            .filter_map(Lenient::known)
            .collect()
    }

    /// Identifier used in `sourceDocuments`; falls back to a positional
    /// name when the extraction carries no file name.
    pub fn source_id(&self, index: usize) -> String {
        match self.source_file.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("documento-{}", index + 1),
        }
    }

    pub fn work_fitness_mut(&mut self) -> &mut WorkFitness {
        self.work_fitness.get_or_insert_with(WorkFitness::default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn work_fitness_accepts_bare_literal() {
        let record: StructuredRecord = serde_json::from_value(json!({
            "sourceDocumentType": "cmo",
            "workFitness": "apto_con_restricciones"
        }))
        .unwrap();
        assert_eq!(
            record.fitness_outcome(),
            Some(WorkFitnessOutcome::FitWithRestrictions)
        );
    }

    #[test]
    fn work_fitness_accepts_detail_object() {
        let record: StructuredRecord = serde_json::from_value(json!({
            "workFitness": {
                "outcome": "fit_with_restrictions",
                "restrictions": "Evitar exposición a ruido sin protección"
            }
        }))
        .unwrap();
        let fitness = record.work_fitness.unwrap();
        assert_eq!(
            fitness.known_outcome(),
            Some(WorkFitnessOutcome::FitWithRestrictions)
        );
        assert_eq!(
            fitness.restrictions_text(),
            Some("Evitar exposición a ruido sin protección")
        );
    }

    #[test]
    fn unknown_fitness_literal_survives_parsing() {
        let record: StructuredRecord = serde_json::from_value(json!({
            "workFitness": "aplazado para completar estudios"
        }))
        .unwrap();
        let fitness = record.work_fitness.unwrap();
        assert_eq!(fitness.known_outcome(), None);
        assert_eq!(
            fitness.outcome,
            Some(Lenient::Unrecognized(
                "aplazado para completar estudios".to_string()
            ))
        );
    }

    #[test]
    fn unknown_program_survives_parsing() {
        let record: StructuredRecord = serde_json::from_value(json!({
            "surveillancePrograms": ["ruido", "osteomuscular"]
        }))
        .unwrap();
        assert_eq!(record.known_programs(), vec![SurveillanceProgram::Noise]);
        assert_eq!(record.surveillance_programs.len(), 2);
    }

    #[test]
    fn serializes_camel_case_and_canonical_literals() {
        let record = StructuredRecord {
            source_document_type: Some(SourceDocumentType::SpecificExam),
            exam_date: Some("2024-03-01".into()),
            work_fitness: Some(WorkFitness {
                outcome: Some(Lenient::Known(WorkFitnessOutcome::Fit)),
                ..WorkFitness::default()
            }),
            ..StructuredRecord::default()
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["sourceDocumentType"], "examen_especifico");
        assert_eq!(value["examDate"], "2024-03-01");
        assert_eq!(value["workFitness"]["outcome"], "apto");
    }

    #[test]
    fn push_restriction_appends_once() {
        let mut fitness = WorkFitness::default();
        fitness.push_restriction("Evitar alturas");
        fitness.push_restriction("No levantar más de 10 kg");
        fitness.push_restriction("Evitar alturas");
        assert_eq!(
            fitness.restrictions.as_deref(),
            Some("Evitar alturas; No levantar más de 10 kg")
        );
    }

    #[test]
    fn blood_pressure_parsing() {
        let vitals = VitalSigns {
            blood_pressure: Some("130 / 85 mmHg".into()),
            ..VitalSigns::default()
        };
        assert_eq!(vitals.parsed_blood_pressure(), Some((130, 85)));

        let garbled = VitalSigns {
            blood_pressure: Some("normal".into()),
            ..VitalSigns::default()
        };
        assert_eq!(garbled.parsed_blood_pressure(), None);
    }

    #[test]
    fn sick_leaves_and_referrals_accept_extraction_names() {
        let record: StructuredRecord = serde_json::from_value(json!({
            "incapacidades": [{
                "fecha_inicio": "2025-02-01",
                "fecha_fin": "2025-02-10",
                "tipo": "enfermedad_laboral",
                "prorroga": true,
                "diagnostico_asociado": "M54.5"
            }],
            "remisiones": [{ "especialidad": "Otorrinolaringología", "motivo": "Hipoacusia" }]
        }))
        .unwrap();
        let leave = &record.sick_leaves[0];
        assert_eq!(leave.kind, Some(Lenient::Known(SickLeaveKind::OccupationalDisease)));
        assert!(leave.extension);
        assert_eq!(leave.total_days, None);
        assert_eq!(leave.kind_literal(), "enfermedad_laboral");
        let referral = &record.referrals[0];
        assert_eq!(referral.reason.as_deref(), Some("Hipoacusia"));
        assert!(referral.follow_up_required);
    }

    #[test]
    fn source_id_falls_back_to_position() {
        let mut record = StructuredRecord::default();
        assert_eq!(record.source_id(0), "documento-1");
        record.source_file = Some("audiometria.pdf".into());
        assert_eq!(record.source_id(3), "audiometria.pdf");
    }
}
