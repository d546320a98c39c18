use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern.
///
/// The first literal is the canonical wire value; any extra literals after `|`
/// are accepted as aliases on input but never produced on output.
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal $(| $alias:literal)*),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $s $(, alias = $alias)*)]
                $variant
            ),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }

            pub fn all() -> &'static [$name] {
                &[$(Self::$variant),+]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s $(| $alias)* => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(
    /// Kind of source document a record was extracted from.
    /// Drives every alert-filtering decision downstream.
    SourceDocumentType {
        SpecificExam => "examen_especifico" | "specific_exam",
        MedicalFitnessConcept => "cmo" | "medical_fitness_concept",
        FullClinicalRecord => "hc_completa" | "full_clinical_record",
        Consolidated => "consolidado" | "consolidated",
    }
);

impl SourceDocumentType {
    /// Full clinical records and fitness concepts are authoritative for
    /// general fields (exam type, date, vital signs, fitness outcome).
    pub fn is_primary(&self) -> bool {
        matches!(self, Self::FullClinicalRecord | Self::MedicalFitnessConcept)
    }
}

str_enum!(
    /// Occupational medical exam (EMO) type.
    EmoType {
        PreEmployment => "preingreso" | "pre_employment",
        Periodic => "periodico" | "periodic",
        OccupationChange => "cambio_ocupacion" | "occupation_change",
        PostLeave => "post_incapacidad" | "post_leave",
        Exit => "retiro" | "exit",
        FollowUp => "seguimiento" | "follow_up",
        Other => "otro" | "other",
    }
);

str_enum!(ExamKind {
    Laboratory => "laboratorio" | "laboratory",
    Imaging => "imagenologia" | "imaging",
    Functional => "funcional" | "functional",
    Audiometry => "audiometria" | "audiometry",
    Spirometry => "espirometria" | "spirometry",
    Optometry => "optometria" | "optometry",
    Electrocardiogram => "electrocardiograma" | "electrocardiogram",
    Other => "otro" | "other",
});

str_enum!(Interpretation {
    Normal => "normal",
    Abnormal => "anormal" | "abnormal",
    Altered => "alterado" | "alterada" | "altered",
    Critical => "critico" | "critica" | "critical",
    Pending => "pendiente" | "pending",
});

impl Interpretation {
    /// True for any interpretation that reports a finding outside normal.
    pub fn is_abnormal(&self) -> bool {
        matches!(self, Self::Abnormal | Self::Altered | Self::Critical)
    }
}

str_enum!(DiagnosisCategory {
    Principal => "principal",
    Secondary => "secundario" | "secondary",
    Related => "relacionado" | "related",
    Finding => "hallazgo" | "finding",
});

str_enum!(SickLeaveKind {
    General => "general",
    Occupational => "laboral" | "occupational",
    WorkAccident => "accidente_trabajo" | "work_accident",
    OccupationalDisease => "enfermedad_laboral" | "occupational_disease",
});

str_enum!(AntecedentCategory {
    Pathological => "patologico" | "personal",
    Surgical => "quirurgico",
    Traumatic => "traumatologico",
    Occupational => "ocupacional" | "occupational",
    Toxic => "toxicologico" | "toxic",
    Allergic => "alergico" | "allergic" | "toxic_allergic",
    Pharmacological => "farmacologico",
    GynecoObstetric => "gineco_obstetrico",
    Family => "familiar" | "family",
});

str_enum!(
    /// Closed set of work-fitness outcomes.
    WorkFitnessOutcome {
        Fit => "apto" | "fit",
        FitWithRecommendations => "apto_con_recomendaciones" | "fit_with_recommendations",
        FitWithRestrictions => "apto_con_restricciones" | "fit_with_restrictions",
        TemporarilyUnfit => "no_apto_temporal" | "temporarily_unfit",
        PermanentlyUnfit => "no_apto_definitivo" | "permanently_unfit",
        Pending => "pendiente" | "pending",
    }
);

impl WorkFitnessOutcome {
    /// Total severity order used when merging outcomes across documents.
    ///
    /// `pendiente` ranks lowest: it states that no decision was made, so any
    /// real outcome from another document outranks it.
    pub fn severity_rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Fit => 1,
            Self::FitWithRecommendations => 2,
            Self::FitWithRestrictions => 3,
            Self::TemporarilyUnfit => 4,
            Self::PermanentlyUnfit => 5,
        }
    }
}

str_enum!(RecommendationCategory {
    SpecialistReferral => "remision_especialista" | "referral",
    ComplementaryExam => "examen_complementario",
    SurveillanceInclusion => "inclusion_sve",
    Treatment => "tratamiento" | "medical",
    WorkRestriction => "restriccion_laboral",
    ErgonomicAdjustment => "ajuste_ergonomico" | "occupational",
    FollowUp => "seguimiento" | "follow_up",
});

str_enum!(Priority {
    High => "alta" | "high",
    Medium => "media" | "medium",
    Low => "baja" | "low",
});

str_enum!(AlertSeverity {
    High => "alta" | "high",
    Medium => "media" | "medium",
    Low => "baja" | "low",
});

str_enum!(
    /// Occupational epidemiological surveillance (SVE) programs.
    SurveillanceProgram {
        Musculoskeletal => "dme",
        Noise => "ruido" | "noise",
        Biological => "biologico" | "biological",
        Psychosocial => "psicosocial" | "psychosocial",
        Btx => "btx",
        IonizingRadiation => "radiaciones_ionizantes" | "ionizing_radiation",
        Chemical => "quimico" | "chemical",
        Cardiovascular => "cardiovascular",
        Voice => "voz" | "voice",
        Visual => "visual",
        Respiratory => "respiratorio" | "respiratory",
    }
);

/// Validation alert category.
///
/// Written by hand rather than through `str_enum!` because upstream
/// extraction may emit types outside the closed set; those deserialize
/// into `Other` instead of failing the whole record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AlertType {
    #[serde(rename = "valor_critico", alias = "critical_value")]
    CriticalValue,
    #[serde(rename = "formato_incorrecto", alias = "format_incorrect")]
    FormatIncorrect,
    #[serde(rename = "inconsistencia_diagnostica", alias = "diagnostic_inconsistency")]
    DiagnosticInconsistency,
    #[serde(rename = "fecha_invalida", alias = "invalid_date")]
    InvalidDate,
    #[serde(rename = "dato_faltante", alias = "missing_data")]
    MissingData,
    #[serde(rename = "evaluacion_incompleta", alias = "incomplete_evaluation")]
    IncompleteEvaluation,
    #[serde(rename = "otro", other)]
    Other,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CriticalValue => "valor_critico",
            Self::FormatIncorrect => "formato_incorrecto",
            Self::DiagnosticInconsistency => "inconsistencia_diagnostica",
            Self::InvalidDate => "fecha_invalida",
            Self::MissingData => "dato_faltante",
            Self::IncompleteEvaluation => "evaluacion_incompleta",
            Self::Other => "otro",
        }
    }
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AlertType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "valor_critico" | "critical_value" => Ok(Self::CriticalValue),
            "formato_incorrecto" | "format_incorrect" => Ok(Self::FormatIncorrect),
            "inconsistencia_diagnostica" | "diagnostic_inconsistency" => {
                Ok(Self::DiagnosticInconsistency)
            }
            "fecha_invalida" | "invalid_date" => Ok(Self::InvalidDate),
            "dato_faltante" | "missing_data" => Ok(Self::MissingData),
            "evaluacion_incompleta" | "incomplete_evaluation" => Ok(Self::IncompleteEvaluation),
            "otro" => Ok(Self::Other),
            _ => Err(ModelError::InvalidEnum {
                field: "AlertType".into(),
                value: s.into(),
            }),
        }
    }
}
