use crate::models::{Alert, AlertSeverity, AlertType, Diagnosis, VitalSigns};

pub const BP_CRISIS: (u32, u32) = (180, 110);
pub const BP_ELEVATED: (u32, u32) = (140, 90);
pub const BMI_SEVERE_THINNESS: f64 = 16.0;
pub const BMI_MORBID_OBESITY: f64 = 40.0;
pub const SPO2_CRITICAL: f64 = 90.0;

/// `valor_critico` alerts for vital signs that need clinical attention.
pub fn critical_vital_signs(vitals: &VitalSigns) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if let Some((sys, dia)) = vitals.parsed_blood_pressure() {
        let shown = format!("{sys}/{dia} mmHg");
        if sys >= BP_CRISIS.0 || dia >= BP_CRISIS.1 {
            alerts.push(
                Alert::new(
                    AlertType::CriticalValue,
                    AlertSeverity::High,
                    "vitalSigns.bloodPressure",
                    format!("Presión arterial crítica: {shown} (crisis hipertensiva)"),
                )
                .with_action("Requiere atención médica inmediata"),
            );
        } else if sys >= BP_ELEVATED.0 || dia >= BP_ELEVATED.1 {
            alerts.push(
                Alert::new(
                    AlertType::CriticalValue,
                    AlertSeverity::Medium,
                    "vitalSigns.bloodPressure",
                    format!("Presión arterial elevada: {shown}"),
                )
                .with_action("Considerar seguimiento y manejo de hipertensión"),
            );
        }
    }

    if let Some(bmi) = vitals.bmi {
        let label = if bmi < BMI_SEVERE_THINNESS {
            Some("delgadez severa")
        } else if bmi >= BMI_MORBID_OBESITY {
            Some("obesidad mórbida")
        } else {
            None
        };
        if let Some(label) = label {
            alerts.push(Alert::new(
                AlertType::CriticalValue,
                AlertSeverity::High,
                "vitalSigns.bmi",
                format!("IMC crítico: {bmi} ({label})"),
            ));
        }
    }

    if let Some(spo2) = vitals.oxygen_saturation.filter(|s| *s < SPO2_CRITICAL) {
        alerts.push(
            Alert::new(
                AlertType::CriticalValue,
                AlertSeverity::High,
                "vitalSigns.oxygenSaturation",
                format!("Saturación de oxígeno crítica: {spo2}%"),
            )
            .with_action("Requiere evaluación respiratoria urgente"),
        );
    }

    alerts
}

/// Review candidates for diagnoses extracted with low confidence.
/// The diagnosis exists, so these are `inconsistencia_diagnostica`, never
/// `dato_faltante`.
pub fn low_confidence_diagnoses(diagnoses: &[Diagnosis], threshold: f32) -> Vec<Alert> {
    diagnoses
        .iter()
        .enumerate()
        .filter(|(_, dx)| dx.confidence < threshold)
        .map(|(i, dx)| {
            Alert::new(
                AlertType::DiagnosticInconsistency,
                AlertSeverity::Medium,
                format!("diagnoses[{i}]"),
                format!(
                    "Diagnóstico con confianza baja ({:.2}): {}",
                    dx.confidence, dx.description
                ),
            )
            .with_action("Verificar manualmente el diagnóstico en el documento original")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_vitals(bp: &str) -> VitalSigns {
        VitalSigns {
            blood_pressure: Some(bp.into()),
            ..VitalSigns::default()
        }
    }

    #[test]
    fn hypertensive_crisis_is_high() {
        let alerts = critical_vital_signs(&make_vitals("185/95"));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::High);
        let alerts = critical_vital_signs(&make_vitals("150/112"));
        assert_eq!(alerts[0].severity, AlertSeverity::High);
    }

    #[test]
    fn elevated_pressure_is_medium() {
        let alerts = critical_vital_signs(&make_vitals("142/85"));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Medium);
        assert_eq!(alerts[0].alert_type, AlertType::CriticalValue);
    }

    #[test]
    fn normal_pressure_no_alert() {
        assert!(critical_vital_signs(&make_vitals("120/80")).is_empty());
    }

    #[test]
    fn bmi_and_saturation_extremes() {
        let vitals = VitalSigns {
            bmi: Some(41.2),
            oxygen_saturation: Some(86.0),
            ..VitalSigns::default()
        };
        let alerts = critical_vital_signs(&vitals);
        assert_eq!(alerts.len(), 2);
        assert!(alerts.iter().all(|a| a.severity == AlertSeverity::High));

        let thin = VitalSigns {
            bmi: Some(15.5),
            ..VitalSigns::default()
        };
        assert_eq!(critical_vital_signs(&thin).len(), 1);
    }

    #[test]
    fn low_confidence_flagged() {
        let diagnoses = vec![
            Diagnosis {
                icd10_code: "M54.5".into(),
                description: "Lumbalgia".into(),
                category: None,
                work_related: false,
                confidence: 0.55,
            },
            Diagnosis {
                icd10_code: "H90.3".into(),
                description: "Hipoacusia".into(),
                category: None,
                work_related: true,
                confidence: 0.9,
            },
        ];
        let alerts = low_confidence_diagnoses(&diagnoses, 0.7);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].field, "diagnoses[0]");
        assert_eq!(alerts[0].alert_type, AlertType::DiagnosticInconsistency);
    }
}
