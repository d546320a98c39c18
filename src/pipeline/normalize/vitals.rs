use crate::models::{Alert, StructuredRecord, VitalSigns};

/// Physiologically plausible bounds, inclusive. Values outside are
/// extraction noise (misread digits), not clinical findings.
pub const HEART_RATE: (f64, f64) = (40.0, 200.0);
pub const RESPIRATORY_RATE: (f64, f64) = (8.0, 40.0);
pub const TEMPERATURE: (f64, f64) = (35.0, 42.0);
pub const OXYGEN_SATURATION: (f64, f64) = (70.0, 100.0);
pub const WEIGHT_KG: (f64, f64) = (20.0, 300.0);
pub const HEIGHT_CM: (f64, f64) = (100.0, 250.0);
pub const BMI: (f64, f64) = (10.0, 60.0);
pub const SYSTOLIC: (u32, u32) = (60, 260);
pub const DIASTOLIC: (u32, u32) = (30, 160);

fn implausible(field: &str, shown: &str) -> Alert {
    Alert::format_incorrect(
        format!("vitalSigns.{field}"),
        format!("Valor fisiológicamente implausible descartado: {shown}"),
    )
    .with_action("Verificar el valor en el documento fuente")
}

fn clear_out_of_range(
    value: &mut Option<f64>,
    (min, max): (f64, f64),
    field: &str,
    alerts: &mut Vec<Alert>,
) {
    if let Some(v) = *value {
        if !v.is_finite() || v < min || v > max {
            alerts.push(implausible(field, &v.to_string()));
            *value = None;
        }
    }
}

fn blood_pressure_plausible(vitals: &VitalSigns) -> bool {
    match vitals.parsed_blood_pressure() {
        Some((sys, dia)) => {
            (SYSTOLIC.0..=SYSTOLIC.1).contains(&sys)
                && (DIASTOLIC.0..=DIASTOLIC.1).contains(&dia)
                && sys > dia
        }
        None => false,
    }
}

/// Clear implausible vital signs, returning one alert per cleared value.
pub fn clean_vitals(vitals: &mut VitalSigns) -> Vec<Alert> {
    let mut alerts = Vec::new();
    clear_out_of_range(&mut vitals.heart_rate, HEART_RATE, "heartRate", &mut alerts);
    clear_out_of_range(&mut vitals.respiratory_rate, RESPIRATORY_RATE, "respiratoryRate", &mut alerts);
    clear_out_of_range(&mut vitals.temperature, TEMPERATURE, "temperature", &mut alerts);
    clear_out_of_range(&mut vitals.oxygen_saturation, OXYGEN_SATURATION, "oxygenSaturation", &mut alerts);
    clear_out_of_range(&mut vitals.weight_kg, WEIGHT_KG, "weightKg", &mut alerts);
    clear_out_of_range(&mut vitals.height_cm, HEIGHT_CM, "heightCm", &mut alerts);
    clear_out_of_range(&mut vitals.bmi, BMI, "bmi", &mut alerts);

    let raw_bp = vitals.blood_pressure.as_deref().map(|bp| bp.trim().to_string());
    match raw_bp.as_deref() {
        Some("") => vitals.blood_pressure = None,
        Some(raw) if !blood_pressure_plausible(vitals) => {
            alerts.push(implausible("bloodPressure", raw));
            vitals.blood_pressure = None;
        }
        _ => {}
    }
    alerts
}

/// Record-level step: clean vitals and drop the block when nothing is left.
///
/// `emit_alerts = false` clears silently (fitness concepts do not carry
/// vital-sign alerts).
pub fn normalize_vitals(mut record: StructuredRecord, emit_alerts: bool) -> StructuredRecord {
    let Some(mut vitals) = record.vital_signs.take() else {
        return record;
    };
    let alerts = clean_vitals(&mut vitals);
    if emit_alerts {
        record.alerts.extend(alerts);
    }
    if !vitals.is_empty() {
        record.vital_signs = Some(vitals);
    }
    record
}
