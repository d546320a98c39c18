use chrono::{Datelike, NaiveDate};

use crate::models::{Alert, AlertSeverity, AlertType, StructuredRecord};
use crate::pipeline::helpers::{is_iso_date, parse_date_lenient};

/// Earliest accepted exam date: January 1st, `years` years before `today`.
pub fn horizon_start(today: NaiveDate, years: u32) -> NaiveDate {
    i32::try_from(years)
        .ok()
        .and_then(|years| today.year().checked_sub(years))
        .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
        .unwrap_or(NaiveDate::MIN)
}

/// Sanity of one exam date. At most one alert: an unparseable date is not
/// also reported as badly formatted.
pub fn check_exam_date(raw: &str, field: &str, today: NaiveDate, horizon_years: u32) -> Option<Alert> {
    let Some(date) = parse_date_lenient(raw) else {
        return Some(
            Alert::new(
                AlertType::InvalidDate,
                AlertSeverity::Medium,
                field,
                format!("Fecha no interpretable: '{}'", raw.trim()),
            )
            .with_action("Verificar la fecha en el documento fuente"),
        );
    };
    if date > today {
        return Some(Alert::new(
            AlertType::InvalidDate,
            AlertSeverity::Medium,
            field,
            format!("Fecha futura: {date} (posterior a {today})"),
        ));
    }
    let earliest = horizon_start(today, horizon_years);
    if date < earliest {
        return Some(Alert::new(
            AlertType::InvalidDate,
            AlertSeverity::Medium,
            field,
            format!("Fecha fuera del rango esperado: {date} (mínima {earliest})"),
        ));
    }
    if !is_iso_date(raw.trim()) {
        return Some(Alert::new(
            AlertType::FormatIncorrect,
            AlertSeverity::Low,
            field,
            format!("Fecha '{}' no está en formato ISO (AAAA-MM-DD)", raw.trim()),
        ));
    }
    None
}

/// Check the record's exam date and every dated exam.
pub fn validate_dates(record: &StructuredRecord, today: NaiveDate, horizon_years: u32) -> Vec<Alert> {
    let mut alerts = Vec::new();
    if let Some(raw) = record.exam_date.as_deref().filter(|d| !d.trim().is_empty()) {
        alerts.extend(check_exam_date(raw, "examDate", today, horizon_years));
    }
    for (i, exam) in record.exams.iter().enumerate() {
        if let Some(raw) = exam.date.as_deref().filter(|d| !d.trim().is_empty()) {
            alerts.extend(check_exam_date(raw, &format!("exams[{i}].date"), today, horizon_years));
        }
    }
    alerts.extend(check_sick_leave_dates(record));
    alerts
}

/// A sick leave must end on or after the day it starts. Leaves are history,
/// so the exam-date horizon does not apply.
pub fn check_sick_leave_dates(record: &StructuredRecord) -> Vec<Alert> {
    record
        .sick_leaves
        .iter()
        .enumerate()
        .filter_map(|(i, leave)| {
            let start = parse_date_lenient(leave.start_date.as_deref()?)?;
            let end = parse_date_lenient(leave.end_date.as_deref()?)?;
            (end < start).then(|| {
                Alert::new(
                    AlertType::InvalidDate,
                    AlertSeverity::Medium,
                    format!("sickLeaves[{i}].endDate"),
                    format!("Incapacidad termina ({end}) antes de iniciar ({start})"),
                )
                .with_action("Verificar las fechas de la incapacidad en el documento fuente")
            })
        })
        .collect()
}
