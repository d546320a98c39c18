use std::str::FromStr;

use crate::models::{Alert, Lenient, StructuredRecord, WorkFitnessOutcome};
use crate::pipeline::helpers::fold_accents;

pub const FITNESS_FIELD: &str = "workFitness.outcome";

/// How a raw fitness literal resolves against the closed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FitnessResolution {
    Outcome(WorkFitnessOutcome),
    /// "aplazado ..." : no decision yet, the qualifier is a restriction.
    Deferred,
    /// Blank literal: nothing was extracted.
    Empty,
    Unknown,
}

/// Free-text spellings seen in fitness concepts, keyed after folding.
const SYNONYMS: &[(&str, WorkFitnessOutcome)] = &[
    ("apto_sin_restricciones", WorkFitnessOutcome::Fit),
    ("apto_para_el_cargo", WorkFitnessOutcome::Fit),
    ("apto_para_laborar", WorkFitnessOutcome::Fit),
    ("apto_con_recomendacion", WorkFitnessOutcome::FitWithRecommendations),
    ("apto_con_observaciones", WorkFitnessOutcome::FitWithRecommendations),
    ("apto_con_restriccion", WorkFitnessOutcome::FitWithRestrictions),
    ("apto_con_limitaciones", WorkFitnessOutcome::FitWithRestrictions),
    ("no_apto_temporalmente", WorkFitnessOutcome::TemporarilyUnfit),
    ("no_apto_transitorio", WorkFitnessOutcome::TemporarilyUnfit),
    ("no_apto_permanente", WorkFitnessOutcome::PermanentlyUnfit),
    ("no_apto_definitivamente", WorkFitnessOutcome::PermanentlyUnfit),
    ("en_estudio", WorkFitnessOutcome::Pending),
    ("pendiente_por_estudios", WorkFitnessOutcome::Pending),
];

fn fitness_key(raw: &str) -> String {
    let folded = fold_accents(raw.trim()).to_lowercase();
    let mut key = String::with_capacity(folded.len());
    for c in folded.chars() {
        let c = if c == ' ' || c == '-' { '_' } else { c };
        if c == '_' && key.ends_with('_') {
            continue;
        }
        key.push(c);
    }
    key.trim_matches('_').to_string()
}

/// Resolve a raw fitness literal.
///
/// A literal already in the closed set is returned as is. Bare "no apto"
/// is ambiguous between the temporary and permanent variants and stays
/// unknown rather than being guessed.
pub fn resolve_outcome(raw: &str) -> FitnessResolution {
    let key = fitness_key(raw);
    if key.is_empty() {
        return FitnessResolution::Empty;
    }
    if key.starts_with("aplazad") {
        return FitnessResolution::Deferred;
    }
    if let Ok(outcome) = WorkFitnessOutcome::from_str(&key) {
        return FitnessResolution::Outcome(outcome);
    }
    SYNONYMS
        .iter()
        .find(|(synonym, _)| *synonym == key)
        .map(|(_, outcome)| FitnessResolution::Outcome(*outcome))
        .unwrap_or(FitnessResolution::Unknown)
}

/// Map an unrecognized fitness literal onto the closed set.
///
/// Known values pass through untouched. Unknown literals become
/// `pendiente` with a `formato_incorrecto` alert; nothing here fails.
pub fn normalize_fitness(mut record: StructuredRecord) -> StructuredRecord {
    let raw = match record.work_fitness.as_ref().and_then(|f| f.outcome.as_ref()) {
        Some(Lenient::Unrecognized(raw)) => raw.clone(),
        _ => return record,
    };
    let Some(fitness) = record.work_fitness.as_mut() else {
        return record;
    };

    let mut alert = None;
    match resolve_outcome(&raw) {
        FitnessResolution::Outcome(outcome) => {
            fitness.outcome = Some(Lenient::Known(outcome));
        }
        FitnessResolution::Empty => {
            fitness.outcome = None;
        }
        FitnessResolution::Deferred => {
            fitness.outcome = Some(Lenient::Known(WorkFitnessOutcome::Pending));
            fitness.push_restriction(&raw);
        }
        FitnessResolution::Unknown => {
            tracing::debug!(raw = %raw, "Unrecognized fitness outcome, defaulting to pending");
            fitness.outcome = Some(Lenient::Known(WorkFitnessOutcome::Pending));
            alert = Some(
                Alert::format_incorrect(
                    FITNESS_FIELD,
                    format!("Concepto de aptitud no reconocido: '{}'", raw.trim()),
                )
                .with_action("Verificar el concepto de aptitud en el documento fuente"),
            );
        }
    }
    record.alerts.extend(alert);
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertType, WorkFitness};

    fn make_record(outcome: Lenient<WorkFitnessOutcome>) -> StructuredRecord {
        StructuredRecord {
            work_fitness: Some(WorkFitness {
                outcome: Some(outcome),
                ..WorkFitness::default()
            }),
            ..StructuredRecord::default()
        }
    }

    fn raw(s: &str) -> Lenient<WorkFitnessOutcome> {
        Lenient::Unrecognized(s.to_string())
    }

    #[test]
    fn known_outcome_untouched() {
        for outcome in WorkFitnessOutcome::all() {
            let record = make_record(Lenient::Known(*outcome));
            let normalized = normalize_fitness(record.clone());
            assert_eq!(normalized, record);
        }
    }

    #[test]
    fn resolves_spelling_variants() {
        assert_eq!(
            resolve_outcome("Apto con Restricciones"),
            FitnessResolution::Outcome(WorkFitnessOutcome::FitWithRestrictions)
        );
        assert_eq!(
            resolve_outcome("APTO"),
            FitnessResolution::Outcome(WorkFitnessOutcome::Fit)
        );
        assert_eq!(
            resolve_outcome("no-apto  temporal"),
            FitnessResolution::Outcome(WorkFitnessOutcome::TemporarilyUnfit)
        );
        assert_eq!(
            resolve_outcome("Apto sin restricciones"),
            FitnessResolution::Outcome(WorkFitnessOutcome::Fit)
        );
    }

    #[test]
    fn deferred_maps_to_pending_with_restriction() {
        let normalized = normalize_fitness(make_record(raw("aplazado para completar estudios")));
        let fitness = normalized.work_fitness.unwrap();
        assert_eq!(fitness.known_outcome(), Some(WorkFitnessOutcome::Pending));
        assert_eq!(
            fitness.restrictions.as_deref(),
            Some("aplazado para completar estudios")
        );
        assert!(normalized.alerts.is_empty());
    }

    #[test]
    fn unknown_literal_becomes_pending_with_alert() {
        let normalized = normalize_fitness(make_record(raw("requiere valoración")));
        assert_eq!(normalized.fitness_outcome(), Some(WorkFitnessOutcome::Pending));
        assert_eq!(normalized.alerts.len(), 1);
        assert_eq!(normalized.alerts[0].alert_type, AlertType::FormatIncorrect);
        assert_eq!(normalized.alerts[0].field, FITNESS_FIELD);
    }

    #[test]
    fn bare_no_apto_is_not_guessed() {
        assert_eq!(resolve_outcome("No apto"), FitnessResolution::Unknown);
    }

    #[test]
    fn blank_literal_clears_outcome() {
        let normalized = normalize_fitness(make_record(raw("  ")));
        assert!(normalized.work_fitness.unwrap().outcome.is_none());
        assert!(normalized.alerts.is_empty());
    }

    #[test]
    fn missing_fitness_not_invented() {
        let normalized = normalize_fitness(StructuredRecord::default());
        assert!(normalized.work_fitness.is_none());
    }

    #[test]
    fn idempotent_on_unknown() {
        let once = normalize_fitness(make_record(raw("indeterminado")));
        let twice = normalize_fitness(once.clone());
        assert_eq!(once, twice);
    }
}
