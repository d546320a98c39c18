use std::collections::HashSet;
use std::str::FromStr;

use crate::models::{Lenient, StructuredRecord, SurveillanceProgram};
use crate::pipeline::helpers::fold_accents;

/// Free-text program names mapped onto the SVE vocabulary. Phrases are
/// accent-folded and lowercased; longer phrases come first.
const PROGRAM_SYNONYMS: &[(&str, SurveillanceProgram)] = &[
    ("desordenes musculoesqueleticos", SurveillanceProgram::Musculoskeletal),
    ("musculoesqueletico", SurveillanceProgram::Musculoskeletal),
    ("osteomuscular", SurveillanceProgram::Musculoskeletal),
    ("ergonomico", SurveillanceProgram::Musculoskeletal),
    ("conservacion auditiva", SurveillanceProgram::Noise),
    ("audiometria", SurveillanceProgram::Noise),
    ("hipoacusia", SurveillanceProgram::Noise),
    ("auditivo", SurveillanceProgram::Noise),
    ("ruido", SurveillanceProgram::Noise),
    ("riesgo biologico", SurveillanceProgram::Biological),
    ("biologico", SurveillanceProgram::Biological),
    ("riesgo psicosocial", SurveillanceProgram::Psychosocial),
    ("psicosocial", SurveillanceProgram::Psychosocial),
    ("solventes", SurveillanceProgram::Btx),
    ("benceno", SurveillanceProgram::Btx),
    ("tolueno", SurveillanceProgram::Btx),
    ("xileno", SurveillanceProgram::Btx),
    ("btx", SurveillanceProgram::Btx),
    ("radiaciones ionizantes", SurveillanceProgram::IonizingRadiation),
    ("radiacion ionizante", SurveillanceProgram::IonizingRadiation),
    ("sustancias quimicas", SurveillanceProgram::Chemical),
    ("riesgo quimico", SurveillanceProgram::Chemical),
    ("quimico", SurveillanceProgram::Chemical),
    ("riesgo cardiovascular", SurveillanceProgram::Cardiovascular),
    ("cardiovascular", SurveillanceProgram::Cardiovascular),
    ("hipertension", SurveillanceProgram::Cardiovascular),
    ("cardio", SurveillanceProgram::Cardiovascular),
    ("conservacion de la voz", SurveillanceProgram::Voice),
    ("vocal", SurveillanceProgram::Voice),
    ("voz", SurveillanceProgram::Voice),
    ("conservacion visual", SurveillanceProgram::Visual),
    ("oftalmologico", SurveillanceProgram::Visual),
    ("vision", SurveillanceProgram::Visual),
    ("visual", SurveillanceProgram::Visual),
    ("conservacion respiratoria", SurveillanceProgram::Respiratory),
    ("respiratorio", SurveillanceProgram::Respiratory),
    ("pulmonar", SurveillanceProgram::Respiratory),
];

/// Lowercased, accent-folded, with every non-alphanumeric run collapsed to one space.
fn words(text: &str) -> String {
    fold_accents(text)
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve a program tag such as "Conservación auditiva" or "DME".
pub fn canonical_program(raw: &str) -> Option<SurveillanceProgram> {
    let phrase = words(raw);
    if phrase.is_empty() {
        return None;
    }
    if let Ok(program) = SurveillanceProgram::from_str(&phrase.replace(' ', "_")) {
        return Some(program);
    }
    PROGRAM_SYNONYMS
        .iter()
        .find(|(synonym, _)| *synonym == phrase)
        .map(|(_, program)| *program)
}

/// Find the first program named anywhere in a sentence, on word boundaries.
pub fn program_mentioned_in(text: &str) -> Option<SurveillanceProgram> {
    let padded = format!(" {} ", words(text));
    if let Some(program) = SurveillanceProgram::all()
        .iter()
        .find(|p| padded.contains(&format!(" {} ", p.as_str().replace('_', " "))))
    {
        return Some(*program);
    }
    PROGRAM_SYNONYMS
        .iter()
        .find(|(synonym, _)| padded.contains(&format!(" {synonym} ")))
        .map(|(_, program)| *program)
}

/// Canonicalize program tags, drop the ones that map to nothing, dedupe
/// keeping first-seen order.
pub fn normalize_programs(mut record: StructuredRecord) -> StructuredRecord {
    let mut seen = HashSet::new();
    let mut programs = Vec::with_capacity(record.surveillance_programs.len());
    for entry in std::mem::take(&mut record.surveillance_programs) {
        let resolved = match &entry {
            Lenient::Known(program) => Some(*program),
            Lenient::Unrecognized(raw) => {
                let resolved = canonical_program(raw);
                if resolved.is_none() {
                    tracing::debug!(program = %raw, "Dropping unrecognized surveillance program");
                }
                resolved
            }
        };
        if let Some(program) = resolved {
            if seen.insert(program) {
                programs.push(Lenient::Known(program));
            }
        }
    }
    record.surveillance_programs = programs;
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names_and_synonyms() {
        assert_eq!(canonical_program("DME"), Some(SurveillanceProgram::Musculoskeletal));
        assert_eq!(
            canonical_program("Conservación auditiva"),
            Some(SurveillanceProgram::Noise)
        );
        assert_eq!(canonical_program("osteomuscular"), Some(SurveillanceProgram::Musculoskeletal));
        assert_eq!(
            canonical_program("radiaciones ionizantes"),
            Some(SurveillanceProgram::IonizingRadiation)
        );
        assert_eq!(canonical_program("pulmonar"), Some(SurveillanceProgram::Respiratory));
        assert_eq!(canonical_program("gestión documental"), None);
    }

    #[test]
    fn finds_program_inside_sentence() {
        assert_eq!(
            program_mentioned_in("SVE de conservación auditiva por exposición"),
            Some(SurveillanceProgram::Noise)
        );
        assert_eq!(
            program_mentioned_in("programa de riesgo cardiovascular"),
            Some(SurveillanceProgram::Cardiovascular)
        );
        assert_eq!(program_mentioned_in("evaluación cardiológica"), None);
    }

    #[test]
    fn normalizes_and_dedupes() {
        let record = StructuredRecord {
            surveillance_programs: vec![
                Lenient::Unrecognized("osteomuscular".into()),
                Lenient::Known(SurveillanceProgram::Noise),
                Lenient::Unrecognized("Auditivo".into()),
                Lenient::Unrecognized("gimnasio".into()),
                Lenient::Known(SurveillanceProgram::Musculoskeletal),
            ],
            ..StructuredRecord::default()
        };
        let normalized = normalize_programs(record);
        assert_eq!(
            normalized.known_programs(),
            vec![SurveillanceProgram::Musculoskeletal, SurveillanceProgram::Noise]
        );
        assert_eq!(normalized.surveillance_programs.len(), 2);
    }
}
