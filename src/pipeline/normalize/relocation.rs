use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Lenient, Recommendation, StructuredRecord};
use crate::pipeline::helpers::fold_accents;

use super::programs::program_mentioned_in;

static RE_DEFERRAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*aplazad[oa]s?\b").unwrap());

/// "Incluir en SVE de ...", "Inclusión al programa de vigilancia epidemiológica para ..."
static RE_SVE_INCLUSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:incluir|inclusion|ingresar|ingreso|vincular)\s+(?:en|a|al)\s+(?:el\s+|los\s+)?(?:sve|pve|programas?\s+de\s+vigilancia(?:\s+epidemiologica)?)\b(?P<target>.*)$",
    )
    .unwrap()
});

enum Destination {
    Restrictions,
    Program(crate::models::SurveillanceProgram),
    Stay,
}

fn destination(rec: &Recommendation) -> Destination {
    let text = fold_accents(&rec.description).to_lowercase();
    if RE_DEFERRAL.is_match(&text) {
        return Destination::Restrictions;
    }
    if let Some(caps) = RE_SVE_INCLUSION.captures(&text) {
        let target = caps.name("target").map_or("", |m| m.as_str());
        if let Some(program) = program_mentioned_in(target) {
            return Destination::Program(program);
        }
    }
    Destination::Stay
}

/// Move recommendation text that is really a deferral or an SVE enrollment
/// into the field it belongs to, removing it from `recommendations`.
///
/// Inclusion text that names no recognizable program stays a
/// recommendation so no program is invented. A deferral never sets a
/// fitness outcome; it only appends to the restrictions text.
pub fn relocate_misclassified(mut record: StructuredRecord) -> StructuredRecord {
    let mut kept = Vec::with_capacity(record.recommendations.len());
    for rec in std::mem::take(&mut record.recommendations) {
        match destination(&rec) {
            Destination::Restrictions => {
                tracing::debug!(text = %rec.description, "Relocating deferral to restrictions");
                record.work_fitness_mut().push_restriction(&rec.description);
            }
            Destination::Program(program) => {
                tracing::debug!(text = %rec.description, program = %program, "Relocating SVE inclusion");
                let entry = Lenient::Known(program);
                if !record.surveillance_programs.contains(&entry) {
                    record.surveillance_programs.push(entry);
                }
            }
            Destination::Stay => kept.push(rec),
        }
    }
    record.recommendations = kept;
    record
}
