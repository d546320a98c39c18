//! Field-level merge rules for combining per-document records.

use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::models::{
    EmoType, EmployeeData, Lenient, NationalId, StructuredRecord, SurveillanceProgram, VitalSigns,
    WorkFitness, WorkFitnessOutcome,
};
use crate::pipeline::helpers::{is_blank, normalize_text, parse_date_lenient};

/// Job titles that carry no information and never win the merge.
const PLACEHOLDER_JOB_TITLES: &[&str] = &["empleado", "trabajador", "personal"];

/// One source record with the facts the ranking rules need.
#[derive(Debug, Clone, Copy)]
pub struct SourceView<'a> {
    pub index: usize,
    pub record: &'a StructuredRecord,
    pub date: Option<NaiveDate>,
}

impl<'a> SourceView<'a> {
    pub fn new(index: usize, record: &'a StructuredRecord) -> Self {
        Self {
            index,
            record,
            date: record.exam_date.as_deref().and_then(parse_date_lenient),
        }
    }

    fn is_primary(&self) -> bool {
        self.record
            .source_document_type
            .is_some_and(|t| t.is_primary())
    }
}

pub fn source_views(records: &[StructuredRecord]) -> Vec<SourceView<'_>> {
    records
        .iter()
        .enumerate()
        .map(|(i, r)| SourceView::new(i, r))
        .collect()
}

/// More recent first; undated sources sort last.
fn recency(a: &SourceView, b: &SourceView) -> Ordering {
    b.date.cmp(&a.date)
}

/// Ranking for employee fields: extraction confidence, then most recent
/// exam date, then the more complete value, then input order.
fn employee_rank(a: (&SourceView, usize), b: (&SourceView, usize)) -> Ordering {
    b.0.record
        .extraction_confidence
        .total_cmp(&a.0.record.extraction_confidence)
        .then_with(|| recency(a.0, b.0))
        .then_with(|| b.1.cmp(&a.1))
        .then_with(|| a.0.index.cmp(&b.0.index))
}

fn pick_best<'a, T, F>(sources: &[SourceView<'a>], get: F) -> Option<T>
where
    T: Clone,
    F: Fn(&'a StructuredRecord) -> Option<(T, usize)>,
{
    let mut candidates: Vec<(&SourceView<'a>, T, usize)> = sources
        .iter()
        .filter_map(|s| get(s.record).map(|(value, weight)| (s, value, weight)))
        .collect();
    candidates.sort_by(|a, b| employee_rank((a.0, a.2), (b.0, b.2)));
    candidates.into_iter().next().map(|(_, value, _)| value)
}

fn text_value(value: Option<&str>) -> Option<(String, usize)> {
    let trimmed = value?.trim();
    (!trimmed.is_empty()).then(|| (trimmed.to_string(), trimmed.chars().count()))
}

fn is_placeholder_title(title: &str) -> bool {
    PLACEHOLDER_JOB_TITLES.contains(&normalize_text(title).as_str())
}

/// Field-by-field union of employee data across sources.
pub fn merge_employee(sources: &[SourceView]) -> EmployeeData {
    let national_id = pick_best(sources, |r| {
        let id = r.employee_data.national_id.as_ref()?;
        let number = r.employee_data.national_id_number()?;
        let weight = number.len() + usize::from(!is_blank(id.id_type.as_deref()));
        Some((
            NationalId {
                id_type: id.id_type.clone(),
                number: Some(number.to_string()),
            },
            weight,
        ))
    });

    EmployeeData {
        full_name: pick_best(sources, |r| text_value(r.employee_data.full_name.as_deref())),
        national_id,
        age: pick_best(sources, |r| r.employee_data.age.map(|age| (age, 0))),
        job_title: pick_best(sources, |r| {
            text_value(r.employee_data.job_title.as_deref())
                .filter(|(title, _)| !is_placeholder_title(title))
        }),
        company: pick_best(sources, |r| text_value(r.employee_data.company.as_deref())),
        department: pick_best(sources, |r| {
            text_value(r.employee_data.department.as_deref())
        }),
    }
}

/// Sources ordered for clinical-context fields: full clinical records and
/// fitness concepts before specific exams, most recent first within each.
fn clinical_order<'s, 'a>(sources: &'s [SourceView<'a>]) -> Vec<&'s SourceView<'a>> {
    let mut ordered: Vec<&SourceView<'a>> = sources.iter().collect();
    ordered.sort_by(|a, b| {
        b.is_primary()
            .cmp(&a.is_primary())
            .then_with(|| recency(a, b))
            .then_with(|| a.index.cmp(&b.index))
    });
    ordered
}

pub fn merge_exam_type(sources: &[SourceView]) -> Option<EmoType> {
    clinical_order(sources)
        .into_iter()
        .find_map(|s| s.record.exam_type)
}

pub fn merge_exam_date(sources: &[SourceView]) -> Option<String> {
    clinical_order(sources)
        .into_iter()
        .find_map(|s| text_value(s.record.exam_date.as_deref()).map(|(date, _)| date))
}

pub fn merge_vital_signs(sources: &[SourceView]) -> Option<VitalSigns> {
    clinical_order(sources)
        .into_iter()
        .find_map(|s| s.record.vital_signs.as_ref().filter(|v| !v.is_empty()))
        .cloned()
}

/// Distinct findings texts in input order, one per line.
pub fn merge_findings(sources: &[SourceView]) -> Option<String> {
    let mut seen = Vec::new();
    let mut parts = Vec::new();
    for source in sources {
        if let Some((text, _)) = text_value(source.record.physical_exam_findings.as_deref()) {
            let key = normalize_text(&text);
            if !seen.contains(&key) {
                seen.push(key);
                parts.push(text);
            }
        }
    }
    (!parts.is_empty()).then(|| parts.join("\n"))
}

/// The work-fitness concept that wins across sources.
///
/// Any stated non-pending outcome beats pending; among those the most
/// severe wins, then the most recent. Pending is kept only when nothing
/// else is stated, and no outcome is synthesized when none is stated.
/// Restrictions and recommendations are the distinct texts of all
/// sources, the winner's first.
pub fn merge_work_fitness(sources: &[SourceView]) -> Option<WorkFitness> {
    let with_fitness: Vec<&SourceView> = sources
        .iter()
        .filter(|s| s.record.work_fitness.is_some())
        .collect();
    if with_fitness.is_empty() {
        return None;
    }

    let winner = with_fitness
        .iter()
        .filter_map(|s| s.record.fitness_outcome().map(|outcome| (*s, outcome)))
        .min_by(|(a, oa), (b, ob)| {
            let stated = |o: &WorkFitnessOutcome| *o != WorkFitnessOutcome::Pending;
            stated(ob)
                .cmp(&stated(oa))
                .then_with(|| ob.severity_rank().cmp(&oa.severity_rank()))
                .then_with(|| recency(a, b))
                .then_with(|| a.index.cmp(&b.index))
        });

    let mut merged = WorkFitness {
        outcome: winner.map(|(_, outcome)| Lenient::Known(outcome)),
        ..WorkFitness::default()
    };

    let mut ordered: Vec<&SourceView> = Vec::with_capacity(with_fitness.len());
    if let Some((source, _)) = winner {
        ordered.push(source);
    }
    ordered.extend(
        with_fitness
            .iter()
            .copied()
            .filter(|s| winner.map_or(true, |(w, _)| w.index != s.index)),
    );

    let mut recommendations: Vec<String> = Vec::new();
    for source in ordered {
        let Some(fitness) = source.record.work_fitness.as_ref() else {
            continue;
        };
        if let Some(text) = fitness.restrictions_text() {
            for part in text.split(';') {
                merged.push_restriction(part);
            }
        }
        if let Some((text, _)) = text_value(fitness.recommendations.as_deref()) {
            if !recommendations.contains(&text) {
                recommendations.push(text);
            }
        }
    }
    if !recommendations.is_empty() {
        merged.recommendations = Some(recommendations.join("; "));
    }
    Some(merged)
}

/// Set union of known programs in first-seen order.
pub fn merge_programs(sources: &[SourceView]) -> Vec<Lenient<SurveillanceProgram>> {
    let mut merged: Vec<SurveillanceProgram> = Vec::new();
    for source in sources {
        for program in source.record.known_programs() {
            if !merged.contains(&program) {
                merged.push(program);
            }
        }
    }
    merged.into_iter().map(Lenient::Known).collect()
}

/// Mean diagnosis confidence, or the mean source confidence when the
/// merged record has no diagnoses.
pub fn merged_confidence(record: &StructuredRecord, sources: &[SourceView]) -> f32 {
    let mean = |values: Vec<f32>| -> f32 {
        if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f32>() / values.len() as f32
        }
    };
    if record.diagnoses.is_empty() {
        mean(sources.iter().map(|s| s.record.extraction_confidence).collect())
    } else {
        mean(record.diagnoses.iter().map(|d| d.confidence).collect())
    }
}
