//! Best-effort parsing of free-text reference ranges ("<25 dB", "50-100",
//! "≤ 200 mg/dL"). Formats not recognized here are ignored, never flagged.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Alert, Exam, Interpretation};
use crate::pipeline::helpers::fold_accents;

const NUM: &str = r"(-?\d+(?:\.\d+)?)";

static RE_BETWEEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^\s*(?:entre\s+)?{NUM}\s*(?:-|–|a|y|to)\s*{NUM}")).unwrap()
});
static RE_BOUND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\s*(<=|>=|≤|≥|<|>|menor\s+(?:a|de|que)|hasta|mayor\s+(?:a|de|que)|desde)\s*{NUM}"
    ))
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    pub value: f64,
    pub inclusive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceRange {
    pub min: Option<Bound>,
    pub max: Option<Bound>,
}

impl ReferenceRange {
    pub fn contains(&self, value: f64) -> bool {
        let above_min = self.min.map_or(true, |b| {
            if b.inclusive {
                value >= b.value
            } else {
                value > b.value
            }
        });
        let below_max = self.max.map_or(true, |b| {
            if b.inclusive {
                value <= b.value
            } else {
                value < b.value
            }
        });
        above_min && below_max
    }
}

fn number(s: &str) -> Option<f64> {
    s.parse().ok()
}

pub fn parse_reference_range(raw: &str) -> Option<ReferenceRange> {
    let text = fold_accents(raw).to_lowercase().replace(',', ".");

    if let Some(caps) = RE_BETWEEN.captures(&text) {
        let a = number(&caps[1])?;
        let b = number(&caps[2])?;
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        return Some(ReferenceRange {
            min: Some(Bound { value: lo, inclusive: true }),
            max: Some(Bound { value: hi, inclusive: true }),
        });
    }

    let caps = RE_BOUND.captures(&text)?;
    let value = number(&caps[2])?;
    let op = caps[1].split_whitespace().next().unwrap_or("");
    let range = match op {
        "<" | "menor" => ReferenceRange {
            min: None,
            max: Some(Bound { value, inclusive: false }),
        },
        "<=" | "≤" | "hasta" => ReferenceRange {
            min: None,
            max: Some(Bound { value, inclusive: true }),
        },
        ">" | "mayor" => ReferenceRange {
            min: Some(Bound { value, inclusive: false }),
            max: None,
        },
        ">=" | "≥" | "desde" => ReferenceRange {
            min: Some(Bound { value, inclusive: true }),
            max: None,
        },
        _ => return None,
    };
    Some(range)
}

/// Flag exams whose numeric value falls outside their own reference range
/// while being interpreted as normal.
pub fn range_inconsistencies(exams: &[Exam]) -> Vec<Alert> {
    exams
        .iter()
        .enumerate()
        .filter(|(_, exam)| exam.interpretation == Some(Interpretation::Normal))
        .filter_map(|(i, exam)| {
            let value = exam.numeric_value?;
            let range = parse_reference_range(exam.reference_range.as_deref()?)?;
            if range.contains(value) {
                return None;
            }
            let unit = exam.unit.as_deref().unwrap_or("");
            Some(
                Alert::inconsistency(
                    format!("exams[{i}]"),
                    format!(
                        "{}: valor {value} {unit} fuera del rango de referencia '{}' pero interpretado como normal",
                        exam.name,
                        exam.reference_range.as_deref().unwrap_or_default()
                    ),
                )
                .with_action("Verificar la interpretación del examen"),
            )
        })
        .collect()
}
