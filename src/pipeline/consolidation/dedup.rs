use std::collections::HashMap;
use std::hash::Hash;

use chrono::NaiveDate;

use crate::models::{Antecedent, Diagnosis, Exam, Interpretation, Referral, SickLeave};
use crate::pipeline::helpers::{is_blank, normalize_text, parse_date_lenient};

/// Result of deduplicating one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Deduped<T> {
    pub items: Vec<T>,
    pub removed: usize,
}

/// Keep one entry per key at the position of its first occurrence.
/// `replace(new, kept)` decides whether a later duplicate takes the slot.
fn dedup_by_key<T, K, F, P>(items: Vec<T>, key: F, replace: P) -> Deduped<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
    P: Fn(&T, &T) -> bool,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut kept: Vec<T> = Vec::with_capacity(items.len());
    let mut removed = 0;

    for item in items {
        match index.get(&key(&item)) {
            Some(&slot) => {
                removed += 1;
                if replace(&item, &kept[slot]) {
                    kept[slot] = item;
                }
            }
            None => {
                index.insert(key(&item), kept.len());
                kept.push(item);
            }
        }
    }
    Deduped {
        items: kept,
        removed,
    }
}

/// Same (code, normalized description) pair is one diagnosis; the more
/// confident extraction wins.
pub fn dedup_diagnoses(diagnoses: Vec<Diagnosis>) -> Deduped<Diagnosis> {
    dedup_by_key(
        diagnoses,
        |dx| (dx.icd10_code.to_uppercase(), normalize_text(&dx.description)),
        |new, kept| new.confidence > kept.confidence,
    )
}

pub fn dedup_antecedents(antecedents: Vec<Antecedent>) -> Deduped<Antecedent> {
    dedup_by_key(
        antecedents,
        |a| (a.category, normalize_text(&a.description)),
        |_, _| false,
    )
}

fn is_interpreted(exam: &Exam) -> bool {
    matches!(exam.interpretation, Some(i) if i != Interpretation::Pending)
}

fn same_exam(a: &Exam, b: &Exam) -> bool {
    a.kind == b.kind
        && normalize_text(&a.name) == normalize_text(&b.name)
        && match (&a.date, &b.date) {
            (Some(da), Some(db)) => da == db,
            _ => true,
        }
}

fn prefer_exam(new: &Exam, kept: &Exam) -> bool {
    match (is_interpreted(new), is_interpreted(kept)) {
        (true, false) => true,
        (false, true) => false,
        _ => new.confidence > kept.confidence,
    }
}

/// Exams match on kind and normalized name, and on date when both carry
/// one. An interpreted result beats a pending one; otherwise confidence.
pub fn dedup_exams(exams: Vec<Exam>) -> Deduped<Exam> {
    let mut kept: Vec<Exam> = Vec::with_capacity(exams.len());
    let mut removed = 0;

    for exam in exams {
        match kept.iter().position(|k| same_exam(k, &exam)) {
            Some(slot) => {
                removed += 1;
                if prefer_exam(&exam, &kept[slot]) {
                    let mut winner = exam;
                    if winner.date.is_none() {
                        winner.date = kept[slot].date.take();
                    }
                    kept[slot] = winner;
                } else if kept[slot].date.is_none() {
                    kept[slot].date = exam.date;
                }
            }
            None => kept.push(exam),
        }
    }
    Deduped {
        items: kept,
        removed,
    }
}

fn parsed(date: Option<&str>) -> Option<NaiveDate> {
    date.and_then(parse_date_lenient)
}

/// One sick leave per (start date, kind); a later record of the same leave
/// replaces the earlier one. Undated leaves are skipped. Newest start first.
pub fn dedup_sick_leaves(leaves: Vec<SickLeave>) -> Deduped<SickLeave> {
    let (dated, undated): (Vec<SickLeave>, Vec<SickLeave>) = leaves
        .into_iter()
        .partition(|l| !is_blank(l.start_date.as_deref()));
    if !undated.is_empty() {
        tracing::debug!(skipped = undated.len(), "Sick leaves without start date skipped");
    }
    let mut deduped = dedup_by_key(
        dated,
        |l| {
            (
                l.start_date.as_deref().unwrap_or_default().trim().to_string(),
                normalize_text(l.kind_literal()),
            )
        },
        |_, _| true,
    );
    deduped
        .items
        .sort_by(|a, b| parsed(b.start_date.as_deref()).cmp(&parsed(a.start_date.as_deref())));
    deduped
}

/// One referral per (specialty, reason); the later planned date wins.
/// Referrals without a specialty are skipped.
pub fn dedup_referrals(referrals: Vec<Referral>) -> Deduped<Referral> {
    let named: Vec<Referral> = referrals
        .into_iter()
        .filter(|r| !r.specialty.trim().is_empty())
        .collect();
    dedup_by_key(
        named,
        |r| {
            (
                normalize_text(&r.specialty),
                r.reason.as_deref().map(normalize_text).unwrap_or_default(),
            )
        },
        |new, kept| match (parsed(new.planned_date.as_deref()), parsed(kept.planned_date.as_deref())) {
            (Some(_), None) => true,
            (Some(n), Some(k)) => n > k,
            _ => false,
        },
    )
}
