use std::str::FromStr;

use crate::models::{Lenient, Referral, SickLeave, SickLeaveKind, StructuredRecord};
use crate::pipeline::helpers::{fold_accents, parse_date_lenient};

use super::{canonical_date, canonical_icd10};

/// "Accidente de trabajo" → `accidente_trabajo`. Unknown kinds keep their
/// literal; merge keys on it as written.
fn resolve_kind(raw: &str) -> Option<SickLeaveKind> {
    let folded = fold_accents(raw.trim()).to_lowercase();
    let key = folded
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|w| !w.is_empty() && *w != "de" && *w != "por")
        .collect::<Vec<_>>()
        .join("_");
    SickLeaveKind::from_str(&key).ok()
}

/// Inclusive day count between two dates, when both parse and are ordered.
pub fn leave_days(start: &str, end: &str) -> Option<u32> {
    let start = parse_date_lenient(start)?;
    let end = parse_date_lenient(end)?;
    let days = (end - start).num_days() + 1;
    u32::try_from(days).ok().filter(|d| *d > 0)
}

fn normalize_sick_leave(mut leave: SickLeave) -> SickLeave {
    leave.start_date = canonical_date(leave.start_date.take());
    leave.end_date = canonical_date(leave.end_date.take());
    leave.total_days = leave.total_days.filter(|d| *d > 0);
    if leave.total_days.is_none() {
        if let (Some(start), Some(end)) = (&leave.start_date, &leave.end_date) {
            leave.total_days = leave_days(start, end);
        }
    }
    if let Some(Lenient::Unrecognized(raw)) = &leave.kind {
        if let Some(kind) = resolve_kind(raw) {
            leave.kind = Some(Lenient::Known(kind));
        }
    }
    leave.related_diagnosis = leave
        .related_diagnosis
        .as_deref()
        .map(canonical_icd10)
        .filter(|code| !code.is_empty());
    leave
}

fn normalize_referral(mut referral: Referral) -> Referral {
    referral.specialty = referral.specialty.trim().to_string();
    referral.reason = referral
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(String::from);
    referral.planned_date = canonical_date(referral.planned_date.take());
    referral
}

/// Canonical dates on sick leaves and referrals, derived day counts, and
/// sick-leave kinds resolved where the spelling allows.
pub fn normalize_leaves_and_referrals(mut record: StructuredRecord) -> StructuredRecord {
    record.sick_leaves = std::mem::take(&mut record.sick_leaves)
        .into_iter()
        .map(normalize_sick_leave)
        .collect();
    record.referrals = std::mem::take(&mut record.referrals)
        .into_iter()
        .map(normalize_referral)
        .collect();
    record
}
