use std::time::Instant;

use crate::config::{ConfigError, ConsolidationConfig};
use crate::models::{
    Alert, ConsolidatedRecord, DuplicatesRemoved, SourceDocumentType, StructuredRecord,
};
use crate::pipeline::filters::{filter_alerts_for_record, filter_and_dedup};
use crate::pipeline::filters::policy::{AlertPolicy, RecommendationPolicy};
use crate::pipeline::normalize::normalize;
use crate::pipeline::validation::{validate, ValidationPolicy};

use super::dedup::{
    dedup_antecedents, dedup_diagnoses, dedup_exams, dedup_referrals, dedup_sick_leaves,
};
use super::merge::{
    merge_employee, merge_exam_date, merge_exam_type, merge_findings, merge_programs,
    merge_vital_signs, merge_work_fitness, merged_confidence, source_views,
};
use super::{ConsolidationError, RecordConsolidator};

/// Counts reported once per consolidation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsolidationSummary {
    pub sources: usize,
    pub duplicates: DuplicatesRemoved,
    pub recommendations_dropped: usize,
    pub alert_candidates: usize,
    pub alerts_kept: usize,
}

/// Default consolidator: normalize each source, merge, dedup, filter
/// recommendations, validate, then filter alerts as `consolidado`.
#[derive(Debug, Clone, Default)]
pub struct DefaultConsolidator {
    pub(crate) validation: ValidationPolicy,
    pub(crate) alerts: AlertPolicy,
    pub(crate) recommendations: RecommendationPolicy,
}

impl DefaultConsolidator {
    pub fn new(
        validation: ValidationPolicy,
        alerts: AlertPolicy,
        recommendations: RecommendationPolicy,
    ) -> Self {
        Self {
            validation,
            alerts,
            recommendations,
        }
    }

    pub fn from_config(config: &ConsolidationConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            validation: ValidationPolicy::from_config(config),
            alerts: AlertPolicy::from_config(config)?,
            recommendations: RecommendationPolicy::from_config(config),
        })
    }

    pub fn validation_policy(&self) -> &ValidationPolicy {
        &self.validation
    }

    /// Normalize one source. Upstream alerts are discarded; the
    /// normalizer's own coercion alerts are returned tagged with the
    /// source they came from.
    fn normalize_source(
        &self,
        index: usize,
        mut record: StructuredRecord,
    ) -> (StructuredRecord, Vec<Alert>) {
        let source_id = record.source_id(index);
        record.alerts.clear();
        let mut normalized = normalize(record);
        let coerced = std::mem::take(&mut normalized.alerts)
            .into_iter()
            .map(|mut alert| {
                alert.message = format!("[{source_id}] {}", alert.message);
                alert
            })
            .collect();
        (normalized, coerced)
    }
}

fn check_preconditions(sources: &[StructuredRecord]) -> Result<(), ConsolidationError> {
    if sources.is_empty() {
        return Err(ConsolidationError::EmptyInput);
    }
    if let Some(index) = sources
        .iter()
        .position(|r| r.source_document_type.is_none())
    {
        return Err(ConsolidationError::MissingSourceDocumentType { index });
    }
    Ok(())
}

fn warn_on_identity_mismatch(sources: &[StructuredRecord]) {
    let mut ids: Vec<&str> = sources
        .iter()
        .filter_map(|r| r.employee_data.national_id_number())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.len() > 1 {
        tracing::warn!(
            distinct_ids = ids.len(),
            "Source records carry different national ids"
        );
    }
}

impl RecordConsolidator for DefaultConsolidator {
    fn consolidate(
        &self,
        sources: Vec<StructuredRecord>,
    ) -> Result<ConsolidatedRecord, ConsolidationError> {
        let start = Instant::now();
        check_preconditions(&sources)?;
        warn_on_identity_mismatch(&sources);

        let source_documents: Vec<String> = sources
            .iter()
            .enumerate()
            .map(|(i, r)| r.source_id(i))
            .collect();

        let mut coerced = Vec::new();
        let normalized: Vec<StructuredRecord> = sources
            .into_iter()
            .enumerate()
            .map(|(i, record)| {
                let (record, alerts) = self.normalize_source(i, record);
                coerced.extend(alerts);
                record
            })
            .collect();
        let views = source_views(&normalized);

        let diagnoses = dedup_diagnoses(
            normalized.iter().flat_map(|r| r.diagnoses.iter().cloned()).collect(),
        );
        let exams = dedup_exams(normalized.iter().flat_map(|r| r.exams.iter().cloned()).collect());
        let antecedents = dedup_antecedents(
            normalized.iter().flat_map(|r| r.antecedents.iter().cloned()).collect(),
        );
        let sick_leaves = dedup_sick_leaves(
            normalized.iter().flat_map(|r| r.sick_leaves.iter().cloned()).collect(),
        );
        let referrals = dedup_referrals(
            normalized.iter().flat_map(|r| r.referrals.iter().cloned()).collect(),
        );
        let recommendations = filter_and_dedup(
            normalized
                .iter()
                .flat_map(|r| r.recommendations.iter().cloned())
                .collect(),
            &self.recommendations,
        );

        let mut record = StructuredRecord {
            source_file: None,
            source_document_type: Some(SourceDocumentType::Consolidated),
            employee_data: merge_employee(&views),
            exam_type: merge_exam_type(&views),
            exam_date: merge_exam_date(&views),
            diagnoses: diagnoses.items,
            exams: exams.items,
            antecedents: antecedents.items,
            vital_signs: merge_vital_signs(&views),
            physical_exam_findings: merge_findings(&views),
            work_fitness: merge_work_fitness(&views),
            recommendations: recommendations.kept,
            sick_leaves: sick_leaves.items,
            referrals: referrals.items,
            surveillance_programs: merge_programs(&views),
            alerts: Vec::new(),
            extraction_confidence: 0.0,
        };
        record.extraction_confidence = merged_confidence(&record, &views);

        let duplicates = DuplicatesRemoved {
            diagnoses: diagnoses.removed,
            exams: exams.removed,
            recommendations: recommendations.duplicates_removed,
            antecedents: antecedents.removed,
            sick_leaves: sick_leaves.removed,
            referrals: referrals.removed,
        };
        let mut consolidated = ConsolidatedRecord {
            record,
            consolidation_id: ConsolidatedRecord::derive_id(&source_documents),
            document_count: source_documents.len(),
            source_documents,
            duplicates_removed: duplicates,
        };

        let mut candidates = coerced;
        candidates.extend(validate(&consolidated, &self.validation));
        let alert_candidates = candidates.len();
        consolidated.record.alerts =
            filter_alerts_for_record(candidates, &consolidated.record, &self.alerts);

        let summary = ConsolidationSummary {
            sources: consolidated.document_count,
            duplicates,
            recommendations_dropped: recommendations.dropped,
            alert_candidates,
            alerts_kept: consolidated.record.alerts.len(),
        };
        tracing::info!(
            consolidation_id = %consolidated.consolidation_id,
            sources = summary.sources,
            duplicates = summary.duplicates.total(),
            recommendations_dropped = summary.recommendations_dropped,
            alert_candidates = summary.alert_candidates,
            alerts_kept = summary.alerts_kept,
            processing_ms = start.elapsed().as_millis() as u64,
            "Consolidation complete"
        );

        Ok(consolidated)
    }
}

/// Consolidate with the default policies.
pub fn consolidate(sources: Vec<StructuredRecord>) -> Result<ConsolidatedRecord, ConsolidationError> {
    DefaultConsolidator::default().consolidate(sources)
}

/// Parse each JSON document as a [`StructuredRecord`] and consolidate them.
pub fn consolidate_json(documents: &[&str]) -> Result<ConsolidatedRecord, ConsolidationError> {
    let sources = documents
        .iter()
        .enumerate()
        .map(|(index, json)| {
            serde_json::from_str(json).map_err(|source| ConsolidationError::Json { index, source })
        })
        .collect::<Result<Vec<StructuredRecord>, _>>()?;
    consolidate(sources)
}
