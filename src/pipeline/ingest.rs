//! Per-document ingestion: normalize a freshly extracted record, run the
//! single-document checks, and keep only the alerts its document type may
//! carry.

use thiserror::Error;

use crate::config::{ConfigError, ConsolidationConfig};
use crate::models::StructuredRecord;
use crate::pipeline::filters::filter_alerts_for_record;
use crate::pipeline::filters::policy::AlertPolicy;
use crate::pipeline::normalize::normalize;
use crate::pipeline::validation::{validate_document, ValidationPolicy};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Record has no sourceDocumentType")]
    MissingSourceDocumentType,

    #[error("Record is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default)]
pub struct IngestPolicy {
    pub validation: ValidationPolicy,
    pub alerts: AlertPolicy,
}

impl IngestPolicy {
    pub fn from_config(config: &ConsolidationConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            validation: ValidationPolicy::from_config(config),
            alerts: AlertPolicy::from_config(config)?,
        })
    }
}

pub fn ingest(record: StructuredRecord, policy: &IngestPolicy) -> Result<StructuredRecord, IngestError> {
    let Some(doc_type) = record.source_document_type else {
        return Err(IngestError::MissingSourceDocumentType);
    };

    let upstream = record.alerts.len();
    let mut record = normalize(record);
    let checks = validate_document(&record, &policy.validation);
    let mut candidates = std::mem::take(&mut record.alerts);
    candidates.extend(checks);
    let total = candidates.len();
    record.alerts = filter_alerts_for_record(candidates, &record, &policy.alerts);

    tracing::info!(
        doc_type = %doc_type,
        source = %record.source_id(0),
        upstream,
        candidates = total,
        kept = record.alerts.len(),
        "Document ingested"
    );
    Ok(record)
}

pub fn ingest_json(json: &str, policy: &IngestPolicy) -> Result<StructuredRecord, IngestError> {
    let record: StructuredRecord = serde_json::from_str(json)?;
    ingest(record, policy)
}
