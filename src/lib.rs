//! Consolidation and validation of occupational medical exam (EMO)
//! records extracted from scanned documents.
//!
//! Each source document arrives as a [`models::StructuredRecord`]. The
//! pipeline normalizes it, filters its recommendations and alerts by
//! document type, and merges every document of one person into a
//! [`models::ConsolidatedRecord`] that is validated across documents.

pub mod config;
pub mod models;
pub mod pipeline;

pub use config::{init_tracing, ConfigError, ConsolidationConfig};
pub use models::{Alert, ConsolidatedRecord, StructuredRecord};
pub use pipeline::consolidation::{
    consolidate, consolidate_json, ConsolidationError, DefaultConsolidator, RecordConsolidator,
};
pub use pipeline::filters::policy::{AlertPolicy, RecommendationPolicy};
pub use pipeline::filters::{filter_alerts, filter_alerts_for_record, filter_recommendations};
pub use pipeline::ingest::{ingest, ingest_json, IngestError, IngestPolicy};
pub use pipeline::normalize::normalize;
pub use pipeline::validation::{validate, validate_document, ValidationPolicy};
