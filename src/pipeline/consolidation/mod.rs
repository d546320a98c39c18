//! Merge every per-document record of one person into a single
//! consolidated record.

pub mod dedup;
pub mod merge;
pub mod orchestrator;

pub use dedup::*;
pub use merge::*;
pub use orchestrator::*;

use thiserror::Error;

use crate::models::{ConsolidatedRecord, StructuredRecord};

#[derive(Error, Debug)]
pub enum ConsolidationError {
    #[error("No source records to consolidate")]
    EmptyInput,

    #[error("Source record {index} has no sourceDocumentType")]
    MissingSourceDocumentType { index: usize },

    #[error("Source record {index} is not valid JSON: {source}")]
    Json {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

pub trait RecordConsolidator {
    fn consolidate(
        &self,
        sources: Vec<StructuredRecord>,
    ) -> Result<ConsolidatedRecord, ConsolidationError>;
}
