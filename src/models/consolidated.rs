use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::record::StructuredRecord;

/// Fixed namespace for deterministic consolidation ids.
pub const CONSOLIDATION_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2d0e_8a47_4b3e_9c55_1e0a_7d2b_c4f9);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DuplicatesRemoved {
    pub diagnoses: usize,
    pub exams: usize,
    pub recommendations: usize,
    pub antecedents: usize,
    pub sick_leaves: usize,
    pub referrals: usize,
}

impl DuplicatesRemoved {
    pub fn total(&self) -> usize {
        self.diagnoses
            + self.exams
            + self.recommendations
            + self.antecedents
            + self.sick_leaves
            + self.referrals
    }
}

/// The merged view of every document belonging to one person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedRecord {
    #[serde(flatten)]
    pub record: StructuredRecord,
    pub consolidation_id: Uuid,
    pub source_documents: Vec<String>,
    pub document_count: usize,
    pub duplicates_removed: DuplicatesRemoved,
}

impl ConsolidatedRecord {
    /// UUID v5 over the ordered source identifiers: the same inputs in the
    /// same order always produce the same id.
    pub fn derive_id(source_documents: &[String]) -> Uuid {
        let joined = source_documents.join("\n");
        Uuid::new_v5(&CONSOLIDATION_NAMESPACE, joined.as_bytes())
    }
}
