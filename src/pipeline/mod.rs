pub mod consolidation;
pub mod filters;
pub mod helpers;
pub mod ingest;
pub mod normalize;
pub mod validation;
