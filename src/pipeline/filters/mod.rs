//! Document-type-aware alert filtering and recommendation filtering.

pub mod alerts;
pub mod policy;
pub mod recommendations;

pub use alerts::*;
pub use policy::*;
pub use recommendations::*;
