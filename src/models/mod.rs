pub mod alert;
pub mod consolidated;
pub mod enums;
pub mod record;

pub use alert::*;
pub use consolidated::*;
pub use enums::*;
pub use record::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid value '{value}' for {field}")]
    InvalidEnum { field: String, value: String },
}
