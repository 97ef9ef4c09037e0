//! Row-shaped domain model for the application/library dependency graph.
//!
//! # Responsibility
//! - Define explicit row structs with foreign-key fields.
//! - Provide label validation shared by every write path.
//!
//! # Invariants
//! - Every record is identified by a store-assigned integer id.
//! - Relationships are expressed as id fields, never as nested objects.

pub mod application;
pub mod library;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation failure for user-provided labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// Field is empty after trimming.
    EmptyField(&'static str),
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "{field} cannot be empty"),
        }
    }
}

impl Error for ModelValidationError {}

/// Trims a label and rejects it when nothing is left.
pub fn normalize_label(field: &'static str, value: &str) -> Result<String, ModelValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ModelValidationError::EmptyField(field));
    }
    Ok(trimmed.to_string())
}
