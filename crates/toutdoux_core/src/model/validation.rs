//! Structured validation violations.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// One violated constraint, naming the offending field and value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Request field the violation is attached to (`title`, `labels`, ...).
    pub field: String,
    /// Human-readable message; includes the offending value where one exists.
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Renders a violation list as one `; `-separated line.
pub fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
