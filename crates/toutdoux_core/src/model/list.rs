//! List and list-label records.
//!
//! # Invariants
//! - List names are not unique; several lists may share one name.
//! - `(name, todo_list_id)` is unique for labels and enforced by storage.
//! - Labels are immutable once created.

use crate::model::validation::FieldError;
use crate::model::{LabelId, TodoListId, UserId};
use serde::{Deserialize, Serialize};

/// Named container of entries, owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoList {
    pub id: TodoListId,
    pub name: String,
    pub user_id: UserId,
    /// Epoch milliseconds, defaulted by storage.
    pub created_at: i64,
    /// Epoch milliseconds, defaulted by storage.
    pub updated_at: i64,
}

/// Tag scoped to exactly one list.
///
/// Only `id` and `name` are part of the serialized snapshot; the owning list
/// is implied by the entry carrying the label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoListLabel {
    pub id: LabelId,
    pub name: String,
    #[serde(skip)]
    pub todo_list_id: TodoListId,
    #[serde(skip)]
    pub created_at: i64,
    #[serde(skip)]
    pub updated_at: i64,
}

/// Normalizes a list name: trimmed and lowercased.
pub fn normalize_list_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Validates a normalized list name.
pub fn validate_list_name(name: &str) -> Option<FieldError> {
    if name.is_empty() {
        Some(FieldError::new("name", "list name can not be blank"))
    } else {
        None
    }
}

/// Validates the intrinsic shape of a label name.
///
/// Names are case-sensitive and kept verbatim; only blank names are rejected.
pub fn validate_label_name(name: &str) -> Option<FieldError> {
    if name.trim().is_empty() {
        Some(FieldError::new(
            "labels",
            format!("label `{name}`: name can not be blank"),
        ))
    } else {
        None
    }
}
