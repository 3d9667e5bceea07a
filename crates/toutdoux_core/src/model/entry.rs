//! To-do entry record and creation request.
//!
//! # Invariants
//! - `title` is non-empty after trim.
//! - `priority` is strictly greater than zero.
//! - `done` starts as `false`.

use crate::model::list::TodoListLabel;
use crate::model::relation::{RelationRequest, TodoEntryRelation};
use crate::model::validation::FieldError;
use crate::model::{TodoEntryId, TodoListId};
use serde::{Deserialize, Serialize};

/// Fully-populated entry snapshot, as read back from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoEntry {
    pub id: TodoEntryId,
    #[serde(skip)]
    pub todo_list_id: TodoListId,
    pub title: String,
    pub priority: i64,
    pub done: bool,
    /// Epoch milliseconds.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub due_date: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    /// Labels in attachment order.
    #[serde(default)]
    pub labels: Vec<TodoListLabel>,
    /// Outgoing relations in creation order.
    #[serde(default)]
    pub relations: Vec<TodoEntryRelation>,
}

/// Row-level shape written by the entry insert, before timestamps exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodoEntry {
    pub id: TodoEntryId,
    pub todo_list_id: TodoListId,
    pub title: String,
    pub priority: i64,
    pub done: bool,
    pub due_date: Option<i64>,
}

/// Input of the entry creation workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEntryRequest {
    pub title: String,
    pub priority: i64,
    #[serde(default)]
    pub due_date: Option<i64>,
    /// Label names; duplicates are collapsed keeping first occurrence.
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub relations: Vec<RelationRequest>,
    /// Caller-provided identity for import paths. Generated when absent.
    #[serde(default)]
    pub entry_id: Option<TodoEntryId>,
}

/// Validates request-shape fields that need no storage access.
pub fn validate_entry_fields(title: &str, priority: i64) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if title.trim().is_empty() {
        errors.push(FieldError::new("title", "title can not be blank"));
    }
    if priority <= 0 {
        errors.push(FieldError::new(
            "priority",
            format!("priority must be greater than 0, got {priority}"),
        ));
    }
    errors
}
