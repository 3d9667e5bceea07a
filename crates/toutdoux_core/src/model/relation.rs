//! Directed entry relations and their type vocabulary.
//!
//! # Invariants
//! - `todo_entry_id` is the entry that declared the relation.
//! - `todo_entry_id != related_to_todo_entry_id`.
//! - Relation type names are unique and each carries its reciprocal name.

use crate::model::TodoEntryId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Directed, typed edge between two entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoEntryRelation {
    pub todo_entry_id: TodoEntryId,
    pub related_to_todo_entry_id: TodoEntryId,
    pub relation_type: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Relation record built from a request, before storage assigns timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodoEntryRelation {
    pub todo_entry_id: TodoEntryId,
    pub related_to_todo_entry_id: TodoEntryId,
    pub relation_type: String,
}

/// Named relation kind, e.g. name=`blocked by`, reverse=`blocking`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoEntryRelationType {
    #[serde(skip)]
    pub id: Uuid,
    pub name: String,
    pub reverse_name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Caller-side relation request; `related_todo` is not yet parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationRequest {
    pub related_todo: String,
    pub relation_type: String,
}

impl RelationRequest {
    pub fn new(related_todo: impl Into<String>, relation_type: impl Into<String>) -> Self {
        Self {
            related_todo: related_todo.into(),
            relation_type: relation_type.into(),
        }
    }
}
