//! Validation and batch creation of relations declared by a new entry.
//!
//! # Responsibility
//! - Parse relation requests into relation records outgoing from the new entry.
//! - Validate records against the entry, the relation vocabulary and storage.
//! - Submit the validated records as one batch.
//!
//! # Invariants
//! - Phases run in order: parse (fail-fast on the first malformed id),
//!   structural checks (all violations collected), target existence
//!   (first missing target reported), batch insert.
//! - Targets must live in a list owned by the same owner; an entry of
//!   another owner is reported exactly like a missing one.
//! - A relation never points at its own declaring entry.
//! - Nothing is written unless every relation passed every check.

use crate::model::relation::{NewTodoEntryRelation, RelationRequest};
use crate::model::validation::FieldError;
use crate::model::{TodoEntryId, UserId};
use crate::repo::entry_repo::EntryRepository;
use crate::repo::relation_type_repo::RelationTypeRepository;
use crate::service::error::{EntityKind, ServiceError};
use std::collections::HashSet;
use uuid::Uuid;

/// Builds and persists relations for one freshly inserted entry.
pub struct RelationBuilder<'r, E: EntryRepository, R: RelationTypeRepository> {
    entries: &'r E,
    relation_types: &'r R,
    owner: UserId,
}

impl<'r, E: EntryRepository, R: RelationTypeRepository> RelationBuilder<'r, E, R> {
    /// Builder for relations declared on behalf of `owner`.
    pub fn new(entries: &'r E, relation_types: &'r R, owner: UserId) -> Self {
        Self {
            entries,
            relation_types,
            owner,
        }
    }

    /// Parses and validates `requests` as relations outgoing from `new_entry_id`.
    ///
    /// Does not write anything.
    pub fn build_relations(
        &self,
        new_entry_id: TodoEntryId,
        requests: &[RelationRequest],
    ) -> Result<Vec<NewTodoEntryRelation>, ServiceError> {
        let mut relations = Vec::with_capacity(requests.len());
        for (index, request) in requests.iter().enumerate() {
            let related = Uuid::parse_str(request.related_todo.trim()).map_err(|_| {
                ServiceError::validation(
                    format!("relations[{index}].related_todo"),
                    format!("invalid related_todo id `{}`", request.related_todo),
                )
            })?;

            relations.push(NewTodoEntryRelation {
                todo_entry_id: new_entry_id,
                related_to_todo_entry_id: related,
                relation_type: request.relation_type.clone(),
            });
        }

        self.validate_relations(new_entry_id, &relations)?;
        Ok(relations)
    }

    /// Validates relation records declared by entry `entry_id`.
    pub fn validate_relations(
        &self,
        entry_id: TodoEntryId,
        relations: &[NewTodoEntryRelation],
    ) -> Result<(), ServiceError> {
        let mut violations = Vec::new();
        let mut seen = HashSet::new();

        for (index, relation) in relations.iter().enumerate() {
            let field = format!("relations[{index}]");
            if relation.todo_entry_id != entry_id {
                violations.push(FieldError::new(
                    field,
                    format!(
                        "relation declares todo_entry_id {} but must be {entry_id}",
                        relation.todo_entry_id
                    ),
                ));
                continue;
            }

            if relation.related_to_todo_entry_id == entry_id {
                violations.push(FieldError::new(
                    field,
                    format!("todo entry {entry_id} can not be related to itself"),
                ));
                continue;
            }

            if !self
                .relation_types
                .relation_type_exists(&relation.relation_type)?
            {
                violations.push(FieldError::new(
                    format!("{field}.relation_type"),
                    format!("unknown relation type `{}`", relation.relation_type),
                ));
                continue;
            }

            if !seen.insert((
                relation.related_to_todo_entry_id,
                relation.relation_type.as_str(),
            )) {
                violations.push(FieldError::new(
                    field,
                    format!(
                        "duplicate `{}` relation to {}",
                        relation.relation_type, relation.related_to_todo_entry_id
                    ),
                ));
            }
        }

        if !violations.is_empty() {
            return Err(ServiceError::ValidationFailed(violations));
        }

        for relation in relations {
            if !self
                .entries
                .entry_owned_by(relation.related_to_todo_entry_id, self.owner)?
            {
                return Err(ServiceError::not_found(
                    EntityKind::TodoEntry,
                    relation.related_to_todo_entry_id,
                ));
            }
        }

        Ok(())
    }

    /// Builds, validates and batch-inserts relations for `new_entry_id`.
    pub fn create_relations(
        &self,
        new_entry_id: TodoEntryId,
        requests: &[RelationRequest],
    ) -> Result<Vec<NewTodoEntryRelation>, ServiceError> {
        let relations = self.build_relations(new_entry_id, requests)?;
        self.entries.insert_relations(&relations)?;
        Ok(relations)
    }
}
