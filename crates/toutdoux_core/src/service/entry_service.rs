//! Transactional entry creation.
//!
//! # Responsibility
//! - Create one entry together with its labels and relations, atomically.
//! - Return the canonical snapshot of what storage holds afterwards.
//!
//! # Invariants
//! - Request-shape violations fail before any storage access.
//! - Label resolution, entry insert and relation insert share one
//!   IMMEDIATE transaction; any failure drops it, rolling everything back.
//! - The returned snapshot is read back inside that transaction, so storage
//!   defaults (timestamps, `done`) are reflected exactly.
//! - Titles and label names never appear in log events.

use crate::model::entry::{validate_entry_fields, CreateEntryRequest, NewTodoEntry, TodoEntry};
use crate::model::list::TodoListLabel;
use crate::model::validation::FieldError;
use crate::model::{TodoEntryId, TodoListId, UserId};
use crate::repo::entry_repo::{EntryRepository, SqliteEntryRepository};
use crate::repo::label_repo::{LabelRepository, SqliteLabelRepository};
use crate::repo::list_repo::{SqliteTodoListRepository, TodoListRepository};
use crate::repo::relation_type_repo::SqliteRelationTypeRepository;
use crate::repo::{ensure_connection_ready, RepoResult};
use crate::service::error::{EntityKind, ServiceError};
use crate::service::label_resolver::LabelResolver;
use crate::service::relation_builder::RelationBuilder;
use log::{error, info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::time::Instant;
use uuid::Uuid;

const REQUIRED_TABLES: &[&str] = &[
    "todo_lists",
    "todo_list_labels",
    "todo_entries",
    "todo_entry_labels",
    "todo_entry_relation_types",
    "todo_entry_relations",
];

/// Entry use-case service bound to one connection.
pub struct EntryService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> EntryService<'conn> {
    /// Constructs the service from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }

    /// Creates one entry in `list_id` on behalf of `owner`.
    ///
    /// Sequence: shape validation, list ownership, label resolution, entry
    /// insert with label links, relation build and batch insert, read-back.
    ///
    /// # Errors
    /// - `ValidationFailed` when any field, label or relation is invalid.
    /// - `NotFound` when the list is not visible to `owner` or a related
    ///   entry does not exist.
    /// - `Internal` on storage failure.
    ///
    /// On every error no row written by this call remains visible.
    pub fn create_entry(
        &mut self,
        list_id: TodoListId,
        owner: UserId,
        request: &CreateEntryRequest,
    ) -> Result<TodoEntry, ServiceError> {
        let started_at = Instant::now();

        let shape_errors = validate_entry_fields(&request.title, request.priority);
        if !shape_errors.is_empty() {
            let err = ServiceError::ValidationFailed(shape_errors);
            log_create_failure(list_id, &err, started_at);
            return Err(err);
        }

        let result = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(ServiceError::from)
            .and_then(|tx| {
                let entry = create_entry_in_tx(&tx, list_id, owner, request)?;
                tx.commit()?;
                Ok(entry)
            });

        match result {
            Ok(entry) => {
                info!(
                    "event=entry_create module=service status=ok list_id={list_id} entry_id={} label_count={} relation_count={} duration_ms={}",
                    entry.id,
                    entry.labels.len(),
                    entry.relations.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(entry)
            }
            Err(err) => {
                log_create_failure(list_id, &err, started_at);
                Err(err)
            }
        }
    }

    /// Loads one entry snapshot visible to `owner`.
    pub fn get_entry(
        &self,
        owner: UserId,
        entry_id: TodoEntryId,
    ) -> Result<TodoEntry, ServiceError> {
        let conn: &Connection = &*self.conn;
        let entries = SqliteEntryRepository::new(conn);
        let lists = SqliteTodoListRepository::new(conn);

        match entries.get_entry(entry_id)? {
            Some(entry) if lists.list_owned_by(entry.todo_list_id, owner)? => Ok(entry),
            _ => Err(ServiceError::not_found(EntityKind::TodoEntry, entry_id)),
        }
    }
}

fn create_entry_in_tx(
    tx: &Transaction<'_>,
    list_id: TodoListId,
    owner: UserId,
    request: &CreateEntryRequest,
) -> Result<TodoEntry, ServiceError> {
    // Schema readiness was checked once in `EntryService::try_new`.
    let lists = SqliteTodoListRepository::new(tx);
    let labels_repo = SqliteLabelRepository::new(tx);
    let entries = SqliteEntryRepository::new(tx);
    let relation_types = SqliteRelationTypeRepository::new(tx);

    if !lists.list_owned_by(list_id, owner)? {
        return Err(ServiceError::not_found(EntityKind::TodoList, list_id));
    }

    let labels =
        LabelResolver::new(&labels_repo, &lists).resolve_labels(list_id, owner, &request.labels)?;

    let label_errors = validate_entry_labels(&labels_repo, list_id, &labels)?;
    if !label_errors.is_empty() {
        return Err(ServiceError::ValidationFailed(label_errors));
    }

    let entry = NewTodoEntry {
        id: request.entry_id.unwrap_or_else(Uuid::new_v4),
        todo_list_id: list_id,
        title: request.title.clone(),
        priority: request.priority,
        done: false,
        due_date: request.due_date,
    };
    if request.entry_id.is_some() && entries.entry_exists(entry.id)? {
        return Err(ServiceError::validation(
            "id",
            format!("todo entry {} already exists", entry.id),
        ));
    }

    let label_ids: Vec<_> = labels.iter().map(|label| label.id).collect();
    entries.insert_entry(&entry, &label_ids)?;

    RelationBuilder::new(&entries, &relation_types, owner)
        .create_relations(entry.id, &request.relations)?;

    entries
        .get_entry(entry.id)?
        .ok_or(ServiceError::InconsistentState(
            "created entry not found in read-back",
        ))
}

/// Checks that every label attached to a new entry belongs to `list_id`.
pub fn validate_entry_labels<L: LabelRepository>(
    labels_repo: &L,
    list_id: TodoListId,
    labels: &[TodoListLabel],
) -> RepoResult<Vec<FieldError>> {
    let mut errors = Vec::new();
    for label in labels {
        if !labels_repo.label_belongs_to_list(label.id, list_id)? {
            errors.push(FieldError::new(
                "labels",
                format!("todo_list_label {} not found in list {list_id}", label.id),
            ));
        }
    }
    Ok(errors)
}

fn log_create_failure(list_id: TodoListId, err: &ServiceError, started_at: Instant) {
    match err {
        ServiceError::Internal(_) | ServiceError::InconsistentState(_) => error!(
            "event=entry_create module=service status=error list_id={list_id} error_code={} duration_ms={} error={err}",
            err.code(),
            started_at.elapsed().as_millis()
        ),
        _ => warn!(
            "event=entry_create module=service status=rejected list_id={list_id} error_code={} violations={} duration_ms={}",
            err.code(),
            err.field_errors().len(),
            started_at.elapsed().as_millis()
        ),
    }
}
