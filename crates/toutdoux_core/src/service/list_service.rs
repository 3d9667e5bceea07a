//! List and label use-case service.
//!
//! # Responsibility
//! - Create and look up owner-scoped lists.
//! - Provide the explicit label-creation path.
//! - List entries of a list with an optional `done` filter.
//!
//! # Invariants
//! - A list not owned by the caller is reported as not found.
//! - The explicit label path never reuses an existing label; a taken name
//!   is a validation failure.

use crate::model::entry::TodoEntry;
use crate::model::list::{normalize_list_name, validate_list_name, TodoList, TodoListLabel};
use crate::model::{TodoListId, UserId};
use crate::repo::entry_repo::{EntryRepository, SqliteEntryRepository};
use crate::repo::label_repo::{LabelRepository, SqliteLabelRepository};
use crate::repo::list_repo::{SqliteTodoListRepository, TodoListRepository};
use crate::service::error::{EntityKind, ServiceError};
use crate::service::label_resolver::LabelResolver;
use log::info;
use rusqlite::Connection;
use uuid::Uuid;

/// List use-case service bound to one connection.
pub struct ListService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ListService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Creates a list; the name is trimmed and lowercased.
    pub fn create_list(&self, owner: UserId, name: &str) -> Result<TodoList, ServiceError> {
        let name = normalize_list_name(name);
        if let Some(err) = validate_list_name(&name) {
            return Err(ServiceError::ValidationFailed(vec![err]));
        }

        let lists = SqliteTodoListRepository::try_new(self.conn)?;
        let list = lists.create_list(Uuid::new_v4(), owner, &name)?;
        info!(
            "event=list_create module=service status=ok list_id={}",
            list.id
        );
        Ok(list)
    }

    pub fn get_list(&self, owner: UserId, list_id: TodoListId) -> Result<TodoList, ServiceError> {
        SqliteTodoListRepository::try_new(self.conn)?
            .find_owned_list(list_id, owner)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::TodoList, list_id))
    }

    pub fn lists_for_owner(&self, owner: UserId) -> Result<Vec<TodoList>, ServiceError> {
        Ok(SqliteTodoListRepository::try_new(self.conn)?.lists_for_owner(owner)?)
    }

    /// Creates one label in `list_id` explicitly.
    pub fn create_label(
        &self,
        owner: UserId,
        list_id: TodoListId,
        name: &str,
    ) -> Result<TodoListLabel, ServiceError> {
        let lists = SqliteTodoListRepository::try_new(self.conn)?;
        if !lists.list_owned_by(list_id, owner)? {
            return Err(ServiceError::not_found(EntityKind::TodoList, list_id));
        }

        let labels = SqliteLabelRepository::try_new(self.conn)?;
        let errors = LabelResolver::new(&labels, &lists).validate_new_label(list_id, owner, name)?;
        if !errors.is_empty() {
            return Err(ServiceError::ValidationFailed(errors));
        }

        // The unique index decides when a concurrent writer got there first.
        if let Err(err) = labels.insert_label(Uuid::new_v4(), list_id, name) {
            if err.is_unique_violation() {
                return Err(ServiceError::validation(
                    "name",
                    format!("label `{name}` is already taken"),
                ));
            }
            return Err(err.into());
        }

        let label = labels
            .find_label(list_id, name)?
            .ok_or(ServiceError::InconsistentState("created label not found"))?;
        info!(
            "event=label_create module=service status=ok list_id={list_id} label_id={}",
            label.id
        );
        Ok(label)
    }

    pub fn labels_for_list(
        &self,
        owner: UserId,
        list_id: TodoListId,
    ) -> Result<Vec<TodoListLabel>, ServiceError> {
        let lists = SqliteTodoListRepository::try_new(self.conn)?;
        if !lists.list_owned_by(list_id, owner)? {
            return Err(ServiceError::not_found(EntityKind::TodoList, list_id));
        }
        Ok(SqliteLabelRepository::try_new(self.conn)?.labels_for_list(list_id)?)
    }

    /// Lists entries of `list_id`, by priority then last update.
    pub fn list_entries(
        &self,
        owner: UserId,
        list_id: TodoListId,
        done: Option<bool>,
    ) -> Result<Vec<TodoEntry>, ServiceError> {
        let lists = SqliteTodoListRepository::try_new(self.conn)?;
        if !lists.list_owned_by(list_id, owner)? {
            return Err(ServiceError::not_found(EntityKind::TodoList, list_id));
        }
        Ok(SqliteEntryRepository::try_new(self.conn)?.list_entries(list_id, done)?)
    }
}
