//! List label repository.
//!
//! # Responsibility
//! - Look up labels by `(name, todo_list_id)`.
//! - Insert labels either strictly or with upsert-style conflict skipping.
//!
//! # Invariants
//! - Label names are compared case-sensitively.
//! - The `UNIQUE (name, todo_list_id)` index is the source of truth for
//!   "already taken"; existence checks here are an optimization only.

use crate::model::list::TodoListLabel;
use crate::model::{LabelId, TodoListId};
use crate::repo::{ensure_connection_ready, parse_uuid, RepoResult};
use rusqlite::{params, Connection, Row};

const LABEL_SELECT_SQL: &str = "SELECT
    id,
    name,
    todo_list_id,
    created_at,
    updated_at
FROM todo_list_labels";

/// Repository interface for list labels.
pub trait LabelRepository {
    /// Finds the label named `name` in list `list_id`.
    fn find_label(&self, list_id: TodoListId, name: &str) -> RepoResult<Option<TodoListLabel>>;
    /// Returns whether `name` is already used in list `list_id`.
    fn label_name_taken(&self, list_id: TodoListId, name: &str) -> RepoResult<bool>;
    /// Inserts a label; a uniqueness conflict surfaces as an error.
    fn insert_label(&self, id: LabelId, list_id: TodoListId, name: &str) -> RepoResult<()>;
    /// Inserts a label unless `(name, list_id)` exists. Returns `true` when inserted.
    fn insert_label_if_absent(
        &self,
        id: LabelId,
        list_id: TodoListId,
        name: &str,
    ) -> RepoResult<bool>;
    /// Returns whether label `label_id` belongs to list `list_id`.
    fn label_belongs_to_list(&self, label_id: LabelId, list_id: TodoListId) -> RepoResult<bool>;
    /// Lists labels of one list ordered by name.
    fn labels_for_list(&self, list_id: TodoListId) -> RepoResult<Vec<TodoListLabel>>;
}

/// SQLite-backed label repository.
pub struct SqliteLabelRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLabelRepository<'conn> {
    /// Creates repository from a migrated connection or transaction.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["todo_lists", "todo_list_labels"])?;
        Ok(Self::new(conn))
    }

    /// Wraps a connection already checked by the caller.
    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl LabelRepository for SqliteLabelRepository<'_> {
    fn find_label(&self, list_id: TodoListId, name: &str) -> RepoResult<Option<TodoListLabel>> {
        let mut stmt = self.conn.prepare(&format!(
            "{LABEL_SELECT_SQL}
             WHERE name = ?1
               AND todo_list_id = ?2;"
        ))?;
        let mut rows = stmt.query(params![name, list_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_label_row(row)?));
        }
        Ok(None)
    }

    fn label_name_taken(&self, list_id: TodoListId, name: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM todo_list_labels
                WHERE name = ?1
                  AND todo_list_id = ?2
            );",
            params![name, list_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn insert_label(&self, id: LabelId, list_id: TodoListId, name: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO todo_list_labels (id, name, todo_list_id) VALUES (?1, ?2, ?3);",
            params![id.to_string(), name, list_id.to_string()],
        )?;
        Ok(())
    }

    fn insert_label_if_absent(
        &self,
        id: LabelId,
        list_id: TodoListId,
        name: &str,
    ) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "INSERT INTO todo_list_labels (id, name, todo_list_id)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (name, todo_list_id) DO NOTHING;",
            params![id.to_string(), name, list_id.to_string()],
        )?;
        Ok(changed == 1)
    }

    fn label_belongs_to_list(&self, label_id: LabelId, list_id: TodoListId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM todo_list_labels
                WHERE id = ?1
                  AND todo_list_id = ?2
            );",
            params![label_id.to_string(), list_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn labels_for_list(&self, list_id: TodoListId) -> RepoResult<Vec<TodoListLabel>> {
        let mut stmt = self.conn.prepare(&format!(
            "{LABEL_SELECT_SQL}
             WHERE todo_list_id = ?1
             ORDER BY name ASC;"
        ))?;
        let mut rows = stmt.query([list_id.to_string()])?;
        let mut labels = Vec::new();
        while let Some(row) = rows.next()? {
            labels.push(parse_label_row(row)?);
        }
        Ok(labels)
    }
}

pub(crate) fn parse_label_row(row: &Row<'_>) -> RepoResult<TodoListLabel> {
    let id_text: String = row.get("id")?;
    let list_text: String = row.get("todo_list_id")?;
    Ok(TodoListLabel {
        id: parse_uuid(&id_text, "todo_list_labels.id")?,
        name: row.get("name")?,
        todo_list_id: parse_uuid(&list_text, "todo_list_labels.todo_list_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
