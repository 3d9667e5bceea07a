//! To-do list repository: creation and owner-scoped lookups.
//!
//! # Invariants
//! - Every lookup is scoped by `(id, user_id)`; a list owned by someone else
//!   is indistinguishable from a missing one.

use crate::model::list::TodoList;
use crate::model::{TodoListId, UserId};
use crate::repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const LIST_SELECT_SQL: &str = "SELECT
    id,
    name,
    user_id,
    created_at,
    updated_at
FROM todo_lists";

/// Repository interface for lists and the list-ownership lookup.
pub trait TodoListRepository {
    /// Inserts one list row and returns it as stored.
    fn create_list(&self, id: TodoListId, owner: UserId, name: &str) -> RepoResult<TodoList>;
    /// Loads one list when it exists and belongs to `owner`.
    fn find_owned_list(&self, id: TodoListId, owner: UserId) -> RepoResult<Option<TodoList>>;
    /// Confirms existence and ownership without loading the row.
    fn list_owned_by(&self, id: TodoListId, owner: UserId) -> RepoResult<bool>;
    /// Lists all lists of one owner, by name.
    fn lists_for_owner(&self, owner: UserId) -> RepoResult<Vec<TodoList>>;
}

/// SQLite-backed list repository.
pub struct SqliteTodoListRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTodoListRepository<'conn> {
    /// Creates repository from a migrated connection or transaction.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["todo_lists"])?;
        Ok(Self::new(conn))
    }

    /// Wraps a connection already checked by the caller.
    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TodoListRepository for SqliteTodoListRepository<'_> {
    fn create_list(&self, id: TodoListId, owner: UserId, name: &str) -> RepoResult<TodoList> {
        self.conn.execute(
            "INSERT INTO todo_lists (id, name, user_id) VALUES (?1, ?2, ?3);",
            params![id.to_string(), name, owner.to_string()],
        )?;

        self.find_owned_list(id, owner)?.ok_or_else(|| {
            RepoError::InvalidData(format!("todo list {id} missing right after insert"))
        })
    }

    fn find_owned_list(&self, id: TodoListId, owner: UserId) -> RepoResult<Option<TodoList>> {
        let mut stmt = self.conn.prepare(&format!(
            "{LIST_SELECT_SQL}
             WHERE id = ?1
               AND user_id = ?2;"
        ))?;
        let mut rows = stmt.query(params![id.to_string(), owner.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_list_row(row)?));
        }
        Ok(None)
    }

    fn list_owned_by(&self, id: TodoListId, owner: UserId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM todo_lists
                WHERE id = ?1
                  AND user_id = ?2
            );",
            params![id.to_string(), owner.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn lists_for_owner(&self, owner: UserId) -> RepoResult<Vec<TodoList>> {
        let mut stmt = self.conn.prepare(&format!(
            "{LIST_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY name ASC, created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([owner.to_string()])?;
        let mut lists = Vec::new();
        while let Some(row) = rows.next()? {
            lists.push(parse_list_row(row)?);
        }
        Ok(lists)
    }
}

fn parse_list_row(row: &Row<'_>) -> RepoResult<TodoList> {
    let id_text: String = row.get("id")?;
    let user_text: String = row.get("user_id")?;
    Ok(TodoList {
        id: parse_uuid(&id_text, "todo_lists.id")?,
        name: row.get("name")?,
        user_id: parse_uuid(&user_text, "todo_lists.user_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
