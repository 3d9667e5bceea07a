//! Entry repository: entry rows, label links and relation edges.
//!
//! # Responsibility
//! - Insert entries together with their ordered label links.
//! - Batch-insert relation edges with all-or-nothing semantics.
//! - Read entries back with labels and relations eagerly loaded.
//!
//! # Invariants
//! - Multi-row writes run under a savepoint: either every row lands or none.
//! - Label links keep the attachment order via `position`.
//! - Relations are read back in insertion order.

use crate::model::entry::{NewTodoEntry, TodoEntry};
use crate::model::list::TodoListLabel;
use crate::model::relation::{NewTodoEntryRelation, TodoEntryRelation};
use crate::model::{LabelId, TodoEntryId, TodoListId, UserId};
use crate::repo::label_repo::parse_label_row;
use crate::repo::{
    bool_to_int, ensure_connection_ready, parse_bool, parse_uuid, RepoError, RepoResult,
};
use log::warn;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const ENTRY_SELECT_SQL: &str = "SELECT
    id,
    todo_list_id,
    title,
    priority,
    done,
    due_date,
    created_at,
    updated_at
FROM todo_entries";

/// Repository interface for entries and their outgoing relations.
pub trait EntryRepository {
    /// Inserts one entry and links `label_ids` in the given order.
    fn insert_entry(&self, entry: &NewTodoEntry, label_ids: &[LabelId]) -> RepoResult<()>;
    /// Returns whether an entry with `id` exists.
    fn entry_exists(&self, id: TodoEntryId) -> RepoResult<bool>;
    /// Returns whether entry `id` lives in a list owned by `owner`.
    fn entry_owned_by(&self, id: TodoEntryId, owner: UserId) -> RepoResult<bool>;
    /// Loads one entry with labels and relations.
    fn get_entry(&self, id: TodoEntryId) -> RepoResult<Option<TodoEntry>>;
    /// Lists entries of one list, optionally filtered by `done`.
    fn list_entries(&self, list_id: TodoListId, done: Option<bool>) -> RepoResult<Vec<TodoEntry>>;
    /// Inserts every relation or none of them.
    fn insert_relations(&self, relations: &[NewTodoEntryRelation]) -> RepoResult<()>;
}

/// SQLite-backed entry repository.
pub struct SqliteEntryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntryRepository<'conn> {
    /// Creates repository from a migrated connection or transaction.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                "todo_lists",
                "todo_entries",
                "todo_entry_labels",
                "todo_list_labels",
                "todo_entry_relations",
            ],
        )?;
        Ok(Self::new(conn))
    }

    /// Wraps a connection already checked by the caller.
    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EntryRepository for SqliteEntryRepository<'_> {
    fn insert_entry(&self, entry: &NewTodoEntry, label_ids: &[LabelId]) -> RepoResult<()> {
        with_savepoint(self.conn, "insert_entry", || {
            self.conn.execute(
                "INSERT INTO todo_entries (
                    id,
                    todo_list_id,
                    title,
                    priority,
                    done,
                    due_date
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    entry.id.to_string(),
                    entry.todo_list_id.to_string(),
                    entry.title.as_str(),
                    entry.priority,
                    bool_to_int(entry.done),
                    entry.due_date,
                ],
            )?;

            let mut stmt = self.conn.prepare(
                "INSERT INTO todo_entry_labels (todo_entry_id, todo_list_label_id, position)
                 VALUES (?1, ?2, ?3);",
            )?;
            for (position, label_id) in label_ids.iter().enumerate() {
                stmt.execute(params![
                    entry.id.to_string(),
                    label_id.to_string(),
                    position as i64,
                ])?;
            }
            Ok(())
        })
    }

    fn entry_exists(&self, id: TodoEntryId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM todo_entries WHERE id = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn entry_owned_by(&self, id: TodoEntryId, owner: UserId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM todo_entries e
                INNER JOIN todo_lists l ON l.id = e.todo_list_id
                WHERE e.id = ?1
                  AND l.user_id = ?2
            );",
            params![id.to_string(), owner.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn get_entry(&self, id: TodoEntryId) -> RepoResult<Option<TodoEntry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ENTRY_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            let mut entry = parse_entry_row(row)?;
            load_associations(self.conn, &mut entry)?;
            return Ok(Some(entry));
        }
        Ok(None)
    }

    fn list_entries(&self, list_id: TodoListId, done: Option<bool>) -> RepoResult<Vec<TodoEntry>> {
        let mut sql = format!("{ENTRY_SELECT_SQL} WHERE todo_list_id = ?");
        let mut bind_values = vec![Value::Text(list_id.to_string())];
        if let Some(done) = done {
            sql.push_str(" AND done = ?");
            bind_values.push(Value::Integer(bool_to_int(done)));
        }
        sql.push_str(" ORDER BY priority ASC, updated_at ASC, id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }
        for entry in &mut entries {
            load_associations(self.conn, entry)?;
        }
        Ok(entries)
    }

    fn insert_relations(&self, relations: &[NewTodoEntryRelation]) -> RepoResult<()> {
        if relations.is_empty() {
            return Ok(());
        }

        with_savepoint(self.conn, "insert_relations", || {
            let mut stmt = self.conn.prepare(
                "INSERT INTO todo_entry_relations (
                    todo_entry_id,
                    related_to_todo_entry_id,
                    relation_type
                ) VALUES (?1, ?2, ?3);",
            )?;
            for relation in relations {
                stmt.execute(params![
                    relation.todo_entry_id.to_string(),
                    relation.related_to_todo_entry_id.to_string(),
                    relation.relation_type.as_str(),
                ])?;
            }
            Ok(())
        })
    }
}

/// Runs `work` inside a named savepoint, rolling back to it on failure.
///
/// Works both on a bare connection and inside an open transaction.
fn with_savepoint<T>(
    conn: &Connection,
    name: &'static str,
    work: impl FnOnce() -> RepoResult<T>,
) -> RepoResult<T> {
    conn.execute_batch(&format!("SAVEPOINT {name};"))?;
    match work() {
        Ok(value) => {
            conn.execute_batch(&format!("RELEASE {name};"))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) =
                conn.execute_batch(&format!("ROLLBACK TO {name}; RELEASE {name};"))
            {
                warn!(
                    "event=savepoint_rollback module=repo status=error savepoint={name} error={rollback_err}"
                );
            }
            Err(err)
        }
    }
}

fn load_associations(conn: &Connection, entry: &mut TodoEntry) -> RepoResult<()> {
    entry.labels = load_labels_for_entry(conn, entry.id)?;
    entry.relations = load_relations_for_entry(conn, entry.id)?;
    Ok(())
}

fn load_labels_for_entry(conn: &Connection, id: TodoEntryId) -> RepoResult<Vec<TodoListLabel>> {
    let mut stmt = conn.prepare(
        "SELECT
            l.id AS id,
            l.name AS name,
            l.todo_list_id AS todo_list_id,
            l.created_at AS created_at,
            l.updated_at AS updated_at
         FROM todo_entry_labels el
         INNER JOIN todo_list_labels l ON l.id = el.todo_list_label_id
         WHERE el.todo_entry_id = ?1
         ORDER BY el.position ASC;",
    )?;
    let mut rows = stmt.query([id.to_string()])?;
    let mut labels = Vec::new();
    while let Some(row) = rows.next()? {
        labels.push(parse_label_row(row)?);
    }
    Ok(labels)
}

fn load_relations_for_entry(
    conn: &Connection,
    id: TodoEntryId,
) -> RepoResult<Vec<TodoEntryRelation>> {
    let mut stmt = conn.prepare(
        "SELECT
            todo_entry_id,
            related_to_todo_entry_id,
            relation_type,
            created_at,
            updated_at
         FROM todo_entry_relations
         WHERE todo_entry_id = ?1
         ORDER BY rowid ASC;",
    )?;
    let mut rows = stmt.query([id.to_string()])?;
    let mut relations = Vec::new();
    while let Some(row) = rows.next()? {
        let from_text: String = row.get("todo_entry_id")?;
        let to_text: String = row.get("related_to_todo_entry_id")?;
        relations.push(TodoEntryRelation {
            todo_entry_id: parse_uuid(&from_text, "todo_entry_relations.todo_entry_id")?,
            related_to_todo_entry_id: parse_uuid(
                &to_text,
                "todo_entry_relations.related_to_todo_entry_id",
            )?,
            relation_type: row.get("relation_type")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        });
    }
    Ok(relations)
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<TodoEntry> {
    let id_text: String = row.get("id")?;
    let list_text: String = row.get("todo_list_id")?;
    let priority: i64 = row.get("priority")?;
    if priority <= 0 {
        return Err(RepoError::InvalidData(format!(
            "invalid priority `{priority}` in todo_entries.priority"
        )));
    }

    Ok(TodoEntry {
        id: parse_uuid(&id_text, "todo_entries.id")?,
        todo_list_id: parse_uuid(&list_text, "todo_entries.todo_list_id")?,
        title: row.get("title")?,
        priority,
        done: parse_bool(row.get("done")?, "todo_entries.done")?,
        due_date: row.get("due_date")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        labels: Vec::new(),
        relations: Vec::new(),
    })
}
