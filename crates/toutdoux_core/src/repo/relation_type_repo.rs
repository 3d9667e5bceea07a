//! Relation type repository.

use crate::model::relation::TodoEntryRelationType;
use crate::repo::{ensure_connection_ready, parse_uuid, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const RELATION_TYPE_SELECT_SQL: &str = "SELECT
    id,
    name,
    reverse_name,
    created_at,
    updated_at
FROM todo_entry_relation_types";

/// Repository interface for the relation type vocabulary.
pub trait RelationTypeRepository {
    fn relation_type_exists(&self, name: &str) -> RepoResult<bool>;
    fn find_relation_type(&self, name: &str) -> RepoResult<Option<TodoEntryRelationType>>;
    /// Inserts one type unless the name exists; returns whether a row was added.
    fn insert_relation_type(&self, name: &str, reverse_name: &str) -> RepoResult<bool>;
    /// Lists every relation type ordered by name.
    fn list_relation_types(&self) -> RepoResult<Vec<TodoEntryRelationType>>;
}

/// SQLite-backed relation type repository.
pub struct SqliteRelationTypeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRelationTypeRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["todo_entry_relation_types"])?;
        Ok(Self::new(conn))
    }

    /// Wraps a connection already checked by the caller.
    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RelationTypeRepository for SqliteRelationTypeRepository<'_> {
    fn relation_type_exists(&self, name: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM todo_entry_relation_types WHERE name = ?1);",
            [name],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn find_relation_type(&self, name: &str) -> RepoResult<Option<TodoEntryRelationType>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RELATION_TYPE_SELECT_SQL} WHERE name = ?1;"))?;
        let mut rows = stmt.query([name])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_relation_type_row(row)?));
        }
        Ok(None)
    }

    fn insert_relation_type(&self, name: &str, reverse_name: &str) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "INSERT INTO todo_entry_relation_types (id, name, reverse_name)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (name) DO NOTHING;",
            params![Uuid::new_v4().to_string(), name, reverse_name],
        )?;
        Ok(changed == 1)
    }

    fn list_relation_types(&self) -> RepoResult<Vec<TodoEntryRelationType>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RELATION_TYPE_SELECT_SQL} ORDER BY name ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut types = Vec::new();
        while let Some(row) = rows.next()? {
            types.push(parse_relation_type_row(row)?);
        }
        Ok(types)
    }
}

fn parse_relation_type_row(row: &Row<'_>) -> RepoResult<TodoEntryRelationType> {
    let id_text: String = row.get("id")?;
    Ok(TodoEntryRelationType {
        id: parse_uuid(&id_text, "todo_entry_relation_types.id")?,
        name: row.get("name")?,
        reverse_name: row.get("reverse_name")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
