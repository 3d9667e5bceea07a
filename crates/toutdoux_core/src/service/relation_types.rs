//! Relation type registry.
//!
//! # Responsibility
//! - Seed the fixed vocabulary of directed relation kinds at bootstrap.
//! - Answer "is this a known relation kind" and "what is its reciprocal".
//!
//! # Invariants
//! - Seeding is idempotent: names that already exist are skipped.
//! - Seeding takes the write lock up front, so concurrent bootstraps queue
//!   on the busy timeout instead of failing on lock upgrade.
//! - The vocabulary is read-only at runtime; nothing deletes relation types.
//! - Relation requests naming an unregistered kind are rejected.

use crate::model::relation::TodoEntryRelationType;
use crate::repo::relation_type_repo::{RelationTypeRepository, SqliteRelationTypeRepository};
use crate::repo::RepoResult;
use log::info;
use rusqlite::{Connection, TransactionBehavior};

/// Directed `(name, reverse_name)` pairs seeded on every bootstrap.
pub const RELATION_TYPE_SEED: &[(&str, &str)] = &[
    ("related to", "related to"),
    ("blocked by", "blocking"),
    ("blocking", "blocked by"),
    ("precedes", "follows"),
    ("follows", "precedes"),
];

/// Seeds the relation type vocabulary in one transaction.
///
/// Returns how many types were inserted; `0` on an already seeded store.
pub fn seed_relation_types(conn: &mut Connection) -> RepoResult<usize> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let inserted = {
        let repo = SqliteRelationTypeRepository::try_new(&tx)?;
        RelationTypeRegistry::new(repo).seed()?
    };
    tx.commit()?;

    info!(
        "event=relation_types_seed module=service status=ok inserted={inserted} known={}",
        RELATION_TYPE_SEED.len()
    );
    Ok(inserted)
}

/// Read/seed facade over a relation type repository.
pub struct RelationTypeRegistry<R: RelationTypeRepository> {
    repo: R,
}

impl<R: RelationTypeRepository> RelationTypeRegistry<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Inserts every seed pair whose name is not yet present.
    pub fn seed(&self) -> RepoResult<usize> {
        let mut inserted = 0;
        for (name, reverse_name) in RELATION_TYPE_SEED {
            if self.repo.relation_type_exists(name)? {
                continue;
            }
            if self.repo.insert_relation_type(name, reverse_name)? {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    pub fn is_known(&self, name: &str) -> RepoResult<bool> {
        self.repo.relation_type_exists(name)
    }

    /// Returns the reciprocal name, e.g. `blocking` for `blocked by`.
    pub fn reverse_name(&self, name: &str) -> RepoResult<Option<String>> {
        Ok(self
            .repo
            .find_relation_type(name)?
            .map(|relation_type| relation_type.reverse_name))
    }

    pub fn list(&self) -> RepoResult<Vec<TodoEntryRelationType>> {
        self.repo.list_relation_types()
    }
}
