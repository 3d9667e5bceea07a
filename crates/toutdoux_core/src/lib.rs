//! Core domain logic for toutdoux.
//! This crate is the single source of truth for list, label, entry and
//! relation invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{bootstrap, BootstrapError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::entry::{CreateEntryRequest, TodoEntry};
pub use model::list::{TodoList, TodoListLabel};
pub use model::relation::{RelationRequest, TodoEntryRelation, TodoEntryRelationType};
pub use model::validation::FieldError;
pub use model::{LabelId, TodoEntryId, TodoListId, UserId};
pub use repo::{RepoError, RepoResult};
pub use service::entry_service::EntryService;
pub use service::error::{EntityKind, ServiceError};
pub use service::label_resolver::LabelResolver;
pub use service::list_service::ListService;
pub use service::relation_builder::RelationBuilder;
pub use service::relation_types::{seed_relation_types, RelationTypeRegistry, RELATION_TYPE_SEED};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
