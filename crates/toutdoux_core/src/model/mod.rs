//! Domain model for lists, labels, entries and entry relations.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Hold the field-level validation rules shared by every write path.
//!
//! # Invariants
//! - Every persisted object is identified by a stable UUID.
//! - Labels are scoped to exactly one list; entries belong to exactly one list.
//! - Relations are directed and always outgoing from the entry that declares them.

pub mod entry;
pub mod list;
pub mod relation;
pub mod validation;

use uuid::Uuid;

/// Opaque identifier of the authenticated owner, supplied per request.
pub type UserId = Uuid;
/// Stable identifier of a to-do list.
pub type TodoListId = Uuid;
/// Stable identifier of a list label.
pub type LabelId = Uuid;
/// Stable identifier of a to-do entry.
pub type TodoEntryId = Uuid;
