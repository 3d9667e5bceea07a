//! Tagged failure type shared by the use-case services.
//!
//! A failed call is exactly one of: a list of violated constraints, a missing
//! referenced object, or an internal storage failure. Callers map these to
//! their own transport (HTTP status, CLI exit code, ...).

use crate::db::DbError;
use crate::model::validation::{join_field_errors, FieldError};
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Kind of object a `NotFound` failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    TodoList,
    TodoEntry,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TodoList => write!(f, "todo list"),
            Self::TodoEntry => write!(f, "todo entry"),
        }
    }
}

/// Service-level failure.
#[derive(Debug)]
pub enum ServiceError {
    /// One entry per violated constraint; reported to the caller verbatim.
    ValidationFailed(Vec<FieldError>),
    /// A referenced list or entry does not exist (or is not visible to the owner).
    NotFound { kind: EntityKind, id: String },
    /// Storage failure; not detailed to end users.
    Internal(RepoError),
    /// Write succeeded but read-back disagrees with it.
    InconsistentState(&'static str),
}

impl ServiceError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationFailed(vec![FieldError::new(field, message)])
    }

    pub fn not_found(kind: EntityKind, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Returns the violation list for `ValidationFailed`, empty otherwise.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::ValidationFailed(errors) => errors,
            _ => &[],
        }
    }

    /// Stable short code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ValidationFailed(_) => "validation_failed",
            Self::NotFound { .. } => "not_found",
            Self::Internal(_) => "internal",
            Self::InconsistentState(_) => "inconsistent_state",
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ValidationFailed(errors) => {
                write!(f, "invalid values: {}", join_field_errors(errors))
            }
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Internal(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Internal(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Internal(value)
    }
}

impl From<DbError> for ServiceError {
    fn from(value: DbError) -> Self {
        Self::Internal(RepoError::Db(value))
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Internal(RepoError::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::{EntityKind, ServiceError};

    #[test]
    fn not_found_names_kind_and_id() {
        let err = ServiceError::not_found(EntityKind::TodoEntry, "abc");
        assert_eq!(err.to_string(), "todo entry not found: abc");
        assert_eq!(err.code(), "not_found");
        assert!(err.field_errors().is_empty());
    }

    #[test]
    fn validation_lists_every_violation() {
        let err = ServiceError::validation("title", "title can not be blank");
        assert_eq!(err.field_errors().len(), 1);
        assert!(err.to_string().contains("title can not be blank"));
    }
}
