//! Find-or-create resolution of label names for one list.
//!
//! # Responsibility
//! - Turn requested label names into label rows scoped to a list, reusing
//!   existing rows and creating missing ones.
//! - Hold the validation rules of a new label, shared with the explicit
//!   label-creation path.
//!
//! # Invariants
//! - Names are deduplicated case-sensitively; output keeps first-occurrence order.
//! - A lost insert race on `(name, todo_list_id)` reuses the winning row.
//! - Violations are collected across all names, then the call fails as a
//!   whole. Storage failures abort immediately.
//! - Writes made here are only durable if the caller's transaction commits.

use crate::model::list::{validate_label_name, TodoListLabel};
use crate::model::validation::FieldError;
use crate::model::{TodoListId, UserId};
use crate::repo::label_repo::LabelRepository;
use crate::repo::list_repo::TodoListRepository;
use crate::repo::RepoResult;
use crate::service::error::ServiceError;
use log::debug;
use std::collections::HashSet;
use uuid::Uuid;

/// Resolves label names against one list's label set.
pub struct LabelResolver<'r, L: LabelRepository, T: TodoListRepository> {
    labels: &'r L,
    lists: &'r T,
}

impl<'r, L: LabelRepository, T: TodoListRepository> LabelResolver<'r, L, T> {
    pub fn new(labels: &'r L, lists: &'r T) -> Self {
        Self { labels, lists }
    }

    /// Resolves `requested` names to labels of `list_id`, creating missing ones.
    ///
    /// # Errors
    /// - `ValidationFailed` with one item per offending name.
    /// - `Internal` on storage failure.
    pub fn resolve_labels(
        &self,
        list_id: TodoListId,
        owner: UserId,
        requested: &[String],
    ) -> Result<Vec<TodoListLabel>, ServiceError> {
        let names = unique_names(requested);
        let mut resolved = Vec::with_capacity(names.len());
        let mut violations = Vec::new();
        let mut created = 0usize;

        for name in names {
            if let Some(existing) = self.labels.find_label(list_id, name)? {
                resolved.push(existing);
                continue;
            }

            let errors = self.validate_new_label(list_id, owner, name)?;
            if !errors.is_empty() {
                violations.extend(errors);
                continue;
            }

            resolved.push(self.insert_or_reuse(list_id, name)?);
            created += 1;
        }

        if !violations.is_empty() {
            return Err(ServiceError::ValidationFailed(violations));
        }

        debug!(
            "event=labels_resolve module=service status=ok list_id={list_id} resolved={} created={created}",
            resolved.len()
        );
        Ok(resolved)
    }

    /// Validates a label about to be created in `list_id` on behalf of `owner`.
    ///
    /// Checks: name not blank, list exists and belongs to `owner`, name not
    /// already used in that list. Every message names the offending label.
    pub fn validate_new_label(
        &self,
        list_id: TodoListId,
        owner: UserId,
        name: &str,
    ) -> RepoResult<Vec<FieldError>> {
        let mut errors = Vec::new();
        if let Some(err) = validate_label_name(name) {
            errors.push(err);
        }

        if !self.lists.list_owned_by(list_id, owner)? {
            errors.push(FieldError::new(
                "todo_list_id",
                format!("label `{name}`: list {list_id} does not exist"),
            ));
        }

        if self.labels.label_name_taken(list_id, name)? {
            errors.push(FieldError::new(
                "labels",
                format!("label `{name}` is already taken"),
            ));
        }

        Ok(errors)
    }

    fn insert_or_reuse(
        &self,
        list_id: TodoListId,
        name: &str,
    ) -> Result<TodoListLabel, ServiceError> {
        if !self
            .labels
            .insert_label_if_absent(Uuid::new_v4(), list_id, name)?
        {
            debug!(
                "event=label_insert module=service status=conflict list_id={list_id} action=reuse"
            );
        }

        self.labels
            .find_label(list_id, name)?
            .ok_or(ServiceError::InconsistentState(
                "label missing after insert",
            ))
    }
}

/// Deduplicates names, keeping the first occurrence of each.
pub fn unique_names(names: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(String::as_str)
        .filter(|name| seen.insert(*name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::unique_names;

    #[test]
    fn unique_names_keeps_first_occurrence_order() {
        let names = ["b", "a", "b", "c", "a"].map(String::from);
        assert_eq!(unique_names(&names), vec!["b", "a", "c"]);
    }

    #[test]
    fn unique_names_is_case_sensitive() {
        let names = ["Work", "work"].map(String::from);
        assert_eq!(unique_names(&names), vec!["Work", "work"]);
    }
}
