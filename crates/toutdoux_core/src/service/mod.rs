//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep callers (HTTP, CLI) decoupled from storage details.
//!
//! # Invariants
//! - Request-scoped values (owner, list, transaction) are passed explicitly.
//! - Services report failures through `ServiceError` only.

pub mod entry_service;
pub mod error;
pub mod label_resolver;
pub mod list_service;
pub mod relation_builder;
pub mod relation_types;
