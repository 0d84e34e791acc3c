//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite statements from service orchestration.
//!
//! # Invariants
//! - Repository writes validate input before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `Validation`) in
//!   addition to storage errors.

pub mod customer_repo;
pub mod lookup_repo;
pub mod rating_link;
pub mod statements;
