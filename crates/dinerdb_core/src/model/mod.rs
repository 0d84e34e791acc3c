//! Domain model for the customer store.
//!
//! # Responsibility
//! - Define the customer record, its read projections and lookup rows.
//! - Hold the pure helpers (association diff, page window) used by the
//!   repository layer.
//!
//! # Invariants
//! - Customer ids are assigned by the store and never reused.
//! - Association sets are sets: no duplicate ids.

pub mod association;
pub mod customer;
pub mod lookup;
pub mod page;
pub mod rating;
