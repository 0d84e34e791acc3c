//! Read-only accessors for reference tables.
//!
//! # Invariants
//! - Rows are ordered by display label ascending.
//! - No mutation and no pagination.

use crate::db::ConnectionSource;
use crate::model::lookup::LookupRow;
use crate::repo::customer_repo::RepoResult;
use crate::repo::statements::{ListLookupRows, LookupTable};

/// Repository interface for reference-table reads.
pub trait LookupReader {
    fn list_cuisines(&self) -> RepoResult<Vec<LookupRow>>;
    fn list_payment_methods(&self) -> RepoResult<Vec<LookupRow>>;
    fn list_dress_codes(&self) -> RepoResult<Vec<LookupRow>>;
}

/// SQLite-backed lookup reader.
pub struct SqliteLookupReader<S> {
    source: S,
}

impl<S: ConnectionSource> SqliteLookupReader<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    fn list(&self, table: LookupTable) -> RepoResult<Vec<LookupRow>> {
        let scope = self.source.acquire()?;
        let rows = ListLookupRows { table }.run(&scope)?;
        Ok(rows)
    }
}

impl<S: ConnectionSource> LookupReader for SqliteLookupReader<S> {
    fn list_cuisines(&self) -> RepoResult<Vec<LookupRow>> {
        self.list(LookupTable::Cuisine)
    }

    fn list_payment_methods(&self) -> RepoResult<Vec<LookupRow>> {
        self.list(LookupTable::PaymentMethod)
    }

    fn list_dress_codes(&self) -> RepoResult<Vec<LookupRow>> {
        self.list(LookupTable::DressCode)
    }
}
