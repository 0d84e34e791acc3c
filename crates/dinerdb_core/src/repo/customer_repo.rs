//! Customer repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/read/update/delete/count APIs over `Customer` and its
//!   two association tables.
//! - Run every multi-statement operation as one unit of work.
//!
//! # Invariants
//! - Write paths validate input before any statement is issued.
//! - Association sets are reconciled by diff against the stored state read
//!   inside the same transaction; removals run before additions.
//! - Delete clears rating back-references before removing any row, and is
//!   a no-op for unknown ids.
//! - Concurrent updates of the same customer are not serialized beyond the
//!   store's own locking: the last commit wins on scalar fields.

use crate::db::{ConnectionSource, DbError};
use crate::model::association::{AssociationDelta, AssociationDiff};
use crate::model::customer::{
    validate_customer_id, validate_id_set, Customer, CustomerId, CustomerRecord, CustomerSummary,
    IdSet, ValidationError,
};
use crate::model::page::{page_arg, PageWindow};
use crate::repo::rating_link::detach_customer;
use crate::repo::statements::{
    AssociationRow, AssociationTable, CountCustomers, CustomerRow, DeleteAssociations,
    DeleteCustomer, InsertCustomer, ListCustomers, SelectAssociationIds, SelectCustomer,
    UpdateCustomer,
};
use log::{debug, warn};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for customer persistence and lookup reads.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    NotFound(CustomerId),
    Db(DbError),
    InvalidData(String),
}

/// Coarse error class for callers that map failures to responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Storage,
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Db(_) | Self::InvalidData(_) => ErrorKind::Storage,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "customer not found: {id}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted customer data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Association diffs applied by one update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub cuisines: AssociationDiff,
    pub payment_methods: AssociationDiff,
}

impl SyncReport {
    /// True when neither association set changed.
    pub fn is_noop(&self) -> bool {
        self.cuisines.is_empty() && self.payment_methods.is_empty()
    }
}

/// Repository interface for customer operations.
pub trait CustomerRepository {
    /// Inserts one customer with its initial association sets.
    fn create_customer(
        &self,
        customer: &Customer,
        cuisine_ids: &IdSet,
        payment_method_ids: &IdSet,
    ) -> RepoResult<CustomerId>;
    /// Loads one customer with both association sets.
    fn get_customer(&self, id: CustomerId) -> RepoResult<CustomerRecord>;
    /// Lists one 1-indexed page ordered by name.
    fn list_customers(&self, page: i64, page_size: i64) -> RepoResult<Vec<CustomerSummary>>;
    /// Lists every customer ordered by name.
    fn list_all_customers(&self) -> RepoResult<Vec<CustomerSummary>>;
    fn count_customers(&self) -> RepoResult<u64>;
    /// Overwrites scalars and moves both association sets to the desired sets.
    fn update_customer(
        &self,
        id: CustomerId,
        customer: &Customer,
        desired_cuisine_ids: &IdSet,
        desired_payment_method_ids: &IdSet,
    ) -> RepoResult<SyncReport>;
    /// Overwrites scalars and applies caller deltas checked against stored sets.
    fn apply_customer_delta(
        &self,
        id: CustomerId,
        customer: &Customer,
        cuisine_delta: &AssociationDelta,
        payment_method_delta: &AssociationDelta,
    ) -> RepoResult<SyncReport>;
    /// Deletes one customer and its association rows; clears rating links.
    fn delete_customer(&self, id: CustomerId) -> RepoResult<()>;
    /// Runs several repository calls in one transaction on one connection.
    fn within_unit_of_work<T, F>(&self, work: F) -> RepoResult<T>
    where
        F: FnOnce(&Self) -> RepoResult<T>,
        Self: Sized;
}

/// SQLite-backed customer repository.
pub struct SqliteCustomerRepository<S> {
    source: S,
}

impl<S: ConnectionSource> SqliteCustomerRepository<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: ConnectionSource> CustomerRepository for SqliteCustomerRepository<S> {
    fn create_customer(
        &self,
        customer: &Customer,
        cuisine_ids: &IdSet,
        payment_method_ids: &IdSet,
    ) -> RepoResult<CustomerId> {
        customer.validate()?;
        validate_id_set("cuisine_ids", cuisine_ids)?;
        validate_id_set("payment_method_ids", payment_method_ids)?;

        let started_at = Instant::now();
        let scope = self.source.acquire()?;
        let result: RepoResult<CustomerId> = scope.unit_of_work(|conn| {
            let id = InsertCustomer { customer }.run(conn)?;
            insert_associations(conn, AssociationTable::Cuisine, id, cuisine_ids)?;
            insert_associations(conn, AssociationTable::PaymentMethod, id, payment_method_ids)?;
            Ok(id)
        });

        match &result {
            Ok(id) => debug!(
                "event=customer_create module=repo status=ok customer_id={} cuisines={} payment_methods={} duration_ms={}",
                id,
                cuisine_ids.len(),
                payment_method_ids.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure("customer_create", None, started_at, err),
        }
        result
    }

    fn get_customer(&self, id: CustomerId) -> RepoResult<CustomerRecord> {
        validate_customer_id(id)?;

        let scope = self.source.acquire()?;
        scope.unit_of_work(|conn| {
            let row = SelectCustomer { id }
                .run(conn)?
                .ok_or(RepoError::NotFound(id))?;
            Ok(CustomerRecord {
                id,
                customer: parse_customer_row(id, row)?,
                cuisine_ids: load_association_ids(conn, AssociationTable::Cuisine, id)?,
                payment_method_ids: load_association_ids(
                    conn,
                    AssociationTable::PaymentMethod,
                    id,
                )?,
            })
        })
    }

    fn list_customers(&self, page: i64, page_size: i64) -> RepoResult<Vec<CustomerSummary>> {
        let window = page_window(page, page_size)?;
        let scope = self.source.acquire()?;
        let rows = ListCustomers {
            window: Some(window),
        }
        .run(&scope)?;
        Ok(rows)
    }

    fn list_all_customers(&self) -> RepoResult<Vec<CustomerSummary>> {
        let scope = self.source.acquire()?;
        let rows = ListCustomers { window: None }.run(&scope)?;
        Ok(rows)
    }

    fn count_customers(&self) -> RepoResult<u64> {
        let scope = self.source.acquire()?;
        let count = CountCustomers.run(&scope)?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative customer count `{count}`")))
    }

    fn update_customer(
        &self,
        id: CustomerId,
        customer: &Customer,
        desired_cuisine_ids: &IdSet,
        desired_payment_method_ids: &IdSet,
    ) -> RepoResult<SyncReport> {
        validate_customer_id(id)?;
        customer.validate()?;
        validate_id_set("cuisine_ids", desired_cuisine_ids)?;
        validate_id_set("payment_method_ids", desired_payment_method_ids)?;

        self.write_customer("customer_update", id, customer, |table, _current| {
            match table {
                AssociationTable::Cuisine => desired_cuisine_ids.clone(),
                AssociationTable::PaymentMethod => desired_payment_method_ids.clone(),
            }
        })
    }

    fn apply_customer_delta(
        &self,
        id: CustomerId,
        customer: &Customer,
        cuisine_delta: &AssociationDelta,
        payment_method_delta: &AssociationDelta,
    ) -> RepoResult<SyncReport> {
        validate_customer_id(id)?;
        customer.validate()?;
        validate_id_set("cuisine_ids", &cuisine_delta.added)?;
        validate_id_set("cuisine_ids", &cuisine_delta.removed)?;
        validate_id_set("payment_method_ids", &payment_method_delta.added)?;
        validate_id_set("payment_method_ids", &payment_method_delta.removed)?;

        self.write_customer("customer_delta", id, customer, |table, current| match table {
            AssociationTable::Cuisine => cuisine_delta.desired_from(current),
            AssociationTable::PaymentMethod => payment_method_delta.desired_from(current),
        })
    }

    fn delete_customer(&self, id: CustomerId) -> RepoResult<()> {
        validate_customer_id(id)?;

        let started_at = Instant::now();
        let scope = self.source.acquire()?;
        let result: RepoResult<(usize, usize, usize, usize)> = scope.unit_of_work(|conn| {
            let detached = detach_customer(conn, id)?;
            let cuisines = DeleteAssociations {
                table: AssociationTable::Cuisine,
                customer_id: id,
            }
            .run(conn)?;
            let payment_methods = DeleteAssociations {
                table: AssociationTable::PaymentMethod,
                customer_id: id,
            }
            .run(conn)?;
            let deleted = DeleteCustomer { id }.run(conn)?;
            Ok((detached, cuisines, payment_methods, deleted))
        });

        match result {
            Ok((detached, cuisines, payment_methods, deleted)) => {
                debug!(
                    "event=customer_delete module=repo status=ok customer_id={} found={} ratings_detached={} cuisines={} payment_methods={} duration_ms={}",
                    id,
                    deleted > 0,
                    detached,
                    cuisines,
                    payment_methods,
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                log_failure("customer_delete", Some(id), started_at, &err);
                Err(err)
            }
        }
    }

    fn within_unit_of_work<T, F>(&self, work: F) -> RepoResult<T>
    where
        F: FnOnce(&Self) -> RepoResult<T>,
    {
        let scope = self.source.acquire()?;
        scope.unit_of_work(|_| work(self))
    }
}

impl<S: ConnectionSource> SqliteCustomerRepository<S> {
    /// Shared update path: overwrite scalars, then reconcile each
    /// association set against the desired set chosen by `desired_for`.
    fn write_customer<F>(
        &self,
        event: &str,
        id: CustomerId,
        customer: &Customer,
        desired_for: F,
    ) -> RepoResult<SyncReport>
    where
        F: Fn(AssociationTable, &IdSet) -> IdSet,
    {
        let started_at = Instant::now();
        let scope = self.source.acquire()?;
        let result: RepoResult<SyncReport> = scope.unit_of_work(|conn| {
            let changed = UpdateCustomer { id, customer }.run(conn)?;
            if changed == 0 {
                return Err(RepoError::NotFound(id));
            }
            let cuisines = sync_associations(conn, AssociationTable::Cuisine, id, &desired_for)?;
            let payment_methods =
                sync_associations(conn, AssociationTable::PaymentMethod, id, &desired_for)?;
            Ok(SyncReport {
                cuisines,
                payment_methods,
            })
        });

        match &result {
            Ok(report) => debug!(
                "event={} module=repo status=ok customer_id={} cuisines_added={} cuisines_removed={} payment_methods_added={} payment_methods_removed={} duration_ms={}",
                event,
                id,
                report.cuisines.to_add.len(),
                report.cuisines.to_remove.len(),
                report.payment_methods.to_add.len(),
                report.payment_methods.to_remove.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure(event, Some(id), started_at, err),
        }
        result
    }
}

fn sync_associations<F>(
    conn: &Connection,
    table: AssociationTable,
    customer_id: CustomerId,
    desired_for: &F,
) -> RepoResult<AssociationDiff>
where
    F: Fn(AssociationTable, &IdSet) -> IdSet,
{
    let current = load_association_ids(conn, table, customer_id)?;
    let diff = AssociationDiff::between(&current, &desired_for(table, &current));

    // Removals first so a re-added id never meets a stale row.
    for &target_id in &diff.to_remove {
        AssociationRow {
            table,
            customer_id,
            target_id,
        }
        .delete(conn)?;
    }
    insert_associations(conn, table, customer_id, &diff.to_add)?;
    Ok(diff)
}

fn insert_associations(
    conn: &Connection,
    table: AssociationTable,
    customer_id: CustomerId,
    ids: &IdSet,
) -> RepoResult<()> {
    for &target_id in ids {
        AssociationRow {
            table,
            customer_id,
            target_id,
        }
        .insert(conn)?;
    }
    Ok(())
}

fn load_association_ids(
    conn: &Connection,
    table: AssociationTable,
    customer_id: CustomerId,
) -> RepoResult<IdSet> {
    let ids = SelectAssociationIds { table, customer_id }.run(conn)?;
    Ok(ids)
}

fn page_window(page: i64, page_size: i64) -> RepoResult<PageWindow> {
    match (page_arg(page), page_arg(page_size)) {
        (Some(page), Some(size)) => Ok(PageWindow::for_page(page, size)),
        _ => Err(ValidationError::InvalidPage { page, page_size }.into()),
    }
}

fn parse_customer_row(id: CustomerId, row: CustomerRow) -> RepoResult<Customer> {
    let smoker = match row.smoker {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid smoker value `{other}` in Customer.smoker for customer {id}"
            )));
        }
    };

    Ok(Customer {
        name: row.name,
        smoker,
        drink_level: row.drink_level,
        ambience: row.ambience,
        dress_code_id: row.dress_code_id,
        budget: row.budget,
    })
}

fn log_failure(event: &str, id: Option<CustomerId>, started_at: Instant, err: &RepoError) {
    let customer_id = id.map_or_else(|| "none".to_string(), |id| id.to_string());
    warn!(
        "event={} module=repo status=error customer_id={} kind={:?} duration_ms={} error={}",
        event,
        customer_id,
        err.kind(),
        started_at.elapsed().as_millis(),
        err
    );
}
