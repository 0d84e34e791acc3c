//! Customer use-case service.
//!
//! # Responsibility
//! - Provide stable entry points for callers above the repository.
//! - Build page envelopes whose total and items come from one snapshot.
//!
//! # Invariants
//! - Service APIs never bypass repository validation.
//! - Service layer remains storage-agnostic.

use crate::model::association::AssociationDelta;
use crate::model::customer::{Customer, CustomerId, CustomerRecord, CustomerSummary, IdSet};
use crate::model::page::{page_arg, page_count};
use crate::repo::customer_repo::{CustomerRepository, RepoResult, SyncReport};
use serde::{Deserialize, Serialize};

/// One page of customers plus totals for pager rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerPage {
    pub items: Vec<CustomerSummary>,
    pub total: u64,
    pub page: i64,
    pub page_size: i64,
    pub page_count: u64,
}

/// Use-case service wrapper for customer operations.
pub struct CustomerService<R: CustomerRepository> {
    repo: R,
}

impl<R: CustomerRepository> CustomerService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn create_customer(
        &self,
        customer: &Customer,
        cuisine_ids: &IdSet,
        payment_method_ids: &IdSet,
    ) -> RepoResult<CustomerId> {
        self.repo
            .create_customer(customer, cuisine_ids, payment_method_ids)
    }

    pub fn get_customer(&self, id: CustomerId) -> RepoResult<CustomerRecord> {
        self.repo.get_customer(id)
    }

    /// Loads one page and the total count in the same transaction.
    ///
    /// Page arguments are validated by the repository.
    pub fn customer_page(&self, page: i64, page_size: i64) -> RepoResult<CustomerPage> {
        self.repo.within_unit_of_work(|repo| {
            let items = repo.list_customers(page, page_size)?;
            let total = repo.count_customers()?;
            // list_customers has already rejected non-positive sizes.
            let pages = page_arg(page_size).map_or(0, |size| page_count(total, size));
            Ok(CustomerPage {
                items,
                total,
                page,
                page_size,
                page_count: pages,
            })
        })
    }

    pub fn list_all_customers(&self) -> RepoResult<Vec<CustomerSummary>> {
        self.repo.list_all_customers()
    }

    pub fn update_customer(
        &self,
        id: CustomerId,
        customer: &Customer,
        cuisine_ids: &IdSet,
        payment_method_ids: &IdSet,
    ) -> RepoResult<SyncReport> {
        self.repo
            .update_customer(id, customer, cuisine_ids, payment_method_ids)
    }

    /// Edit flow for callers that send added/removed lists.
    pub fn edit_customer(
        &self,
        id: CustomerId,
        customer: &Customer,
        cuisine_delta: &AssociationDelta,
        payment_method_delta: &AssociationDelta,
    ) -> RepoResult<SyncReport> {
        self.repo
            .apply_customer_delta(id, customer, cuisine_delta, payment_method_delta)
    }

    pub fn delete_customer(&self, id: CustomerId) -> RepoResult<()> {
        self.repo.delete_customer(id)
    }
}
