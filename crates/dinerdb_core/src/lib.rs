//! Core persistence layer for dinerdb customers.
//! This crate is the single source of truth for customer store invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, DinerConfig, LoggingConfig, StoreConfig};
pub use db::{ConnectionScope, ConnectionSource, DbError, FileSource, SharedConnection};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::association::{AssociationDelta, AssociationDiff};
pub use model::customer::{
    Customer, CustomerId, CustomerRecord, CustomerSummary, IdSet, ValidationError,
};
pub use model::lookup::LookupRow;
pub use model::page::{page_arg, page_count, PageWindow};
pub use model::rating::RatingLink;
pub use repo::customer_repo::{
    CustomerRepository, ErrorKind, RepoError, RepoResult, SqliteCustomerRepository, SyncReport,
};
pub use repo::lookup_repo::{LookupReader, SqliteLookupReader};
pub use service::customer_service::{CustomerPage, CustomerService};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
