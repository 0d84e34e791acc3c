//! Customer domain model.
//!
//! # Responsibility
//! - Define the scalar customer record written by create/update.
//! - Define read projections returned by the repository.
//! - Validate caller input before any statement is issued.
//!
//! # Invariants
//! - `name` is non-empty after trimming.
//! - `dress_code_id` is required on every write path.
//! - Ids handed to the store are non-negative.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned customer identifier.
pub type CustomerId = i64;

/// Set of referenced ids (cuisines or payment methods) for one customer.
pub type IdSet = BTreeSet<i64>;

/// Scalar customer fields.
///
/// Labels such as `drink_level` are enumerations owned by the store's
/// reference data; they are carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub smoker: bool,
    /// Serialized as `drinkLevel` to match the storage column.
    #[serde(rename = "drinkLevel")]
    pub drink_level: String,
    pub ambience: String,
    /// Foreign key into `DressCode`. `None` only for legacy rows.
    #[serde(rename = "dressCodeID")]
    pub dress_code_id: Option<i64>,
    pub budget: String,
}

impl Customer {
    /// Checks write-path preconditions.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        match self.dress_code_id {
            None => Err(ValidationError::MissingDressCode),
            Some(id) if id < 0 => Err(ValidationError::NegativeId {
                field: "dress_code_id",
                value: id,
            }),
            Some(_) => Ok(()),
        }
    }
}

/// Full customer read model with both association sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: CustomerId,
    #[serde(flatten)]
    pub customer: Customer,
    pub cuisine_ids: IdSet,
    pub payment_method_ids: IdSet,
}

/// List row: id and display name only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSummary {
    pub id: CustomerId,
    pub name: String,
}

/// Caller input that violates a repository precondition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyName,
    MissingDressCode,
    NegativeId { field: &'static str, value: i64 },
    InvalidPage { page: i64, page_size: i64 },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "customer name cannot be empty"),
            Self::MissingDressCode => write!(f, "customer dress code is required"),
            Self::NegativeId { field, value } => {
                write!(f, "{field} must be non-negative, got {value}")
            }
            Self::InvalidPage { page, page_size } => write!(
                f,
                "page and page size must be positive, got page={page} page_size={page_size}"
            ),
        }
    }
}

impl Error for ValidationError {}

/// Rejects negative ids in an association set.
pub fn validate_id_set(field: &'static str, ids: &IdSet) -> Result<(), ValidationError> {
    // Sets are ordered, so the smallest id is the only one worth checking.
    match ids.first() {
        Some(&value) if value < 0 => Err(ValidationError::NegativeId { field, value }),
        _ => Ok(()),
    }
}

/// Rejects a negative customer id.
pub fn validate_customer_id(id: CustomerId) -> Result<(), ValidationError> {
    if id < 0 {
        return Err(ValidationError::NegativeId {
            field: "customer_id",
            value: id,
        });
    }
    Ok(())
}
