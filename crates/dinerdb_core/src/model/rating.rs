//! Rating back-reference to a customer.
//!
//! Ratings are owned by another module. The customer reference is weak:
//! deleting a customer clears it and the rating survives.

use crate::model::customer::CustomerId;
use serde::{Deserialize, Serialize};

/// The part of a rating this layer reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingLink {
    pub rating_id: i64,
    /// `None` once the authoring customer has been deleted.
    pub customer_id: Option<CustomerId>,
}
