//! Rating back-reference maintenance.
//!
//! # Invariants
//! - Ratings are never deleted here; only their `customerID` is cleared.

use crate::model::customer::CustomerId;
use crate::model::rating::RatingLink;
use crate::repo::customer_repo::RepoResult;
use crate::repo::statements::{DetachRatings, SelectRatingLinks};
use rusqlite::Connection;

/// Clears `customerID` on every rating pointing at `customer_id`.
///
/// Returns the number of ratings detached.
pub fn detach_customer(conn: &Connection, customer_id: CustomerId) -> RepoResult<usize> {
    let detached = DetachRatings { customer_id }.run(conn)?;
    Ok(detached)
}

/// Lists ratings that still reference `customer_id`.
pub fn ratings_for_customer(
    conn: &Connection,
    customer_id: CustomerId,
) -> RepoResult<Vec<RatingLink>> {
    let links = SelectRatingLinks { customer_id }.run(conn)?;
    Ok(links)
}
