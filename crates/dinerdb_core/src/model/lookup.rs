//! Reference-table rows (cuisines, payment methods, dress codes).

use serde::{Deserialize, Serialize};

/// One reference row: id plus display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupRow {
    pub id: i64,
    pub label: String,
}
