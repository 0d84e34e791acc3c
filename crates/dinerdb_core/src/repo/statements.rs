//! Typed SQL statements for the customer store.
//!
//! Each statement owns its SQL text and a struct whose fields are the only
//! parameters it binds, so callers cannot misspell or forget a parameter.
//! Statements are prepared through the connection's statement cache.

use crate::model::customer::{Customer, CustomerId, CustomerSummary, IdSet};
use crate::model::lookup::LookupRow;
use crate::model::page::PageWindow;
use crate::model::rating::RatingLink;
use rusqlite::{named_params, Connection, OptionalExtension, Row};

/// One of the two customer association tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationTable {
    Cuisine,
    PaymentMethod,
}

impl AssociationTable {
    fn select_sql(self) -> &'static str {
        match self {
            Self::Cuisine => {
                "SELECT cuisineId FROM CuisineCustomer WHERE customerId = :customer_id;"
            }
            Self::PaymentMethod => {
                "SELECT paymentMethodsID FROM PaymentMethodsCustomer WHERE customerId = :customer_id;"
            }
        }
    }

    fn insert_sql(self) -> &'static str {
        match self {
            Self::Cuisine => {
                "INSERT INTO CuisineCustomer (customerId, cuisineId)
                 VALUES (:customer_id, :target_id);"
            }
            Self::PaymentMethod => {
                "INSERT INTO PaymentMethodsCustomer (customerId, paymentMethodsID)
                 VALUES (:customer_id, :target_id);"
            }
        }
    }

    fn delete_one_sql(self) -> &'static str {
        match self {
            Self::Cuisine => {
                "DELETE FROM CuisineCustomer
                 WHERE customerId = :customer_id AND cuisineId = :target_id;"
            }
            Self::PaymentMethod => {
                "DELETE FROM PaymentMethodsCustomer
                 WHERE customerId = :customer_id AND paymentMethodsID = :target_id;"
            }
        }
    }

    fn delete_all_sql(self) -> &'static str {
        match self {
            Self::Cuisine => "DELETE FROM CuisineCustomer WHERE customerId = :customer_id;",
            Self::PaymentMethod => {
                "DELETE FROM PaymentMethodsCustomer WHERE customerId = :customer_id;"
            }
        }
    }
}

/// Raw `Customer` row before domain checks.
pub struct CustomerRow {
    pub name: String,
    pub smoker: i64,
    pub drink_level: String,
    pub ambience: String,
    pub dress_code_id: Option<i64>,
    pub budget: String,
}

pub struct InsertCustomer<'a> {
    pub customer: &'a Customer,
}

impl InsertCustomer<'_> {
    const SQL: &'static str = "INSERT INTO Customer (
            name,
            smoker,
            drinkLevel,
            dressCodeID,
            ambience,
            budget
        ) VALUES (:name, :smoker, :drink_level, :dress_code_id, :ambience, :budget);";

    /// Returns the store-assigned id.
    pub fn run(&self, conn: &Connection) -> rusqlite::Result<CustomerId> {
        let customer = self.customer;
        conn.prepare_cached(Self::SQL)?.execute(named_params! {
            ":name": customer.name.as_str(),
            ":smoker": customer.smoker,
            ":drink_level": customer.drink_level.as_str(),
            ":dress_code_id": customer.dress_code_id,
            ":ambience": customer.ambience.as_str(),
            ":budget": customer.budget.as_str(),
        })?;
        Ok(conn.last_insert_rowid())
    }
}

pub struct UpdateCustomer<'a> {
    pub id: CustomerId,
    pub customer: &'a Customer,
}

impl UpdateCustomer<'_> {
    const SQL: &'static str = "UPDATE Customer
         SET
            name = :name,
            smoker = :smoker,
            drinkLevel = :drink_level,
            dressCodeID = :dress_code_id,
            ambience = :ambience,
            budget = :budget
         WHERE customerId = :id;";

    /// Returns the number of rows changed (0 when the id does not exist).
    pub fn run(&self, conn: &Connection) -> rusqlite::Result<usize> {
        let customer = self.customer;
        conn.prepare_cached(Self::SQL)?.execute(named_params! {
            ":id": self.id,
            ":name": customer.name.as_str(),
            ":smoker": customer.smoker,
            ":drink_level": customer.drink_level.as_str(),
            ":dress_code_id": customer.dress_code_id,
            ":ambience": customer.ambience.as_str(),
            ":budget": customer.budget.as_str(),
        })
    }
}

pub struct SelectCustomer {
    pub id: CustomerId,
}

impl SelectCustomer {
    const SQL: &'static str = "SELECT
            name,
            smoker,
            drinkLevel,
            dressCodeID,
            ambience,
            budget
        FROM Customer
        WHERE customerId = :id;";

    pub fn run(&self, conn: &Connection) -> rusqlite::Result<Option<CustomerRow>> {
        conn.prepare_cached(Self::SQL)?
            .query_row(named_params! { ":id": self.id }, |row| {
                Ok(CustomerRow {
                    name: row.get("name")?,
                    smoker: row.get("smoker")?,
                    drink_level: row.get("drinkLevel")?,
                    ambience: row.get("ambience")?,
                    dress_code_id: row.get("dressCodeID")?,
                    budget: row.get("budget")?,
                })
            })
            .optional()
    }
}

pub struct DeleteCustomer {
    pub id: CustomerId,
}

impl DeleteCustomer {
    const SQL: &'static str = "DELETE FROM Customer WHERE customerId = :id;";

    pub fn run(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.prepare_cached(Self::SQL)?
            .execute(named_params! { ":id": self.id })
    }
}

pub struct SelectAssociationIds {
    pub table: AssociationTable,
    pub customer_id: CustomerId,
}

impl SelectAssociationIds {
    pub fn run(&self, conn: &Connection) -> rusqlite::Result<IdSet> {
        let mut stmt = conn.prepare_cached(self.table.select_sql())?;
        let ids = stmt.query_map(named_params! { ":customer_id": self.customer_id }, |row| {
            row.get::<_, i64>(0)
        })?;
        ids.collect()
    }
}

/// Inserts or deletes a single association row.
pub struct AssociationRow {
    pub table: AssociationTable,
    pub customer_id: CustomerId,
    pub target_id: i64,
}

impl AssociationRow {
    pub fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.prepare_cached(self.table.insert_sql())?
            .execute(named_params! {
                ":customer_id": self.customer_id,
                ":target_id": self.target_id,
            })
    }

    pub fn delete(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.prepare_cached(self.table.delete_one_sql())?
            .execute(named_params! {
                ":customer_id": self.customer_id,
                ":target_id": self.target_id,
            })
    }
}

pub struct DeleteAssociations {
    pub table: AssociationTable,
    pub customer_id: CustomerId,
}

impl DeleteAssociations {
    pub fn run(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.prepare_cached(self.table.delete_all_sql())?
            .execute(named_params! { ":customer_id": self.customer_id })
    }
}

pub struct ListCustomers {
    /// `None` lists every customer.
    pub window: Option<PageWindow>,
}

impl ListCustomers {
    const SQL_ALL: &'static str = "SELECT customerId AS id, name
        FROM Customer
        ORDER BY name ASC, customerId ASC;";
    const SQL_PAGE: &'static str = "SELECT customerId AS id, name
        FROM Customer
        ORDER BY name ASC, customerId ASC
        LIMIT :limit OFFSET :offset;";

    pub fn run(&self, conn: &Connection) -> rusqlite::Result<Vec<CustomerSummary>> {
        match self.window {
            None => {
                let mut stmt = conn.prepare_cached(Self::SQL_ALL)?;
                let rows = stmt.query_map([], parse_summary_row)?;
                rows.collect()
            }
            Some(window) => {
                // Offsets past i64::MAX cannot match any row.
                let offset = i64::try_from(window.offset).unwrap_or(i64::MAX);
                let mut stmt = conn.prepare_cached(Self::SQL_PAGE)?;
                let rows = stmt.query_map(
                    named_params! {
                        ":limit": i64::from(window.limit),
                        ":offset": offset,
                    },
                    parse_summary_row,
                )?;
                rows.collect()
            }
        }
    }
}

pub struct CountCustomers;

impl CountCustomers {
    const SQL: &'static str = "SELECT COUNT(*) FROM Customer;";

    pub fn run(&self, conn: &Connection) -> rusqlite::Result<i64> {
        conn.prepare_cached(Self::SQL)?.query_row([], |row| row.get(0))
    }
}

/// Reference tables served by the lookup reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupTable {
    Cuisine,
    PaymentMethod,
    DressCode,
}

impl LookupTable {
    fn select_sql(self) -> &'static str {
        match self {
            Self::Cuisine => {
                "SELECT cuisineId AS id, cuisine AS label FROM Cuisine ORDER BY cuisine ASC;"
            }
            Self::PaymentMethod => {
                "SELECT paymentMethodsID AS id, method AS label
                 FROM PaymentMethods
                 ORDER BY method ASC;"
            }
            Self::DressCode => {
                "SELECT dressCodeID AS id, dressCode AS label FROM DressCode ORDER BY dressCode ASC;"
            }
        }
    }
}

pub struct ListLookupRows {
    pub table: LookupTable,
}

impl ListLookupRows {
    pub fn run(&self, conn: &Connection) -> rusqlite::Result<Vec<LookupRow>> {
        let mut stmt = conn.prepare_cached(self.table.select_sql())?;
        let rows = stmt.query_map([], |row| {
            Ok(LookupRow {
                id: row.get("id")?,
                label: row.get("label")?,
            })
        })?;
        rows.collect()
    }
}

pub struct DetachRatings {
    pub customer_id: CustomerId,
}

impl DetachRatings {
    const SQL: &'static str = "UPDATE Rating SET customerID = NULL WHERE customerID = :customer_id;";

    pub fn run(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.prepare_cached(Self::SQL)?
            .execute(named_params! { ":customer_id": self.customer_id })
    }
}

pub struct SelectRatingLinks {
    pub customer_id: CustomerId,
}

impl SelectRatingLinks {
    const SQL: &'static str = "SELECT ratingId, customerID
        FROM Rating
        WHERE customerID = :customer_id
        ORDER BY ratingId ASC;";

    pub fn run(&self, conn: &Connection) -> rusqlite::Result<Vec<RatingLink>> {
        let mut stmt = conn.prepare_cached(Self::SQL)?;
        let rows = stmt.query_map(named_params! { ":customer_id": self.customer_id }, |row| {
            Ok(RatingLink {
                rating_id: row.get("ratingId")?,
                customer_id: row.get("customerID")?,
            })
        })?;
        rows.collect()
    }
}

fn parse_summary_row(row: &Row<'_>) -> rusqlite::Result<CustomerSummary> {
    Ok(CustomerSummary {
        id: row.get("id")?,
        name: row.get("name")?,
    })
}
