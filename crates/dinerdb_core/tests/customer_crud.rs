use dinerdb_core::repo::rating_link::ratings_for_customer;
use dinerdb_core::{
    AssociationDelta, Customer, CustomerRepository, ErrorKind, IdSet, RepoError,
    SharedConnection, SqliteCustomerRepository, ValidationError,
};
use rusqlite::Connection;

fn ids(values: &[i64]) -> IdSet {
    values.iter().copied().collect()
}

fn customer(name: &str) -> Customer {
    Customer {
        name: name.to_string(),
        smoker: false,
        drink_level: "casual".to_string(),
        ambience: "quiet".to_string(),
        dress_code_id: Some(1),
        budget: "medium".to_string(),
    }
}

fn seeded_store() -> SharedConnection {
    let store = SharedConnection::open_in_memory().unwrap();
    store
        .connection()
        .execute_batch(
            "INSERT INTO DressCode (dressCodeID, dressCode) VALUES (1, 'casual'), (2, 'formal');
             INSERT INTO Cuisine (cuisineId, cuisine)
             VALUES (1, 'Mexican'), (2, 'American'), (3, 'Japanese'), (4, 'Italian');
             INSERT INTO PaymentMethods (paymentMethodsID, method)
             VALUES (1, 'cash'), (2, 'visa'), (3, 'bank_debit_cards');",
        )
        .unwrap();
    store
}

fn row_count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

#[test]
fn create_and_get_roundtrip() {
    let store = seeded_store();
    let repo = SqliteCustomerRepository::new(&store);

    let ana = customer("Ana");
    let id = repo
        .create_customer(&ana, &ids(&[1, 3]), &ids(&[2]))
        .unwrap();
    assert!(id > 0);

    let loaded = repo.get_customer(id).unwrap();
    assert_eq!(loaded.id, id);
    assert_eq!(loaded.customer, ana);
    assert_eq!(loaded.cuisine_ids, ids(&[1, 3]));
    assert_eq!(loaded.payment_method_ids, ids(&[2]));
}

#[test]
fn customer_without_associations_is_still_readable() {
    let store = seeded_store();
    let repo = SqliteCustomerRepository::new(&store);

    let id = repo
        .create_customer(&customer("Bruno"), &IdSet::new(), &ids(&[1]))
        .unwrap();

    let loaded = repo.get_customer(id).unwrap();
    assert!(loaded.cuisine_ids.is_empty());
    assert_eq!(loaded.payment_method_ids, ids(&[1]));
}

#[test]
fn validation_failures_issue_no_writes() {
    let store = seeded_store();
    let repo = SqliteCustomerRepository::new(&store);

    let err = repo
        .create_customer(&customer("  "), &ids(&[1]), &ids(&[1]))
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(ValidationError::EmptyName)));

    let mut no_dress_code = customer("Carla");
    no_dress_code.dress_code_id = None;
    let err = repo
        .create_customer(&no_dress_code, &IdSet::new(), &IdSet::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = repo
        .create_customer(&customer("Carla"), &ids(&[-1, 2]), &IdSet::new())
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::NegativeId { value: -1, .. })
    ));

    assert_eq!(repo.count_customers().unwrap(), 0);
}

#[test]
fn get_unknown_customer_is_not_found_and_negative_id_is_invalid() {
    let store = seeded_store();
    let repo = SqliteCustomerRepository::new(&store);

    let err = repo.get_customer(42).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(42)));

    let err = repo.get_customer(-3).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn injected_failure_during_create_rolls_back_customer_row() {
    let store = seeded_store();
    let conn = store.connection();
    conn.execute_batch(
        "CREATE TEMP TRIGGER fail_second_cuisine
         BEFORE INSERT ON CuisineCustomer
         WHEN NEW.cuisineId = 3
         BEGIN
             SELECT RAISE(ABORT, 'injected failure');
         END;",
    )
    .unwrap();
    let repo = SqliteCustomerRepository::new(&store);

    let err = repo
        .create_customer(&customer("Ana"), &ids(&[1, 3, 4]), &ids(&[2]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);

    assert_eq!(row_count(conn, "SELECT COUNT(*) FROM Customer;"), 0);
    assert_eq!(row_count(conn, "SELECT COUNT(*) FROM CuisineCustomer;"), 0);
    assert_eq!(row_count(conn, "SELECT COUNT(*) FROM PaymentMethodsCustomer;"), 0);
    assert!(conn.is_autocommit());
}

#[test]
fn unknown_reference_id_fails_create_atomically() {
    let store = seeded_store();
    let repo = SqliteCustomerRepository::new(&store);

    let err = repo
        .create_customer(&customer("Dora"), &ids(&[1]), &ids(&[99]))
        .unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
    assert_eq!(repo.count_customers().unwrap(), 0);
    assert_eq!(
        row_count(store.connection(), "SELECT COUNT(*) FROM CuisineCustomer;"),
        0
    );
}

#[test]
fn update_reconciles_association_sets_by_diff() {
    let store = seeded_store();
    let repo = SqliteCustomerRepository::new(&store);
    let id = repo
        .create_customer(&customer("Ana"), &ids(&[1, 3]), &ids(&[2]))
        .unwrap();

    let mut edited = customer("Ana Maria");
    edited.smoker = true;
    edited.budget = "high".to_string();
    let report = repo
        .update_customer(id, &edited, &ids(&[3, 4]), &ids(&[2]))
        .unwrap();

    assert_eq!(report.cuisines.to_add, ids(&[4]));
    assert_eq!(report.cuisines.to_remove, ids(&[1]));
    assert!(report.payment_methods.is_empty());

    let loaded = repo.get_customer(id).unwrap();
    assert_eq!(loaded.customer, edited);
    assert_eq!(loaded.cuisine_ids, ids(&[3, 4]));
    assert_eq!(loaded.payment_method_ids, ids(&[2]));
}

#[test]
fn update_with_unchanged_sets_issues_no_association_writes() {
    let store = seeded_store();
    let conn = store.connection();
    let repo = SqliteCustomerRepository::new(&store);
    let id = repo
        .create_customer(&customer("Ana"), &ids(&[1, 3]), &ids(&[2]))
        .unwrap();

    conn.execute_batch(
        "CREATE TEMP TABLE association_writes (op TEXT NOT NULL);
         CREATE TEMP TRIGGER log_cuisine_insert AFTER INSERT ON CuisineCustomer
         BEGIN INSERT INTO association_writes VALUES ('insert'); END;
         CREATE TEMP TRIGGER log_cuisine_delete AFTER DELETE ON CuisineCustomer
         BEGIN INSERT INTO association_writes VALUES ('delete'); END;
         CREATE TEMP TRIGGER log_payment_insert AFTER INSERT ON PaymentMethodsCustomer
         BEGIN INSERT INTO association_writes VALUES ('insert'); END;
         CREATE TEMP TRIGGER log_payment_delete AFTER DELETE ON PaymentMethodsCustomer
         BEGIN INSERT INTO association_writes VALUES ('delete'); END;",
    )
    .unwrap();

    let report = repo
        .update_customer(id, &customer("Ana"), &ids(&[3, 1]), &ids(&[2]))
        .unwrap();
    assert!(report.is_noop());
    assert_eq!(row_count(conn, "SELECT COUNT(*) FROM association_writes;"), 0);
}

#[test]
fn update_unknown_customer_is_not_found() {
    let store = seeded_store();
    let repo = SqliteCustomerRepository::new(&store);

    let err = repo
        .update_customer(77, &customer("Ghost"), &ids(&[1]), &IdSet::new())
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(77)));
    assert_eq!(
        row_count(store.connection(), "SELECT COUNT(*) FROM CuisineCustomer;"),
        0
    );
}

#[test]
fn failed_update_rolls_back_scalar_changes() {
    let store = seeded_store();
    let repo = SqliteCustomerRepository::new(&store);
    let id = repo
        .create_customer(&customer("Ana"), &ids(&[1]), &ids(&[1]))
        .unwrap();

    let err = repo
        .update_customer(id, &customer("Renamed"), &ids(&[1, 99]), &ids(&[1]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);

    let loaded = repo.get_customer(id).unwrap();
    assert_eq!(loaded.customer.name, "Ana");
    assert_eq!(loaded.cuisine_ids, ids(&[1]));
}

#[test]
fn caller_delta_is_checked_against_stored_sets() {
    let store = seeded_store();
    let repo = SqliteCustomerRepository::new(&store);
    let id = repo
        .create_customer(&customer("Ana"), &ids(&[1, 2]), &ids(&[1]))
        .unwrap();

    let cuisine_delta = AssociationDelta {
        added: ids(&[2, 3]),
        removed: ids(&[1, 4]),
    };
    let payment_delta = AssociationDelta {
        added: ids(&[1]),
        removed: IdSet::new(),
    };
    let report = repo
        .apply_customer_delta(id, &customer("Ana"), &cuisine_delta, &payment_delta)
        .unwrap();

    assert_eq!(report.cuisines.to_add, ids(&[3]));
    assert_eq!(report.cuisines.to_remove, ids(&[1]));
    assert!(report.payment_methods.is_empty());

    let loaded = repo.get_customer(id).unwrap();
    assert_eq!(loaded.cuisine_ids, ids(&[2, 3]));
    assert_eq!(loaded.payment_method_ids, ids(&[1]));
}

#[test]
fn delete_clears_rating_reference_and_removes_associations() {
    let store = seeded_store();
    let conn = store.connection();
    let repo = SqliteCustomerRepository::new(&store);
    let id = repo
        .create_customer(&customer("Ana"), &ids(&[1, 3]), &ids(&[2]))
        .unwrap();
    conn.execute(
        "INSERT INTO Rating (ratingId, customerID, score) VALUES (10, ?1, 2);",
        [id],
    )
    .unwrap();
    assert_eq!(ratings_for_customer(conn, id).unwrap().len(), 1);

    repo.delete_customer(id).unwrap();

    assert!(matches!(repo.get_customer(id), Err(RepoError::NotFound(_))));
    assert!(ratings_for_customer(conn, id).unwrap().is_empty());
    let rating_customer: Option<i64> = conn
        .query_row(
            "SELECT customerID FROM Rating WHERE ratingId = 10;",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(rating_customer, None);
    assert_eq!(row_count(conn, "SELECT COUNT(*) FROM CuisineCustomer;"), 0);
    assert_eq!(row_count(conn, "SELECT COUNT(*) FROM PaymentMethodsCustomer;"), 0);
}

#[test]
fn delete_unknown_customer_succeeds() {
    let store = seeded_store();
    let repo = SqliteCustomerRepository::new(&store);

    repo.delete_customer(12345).unwrap();
    repo.delete_customer(12345).unwrap();
}

#[test]
fn failed_delete_leaves_everything_in_place() {
    let store = seeded_store();
    let conn = store.connection();
    let repo = SqliteCustomerRepository::new(&store);
    let id = repo
        .create_customer(&customer("Ana"), &ids(&[1, 3]), &ids(&[2]))
        .unwrap();
    conn.execute(
        "INSERT INTO Rating (ratingId, customerID, score) VALUES (11, ?1, 1);",
        [id],
    )
    .unwrap();
    conn.execute_batch(
        "CREATE TEMP TRIGGER fail_payment_delete
         BEFORE DELETE ON PaymentMethodsCustomer
         BEGIN
             SELECT RAISE(ABORT, 'injected failure');
         END;",
    )
    .unwrap();

    let err = repo.delete_customer(id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);

    let loaded = repo.get_customer(id).unwrap();
    assert_eq!(loaded.cuisine_ids, ids(&[1, 3]));
    assert_eq!(loaded.payment_method_ids, ids(&[2]));
    assert_eq!(ratings_for_customer(conn, id).unwrap().len(), 1);
}

#[test]
fn ids_are_never_reused_after_delete() {
    let store = seeded_store();
    let repo = SqliteCustomerRepository::new(&store);

    let first = repo
        .create_customer(&customer("Ana"), &IdSet::new(), &IdSet::new())
        .unwrap();
    repo.delete_customer(first).unwrap();
    let second = repo
        .create_customer(&customer("Ana"), &IdSet::new(), &IdSet::new())
        .unwrap();
    assert!(second > first);
}

#[test]
fn pages_partition_customers_ordered_by_name() {
    let store = seeded_store();
    let repo = SqliteCustomerRepository::new(&store);
    for name in ["Fiona", "Ana", "Enzo", "Carla", "Bruno", "Dora"] {
        repo.create_customer(&customer(name), &IdSet::new(), &IdSet::new())
            .unwrap();
    }

    let first = repo.list_customers(1, 3).unwrap();
    let second = repo.list_customers(2, 3).unwrap();
    let third = repo.list_customers(3, 3).unwrap();
    assert_eq!(first.len(), 3);
    assert_eq!(second.len(), 3);
    assert!(third.is_empty());

    let paged: Vec<String> = first
        .iter()
        .chain(second.iter())
        .map(|row| row.name.clone())
        .collect();
    assert_eq!(paged, ["Ana", "Bruno", "Carla", "Dora", "Enzo", "Fiona"]);

    let all = repo.list_all_customers().unwrap();
    let paged_ids: Vec<i64> = first.iter().chain(second.iter()).map(|row| row.id).collect();
    let all_ids: Vec<i64> = all.iter().map(|row| row.id).collect();
    assert_eq!(paged_ids, all_ids);
    assert_eq!(repo.count_customers().unwrap(), 6);
}

#[test]
fn non_positive_page_arguments_are_rejected() {
    let store = seeded_store();
    let repo = SqliteCustomerRepository::new(&store);

    for (page, page_size) in [(0, 10), (1, 0), (-1, 5), (2, -5)] {
        let err = repo.list_customers(page, page_size).unwrap_err();
        assert!(
            matches!(err, RepoError::Validation(ValidationError::InvalidPage { .. })),
            "page={page} page_size={page_size}"
        );
    }
}

#[test]
fn within_unit_of_work_rolls_back_every_nested_call() {
    let store = seeded_store();
    let repo = SqliteCustomerRepository::new(&store);

    let result: Result<(), RepoError> = repo.within_unit_of_work(|repo| {
        repo.create_customer(&customer("Ana"), &ids(&[1]), &ids(&[1]))?;
        repo.create_customer(&customer("Bruno"), &ids(&[2]), &IdSet::new())?;
        Err(RepoError::NotFound(0))
    });
    assert!(result.is_err());
    assert_eq!(repo.count_customers().unwrap(), 0);
}

#[test]
fn failed_create_inside_unit_of_work_leaves_no_rows_behind() {
    let store = seeded_store();
    let repo = SqliteCustomerRepository::new(&store);

    let result: Result<(), RepoError> = repo.within_unit_of_work(|repo| {
        let err = repo
            .create_customer(&customer("Broken"), &ids(&[1, 99]), &IdSet::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
        repo.create_customer(&customer("Good"), &ids(&[2]), &IdSet::new())?;
        Ok(())
    });
    assert!(result.is_ok());

    let names: Vec<String> = repo
        .list_all_customers()
        .unwrap()
        .into_iter()
        .map(|summary| summary.name)
        .collect();
    assert_eq!(names, vec!["Good".to_string()]);
    assert_eq!(
        row_count(store.connection(), "SELECT COUNT(*) FROM CuisineCustomer;"),
        1
    );
    assert_eq!(
        row_count(
            store.connection(),
            "SELECT COUNT(*) FROM CuisineCustomer WHERE cuisineId = 2;"
        ),
        1
    );
}

#[test]
fn oversized_page_arguments_return_an_empty_page() {
    let store = seeded_store();
    let repo = SqliteCustomerRepository::new(&store);
    repo.create_customer(&customer("Ana"), &IdSet::new(), &IdSet::new())
        .unwrap();

    let beyond_u32 = i64::from(u32::MAX) + 10;
    assert!(repo.list_customers(beyond_u32, 10).unwrap().is_empty());
    assert!(repo.list_customers(i64::MAX, i64::MAX).unwrap().is_empty());

    let everyone = repo.list_customers(1, beyond_u32).unwrap();
    assert_eq!(everyone.len(), 1);
    assert_eq!(everyone[0].name, "Ana");
}
