//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `dinerdb_core` linkage without an embedding application.
//! - Optionally open a store and print reference/customer counts.
//!
//! Usage: `dinerdb_cli [db_path]`

use dinerdb_core::{
    CustomerRepository, FileSource, LookupReader, SqliteCustomerRepository, SqliteLookupReader,
    StoreConfig,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("dinerdb_core ping={}", dinerdb_core::ping());
    println!("dinerdb_core version={}", dinerdb_core::core_version());

    let Some(path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    let source = FileSource::new(StoreConfig::at(path));
    match print_counts(&source) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("dinerdb_cli error={err}");
            ExitCode::FAILURE
        }
    }
}

fn print_counts(source: &FileSource) -> Result<(), dinerdb_core::RepoError> {
    let customers = SqliteCustomerRepository::new(source);
    let lookups = SqliteLookupReader::new(source);

    println!("customers={}", customers.count_customers()?);
    println!("cuisines={}", lookups.list_cuisines()?.len());
    println!("payment_methods={}", lookups.list_payment_methods()?.len());
    println!("dress_codes={}", lookups.list_dress_codes()?.len());
    Ok(())
}
