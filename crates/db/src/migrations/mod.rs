//! Database migrations.
//!
//! Schema migrations for the registry database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250601_000001_create_allowed_user_table;
mod m20250601_000002_create_report_table;
mod m20250601_000003_create_rating_table;
mod m20250601_000004_create_report_counter_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_allowed_user_table::Migration),
            Box::new(m20250601_000002_create_report_table::Migration),
            Box::new(m20250601_000003_create_rating_table::Migration),
            Box::new(m20250601_000004_create_report_counter_table::Migration),
        ]
    }
}
