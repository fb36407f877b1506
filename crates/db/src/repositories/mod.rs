//! Repositories for database access.

mod allowed_user;
mod rating;
mod report;
mod report_counter;

pub use allowed_user::AllowedUserRepository;
pub use rating::RatingRepository;
pub use report::ReportRepository;
pub use report_counter::ReportCounterRepository;

use informes_common::AppError;
use sea_orm::{DbErr, SqlErr};

/// Whether a write failed because a unique index rejected it.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

pub(crate) fn db_error(err: DbErr) -> AppError {
    AppError::Database(err.to_string())
}
