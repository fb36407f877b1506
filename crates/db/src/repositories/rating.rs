//! Rating repository.

use std::sync::Arc;

use crate::entities::{Rating, rating};
use crate::retry::read_with_retry;
use chrono::{DateTime, FixedOffset};
use informes_common::AppResult;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    sea_query::{Expr, OnConflict},
};

use super::{db_error, is_unique_violation};

/// Rating repository for database operations.
#[derive(Clone)]
pub struct RatingRepository {
    db: Arc<DatabaseConnection>,
}

impl RatingRepository {
    /// Create a new rating repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Rating stored for a report, if any.
    pub async fn find_by_report_id(&self, report_id: &str) -> AppResult<Option<rating::Model>> {
        let db = self.db.as_ref();
        let id = report_id.to_string();
        read_with_retry("rating.find_by_report_id", move || {
            Rating::find_by_id(id.clone()).one(db)
        })
        .await
    }

    /// Insert a rating unless one already exists for the report.
    ///
    /// Returns `false` when another rating was there first; the existing row
    /// is left untouched.
    pub async fn insert_if_absent(&self, model: rating::ActiveModel) -> AppResult<bool> {
        let result = Rating::insert(model)
            .on_conflict(
                OnConflict::column(rating::Column::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await;

        match result {
            Ok(rows) => Ok(rows > 0),
            Err(DbErr::RecordNotInserted) => Ok(false),
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(db_error(e)),
        }
    }

    /// Overwrite an unlocked rating and lock it in one conditional update.
    ///
    /// Returns `false` when the row is already locked (or missing).
    pub async fn lock_if_unlocked(
        &self,
        report_id: &str,
        value: rating::RatingValue,
        comments: Option<String>,
        report_number: &str,
        now: DateTime<FixedOffset>,
    ) -> AppResult<bool> {
        let result = Rating::update_many()
            .col_expr(rating::Column::Rating, Expr::value(value))
            .col_expr(rating::Column::Comments, Expr::value(comments))
            .col_expr(rating::Column::ReportNumber, Expr::value(report_number))
            .col_expr(rating::Column::Locked, Expr::value(true))
            .col_expr(rating::Column::UpdatedAt, Expr::value(now))
            .filter(rating::Column::Id.eq(report_id))
            .filter(rating::Column::Locked.eq(false))
            .exec(self.db.as_ref())
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected == 1)
    }
}
