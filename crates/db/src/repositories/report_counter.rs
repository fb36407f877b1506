//! Report counter repository.

use std::sync::Arc;

use crate::entities::{ReportCounter, report_counter};
use crate::retry::read_with_retry;
use chrono::{DateTime, FixedOffset};
use informes_common::AppResult;
use sea_orm::{
    DatabaseConnection, EntityTrait, Set,
    sea_query::{Expr, OnConflict},
};

use super::db_error;

/// Per-year sequence counter.
#[derive(Clone)]
pub struct ReportCounterRepository {
    db: Arc<DatabaseConnection>,
}

impl ReportCounterRepository {
    /// Create a new counter repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Counter row for a year, if one was ever created.
    pub async fn find(&self, year: i32) -> AppResult<Option<report_counter::Model>> {
        let db = self.db.as_ref();
        read_with_retry("report_counter.find", move || {
            ReportCounter::find_by_id(year).one(db)
        })
        .await
    }

    /// Atomically hand out the next sequence for `year`.
    ///
    /// The first call for a year creates the row at `seed + 1`; later calls
    /// increment it in the same statement, so two concurrent callers can
    /// never receive the same value.
    pub async fn next_sequence(
        &self,
        year: i32,
        seed: i32,
        now: DateTime<FixedOffset>,
    ) -> AppResult<i32> {
        let model = report_counter::ActiveModel {
            year: Set(year),
            last_seq: Set(seed + 1),
            updated_at: Set(now),
        };

        let row = ReportCounter::insert(model)
            .on_conflict(
                OnConflict::column(report_counter::Column::Year)
                    .value(
                        report_counter::Column::LastSeq,
                        Expr::col((ReportCounter, report_counter::Column::LastSeq)).add(1),
                    )
                    .value(report_counter::Column::UpdatedAt, Expr::value(now))
                    .to_owned(),
            )
            .exec_with_returning(self.db.as_ref())
            .await
            .map_err(db_error)?;

        Ok(row.last_seq)
    }
}
