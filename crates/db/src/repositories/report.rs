//! Report repository.

use std::sync::Arc;

use crate::entities::{Report, report};
use crate::retry::read_with_retry;
use informes_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
    sea_query::{Expr, Func, LikeExpr},
};

use super::{db_error, is_unique_violation};

/// Report repository for database operations.
#[derive(Clone)]
pub struct ReportRepository {
    db: Arc<DatabaseConnection>,
}

/// Lowercased `%term%` with LIKE wildcards escaped so the term matches literally.
fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn like_pattern(term: &str) -> LikeExpr {
    LikeExpr::new(contains_pattern(term)).escape('\\')
}

impl ReportRepository {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a report by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<report::Model>> {
        let db = self.db.as_ref();
        let id = id.to_string();
        read_with_retry("report.find_by_id", move || {
            Report::find_by_id(id.clone()).one(db)
        })
        .await
    }

    /// Find a report by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<report::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ReportNotFound(id.to_string()))
    }

    /// List reports newest first, optionally filtered by a case-insensitive
    /// term matched against the report number and the client name.
    pub async fn find_all(
        &self,
        search: Option<&str>,
        limit: Option<u64>,
    ) -> AppResult<Vec<report::Model>> {
        let db = self.db.as_ref();
        let search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string);
        read_with_retry("report.find_all", move || {
            let mut query = Report::find();
            if let Some(term) = &search {
                query = query.filter(
                    Condition::any()
                        .add(
                            Expr::expr(Func::lower(Expr::col(report::Column::NroConsulta)))
                                .like(like_pattern(term)),
                        )
                        .add(
                            Expr::expr(Func::lower(Expr::col(report::Column::Cliente)))
                                .like(like_pattern(term)),
                        ),
                );
            }
            query
                .order_by_desc(report::Column::CreatedAt)
                .order_by_desc(report::Column::Id)
                .limit(limit)
                .all(db)
        })
        .await
    }

    /// Highest sequence already stored for a year, if any.
    pub async fn max_seq_for_year(&self, year: i32) -> AppResult<Option<i32>> {
        let db = self.db.as_ref();
        let latest = read_with_retry("report.max_seq_for_year", move || {
            Report::find()
                .filter(report::Column::SeqYear.eq(year))
                .order_by_desc(report::Column::Seq)
                .one(db)
        })
        .await?;
        Ok(latest.map(|r| r.seq))
    }

    /// Insert a new report. A clashing report number is a conflict.
    pub async fn create(&self, model: report::ActiveModel) -> AppResult<report::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Report number already assigned".to_string())
            } else {
                db_error(e)
            }
        })
    }

    /// Update a report.
    pub async fn update(&self, model: report::ActiveModel) -> AppResult<report::Model> {
        model.update(self.db.as_ref()).await.map_err(db_error)
    }
}
