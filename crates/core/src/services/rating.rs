//! Rating service.
//!
//! A report gets exactly one chance to be rated: the first save creates the
//! rating already locked, and a locked rating is never written again. The
//! store enforces this with put-if-absent and a conditional update, so the
//! `can_modify` pre-check is advisory only.

use informes_common::{AppError, AppResult};
use informes_db::entities::rating::{self, RatingValue};
use informes_db::repositories::{RatingRepository, ReportRepository};
use mockable::Clock;
use sea_orm::IntoActiveModel;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::SharedClock;

/// Rating submission.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingInput {
    /// Chosen satisfaction level
    pub rating: RatingValue,
    /// Optional free text; blank is stored as none
    #[serde(default)]
    pub comments: Option<String>,
    /// Number shown to the rater; the stored value always comes from the report.
    #[serde(default)]
    pub report_number: Option<String>,
}

/// Lifecycle of a report's rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RatingState {
    /// Nothing saved yet; the next save is accepted.
    NoRating,
    /// Written by the older lock-on-second-save flow; finalised on next save.
    Unlocked,
    /// Final; every further save is rejected.
    Locked,
}

impl RatingState {
    /// State of a looked-up rating.
    #[must_use]
    pub const fn of(rating: Option<&rating::Model>) -> Self {
        match rating {
            None => Self::NoRating,
            Some(r) if r.locked => Self::Locked,
            Some(_) => Self::Unlocked,
        }
    }
}

fn locked_error(report_id: &str) -> AppError {
    AppError::RatingLocked(report_id.to_string())
}

/// Service for post-service ratings.
#[derive(Clone)]
pub struct RatingService {
    ratings: RatingRepository,
    reports: ReportRepository,
    clock: SharedClock,
}

impl RatingService {
    /// Create a new rating service.
    #[must_use]
    pub const fn new(ratings: RatingRepository, reports: ReportRepository, clock: SharedClock) -> Self {
        Self {
            ratings,
            reports,
            clock,
        }
    }

    /// The rating of a report, if it has one.
    pub async fn get_rating(&self, report_id: &str) -> AppResult<Option<rating::Model>> {
        self.ratings.find_by_report_id(report_id).await
    }

    /// Where the report's rating is in its lifecycle.
    pub async fn rating_state(&self, report_id: &str) -> AppResult<RatingState> {
        let rating = self.ratings.find_by_report_id(report_id).await?;
        Ok(RatingState::of(rating.as_ref()))
    }

    /// Whether a save would currently be accepted. A failed lookup answers `false`.
    pub async fn can_modify(&self, report_id: &str) -> bool {
        match self.rating_state(report_id).await {
            Ok(state) => state != RatingState::Locked,
            Err(e) => {
                warn!(report_id, error = %e, "Rating lookup failed, treating as locked");
                false
            }
        }
    }

    /// Save the one allowed rating for a report.
    pub async fn save_rating(&self, report_id: &str, input: RatingInput) -> AppResult<rating::Model> {
        let report = self.reports.get_by_id(report_id).await?;

        if let Some(claimed) = input.report_number.as_deref() {
            if claimed.trim() != report.nro_consulta {
                warn!(
                    report_id,
                    claimed,
                    nro_consulta = %report.nro_consulta,
                    "Ignoring mismatched report number on rating"
                );
            }
        }

        let comments = input
            .comments
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        let now = self.clock.utc().fixed_offset();

        match self.ratings.find_by_report_id(report_id).await? {
            Some(existing) if existing.locked => {
                debug!(report_id, "Rejected save on locked rating");
                Err(locked_error(report_id))
            }
            Some(existing) => {
                let finalised = self
                    .ratings
                    .lock_if_unlocked(report_id, input.rating, comments.clone(), &report.nro_consulta, now)
                    .await?;
                if !finalised {
                    debug!(report_id, "Lost race finalising legacy rating");
                    return Err(locked_error(report_id));
                }
                info!(report_id, nro_consulta = %report.nro_consulta, "Legacy rating finalised");
                Ok(rating::Model {
                    rating: input.rating,
                    comments,
                    report_number: report.nro_consulta,
                    locked: true,
                    updated_at: now,
                    ..existing
                })
            }
            None => {
                let model = rating::Model {
                    id: report_id.to_string(),
                    rating: input.rating,
                    comments,
                    report_number: report.nro_consulta,
                    locked: true,
                    created_at: now,
                    updated_at: now,
                };

                if !self
                    .ratings
                    .insert_if_absent(model.clone().into_active_model())
                    .await?
                {
                    debug!(report_id, "Lost race creating rating");
                    return Err(locked_error(report_id));
                }
                info!(report_id, nro_consulta = %model.report_number, rating = ?model.rating, "Rating saved");
                Ok(model)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{
        clock_at, rating_model, report_model, sent_statements, statement_starting,
    };
    use informes_db::entities::report;
    use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase, MockExecResult, Value};
    use serde_json::json;
    use std::sync::Arc;

    fn service_on(conn: &Arc<DatabaseConnection>) -> RatingService {
        RatingService::new(
            RatingRepository::new(conn.clone()),
            ReportRepository::new(conn.clone()),
            clock_at(2025, 3, 15, 10, 0),
        )
    }

    fn service(db: MockDatabase) -> RatingService {
        service_on(&Arc::new(db.into_connection()))
    }

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn input(value: RatingValue, comments: &str) -> RatingInput {
        RatingInput {
            rating: value,
            comments: Some(comments.to_string()),
            report_number: None,
        }
    }

    #[test]
    fn test_input_accepts_english_rating_names() {
        let input: RatingInput =
            serde_json::from_value(json!({"rating": "very_satisfied", "comments": "Excelente"}))
                .unwrap();
        assert_eq!(input.rating, RatingValue::MuySatisfecho);
    }

    #[tokio::test]
    async fn test_first_save_creates_locked_rating() {
        let conn = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[report_model("r1", "CEP-0001-2025")]])
                .append_query_results([Vec::<rating::Model>::new()])
                .append_exec_results([exec(1)])
                .into_connection(),
        );
        let svc = service_on(&conn);

        let saved = svc
            .save_rating("r1", input(RatingValue::MuySatisfecho, "  Excelente "))
            .await
            .unwrap();
        drop(svc);

        assert_eq!(saved.rating, RatingValue::MuySatisfecho);
        assert_eq!(saved.comments.as_deref(), Some("Excelente"));
        assert_eq!(saved.report_number, "CEP-0001-2025");
        assert!(saved.locked);

        // The stored row must be locked too, or a second save could overwrite it
        let insert = statement_starting(&sent_statements(conn), r#"INSERT INTO "rating""#);
        let values = insert.values.expect("insert carries values").0;
        assert!(values.contains(&Value::Bool(Some(true))));
        assert!(!values.contains(&Value::Bool(Some(false))));
        assert!(values.contains(&Value::String(Some(Box::new("CEP-0001-2025".to_string())))));
        assert!(insert.sql.contains("ON CONFLICT"));
    }

    #[tokio::test]
    async fn test_second_save_is_rejected() {
        let original = rating_model("r1", RatingValue::MuySatisfecho, true);
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[report_model("r1", "CEP-0001-2025")]])
                .append_query_results([[original.clone()]])
                .append_query_results([[original.clone()]]),
        );

        let result = svc
            .save_rating("r1", input(RatingValue::Insatisfecho, "Cambio"))
            .await;
        assert!(matches!(result, Err(AppError::RatingLocked(id)) if id == "r1"));

        let after = svc.get_rating("r1").await.unwrap().unwrap();
        assert_eq!(after, original);
    }

    #[tokio::test]
    async fn test_lost_insert_race_is_locked() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[report_model("r1", "CEP-0001-2025")]])
                .append_query_results([Vec::<rating::Model>::new()])
                .append_exec_results([exec(0)]),
        );

        let result = svc.save_rating("r1", input(RatingValue::Neutral, "")).await;

        assert!(matches!(result, Err(AppError::RatingLocked(_))));
    }

    #[tokio::test]
    async fn test_legacy_unlocked_rating_is_finalised() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[report_model("r1", "CEP-0001-2025")]])
                .append_query_results([[rating_model("r1", RatingValue::Neutral, false)]])
                .append_exec_results([exec(1)]),
        );

        let saved = svc
            .save_rating("r1", input(RatingValue::Satisfecho, ""))
            .await
            .unwrap();

        assert!(saved.locked);
        assert_eq!(saved.rating, RatingValue::Satisfecho);
        assert_eq!(saved.comments, None);
    }

    #[tokio::test]
    async fn test_legacy_finalise_race_is_locked() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[report_model("r1", "CEP-0001-2025")]])
                .append_query_results([[rating_model("r1", RatingValue::Neutral, false)]])
                .append_exec_results([exec(0)]),
        );

        let result = svc.save_rating("r1", input(RatingValue::Satisfecho, "")).await;

        assert!(matches!(result, Err(AppError::RatingLocked(_))));
    }

    #[tokio::test]
    async fn test_save_for_missing_report() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<report::Model>::new()]),
        );

        let result = svc.save_rating("missing", input(RatingValue::Neutral, "")).await;

        assert!(matches!(result, Err(AppError::ReportNotFound(_))));
    }

    #[tokio::test]
    async fn test_stored_number_comes_from_report() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[report_model("r1", "CEP-0003-2025")]])
                .append_query_results([Vec::<rating::Model>::new()])
                .append_exec_results([exec(1)]),
        );

        let saved = svc
            .save_rating(
                "r1",
                RatingInput {
                    rating: RatingValue::Satisfecho,
                    comments: None,
                    report_number: Some("CEP-9999-2025".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(saved.report_number, "CEP-0003-2025");
    }

    #[tokio::test]
    async fn test_save_surfaces_store_failure() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[report_model("r1", "CEP-0001-2025")]])
                .append_query_results([Vec::<rating::Model>::new()])
                .append_exec_errors([DbErr::Custom("disk full".to_string())]),
        );

        let result = svc.save_rating("r1", input(RatingValue::Neutral, "")).await;

        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[tokio::test]
    async fn test_can_modify_matches_lock_state() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<rating::Model>::new()])
                .append_query_results([[rating_model("r1", RatingValue::Neutral, false)]])
                .append_query_results([[rating_model("r1", RatingValue::Neutral, true)]]),
        );

        assert!(svc.can_modify("r1").await);
        assert!(svc.can_modify("r1").await);
        assert!(!svc.can_modify("r1").await);
    }

    #[tokio::test]
    async fn test_can_modify_fails_closed() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([DbErr::Custom("timeout".to_string())]),
        );

        assert!(!svc.can_modify("r1").await);
    }

    #[tokio::test]
    async fn test_rating_state() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<rating::Model>::new()])
                .append_query_results([[rating_model("r1", RatingValue::Neutral, true)]]),
        );

        assert_eq!(svc.rating_state("r1").await.unwrap(), RatingState::NoRating);
        assert_eq!(svc.rating_state("r1").await.unwrap(), RatingState::Locked);
    }
}
