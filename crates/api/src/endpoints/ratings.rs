//! Rating endpoints.

use axum::{Json, Router, extract::State, routing::post};
use informes_common::AppResult;
use informes_core::{RatingInput, RatingState};
use informes_db::entities::rating::{self, RatingValue};
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Rating response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingResponse {
    pub report_id: String,
    pub rating: RatingValue,
    pub label: &'static str,
    pub comments: Option<String>,
    pub report_number: String,
    pub locked: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<rating::Model> for RatingResponse {
    fn from(rating: rating::Model) -> Self {
        Self {
            report_id: rating.id,
            label: rating.rating.label(),
            rating: rating.rating,
            comments: rating.comments,
            report_number: rating.report_number,
            locked: rating.locked,
            created_at: rating.created_at.to_rfc3339(),
            updated_at: rating.updated_at.to_rfc3339(),
        }
    }
}

/// A report's rating together with its lifecycle state.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowRatingResponse {
    pub state: RatingState,
    pub rating: Option<RatingResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanModifyResponse {
    pub can_modify: bool,
}

/// Request naming a report.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRatingRequest {
    pub report_id: String,
}

/// Save rating request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRatingRequest {
    pub report_id: String,
    #[serde(flatten)]
    pub rating: RatingInput,
}

async fn show(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ReportRatingRequest>,
) -> AppResult<ApiResponse<ShowRatingResponse>> {
    let rating = state.rating_service.get_rating(&req.report_id).await?;
    Ok(ApiResponse::ok(ShowRatingResponse {
        state: RatingState::of(rating.as_ref()),
        rating: rating.map(RatingResponse::from),
    }))
}

/// Advisory only: the save itself is what enforces the lock.
async fn can_modify(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ReportRatingRequest>,
) -> ApiResponse<CanModifyResponse> {
    ApiResponse::ok(CanModifyResponse {
        can_modify: state.rating_service.can_modify(&req.report_id).await,
    })
}

/// Save the report's one rating. A second save answers `RATING_LOCKED`.
async fn save(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SaveRatingRequest>,
) -> AppResult<ApiResponse<RatingResponse>> {
    let saved = state
        .rating_service
        .save_rating(&req.report_id, req.rating)
        .await?;
    Ok(ApiResponse::ok(saved.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/show", post(show))
        .route("/can-modify", post(can_modify))
        .route("/save", post(save))
}
