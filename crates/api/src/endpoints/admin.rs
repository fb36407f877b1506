//! Allow-list administration endpoints.
//!
//! All of them require the caller to hold the admin flag at request time.

use axum::{Json, Router, extract::State, response::IntoResponse, routing::post};
use informes_common::AppResult;
use informes_db::entities::allowed_user;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    extractors::AdminUser,
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// Allowed user response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowedUserResponse {
    pub id: String,
    pub email: String,
    pub is_admin: bool,
    pub added_by: String,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<allowed_user::Model> for AllowedUserResponse {
    fn from(user: allowed_user::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            is_admin: user.is_admin,
            added_by: user.added_by,
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Add user request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddUserRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveUserRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAdminRequest {
    pub user_id: String,
    pub is_admin: bool,
}

async fn list_users(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<AllowedUserResponse>>> {
    let users = state.allow_list_service.list_users().await?;
    Ok(ApiResponse::ok(
        users.into_iter().map(AllowedUserResponse::from).collect(),
    ))
}

/// Grant access to an email. The caller is recorded as `addedBy`.
async fn add_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<AddUserRequest>,
) -> AppResult<ApiResponse<AllowedUserResponse>> {
    req.validate()?;

    let user = state
        .allow_list_service
        .add_user(&req.email, admin.email(), req.is_admin)
        .await?;
    Ok(ApiResponse::ok(user.into()))
}

async fn remove_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<RemoveUserRequest>,
) -> AppResult<impl IntoResponse> {
    state
        .allow_list_service
        .remove_user_as(admin.email(), &req.user_id)
        .await?;
    Ok(no_content())
}

async fn set_admin(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<SetAdminRequest>,
) -> AppResult<ApiResponse<AllowedUserResponse>> {
    let user = state
        .allow_list_service
        .set_admin_status_as(admin.email(), &req.user_id, req.is_admin)
        .await?;
    Ok(ApiResponse::ok(user.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/list", post(list_users))
        .route("/users/add", post(add_user))
        .route("/users/remove", post(remove_user))
        .route("/users/set-admin", post(set_admin))
}
