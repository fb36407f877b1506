//! Session endpoints.
//!
//! Sign-in happens at the identity provider; these only report on and end
//! the session behind the bearer token.

use axum::{Router, extract::State, response::IntoResponse, routing::post};
use informes_common::AppResult;
use informes_core::SessionSnapshot;
use tracing::info;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// Current user and whether they hold the admin flag right now.
async fn session(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<SessionSnapshot>> {
    Ok(ApiResponse::ok(state.access.session_snapshot(&user).await))
}

/// End the session at the identity provider.
async fn signout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    state.access.sign_out(&user).await?;
    info!(email = %user.email(), "Signed out");
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/session", post(session))
        .route("/signout", post(signout))
}
