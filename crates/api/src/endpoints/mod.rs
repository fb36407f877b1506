//! API endpoints.

mod admin;
mod auth;
mod meta;
mod ratings;
mod reports;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/meta", meta::router())
        .nest("/auth", auth::router())
        .nest("/reports", reports::router())
        .nest("/ratings", ratings::router())
        .nest("/admin", admin::router())
}
