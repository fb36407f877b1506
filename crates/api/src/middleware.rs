//! API middleware.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use informes_common::{AppError, RegistryConfig};
use informes_core::{AccessGuard, AllowListService, ExportService, RatingService, ReportService};
use tracing::warn;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Identity plus allow-list check, run by [`auth_middleware`]
    pub access: AccessGuard,
    pub allow_list_service: AllowListService,
    pub report_service: ReportService,
    pub rating_service: RatingService,
    pub export_service: ExportService,
    /// Registry settings exposed through `/meta`
    pub registry: Arc<RegistryConfig>,
}

/// Why the request carries no authorized user.
///
/// Stored in the request extensions by [`auth_middleware`] and turned back
/// into an [`AppError`] by the extractors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRejection {
    /// No identity, or one the provider would not verify.
    Unauthenticated,
    /// Verified identity that is not on the allow-list.
    Denied(String),
}

impl From<AuthRejection> for AppError {
    fn from(rejection: AuthRejection) -> Self {
        match rejection {
            AuthRejection::Unauthenticated => Self::Unauthorized,
            AuthRejection::Denied(message) => Self::AccessDenied(message),
        }
    }
}

fn bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Authentication middleware.
///
/// Runs on every request. The allow-list is consulted each time, so a
/// revoked email loses access on its next request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = bearer_token(&req).map(ToString::to_string);

    match state.access.authorize(token.as_deref()).await {
        Ok(user) => {
            req.extensions_mut().insert(user);
        }
        Err(AppError::AccessDenied(message)) => {
            req.extensions_mut().insert(AuthRejection::Denied(message));
        }
        Err(AppError::Unauthorized) => {
            req.extensions_mut().insert(AuthRejection::Unauthenticated);
        }
        Err(e) => {
            warn!(error = %e, "Identity check failed, treating request as unauthenticated");
            req.extensions_mut().insert(AuthRejection::Unauthenticated);
        }
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_extraction() {
        let req = Request::builder()
            .header(AUTHORIZATION, "Bearer abc.def")
            .body(Body::empty())
            .unwrap();
        assert_eq!(bearer_token(&req), Some("abc.def"));

        let req = Request::builder()
            .header(AUTHORIZATION, "Basic abc")
            .body(Body::empty())
            .unwrap();
        assert_eq!(bearer_token(&req), None);

        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(bearer_token(&req), None);
    }

    #[test]
    fn test_rejection_maps_to_error() {
        assert!(matches!(
            AppError::from(AuthRejection::Unauthenticated),
            AppError::Unauthorized
        ));
        assert!(matches!(
            AppError::from(AuthRejection::Denied("no".to_string())),
            AppError::AccessDenied(m) if m == "no"
        ));
    }
}
