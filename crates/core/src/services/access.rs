//! Session and access guard.
//!
//! Every request passes through [`AccessGuard::authorize`]: a verified
//! identity is not enough, the email must also be on the allow-list, checked
//! against the directory each time.

use std::collections::HashSet;
use std::sync::Arc;

use informes_common::{AppError, AppResult};
use serde::Serialize;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};

use super::{AllowListService, Identity, IdentityService};

/// Shown when a verified account is not on the allow-list.
pub const ACCESS_DENIED_MESSAGE: &str = "No tienes permiso para acceder a esta aplicación.";

const ADMIN_REQUIRED_MESSAGE: &str = "Se requieren permisos de administrador.";

/// Changes to the current identity, for anyone who wants to follow them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// First authorized request since the guard started or the user signed out.
    SignedIn {
        /// Email of the identity
        email: String,
    },
    /// The user ended their session.
    SignedOut {
        /// Email of the identity
        email: String,
    },
    /// A verified identity was turned away by the allow-list.
    Revoked {
        /// Email of the identity
        email: String,
    },
}

/// An identity that passed the allow-list check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedUser {
    /// Verified identity from the provider
    pub identity: Identity,
}

impl AuthorizedUser {
    /// Normalised email of the user.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.identity.email
    }
}

/// Cached user details for the client. Never used for authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    /// Provider account id
    pub account_id: String,
    /// Normalised email
    pub email: String,
    /// Name shown in the client, when the provider has one
    pub display_name: Option<String>,
}

/// Session view returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Signed-in user, if any
    pub current_user: Option<SessionUser>,
    /// Computed from the directory on every call
    pub is_admin: bool,
}

/// Composes the identity provider with the allow-list.
#[derive(Clone)]
pub struct AccessGuard {
    identity: IdentityService,
    directory: AllowListService,
    events: broadcast::Sender<SessionEvent>,
    /// Emails seen authorized since their last sign-out or revocation
    active: Arc<RwLock<HashSet<String>>>,
}

impl AccessGuard {
    /// Create a new access guard.
    #[must_use]
    pub fn new(identity: IdentityService, directory: AllowListService) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            identity,
            directory,
            events,
            active: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Follow session changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Verify the bearer token and check the allow-list.
    pub async fn authorize(&self, token: Option<&str>) -> AppResult<AuthorizedUser> {
        let token = token.map(str::trim).filter(|t| !t.is_empty()).ok_or(AppError::Unauthorized)?;
        let identity = self.identity.authenticate(token).await?;

        if !self.directory.is_email_allowed(&identity.email).await {
            info!(email = %identity.email, "Identity not on allow-list, revoking session");
            if let Err(e) = self.identity.deauthenticate(&identity).await {
                warn!(email = %identity.email, error = %e, "Failed to end revoked session");
            }
            self.active.write().await.remove(&identity.email);
            self.emit(SessionEvent::Revoked {
                email: identity.email.clone(),
            });
            return Err(AppError::AccessDenied(ACCESS_DENIED_MESSAGE.to_string()));
        }

        debug!(email = %identity.email, "Request authorized");
        let first_seen = self.active.write().await.insert(identity.email.clone());
        if first_seen {
            self.emit(SessionEvent::SignedIn {
                email: identity.email.clone(),
            });
        }
        Ok(AuthorizedUser { identity })
    }

    /// Whether the user currently holds the admin flag.
    pub async fn is_admin(&self, user: &AuthorizedUser) -> bool {
        self.directory.is_user_admin(user.email()).await
    }

    /// Fail with [`AppError::Forbidden`] unless the user is an admin.
    pub async fn require_admin(&self, user: &AuthorizedUser) -> AppResult<()> {
        if self.is_admin(user).await {
            Ok(())
        } else {
            debug!(email = %user.email(), "Admin operation refused");
            Err(AppError::Forbidden(ADMIN_REQUIRED_MESSAGE.to_string()))
        }
    }

    /// End the user's session.
    pub async fn sign_out(&self, user: &AuthorizedUser) -> AppResult<()> {
        self.identity.deauthenticate(&user.identity).await?;
        self.active.write().await.remove(user.email());
        self.emit(SessionEvent::SignedOut {
            email: user.email().to_string(),
        });
        Ok(())
    }

    /// Session view for the client.
    pub async fn session_snapshot(&self, user: &AuthorizedUser) -> SessionSnapshot {
        SessionSnapshot {
            current_user: Some(SessionUser {
                account_id: user.identity.account_id.clone(),
                email: user.identity.email.clone(),
                display_name: user.identity.display_name.clone(),
            }),
            is_admin: self.is_admin(user).await,
        }
    }
}
