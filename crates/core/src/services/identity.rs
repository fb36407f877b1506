//! Identity provider adapter.
//!
//! Login itself happens upstream; this side only verifies the bearer token
//! the provider issued and turns it into an [`Identity`].

use std::sync::Arc;

use async_trait::async_trait;
use informes_common::{AppError, AppResult, AuthConfig};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A verified account as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Stable account identifier at the provider.
    pub account_id: String,
    /// Lowercased email.
    pub email: String,
    /// Name to show, when the provider has one.
    pub display_name: Option<String>,
}

/// Verifies identities and ends sessions.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify a bearer token. Any failure is [`AppError::Unauthorized`].
    async fn authenticate(&self, token: &str) -> AppResult<Identity>;

    /// End the provider-side session for an identity.
    async fn deauthenticate(&self, identity: &Identity) -> AppResult<()>;
}

/// Type alias for a shared identity provider.
pub type IdentityService = Arc<dyn IdentityProvider>;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    #[serde(default)]
    name: Option<String>,
    exp: u64,
}

/// HS256 token verifier.
pub struct JwtIdentityProvider {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityProvider {
    /// Build a verifier from the `auth` configuration section.
    pub fn new(config: &AuthConfig) -> AppResult<Self> {
        if config.jwt_secret.trim().is_empty() {
            return Err(AppError::Config("auth.jwt_secret must not be empty".to_string()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        })
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn authenticate(&self, token: &str) -> AppResult<Identity> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            debug!(error = %e, "Rejected identity token");
            AppError::Unauthorized
        })?;

        let email = data.claims.email.trim().to_lowercase();
        if email.is_empty() {
            debug!(account_id = %data.claims.sub, "Identity token without email");
            return Err(AppError::Unauthorized);
        }

        Ok(Identity {
            account_id: data.claims.sub,
            email,
            display_name: data.claims.name.filter(|n| !n.trim().is_empty()),
        })
    }

    async fn deauthenticate(&self, identity: &Identity) -> AppResult<()> {
        // Tokens are stateless here; the client drops its copy.
        info!(email = %identity.email, "Session ended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    const SECRET: &str = "test-secret";

    fn auth_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: SECRET.to_string(),
            issuer: None,
            audience: None,
            bootstrap_admins: vec![],
        }
    }

    fn token(claims: &serde_json::Value, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn in_one_hour() -> u64 {
        (chrono::Utc::now().timestamp() + 3600) as u64
    }

    #[tokio::test]
    async fn test_authenticate_valid_token() {
        let provider = JwtIdentityProvider::new(&auth_config()).unwrap();
        let token = token(
            &json!({"sub": "acc-1", "email": "Ana@CEPR.edu.pe", "name": "Ana", "exp": in_one_hour()}),
            SECRET,
        );

        let identity = provider.authenticate(&token).await.unwrap();

        assert_eq!(identity.account_id, "acc-1");
        assert_eq!(identity.email, "ana@cepr.edu.pe");
        assert_eq!(identity.display_name.as_deref(), Some("Ana"));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_wrong_secret() {
        let provider = JwtIdentityProvider::new(&auth_config()).unwrap();
        let token = token(
            &json!({"sub": "acc-1", "email": "ana@cepr.edu.pe", "exp": in_one_hour()}),
            "other-secret",
        );

        let result = provider.authenticate(&token).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_expired_token() {
        let provider = JwtIdentityProvider::new(&auth_config()).unwrap();
        let expired = (chrono::Utc::now().timestamp() - 3600) as u64;
        let token = token(
            &json!({"sub": "acc-1", "email": "ana@cepr.edu.pe", "exp": expired}),
            SECRET,
        );

        let result = provider.authenticate(&token).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_authenticate_checks_issuer() {
        let config = AuthConfig {
            issuer: Some("https://accounts.example".to_string()),
            ..auth_config()
        };
        let provider = JwtIdentityProvider::new(&config).unwrap();
        let token = token(
            &json!({"sub": "acc-1", "email": "ana@cepr.edu.pe", "iss": "https://evil.example", "exp": in_one_hour()}),
            SECRET,
        );

        let result = provider.authenticate(&token).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_garbage() {
        let provider = JwtIdentityProvider::new(&auth_config()).unwrap();
        let result = provider.authenticate("not-a-token").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_empty_secret_is_config_error() {
        let config = AuthConfig {
            jwt_secret: "  ".to_string(),
            ..auth_config()
        };
        assert!(matches!(
            JwtIdentityProvider::new(&config),
            Err(AppError::Config(_))
        ));
    }
}
