//! Allow-list directory service.
//!
//! Membership checks fail closed: a lookup error is logged and treated as
//! "not allowed", never surfaced as a grant.

use chrono::{DateTime, FixedOffset};
use informes_common::{AppError, AppResult, FieldErrors, IdGenerator};
use informes_db::entities::allowed_user;
use informes_db::repositories::AllowedUserRepository;
use mockable::Clock;
use sea_orm::Set;
use tracing::{info, warn};
use validator::ValidateEmail;

use super::SharedClock;

/// Granter recorded for entries created from configuration.
pub const SYSTEM_GRANTER: &str = "system";

/// Service for the access allow-list.
#[derive(Clone)]
pub struct AllowListService {
    repo: AllowedUserRepository,
    clock: SharedClock,
    id_gen: IdGenerator,
}

/// Canonical form used for storage and comparison.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AllowListService {
    /// Create a new allow-list service.
    #[must_use]
    pub const fn new(repo: AllowedUserRepository, clock: SharedClock) -> Self {
        Self {
            repo,
            clock,
            id_gen: IdGenerator::new(),
        }
    }

    /// Case-insensitive membership test.
    pub async fn is_email_allowed(&self, email: &str) -> bool {
        let email = normalize_email(email);
        match self.repo.find_by_email(&email).await {
            Ok(entry) => entry.is_some(),
            Err(e) => {
                warn!(email = %email, error = %e, "Allow-list lookup failed, denying");
                false
            }
        }
    }

    /// Membership test that also requires the admin flag.
    pub async fn is_user_admin(&self, email: &str) -> bool {
        let email = normalize_email(email);
        match self.repo.find_admin_by_email(&email).await {
            Ok(entry) => entry.is_some(),
            Err(e) => {
                warn!(email = %email, error = %e, "Admin lookup failed, denying");
                false
            }
        }
    }

    /// Full directory listing.
    pub async fn list_users(&self) -> AppResult<Vec<allowed_user::Model>> {
        self.repo.find_all().await
    }

    /// Get an entry by ID.
    pub async fn get_user(&self, id: &str) -> AppResult<allowed_user::Model> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Allowed user {id}")))
    }

    /// Add an email to the directory.
    pub async fn add_user(
        &self,
        email: &str,
        added_by: &str,
        is_admin: bool,
    ) -> AppResult<allowed_user::Model> {
        let email = normalize_email(email);
        if !email.validate_email() {
            let mut errors = FieldErrors::new();
            errors.push("email", "Correo electrónico inválido.");
            return Err(AppError::Validation(errors));
        }

        if self.repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::DuplicateEmail(email));
        }

        let model = allowed_user::ActiveModel {
            id: Set(self.id_gen.generate()),
            email: Set(email),
            is_admin: Set(is_admin),
            added_by: Set(normalize_email(added_by)),
            created_at: Set(self.now()),
            updated_at: Set(None),
        };

        let created = self.repo.create(model).await?;
        info!(email = %created.email, added_by = %created.added_by, is_admin, "Allowed user added");
        Ok(created)
    }

    /// Delete an entry by ID.
    pub async fn remove_user(&self, id: &str) -> AppResult<()> {
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound(format!("Allowed user {id}")));
        }
        info!(id, "Allowed user removed");
        Ok(())
    }

    /// Set the admin flag of an entry.
    pub async fn set_admin_status(&self, id: &str, is_admin: bool) -> AppResult<()> {
        self.write_admin_flag(id, is_admin).await.map(|_| ())
    }

    async fn write_admin_flag(&self, id: &str, is_admin: bool) -> AppResult<DateTime<FixedOffset>> {
        let now = self.now();
        if !self.repo.set_admin(id, is_admin, now).await? {
            return Err(AppError::NotFound(format!("Allowed user {id}")));
        }
        info!(id, is_admin, "Admin status changed");
        Ok(now)
    }

    fn now(&self) -> DateTime<FixedOffset> {
        self.clock.utc().fixed_offset()
    }

    /// Remove an entry on behalf of an admin, who may not remove themselves.
    pub async fn remove_user_as(&self, actor_email: &str, id: &str) -> AppResult<()> {
        let entry = self.get_user(id).await?;
        if entry.email == normalize_email(actor_email) {
            return Err(AppError::BadRequest(
                "No puedes eliminar tu propio acceso.".to_string(),
            ));
        }
        self.remove_user(id).await
    }

    /// Change an admin flag on behalf of an admin, who may not demote themselves.
    pub async fn set_admin_status_as(
        &self,
        actor_email: &str,
        id: &str,
        is_admin: bool,
    ) -> AppResult<allowed_user::Model> {
        let entry = self.get_user(id).await?;
        if !is_admin && entry.email == normalize_email(actor_email) {
            return Err(AppError::BadRequest(
                "No puedes quitarte tus propios permisos de administrador.".to_string(),
            ));
        }
        let changed_at = self.write_admin_flag(id, is_admin).await?;
        Ok(allowed_user::Model {
            is_admin,
            updated_at: Some(changed_at),
            ..entry
        })
    }

    /// Ensure every configured bootstrap email is an admin entry.
    ///
    /// Existing entries are left as they are. Returns how many were added.
    pub async fn bootstrap_admins(&self, emails: &[String]) -> AppResult<usize> {
        let mut added = 0;
        for email in emails {
            let email = normalize_email(email);
            if email.is_empty() || self.repo.find_by_email(&email).await?.is_some() {
                continue;
            }
            match self.add_user(&email, SYSTEM_GRANTER, true).await {
                Ok(_) => added += 1,
                // Another instance bootstrapped it first
                Err(AppError::DuplicateEmail(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(added)
    }
}
