//! Allowed user repository.

use std::sync::Arc;

use crate::entities::{AllowedUser, allowed_user};
use crate::retry::read_with_retry;
use chrono::{DateTime, FixedOffset};
use informes_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    sea_query::Expr,
};

use super::{db_error, is_unique_violation};

/// Allow-list repository for database operations.
#[derive(Clone)]
pub struct AllowedUserRepository {
    db: Arc<DatabaseConnection>,
}

impl AllowedUserRepository {
    /// Create a new allowed user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an entry by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<allowed_user::Model>> {
        let db = self.db.as_ref();
        let id = id.to_string();
        read_with_retry("allowed_user.find_by_id", move || {
            AllowedUser::find_by_id(id.clone()).one(db)
        })
        .await
    }

    /// Find an entry by its (already lowercased) email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<allowed_user::Model>> {
        let db = self.db.as_ref();
        let email = email.to_string();
        read_with_retry("allowed_user.find_by_email", move || {
            AllowedUser::find()
                .filter(allowed_user::Column::Email.eq(email.clone()))
                .one(db)
        })
        .await
    }

    /// Find an entry by email that also holds the admin flag.
    pub async fn find_admin_by_email(&self, email: &str) -> AppResult<Option<allowed_user::Model>> {
        let db = self.db.as_ref();
        let email = email.to_string();
        read_with_retry("allowed_user.find_admin_by_email", move || {
            AllowedUser::find()
                .filter(allowed_user::Column::Email.eq(email.clone()))
                .filter(allowed_user::Column::IsAdmin.eq(true))
                .one(db)
        })
        .await
    }

    /// List every entry, ordered by email.
    pub async fn find_all(&self) -> AppResult<Vec<allowed_user::Model>> {
        let db = self.db.as_ref();
        read_with_retry("allowed_user.find_all", move || {
            AllowedUser::find()
                .order_by_asc(allowed_user::Column::Email)
                .all(db)
        })
        .await
    }

    /// Insert a new entry. A second entry for the same email is rejected.
    pub async fn create(&self, model: allowed_user::ActiveModel) -> AppResult<allowed_user::Model> {
        let email = model.email.clone().take().unwrap_or_default();
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateEmail(email)
            } else {
                db_error(e)
            }
        })
    }

    /// Delete an entry by ID. Returns whether a row was removed.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = AllowedUser::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected > 0)
    }

    /// Set the admin flag of an entry. Returns whether a row was updated.
    pub async fn set_admin(
        &self,
        id: &str,
        is_admin: bool,
        now: DateTime<FixedOffset>,
    ) -> AppResult<bool> {
        let result = AllowedUser::update_many()
            .col_expr(allowed_user::Column::IsAdmin, Expr::value(is_admin))
            .col_expr(allowed_user::Column::UpdatedAt, Expr::value(now))
            .filter(allowed_user::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult, Set};

    fn entry(email: &str, is_admin: bool) -> allowed_user::Model {
        allowed_user::Model {
            id: format!("id-{email}"),
            email: email.to_string(),
            is_admin,
            added_by: "system".to_string(),
            created_at: Utc::now().fixed_offset(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_email_returns_entry() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[entry("ana@cepr.edu.pe", true)]])
                .into_connection(),
        );

        let repo = AllowedUserRepository::new(db);
        let found = repo.find_by_email("ana@cepr.edu.pe").await.unwrap().unwrap();

        assert_eq!(found.email, "ana@cepr.edu.pe");
        assert!(found.is_admin);
    }

    #[tokio::test]
    async fn test_find_by_email_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<allowed_user::Model>::new()])
                .into_connection(),
        );

        let repo = AllowedUserRepository::new(db);
        assert!(repo.find_by_email("nobody@x.pe").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_email_surfaces_store_failure() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([DbErr::Custom("boom".to_string())])
                .into_connection(),
        );

        let repo = AllowedUserRepository::new(db);
        let result = repo.find_by_email("ana@cepr.edu.pe").await;

        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[tokio::test]
    async fn test_create_inserts_entry() {
        let model = entry("luis@cepr.edu.pe", false);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[model.clone()]])
                .into_connection(),
        );

        let repo = AllowedUserRepository::new(db);
        let created = repo
            .create(allowed_user::ActiveModel {
                id: Set(model.id.clone()),
                email: Set(model.email.clone()),
                is_admin: Set(false),
                added_by: Set("system".to_string()),
                created_at: Set(model.created_at),
                updated_at: Set(None),
            })
            .await
            .unwrap();

        assert_eq!(created.email, "luis@cepr.edu.pe");
    }

    #[tokio::test]
    async fn test_delete_reports_missing_row() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = AllowedUserRepository::new(db);
        assert!(!repo.delete("missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_set_admin_updates_row() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = AllowedUserRepository::new(db);
        assert!(
            repo.set_admin("id-luis@cepr.edu.pe", true, Utc::now().fixed_offset())
                .await
                .unwrap()
        );
    }
}
