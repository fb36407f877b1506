//! Allowed user entity (the access allow-list).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An email permitted to use the registry.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "allowed_user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Lowercased email, unique across the directory
    #[sea_orm(unique)]
    pub email: String,

    pub is_admin: bool,

    /// Email of the admin who granted access
    pub added_by: String,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
