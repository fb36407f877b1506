//! Rating entity (post-service satisfaction, one per report).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Satisfaction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum RatingValue {
    #[sea_orm(string_value = "muy_satisfecho")]
    #[serde(rename = "muy_satisfecho", alias = "very_satisfied")]
    MuySatisfecho,
    #[sea_orm(string_value = "satisfecho")]
    #[serde(rename = "satisfecho", alias = "satisfied")]
    Satisfecho,
    #[sea_orm(string_value = "neutral")]
    #[serde(rename = "neutral")]
    Neutral,
    #[sea_orm(string_value = "insatisfecho")]
    #[serde(rename = "insatisfecho", alias = "unsatisfied")]
    Insatisfecho,
    #[sea_orm(string_value = "muy_insatisfecho")]
    #[serde(rename = "muy_insatisfecho", alias = "very_unsatisfied")]
    MuyInsatisfecho,
}

impl RatingValue {
    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MuySatisfecho => "Muy satisfecho",
            Self::Satisfecho => "Satisfecho",
            Self::Neutral => "Neutral",
            Self::Insatisfecho => "Insatisfecho",
            Self::MuyInsatisfecho => "Muy insatisfecho",
        }
    }
}

/// Rating record. Its `id` is the rated report's id, so a report has at most one.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rating")]
pub struct Model {
    /// Same value as `report.id`
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub rating: RatingValue,

    #[sea_orm(column_type = "Text", nullable)]
    pub comments: Option<String>,

    /// Copy of the report's `nro_consulta` at submission time (display only)
    pub report_number: String,

    /// Once true, the record never changes again
    pub locked: bool,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::report::Entity",
        from = "Column::Id",
        to = "super::report::Column::Id",
        on_delete = "Cascade"
    )]
    Report,
}

impl Related<super::report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Report.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
