//! Report entity ("informe de atención").

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Relationship between the person asking and the applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum Vinculo {
    #[sea_orm(string_value = "Postulante")]
    #[serde(rename = "Postulante")]
    Postulante,
    #[sea_orm(string_value = "Madre/Padre o Apoderado")]
    #[serde(rename = "Madre/Padre o Apoderado")]
    Apoderado,
    #[sea_orm(string_value = "Otro")]
    #[serde(rename = "Otro")]
    Otro,
}

impl Vinculo {
    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Postulante => "Postulante",
            Self::Apoderado => "Madre/Padre o Apoderado",
            Self::Otro => "Otro",
        }
    }
}

/// Channel the inquiry came through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Medio {
    #[sea_orm(string_value = "Presencial")]
    #[serde(rename = "Presencial")]
    Presencial,
    #[sea_orm(string_value = "Telefónico")]
    #[serde(rename = "Telefónico")]
    Telefonico,
    #[sea_orm(string_value = "Teléfono fijo")]
    #[serde(rename = "Teléfono fijo")]
    TelefonoFijo,
    #[sea_orm(string_value = "Correo")]
    #[serde(rename = "Correo")]
    Correo,
    #[sea_orm(string_value = "Mensajería")]
    #[serde(rename = "Mensajería")]
    Mensajeria,
    #[sea_orm(string_value = "Otro")]
    #[serde(rename = "Otro")]
    Otro,
}

impl Medio {
    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Presencial => "Presencial",
            Self::Telefonico => "Telefónico",
            Self::TelefonoFijo => "Teléfono fijo",
            Self::Correo => "Correo",
            Self::Mensajeria => "Mensajería",
            Self::Otro => "Otro",
        }
    }
}

/// Resolution state of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum Estado {
    #[sea_orm(string_value = "atendido")]
    Atendido,
    /// Forwarded to another office; requires `oficina_derivada`.
    #[sea_orm(string_value = "derivado")]
    Derivado,
    #[sea_orm(string_value = "no_atendido")]
    NoAtendido,
}

impl Estado {
    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Atendido => "Atendido",
            Self::Derivado => "Derivado",
            Self::NoAtendido => "No atendido",
        }
    }
}

/// Inquiry category. A report carries a non-empty set of these, stored as JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TipoConsulta {
    #[serde(rename = "Información general")]
    InformacionGeneral,
    #[serde(rename = "Académica")]
    Academica,
    #[serde(rename = "Administrativa")]
    Administrativa,
    #[serde(rename = "Queja/Sugerencia")]
    QuejaSugerencia,
}

impl TipoConsulta {
    /// All categories in form order.
    pub const ALL: [Self; 4] = [
        Self::InformacionGeneral,
        Self::Academica,
        Self::Administrativa,
        Self::QuejaSugerencia,
    ];

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::InformacionGeneral => "Información general",
            Self::Academica => "Académica",
            Self::Administrativa => "Administrativa",
            Self::QuejaSugerencia => "Queja/Sugerencia",
        }
    }
}

/// A logged client-service interaction.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Human readable number, `<PREFIX>-<seq>-<year>`; assigned once at creation
    #[sea_orm(unique)]
    pub nro_consulta: String,

    /// Year scope of the sequence
    pub seq_year: i32,

    /// Sequence within `seq_year`
    pub seq: i32,

    pub cliente: String,

    pub vinculo_cliente_postulante: Vinculo,

    #[sea_orm(nullable)]
    pub vinculo_otro: Option<String>,

    pub medio: Medio,

    pub medio_comunicacion: String,

    pub estado: Estado,

    #[sea_orm(nullable)]
    pub oficina_derivada: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub resultado_derivacion: Option<String>,

    /// JSON array of [`TipoConsulta`] values
    #[sea_orm(column_type = "JsonBinary")]
    pub tipo_consulta: Json,

    #[sea_orm(column_type = "Text")]
    pub resultado_final: String,

    #[sea_orm(nullable)]
    pub correo_cliente: Option<String>,

    #[sea_orm(nullable)]
    pub telefono_cliente: Option<String>,

    /// Email of the creating staff member
    pub responsable: String,

    pub fecha_hora: DateTimeWithTimeZone,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Decode the stored inquiry categories, skipping unknown values.
    #[must_use]
    pub fn tipos_consulta(&self) -> Vec<TipoConsulta> {
        self.tipo_consulta
            .as_array()
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| serde_json::from_value(v.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::rating::Entity")]
    Rating,
}

impl Related<super::rating::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rating.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tipo_consulta_wire_values() {
        let value = serde_json::to_value(TipoConsulta::ALL).unwrap();
        assert_eq!(
            value,
            json!([
                "Información general",
                "Académica",
                "Administrativa",
                "Queja/Sugerencia"
            ])
        );
    }

    #[test]
    fn test_estado_uses_snake_case() {
        assert_eq!(
            serde_json::to_value(Estado::NoAtendido).unwrap(),
            json!("no_atendido")
        );
        let estado: Estado = serde_json::from_value(json!("derivado")).unwrap();
        assert_eq!(estado, Estado::Derivado);
    }

    #[test]
    fn test_vinculo_wire_value() {
        let vinculo: Vinculo = serde_json::from_value(json!("Madre/Padre o Apoderado")).unwrap();
        assert_eq!(vinculo, Vinculo::Apoderado);
    }
}
