//! Export assembly.
//!
//! Flattens reports and their ratings into spreadsheet-ready rows. A rating
//! lookup that fails only affects its own row.

use chrono_tz::Tz;
use futures::future::join_all;
use informes_common::{AppResult, RegistryConfig};
use informes_db::entities::report::{self, Vinculo};
use informes_db::entities::rating;
use informes_db::repositories::{RatingRepository, ReportRepository};
use serde::Serialize;
use tracing::{debug, warn};

use super::parse_timezone;

/// Shown for reports without a rating.
pub const UNRATED_LABEL: &str = "Sin calificar";
/// Shown when the rating could not be read.
pub const UNAVAILABLE_LABEL: &str = "No disponible";

/// Rating part of an export row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RatingCell {
    /// The report has a rating.
    Rated {
        /// Spanish label of the rating value
        label: &'static str,
        /// Rater's comments, if any
        comments: Option<String>,
    },
    /// No rating saved yet.
    Unrated,
    /// The lookup failed; the row is still exported.
    Unavailable,
}

impl RatingCell {
    fn from_lookup(result: AppResult<Option<rating::Model>>, report_id: &str) -> Self {
        match result {
            Ok(Some(r)) => Self::Rated {
                label: r.rating.label(),
                comments: r.comments,
            },
            Ok(None) => Self::Unrated,
            Err(e) => {
                warn!(report_id, error = %e, "Rating lookup failed during export");
                Self::Unavailable
            }
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Rated { label, .. } => *label,
            Self::Unrated => UNRATED_LABEL,
            Self::Unavailable => UNAVAILABLE_LABEL,
        }
    }
}

/// One exported report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    /// Report number
    pub nro_consulta: String,
    /// Client name
    pub cliente: String,
    /// Link label, or the free-text detail for `Otro`
    pub vinculo: String,
    /// Channel label
    pub medio: String,
    /// Channel detail
    pub medio_comunicacion: String,
    /// Status label
    pub estado: String,
    /// Inquiry types, comma separated
    pub tipo_consulta: String,
    /// Referral office, empty unless referred
    pub oficina_derivada: String,
    /// Outcome text
    pub resultado_final: String,
    /// Service date in the registry timezone
    pub fecha: String,
    /// Service time in the registry timezone
    pub hora: String,
    /// Email of the creator
    pub responsable: String,
    /// Rating label or a placeholder
    pub calificacion: String,
    /// Rating comments, empty when none
    pub comentarios: String,
}

impl ExportRow {
    fn build(report: &report::Model, rating: &RatingCell, tz: Tz) -> Self {
        let vinculo = match (report.vinculo_cliente_postulante, &report.vinculo_otro) {
            (Vinculo::Otro, Some(detail)) => detail.clone(),
            (vinculo, _) => vinculo.label().to_string(),
        };
        let at = report.fecha_hora.with_timezone(&tz);
        let tipos: Vec<&str> = report.tipos_consulta().iter().map(|t| t.label()).collect();
        let comentarios = match rating {
            RatingCell::Rated { comments, .. } => comments.clone().unwrap_or_default(),
            _ => String::new(),
        };

        Self {
            nro_consulta: report.nro_consulta.clone(),
            cliente: report.cliente.clone(),
            vinculo,
            medio: report.medio.label().to_string(),
            medio_comunicacion: report.medio_comunicacion.clone(),
            estado: report.estado.label().to_string(),
            tipo_consulta: tipos.join(", "),
            oficina_derivada: report.oficina_derivada.clone().unwrap_or_default(),
            resultado_final: report.resultado_final.clone(),
            fecha: at.format("%d/%m/%Y").to_string(),
            hora: at.format("%H:%M").to_string(),
            responsable: report.responsable.clone(),
            calificacion: rating.label().to_string(),
            comentarios,
        }
    }
}

/// Builds export rows.
#[derive(Clone)]
pub struct ExportService {
    reports: ReportRepository,
    ratings: RatingRepository,
    tz: Tz,
}

impl ExportService {
    /// Create a new export service.
    pub fn new(
        reports: ReportRepository,
        ratings: RatingRepository,
        registry: &RegistryConfig,
    ) -> AppResult<Self> {
        Ok(Self {
            reports,
            ratings,
            tz: parse_timezone(&registry.timezone)?,
        })
    }

    /// Join each report with its rating, looking ratings up concurrently.
    pub async fn assemble(&self, reports: &[report::Model]) -> Vec<ExportRow> {
        let rows = reports.iter().map(|report| async move {
            let lookup = self.ratings.find_by_report_id(&report.id).await;
            let cell = RatingCell::from_lookup(lookup, &report.id);
            ExportRow::build(report, &cell, self.tz)
        });
        join_all(rows).await
    }

    /// Export the reports a listing with the same filters would show.
    pub async fn export(&self, search: Option<&str>, limit: Option<u64>) -> AppResult<Vec<ExportRow>> {
        let reports = self.reports.find_all(search, limit).await?;
        let rows = self.assemble(&reports).await;
        debug!(rows = rows.len(), "Export assembled");
        Ok(rows)
    }
}
