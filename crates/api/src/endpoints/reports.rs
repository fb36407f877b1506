//! Report endpoints.

use axum::{Json, Router, extract::State, routing::post};
use informes_common::AppResult;
use informes_core::{ExportRow, ReportInput};
use informes_db::entities::report::{self, Estado, Medio, TipoConsulta, Vinculo};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Report response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub id: String,
    pub nro_consulta: String,
    pub cliente: String,
    pub vinculo_cliente_postulante: Vinculo,
    pub vinculo_otro: Option<String>,
    pub medio: Medio,
    pub medio_comunicacion: String,
    pub estado: Estado,
    pub oficina_derivada: Option<String>,
    pub resultado_derivacion: Option<String>,
    pub tipo_consulta: Vec<TipoConsulta>,
    pub resultado_final: String,
    pub correo_cliente: Option<String>,
    pub telefono_cliente: Option<String>,
    pub responsable: String,
    pub fecha_hora: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<report::Model> for ReportResponse {
    fn from(report: report::Model) -> Self {
        Self {
            tipo_consulta: report.tipos_consulta(),
            id: report.id,
            nro_consulta: report.nro_consulta,
            cliente: report.cliente,
            vinculo_cliente_postulante: report.vinculo_cliente_postulante,
            vinculo_otro: report.vinculo_otro,
            medio: report.medio,
            medio_comunicacion: report.medio_comunicacion,
            estado: report.estado,
            oficina_derivada: report.oficina_derivada,
            resultado_derivacion: report.resultado_derivacion,
            resultado_final: report.resultado_final,
            correo_cliente: report.correo_cliente,
            telefono_cliente: report.telefono_cliente,
            responsable: report.responsable,
            fecha_hora: report.fecha_hora.to_rfc3339(),
            created_at: report.created_at.to_rfc3339(),
            updated_at: report.updated_at.to_rfc3339(),
        }
    }
}

/// Update report request: the target plus the full set of editable fields.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReportRequest {
    pub report_id: String,
    #[serde(flatten)]
    pub report: ReportInput,
}

/// Show report request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowReportRequest {
    pub report_id: String,
}

/// List/export request.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct ListReportsRequest {
    /// Matched against the report number and the client name
    #[validate(length(max = 100))]
    pub search: Option<String>,
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<u64>,
}

impl ListReportsRequest {
    fn search(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Create a report. The caller becomes its `responsable`.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ReportInput>,
) -> AppResult<ApiResponse<ReportResponse>> {
    let report = state.report_service.create_report(req, user.email()).await?;
    Ok(ApiResponse::ok(report.into()))
}

async fn update(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateReportRequest>,
) -> AppResult<ApiResponse<ReportResponse>> {
    let report = state
        .report_service
        .update_report(&req.report_id, req.report)
        .await?;
    Ok(ApiResponse::ok(report.into()))
}

async fn show(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ShowReportRequest>,
) -> AppResult<ApiResponse<ReportResponse>> {
    let report = state.report_service.get_report(&req.report_id).await?;
    Ok(ApiResponse::ok(report.into()))
}

/// List reports, newest first.
async fn list(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListReportsRequest>,
) -> AppResult<ApiResponse<Vec<ReportResponse>>> {
    req.validate()?;

    let reports = state
        .report_service
        .list_reports(req.search(), req.limit)
        .await?;
    Ok(ApiResponse::ok(
        reports.into_iter().map(ReportResponse::from).collect(),
    ))
}

/// Spreadsheet-ready rows for the reports the same listing would show.
async fn export(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListReportsRequest>,
) -> AppResult<ApiResponse<Vec<ExportRow>>> {
    req.validate()?;

    let rows = state.export_service.export(req.search(), req.limit).await?;
    info!(email = %user.email(), rows = rows.len(), "Reports exported");
    Ok(ApiResponse::ok(rows))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/update", post(update))
        .route("/show", post(show))
        .route("/list", post(list))
        .route("/export", post(export))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_request_flattens_report_fields() {
        let req: UpdateReportRequest = serde_json::from_value(json!({
            "reportId": "r1",
            "cliente": "Juan Pérez",
            "tipoConsulta": ["Académica"],
            "resultadoFinal": "Informado"
        }))
        .unwrap();

        assert_eq!(req.report_id, "r1");
        assert_eq!(req.report.cliente, "Juan Pérez");
        assert_eq!(req.report.tipo_consulta, vec![TipoConsulta::Academica]);
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let req = ListReportsRequest {
            search: Some("   ".to_string()),
            limit: None,
        };
        assert_eq!(req.search(), None);
    }

    #[test]
    fn test_limit_is_bounded() {
        let req = ListReportsRequest {
            search: None,
            limit: Some(0),
        };
        assert!(req.validate().is_err());
    }
}
