//! Meta endpoints.

use axum::{Json, Router, extract::State, routing::post};
use informes_db::entities::rating::RatingValue;
use informes_db::entities::report::{Estado, Medio, TipoConsulta, Vinculo};
use sea_orm::Iterable;
use serde::Serialize;

use crate::middleware::AppState;

/// A selectable form value and the label shown for it.
#[derive(Serialize)]
pub struct FormOption<T: Serialize> {
    pub value: T,
    pub label: &'static str,
}

fn options<T, I>(values: I, label: fn(T) -> &'static str) -> Vec<FormOption<T>>
where
    T: Serialize + Copy,
    I: IntoIterator<Item = T>,
{
    values
        .into_iter()
        .map(|value| FormOption {
            value,
            label: label(value),
        })
        .collect()
}

/// Application metadata and the option lists the report form needs.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub report_prefix: String,
    pub on_site_label: String,
    pub referral_offices: Vec<String>,
    pub vinculos: Vec<FormOption<Vinculo>>,
    pub medios: Vec<FormOption<Medio>>,
    pub estados: Vec<FormOption<Estado>>,
    pub tipos_consulta: Vec<FormOption<TipoConsulta>>,
    pub ratings: Vec<FormOption<RatingValue>>,
}

/// Get application metadata. No authorization required.
async fn meta(State(state): State<AppState>) -> Json<MetaResponse> {
    let registry = &state.registry;
    Json(MetaResponse {
        name: "informes",
        version: env!("CARGO_PKG_VERSION"),
        report_prefix: registry.report_prefix.clone(),
        on_site_label: registry.on_site_label.clone(),
        referral_offices: registry.referral_offices.clone(),
        vinculos: options(Vinculo::iter(), Vinculo::label),
        medios: options(Medio::iter(), Medio::label),
        estados: options(Estado::iter(), Estado::label),
        tipos_consulta: options(TipoConsulta::ALL, TipoConsulta::label),
        ratings: options(RatingValue::iter(), RatingValue::label),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(meta))
}
