//! Report service.

use informes_common::{AppError, AppResult, FieldErrors, IdGenerator, RegistryConfig};
use informes_db::entities::report::{self, Estado, Medio, TipoConsulta, Vinculo};
use informes_db::repositories::ReportRepository;
use mockable::Clock;
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::ValidateEmail;

use super::{NumberingService, SharedClock};

const REQUIRED: &str = "Este campo es obligatorio.";

/// Report fields as submitted by staff, before normalisation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReportInput {
    /// Client name; required
    pub cliente: String,
    /// Client's link to the applicant; required
    pub vinculo_cliente_postulante: Option<Vinculo>,
    /// Free-text link, only kept when the link is `Otro`
    pub vinculo_otro: Option<String>,
    /// Channel; required
    pub medio: Option<Medio>,
    /// Channel detail; defaults to the on-site label for in-person service
    pub medio_comunicacion: Option<String>,
    /// Status; required
    pub estado: Option<Estado>,
    /// Referral office, required and checked when referred
    pub oficina_derivada: Option<String>,
    /// Referral outcome, only kept when referred
    pub resultado_derivacion: Option<String>,
    /// Inquiry types; at least one, duplicates dropped
    pub tipo_consulta: Vec<TipoConsulta>,
    /// Outcome text; required
    pub resultado_final: String,
    /// Client email, checked when present
    pub correo_cliente: Option<String>,
    /// Client phone
    pub telefono_cliente: Option<String>,
}

/// Validated report fields, ready to persist.
///
/// Field meanings match [`ReportInput`]; strings are trimmed and fields that
/// do not apply to the chosen link or status are cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFields {
    /// Client name
    pub cliente: String,
    /// Client's link to the applicant
    pub vinculo: Vinculo,
    /// Set only for `Vinculo::Otro`
    pub vinculo_otro: Option<String>,
    /// Channel
    pub medio: Medio,
    /// Channel detail
    pub medio_comunicacion: String,
    /// Status
    pub estado: Estado,
    /// Set only for `Estado::Derivado`
    pub oficina_derivada: Option<String>,
    /// Set only for `Estado::Derivado`
    pub resultado_derivacion: Option<String>,
    /// Distinct inquiry types, in submission order
    pub tipo_consulta: Vec<TipoConsulta>,
    /// Outcome text
    pub resultado_final: String,
    /// Client email
    pub correo_cliente: Option<String>,
    /// Client phone
    pub telefono_cliente: Option<String>,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ReportInput {
    /// Normalise and validate, collecting every rejected field.
    pub fn validate(self, registry: &RegistryConfig) -> Result<ReportFields, FieldErrors> {
        let mut errors = FieldErrors::new();

        let cliente = self.cliente.trim().to_string();
        if cliente.is_empty() {
            errors.push("cliente", REQUIRED);
        }

        let vinculo_otro = trimmed(self.vinculo_otro);
        if self.vinculo_cliente_postulante.is_none() {
            errors.push("vinculoClientePostulante", REQUIRED);
        }
        let vinculo_otro = match self.vinculo_cliente_postulante {
            Some(Vinculo::Otro) => {
                if vinculo_otro.is_none() {
                    errors.push("vinculoOtro", "Especifique el vínculo.");
                }
                vinculo_otro
            }
            _ => None,
        };

        let mut medio_comunicacion = trimmed(self.medio_comunicacion);
        if self.medio == Some(Medio::Presencial) && medio_comunicacion.is_none() {
            medio_comunicacion = Some(registry.on_site_label.clone());
        }
        if self.medio.is_none() {
            errors.push("medio", REQUIRED);
        }
        if medio_comunicacion.is_none() {
            errors.push("medioComunicacion", REQUIRED);
        }

        let oficina_derivada = trimmed(self.oficina_derivada);
        let resultado_derivacion = trimmed(self.resultado_derivacion);
        let (oficina_derivada, resultado_derivacion) = match self.estado {
            Some(Estado::Derivado) => {
                match &oficina_derivada {
                    None => errors.push("oficinaDerivada", "Seleccione la oficina de derivación."),
                    Some(office) if !registry.referral_offices.contains(office) => {
                        errors.push("oficinaDerivada", "Oficina de derivación no válida.");
                    }
                    Some(_) => {}
                }
                (oficina_derivada, resultado_derivacion)
            }
            _ => (None, None),
        };
        if self.estado.is_none() {
            errors.push("estado", REQUIRED);
        }

        let mut tipo_consulta: Vec<TipoConsulta> = Vec::with_capacity(self.tipo_consulta.len());
        for tipo in self.tipo_consulta {
            if !tipo_consulta.contains(&tipo) {
                tipo_consulta.push(tipo);
            }
        }
        if tipo_consulta.is_empty() {
            errors.push("tipoConsulta", "Seleccione al menos un tipo de consulta.");
        }

        let resultado_final = self.resultado_final.trim().to_string();
        if resultado_final.is_empty() {
            errors.push("resultadoFinal", REQUIRED);
        }

        let correo_cliente = trimmed(self.correo_cliente);
        if let Some(correo) = &correo_cliente {
            if !correo.validate_email() {
                errors.push("correoCliente", "Correo electrónico inválido.");
            }
        }

        match (
            errors.is_empty(),
            self.vinculo_cliente_postulante,
            self.medio,
            medio_comunicacion,
            self.estado,
        ) {
            (true, Some(vinculo), Some(medio), Some(medio_comunicacion), Some(estado)) => {
                Ok(ReportFields {
                    cliente,
                    vinculo,
                    vinculo_otro,
                    medio,
                    medio_comunicacion,
                    estado,
                    oficina_derivada,
                    resultado_derivacion,
                    tipo_consulta,
                    resultado_final,
                    correo_cliente,
                    telefono_cliente: trimmed(self.telefono_cliente),
                })
            }
            _ => Err(errors),
        }
    }
}

impl ReportFields {
    fn tipo_consulta_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.tipo_consulta).unwrap_or_else(|_| serde_json::json!([]))
    }

    /// Copy the editable fields onto an active model.
    fn apply(self, model: &mut report::ActiveModel) {
        model.tipo_consulta = Set(self.tipo_consulta_json());
        model.cliente = Set(self.cliente);
        model.vinculo_cliente_postulante = Set(self.vinculo);
        model.vinculo_otro = Set(self.vinculo_otro);
        model.medio = Set(self.medio);
        model.medio_comunicacion = Set(self.medio_comunicacion);
        model.estado = Set(self.estado);
        model.oficina_derivada = Set(self.oficina_derivada);
        model.resultado_derivacion = Set(self.resultado_derivacion);
        model.resultado_final = Set(self.resultado_final);
        model.correo_cliente = Set(self.correo_cliente);
        model.telefono_cliente = Set(self.telefono_cliente);
    }
}

/// Service for creating, editing, and listing reports.
#[derive(Clone)]
pub struct ReportService {
    reports: ReportRepository,
    numbering: NumberingService,
    clock: SharedClock,
    registry: RegistryConfig,
    id_gen: IdGenerator,
}

impl ReportService {
    /// Create a new report service.
    #[must_use]
    pub const fn new(
        reports: ReportRepository,
        numbering: NumberingService,
        clock: SharedClock,
        registry: RegistryConfig,
    ) -> Self {
        Self {
            reports,
            numbering,
            clock,
            registry,
            id_gen: IdGenerator::new(),
        }
    }

    /// Validate and store a new report, assigning its number.
    pub async fn create_report(
        &self,
        input: ReportInput,
        creator_email: &str,
    ) -> AppResult<report::Model> {
        let fields = input.validate(&self.registry).map_err(AppError::Validation)?;

        let number = self.numbering.next_number().await;
        let now = self.clock.utc().fixed_offset();

        let mut model = report::ActiveModel {
            id: Set(self.id_gen.generate()),
            nro_consulta: Set(number.to_string()),
            seq_year: Set(number.year()),
            seq: Set(number.seq() as i32),
            responsable: Set(creator_email.trim().to_lowercase()),
            fecha_hora: Set(now),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        fields.apply(&mut model);

        let created = self.reports.create(model).await?;
        info!(
            id = %created.id,
            nro_consulta = %created.nro_consulta,
            responsable = %created.responsable,
            "Report created"
        );
        Ok(created)
    }

    /// Replace the editable fields of an existing report.
    ///
    /// The number, creator, and creation time never change.
    pub async fn update_report(&self, id: &str, input: ReportInput) -> AppResult<report::Model> {
        let existing = self.reports.get_by_id(id).await?;
        let fields = input.validate(&self.registry).map_err(AppError::Validation)?;

        let mut model: report::ActiveModel = existing.into();
        fields.apply(&mut model);
        model.updated_at = Set(self.clock.utc().fixed_offset());

        let updated = self.reports.update(model).await?;
        info!(id = %updated.id, nro_consulta = %updated.nro_consulta, "Report updated");
        Ok(updated)
    }

    /// Get a report by ID.
    pub async fn get_report(&self, id: &str) -> AppResult<report::Model> {
        self.reports.get_by_id(id).await
    }

    /// Reports newest first, optionally filtered by number or client name.
    pub async fn list_reports(
        &self,
        search: Option<&str>,
        limit: Option<u64>,
    ) -> AppResult<Vec<report::Model>> {
        self.reports.find_all(search, limit).await
    }
}
