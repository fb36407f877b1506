//! Fixtures shared by service tests.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use informes_db::entities::{allowed_user, rating, report};
use mockable::Clock;
use sea_orm::{DatabaseConnection, Statement};
use serde_json::json;

use super::SharedClock;

pub struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

/// A clock frozen at the given UTC instant.
pub fn clock_at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> SharedClock {
    Arc::new(FixtureClock {
        utc_now: Utc
            .with_ymd_and_hms(year, month, day, hour, minute, 0)
            .single()
            .expect("valid fixture timestamp"),
    })
}

/// Every statement a mock connection received, in order.
///
/// All services sharing the connection must be dropped first.
pub fn sent_statements(conn: Arc<DatabaseConnection>) -> Vec<Statement> {
    Arc::into_inner(conn)
        .expect("connection still shared")
        .into_transaction_log()
        .iter()
        .flat_map(|txn| txn.statements().to_vec())
        .collect()
}

/// The single statement whose SQL starts with `prefix`.
pub fn statement_starting(statements: &[Statement], prefix: &str) -> Statement {
    let mut matching = statements.iter().filter(|s| s.sql.starts_with(prefix));
    let found = matching.next().cloned().expect("no matching statement");
    assert!(matching.next().is_none(), "more than one {prefix} statement");
    found
}

pub fn report_model(id: &str, nro_consulta: &str) -> report::Model {
    let at = Utc
        .with_ymd_and_hms(2025, 3, 14, 15, 5, 0)
        .single()
        .expect("valid fixture timestamp")
        .fixed_offset();
    report::Model {
        id: id.to_string(),
        nro_consulta: nro_consulta.to_string(),
        seq_year: 2025,
        seq: 1,
        cliente: "Ana Torres".to_string(),
        vinculo_cliente_postulante: report::Vinculo::Postulante,
        vinculo_otro: None,
        medio: report::Medio::Presencial,
        medio_comunicacion: "En sede".to_string(),
        estado: report::Estado::Atendido,
        oficina_derivada: None,
        resultado_derivacion: None,
        tipo_consulta: json!(["Académica"]),
        resultado_final: "Se explicó el cronograma.".to_string(),
        correo_cliente: None,
        telefono_cliente: None,
        responsable: "staff@cepr.edu.pe".to_string(),
        fecha_hora: at,
        created_at: at,
        updated_at: at,
    }
}

pub fn rating_model(report_id: &str, value: rating::RatingValue, locked: bool) -> rating::Model {
    let at = Utc::now().fixed_offset();
    rating::Model {
        id: report_id.to_string(),
        rating: value,
        comments: Some("Excelente".to_string()),
        report_number: "CEP-0001-2025".to_string(),
        locked,
        created_at: at,
        updated_at: at,
    }
}

pub fn allowed_user_model(email: &str, is_admin: bool) -> allowed_user::Model {
    allowed_user::Model {
        id: format!("id-{email}"),
        email: email.to_string(),
        is_admin,
        added_by: "system".to_string(),
        created_at: Utc::now().fixed_offset(),
        updated_at: None,
    }
}
