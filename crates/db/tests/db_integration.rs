//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test -p informes-db --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `informes_test`)
//!   `TEST_DB_PASSWORD` (default: `informes_test`)

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use informes_common::AppError;
use informes_db::entities::{allowed_user, rating, report};
use informes_db::repositories::{
    AllowedUserRepository, RatingRepository, ReportCounterRepository, ReportRepository,
};
use informes_db::test_utils::{TestDatabase, TestDbConfig};
use sea_orm::Set;
use serde_json::json;

fn report_model(id: &str, year: i32, seq: i32) -> report::ActiveModel {
    let now = Utc::now().fixed_offset();
    report::ActiveModel {
        id: Set(id.to_string()),
        nro_consulta: Set(format!("CEP-{seq:04}-{year}")),
        seq_year: Set(year),
        seq: Set(seq),
        cliente: Set("Jorge Mamani".to_string()),
        vinculo_cliente_postulante: Set(report::Vinculo::Postulante),
        vinculo_otro: Set(None),
        medio: Set(report::Medio::Correo),
        medio_comunicacion: Set("jorge@correo.pe".to_string()),
        estado: Set(report::Estado::Atendido),
        oficina_derivada: Set(None),
        resultado_derivacion: Set(None),
        tipo_consulta: Set(json!(["Información general"])),
        resultado_final: Set("Consulta resuelta".to_string()),
        correo_cliente: Set(None),
        telefono_cliente: Set(None),
        responsable: Set("ana@cepr.edu.pe".to_string()),
        fecha_hora: Set(now),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

fn rating_model(report_id: &str, value: rating::RatingValue, locked: bool) -> rating::ActiveModel {
    let now = Utc::now().fixed_offset();
    rating::ActiveModel {
        id: Set(report_id.to_string()),
        rating: Set(value),
        comments: Set(None),
        report_number: Set("CEP-0001-2025".to_string()),
        locked: Set(locked),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(config.database_url().starts_with("postgres://"));
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_concurrent_sequences_are_distinct() {
    let db = TestDatabase::create_unique().await.unwrap();
    let conn = Arc::new(db.conn.clone());
    let repo = ReportCounterRepository::new(conn);

    let mut handles = Vec::new();
    for _ in 0..20 {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move {
            repo.next_sequence(2025, 0, Utc::now().fixed_offset())
                .await
                .unwrap()
        }));
    }

    let mut seen = HashSet::new();
    for handle in handles {
        assert!(seen.insert(handle.await.unwrap()));
    }
    assert_eq!(seen, (1..=20).collect::<HashSet<_>>());

    // A new year starts over at seed + 1
    assert_eq!(
        repo.next_sequence(2026, 0, Utc::now().fixed_offset())
            .await
            .unwrap(),
        1
    );

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_first_counter_row_is_seeded() {
    let db = TestDatabase::create_unique().await.unwrap();
    let repo = ReportCounterRepository::new(Arc::new(db.conn.clone()));

    let seq = repo
        .next_sequence(2024, 37, Utc::now().fixed_offset())
        .await
        .unwrap();
    assert_eq!(seq, 38);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_duplicate_report_number_is_conflict() {
    let db = TestDatabase::create_unique().await.unwrap();
    let repo = ReportRepository::new(Arc::new(db.conn.clone()));

    repo.create(report_model("r1", 2025, 1)).await.unwrap();
    let result = repo.create(report_model("r2", 2025, 1)).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let found = repo.find_all(Some("cep-0001"), None).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(repo.max_seq_for_year(2025).await.unwrap(), Some(1));

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_rating_first_save_wins() {
    let db = TestDatabase::create_unique().await.unwrap();
    let conn = Arc::new(db.conn.clone());
    ReportRepository::new(conn.clone())
        .create(report_model("r1", 2025, 1))
        .await
        .unwrap();
    let ratings = RatingRepository::new(conn);

    let first = ratings
        .insert_if_absent(rating_model("r1", rating::RatingValue::Satisfecho, true))
        .await
        .unwrap();
    let second = ratings
        .insert_if_absent(rating_model("r1", rating::RatingValue::Insatisfecho, true))
        .await
        .unwrap();

    assert!(first);
    assert!(!second);
    let stored = ratings.find_by_report_id("r1").await.unwrap().unwrap();
    assert_eq!(stored.rating, rating::RatingValue::Satisfecho);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_unlocked_rating_locks_once() {
    let db = TestDatabase::create_unique().await.unwrap();
    let conn = Arc::new(db.conn.clone());
    ReportRepository::new(conn.clone())
        .create(report_model("r1", 2025, 1))
        .await
        .unwrap();
    let ratings = RatingRepository::new(conn);
    ratings
        .insert_if_absent(rating_model("r1", rating::RatingValue::Neutral, false))
        .await
        .unwrap();

    let now = Utc::now().fixed_offset();
    let first = ratings
        .lock_if_unlocked("r1", rating::RatingValue::MuySatisfecho, None, "CEP-0001-2025", now)
        .await
        .unwrap();
    let second = ratings
        .lock_if_unlocked("r1", rating::RatingValue::Insatisfecho, None, "CEP-0001-2025", now)
        .await
        .unwrap();

    assert!(first);
    assert!(!second);
    let stored = ratings.find_by_report_id("r1").await.unwrap().unwrap();
    assert!(stored.locked);
    assert_eq!(stored.rating, rating::RatingValue::MuySatisfecho);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_allow_list_rejects_duplicate_email() {
    let db = TestDatabase::create_unique().await.unwrap();
    let repo = AllowedUserRepository::new(Arc::new(db.conn.clone()));

    let entry = |id: &str| allowed_user::ActiveModel {
        id: Set(id.to_string()),
        email: Set("luis@cepr.edu.pe".to_string()),
        is_admin: Set(false),
        added_by: Set("system".to_string()),
        created_at: Set(Utc::now().fixed_offset()),
        updated_at: Set(None),
    };

    repo.create(entry("u1")).await.unwrap();
    let result = repo.create(entry("u2")).await;
    assert!(matches!(result, Err(AppError::DuplicateEmail(_))));

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_cleanup_empties_registry_tables() {
    let db = TestDatabase::new().await.unwrap();
    let reports = ReportRepository::new(Arc::new(db.connection().clone()));
    reports.create(report_model("cleanup-1", 2031, 1)).await.unwrap();

    db.cleanup().await.unwrap();

    assert!(reports.find_by_id("cleanup-1").await.unwrap().is_none());
}
