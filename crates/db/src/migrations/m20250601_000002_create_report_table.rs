//! Create report table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Report::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Report::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Report::NroConsulta).string_len(32).not_null())
                    .col(ColumnDef::new(Report::SeqYear).integer().not_null())
                    .col(ColumnDef::new(Report::Seq).integer().not_null())
                    .col(ColumnDef::new(Report::Cliente).string_len(256).not_null())
                    .col(
                        ColumnDef::new(Report::VinculoClientePostulante)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Report::VinculoOtro).string_len(256))
                    .col(ColumnDef::new(Report::Medio).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Report::MedioComunicacion)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Report::Estado).string_len(16).not_null())
                    .col(ColumnDef::new(Report::OficinaDerivada).string_len(128))
                    .col(ColumnDef::new(Report::ResultadoDerivacion).text())
                    .col(
                        ColumnDef::new(Report::TipoConsulta)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(ColumnDef::new(Report::ResultadoFinal).text().not_null())
                    .col(ColumnDef::new(Report::CorreoCliente).string_len(320))
                    .col(ColumnDef::new(Report::TelefonoCliente).string_len(32))
                    .col(ColumnDef::new(Report::Responsable).string_len(320).not_null())
                    .col(
                        ColumnDef::new(Report::FechaHora)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Report::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Report::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: nro_consulta
        manager
            .create_index(
                Index::create()
                    .name("idx_report_nro_consulta")
                    .table(Report::Table)
                    .col(Report::NroConsulta)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Unique index: (seq_year, seq) - one sequence number per year
        manager
            .create_index(
                Index::create()
                    .name("idx_report_seq_year_seq")
                    .table(Report::Table)
                    .col(Report::SeqYear)
                    .col(Report::Seq)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: created_at (dashboard lists newest first)
        manager
            .create_index(
                Index::create()
                    .name("idx_report_created_at")
                    .table(Report::Table)
                    .col(Report::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Report::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Report {
    Table,
    Id,
    NroConsulta,
    SeqYear,
    Seq,
    Cliente,
    VinculoClientePostulante,
    VinculoOtro,
    Medio,
    MedioComunicacion,
    Estado,
    OficinaDerivada,
    ResultadoDerivacion,
    TipoConsulta,
    ResultadoFinal,
    CorreoCliente,
    TelefonoCliente,
    Responsable,
    FechaHora,
    CreatedAt,
    UpdatedAt,
}
