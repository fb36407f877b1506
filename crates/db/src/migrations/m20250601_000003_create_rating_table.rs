//! Create rating table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Rating::Table)
                    .if_not_exists()
                    // Primary key is the report id: at most one rating per report
                    .col(
                        ColumnDef::new(Rating::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Rating::Rating).string_len(16).not_null())
                    .col(ColumnDef::new(Rating::Comments).text())
                    .col(ColumnDef::new(Rating::ReportNumber).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Rating::Locked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Rating::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Rating::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rating_report")
                            .from(Rating::Table, Rating::Id)
                            .to(Report::Table, Report::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Rating::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Rating {
    Table,
    Id,
    Rating,
    Comments,
    ReportNumber,
    Locked,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Report {
    Table,
    Id,
}
