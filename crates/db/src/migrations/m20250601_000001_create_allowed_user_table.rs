//! Create allowed_user table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AllowedUser::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AllowedUser::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AllowedUser::Email).string_len(320).not_null())
                    .col(
                        ColumnDef::new(AllowedUser::IsAdmin)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(AllowedUser::AddedBy).string_len(320).not_null())
                    .col(
                        ColumnDef::new(AllowedUser::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(AllowedUser::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Unique index: email (stored lowercased, so this is case-insensitive)
        manager
            .create_index(
                Index::create()
                    .name("idx_allowed_user_email")
                    .table(AllowedUser::Table)
                    .col(AllowedUser::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AllowedUser::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AllowedUser {
    Table,
    Id,
    Email,
    IsAdmin,
    AddedBy,
    CreatedAt,
    UpdatedAt,
}
