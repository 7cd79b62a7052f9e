//! Create contestant table migration.

use sea_orm_migration::prelude::*;

use super::m20260101_000001_create_registration_table::Registration;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Contestant::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Contestant::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Contestant::RegistrationId)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Contestant::ContestantNumber)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Contestant::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Contestant::Category).string_len(16).not_null())
                    .col(ColumnDef::new(Contestant::Province).string_len(64).not_null())
                    .col(ColumnDef::new(Contestant::PhotoUrl).string_len(1024))
                    .col(ColumnDef::new(Contestant::Bio).text())
                    .col(
                        ColumnDef::new(Contestant::VoteCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Contestant::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(Contestant::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Contestant::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contestant_registration")
                            .from(Contestant::Table, Contestant::RegistrationId)
                            .to(Registration::Table, Registration::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (status, category) for the public voting page
        manager
            .create_index(
                Index::create()
                    .name("idx_contestant_status_category")
                    .table(Contestant::Table)
                    .col(Contestant::Status)
                    .col(Contestant::Category)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Contestant::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Contestant {
    Table,
    Id,
    RegistrationId,
    ContestantNumber,
    Name,
    Category,
    Province,
    PhotoUrl,
    Bio,
    VoteCount,
    Status,
    CreatedAt,
    UpdatedAt,
}
