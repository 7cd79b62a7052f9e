//! Create vote table migration.

use sea_orm_migration::prelude::*;

use super::m20260101_000003_create_contestant_table::Contestant;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vote::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Vote::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Vote::ReceiptNumber)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Vote::ContestantId).string_len(32).not_null())
                    .col(ColumnDef::new(Vote::VoterName).string_len(256).not_null())
                    .col(ColumnDef::new(Vote::VoterEmail).string_len(320))
                    .col(ColumnDef::new(Vote::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Vote::VoteQuantity).integer().not_null())
                    .col(
                        ColumnDef::new(Vote::TransactionId)
                            .string_len(128)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Vote::Message).text())
                    .col(
                        ColumnDef::new(Vote::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vote_contestant")
                            .from(Vote::Table, Vote::ContestantId)
                            .to(Contestant::Table, Contestant::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: contestant_id (vote history per contestant)
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_contestant_id")
                    .table(Vote::Table)
                    .col(Vote::ContestantId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vote::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Vote {
    Table,
    Id,
    ReceiptNumber,
    ContestantId,
    VoterName,
    VoterEmail,
    Amount,
    VoteQuantity,
    TransactionId,
    Message,
    CreatedAt,
}
