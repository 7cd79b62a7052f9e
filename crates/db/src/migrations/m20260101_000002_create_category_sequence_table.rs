//! Create category sequence table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CategorySequence::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CategorySequence::Category)
                            .string_len(16)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CategorySequence::LastValue)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CategorySequence::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Continue numbering after any registrations that predate the counter.
        let db = manager.get_connection();
        db.execute_unprepared(
            "INSERT INTO category_sequence (category, last_value) \
             SELECT category, MAX(sequence) FROM registration GROUP BY category \
             ON CONFLICT (category) DO NOTHING",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CategorySequence::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum CategorySequence {
    Table,
    Category,
    LastValue,
    UpdatedAt,
}
