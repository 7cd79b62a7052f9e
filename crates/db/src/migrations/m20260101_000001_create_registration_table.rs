//! Create registration table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Registration::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Registration::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Registration::RegistrationNumber)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Registration::FullName).string_len(256).not_null())
                    .col(ColumnDef::new(Registration::Email).string_len(320).not_null())
                    .col(ColumnDef::new(Registration::Address).text().not_null())
                    .col(ColumnDef::new(Registration::BirthPlace).string_len(128).not_null())
                    .col(ColumnDef::new(Registration::BirthDate).date().not_null())
                    .col(
                        ColumnDef::new(Registration::WhatsappNumber)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Registration::Gender).string_len(16).not_null())
                    .col(ColumnDef::new(Registration::Profession).string_len(128).not_null())
                    .col(ColumnDef::new(Registration::Province).string_len(64).not_null())
                    .col(ColumnDef::new(Registration::Category).string_len(16).not_null())
                    .col(ColumnDef::new(Registration::Nik).string_len(16))
                    .col(ColumnDef::new(Registration::KiaNumber).string_len(16))
                    .col(
                        ColumnDef::new(Registration::IsMinor)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Registration::PhotoUrl).string_len(1024))
                    .col(ColumnDef::new(Registration::ParentalConsentUrl).string_len(1024))
                    .col(ColumnDef::new(Registration::PaymentProofUrl).string_len(1024))
                    .col(ColumnDef::new(Registration::Sequence).integer().not_null())
                    .col(
                        ColumnDef::new(Registration::InvoiceId)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Registration::ParticipantNumber)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Registration::InvoiceAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Registration::PaymentStatus)
                            .string_len(24)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Registration::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Registration::UpdatedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Registration::VerifiedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Index: category (dashboard counters, filters)
        manager
            .create_index(
                Index::create()
                    .name("idx_registration_category")
                    .table(Registration::Table)
                    .col(Registration::Category)
                    .to_owned(),
            )
            .await?;

        // Index: payment_status (pending queue)
        manager
            .create_index(
                Index::create()
                    .name("idx_registration_payment_status")
                    .table(Registration::Table)
                    .col(Registration::PaymentStatus)
                    .to_owned(),
            )
            .await?;

        // Index: invoice_amount (transfer reconciliation)
        manager
            .create_index(
                Index::create()
                    .name("idx_registration_invoice_amount")
                    .table(Registration::Table)
                    .col(Registration::InvoiceAmount)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (listing, export)
        manager
            .create_index(
                Index::create()
                    .name("idx_registration_created_at")
                    .table(Registration::Table)
                    .col(Registration::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Registration::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Registration {
    Table,
    Id,
    RegistrationNumber,
    FullName,
    Email,
    Address,
    BirthPlace,
    BirthDate,
    WhatsappNumber,
    Gender,
    Profession,
    Province,
    Category,
    Nik,
    KiaNumber,
    IsMinor,
    PhotoUrl,
    ParentalConsentUrl,
    PaymentProofUrl,
    Sequence,
    InvoiceId,
    ParticipantNumber,
    InvoiceAmount,
    PaymentStatus,
    CreatedAt,
    UpdatedAt,
    VerifiedAt,
}
