//! Initial schema migration - creates all tables from scratch.
//!
//! The complete schema for the trade engine:
//!
//! - `users`: auth credentials + the contact profile frozen into shipments
//! - `goods`: listings with pricing, rental bounds and the reservable pool
//! - `rentals`, `purchases`, `applications`: one table per trade kind
//! - `shipments`: one row per (trade, direction) physical movement
//! - `channels`: discussion channel bindings, at most one per trade
//! - `notifications`: best-effort event records

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Username,
    Password,
    DisplayName,
    Phone,
    Address,
}

#[derive(Iden)]
enum Goods {
    Table,
    Id,
    OwnerId,
    Title,
    Description,
    Category,
    Condition,
    OwnerNotes,
    Listing,
    PricePerDay,
    PriceBuy,
    MinRentalDays,
    MaxRentalDays,
    StockQuantity,
    AvailableQuantity,
    Status,
    CreatedAt,
}

#[derive(Iden)]
enum Rentals {
    Table,
    Id,
    GoodId,
    OwnerId,
    RenterId,
    Quantity,
    StartDate,
    EndDate,
    TotalPrice,
    Status,
    Message,
    PaymentMethod,
    PostalCode,
    Address,
    ApprovedAt,
    ShippedAt,
    ReceivedAt,
    ReturnedAt,
    CompletedAt,
    CanceledAt,
    HiddenForOwner,
    HiddenForRenter,
    CreatedAt,
}

#[derive(Iden)]
enum Purchases {
    Table,
    Id,
    GoodId,
    SellerId,
    BuyerId,
    Quantity,
    Price,
    Status,
    ReturnStatus,
    SourceKind,
    SourceId,
    Message,
    PaymentMethod,
    PostalCode,
    Address,
    ApprovedAt,
    ShippedAt,
    CompletedAt,
    CanceledAt,
    ReturnRequestedAt,
    ReturnShippedAt,
    ReturnReceivedAt,
    HiddenForSeller,
    HiddenForBuyer,
    CreatedAt,
}

#[derive(Iden)]
enum Applications {
    Table,
    Id,
    GoodId,
    OwnerId,
    ApplicantId,
    Kind,
    Quantity,
    StartDate,
    EndDate,
    TotalPrice,
    Status,
    Message,
    PaymentMethod,
    PostalCode,
    Address,
    ApprovedAt,
    ShippedAt,
    ReceivedAt,
    ReturnedAt,
    CompletedAt,
    CanceledAt,
    HiddenForOwner,
    HiddenForApplicant,
    CreatedAt,
}

#[derive(Iden)]
enum Shipments {
    Table,
    Id,
    TradeKind,
    TradeId,
    Direction,
    SenderName,
    SenderPhone,
    SenderAddress,
    RecipientName,
    RecipientPhone,
    RecipientAddress,
    TrackingNumber,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Channels {
    Table,
    Id,
    GoodId,
    UserA,
    UserB,
    TradeKind,
    TradeId,
    CreatedAt,
}

#[derive(Iden)]
enum Notifications {
    Table,
    Id,
    UserId,
    Kind,
    Title,
    Body,
    Link,
    TradeKind,
    TradeId,
    CreatedAt,
    ReadAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .col(ColumnDef::new(Users::DisplayName).string())
                    .col(ColumnDef::new(Users::Phone).string())
                    .col(ColumnDef::new(Users::Address).string())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Goods
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Goods::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Goods::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Goods::OwnerId).string().not_null())
                    .col(ColumnDef::new(Goods::Title).string().not_null())
                    .col(ColumnDef::new(Goods::Description).string().not_null())
                    .col(ColumnDef::new(Goods::Category).string().not_null())
                    .col(ColumnDef::new(Goods::Condition).string())
                    .col(ColumnDef::new(Goods::OwnerNotes).string())
                    .col(ColumnDef::new(Goods::Listing).string().not_null())
                    .col(ColumnDef::new(Goods::PricePerDay).big_integer())
                    .col(ColumnDef::new(Goods::PriceBuy).big_integer())
                    .col(
                        ColumnDef::new(Goods::MinRentalDays)
                            .big_integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Goods::MaxRentalDays)
                            .big_integer()
                            .not_null()
                            .default(30),
                    )
                    .col(ColumnDef::new(Goods::StockQuantity).big_integer().not_null())
                    .col(ColumnDef::new(Goods::AvailableQuantity).big_integer())
                    .col(
                        ColumnDef::new(Goods::Status)
                            .string()
                            .not_null()
                            .default("listed"),
                    )
                    .col(ColumnDef::new(Goods::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-goods-owner_id")
                            .from(Goods::Table, Goods::OwnerId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-goods-owner_id")
                    .table(Goods::Table)
                    .col(Goods::OwnerId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Rentals
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Rentals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Rentals::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Rentals::GoodId).string().not_null())
                    .col(ColumnDef::new(Rentals::OwnerId).string().not_null())
                    .col(ColumnDef::new(Rentals::RenterId).string().not_null())
                    .col(ColumnDef::new(Rentals::Quantity).big_integer().not_null())
                    .col(ColumnDef::new(Rentals::StartDate).date().not_null())
                    .col(ColumnDef::new(Rentals::EndDate).date().not_null())
                    .col(ColumnDef::new(Rentals::TotalPrice).big_integer().not_null())
                    .col(ColumnDef::new(Rentals::Status).string().not_null())
                    .col(ColumnDef::new(Rentals::Message).string())
                    .col(ColumnDef::new(Rentals::PaymentMethod).string())
                    .col(ColumnDef::new(Rentals::PostalCode).string())
                    .col(ColumnDef::new(Rentals::Address).string())
                    .col(ColumnDef::new(Rentals::ApprovedAt).timestamp())
                    .col(ColumnDef::new(Rentals::ShippedAt).timestamp())
                    .col(ColumnDef::new(Rentals::ReceivedAt).timestamp())
                    .col(ColumnDef::new(Rentals::ReturnedAt).timestamp())
                    .col(ColumnDef::new(Rentals::CompletedAt).timestamp())
                    .col(ColumnDef::new(Rentals::CanceledAt).timestamp())
                    .col(
                        ColumnDef::new(Rentals::HiddenForOwner)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Rentals::HiddenForRenter)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Rentals::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-rentals-good_id")
                            .from(Rentals::Table, Rentals::GoodId)
                            .to(Goods::Table, Goods::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-rentals-owner_id")
                    .table(Rentals::Table)
                    .col(Rentals::OwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-rentals-renter_id")
                    .table(Rentals::Table)
                    .col(Rentals::RenterId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Purchases
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Purchases::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Purchases::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Purchases::GoodId).string().not_null())
                    .col(ColumnDef::new(Purchases::SellerId).string().not_null())
                    .col(ColumnDef::new(Purchases::BuyerId).string().not_null())
                    .col(ColumnDef::new(Purchases::Quantity).big_integer().not_null())
                    .col(ColumnDef::new(Purchases::Price).big_integer().not_null())
                    .col(ColumnDef::new(Purchases::Status).string().not_null())
                    .col(
                        ColumnDef::new(Purchases::ReturnStatus)
                            .string()
                            .not_null()
                            .default("none"),
                    )
                    .col(ColumnDef::new(Purchases::SourceKind).string())
                    .col(ColumnDef::new(Purchases::SourceId).string())
                    .col(ColumnDef::new(Purchases::Message).string())
                    .col(ColumnDef::new(Purchases::PaymentMethod).string())
                    .col(ColumnDef::new(Purchases::PostalCode).string())
                    .col(ColumnDef::new(Purchases::Address).string())
                    .col(ColumnDef::new(Purchases::ApprovedAt).timestamp())
                    .col(ColumnDef::new(Purchases::ShippedAt).timestamp())
                    .col(ColumnDef::new(Purchases::CompletedAt).timestamp())
                    .col(ColumnDef::new(Purchases::CanceledAt).timestamp())
                    .col(ColumnDef::new(Purchases::ReturnRequestedAt).timestamp())
                    .col(ColumnDef::new(Purchases::ReturnShippedAt).timestamp())
                    .col(ColumnDef::new(Purchases::ReturnReceivedAt).timestamp())
                    .col(
                        ColumnDef::new(Purchases::HiddenForSeller)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Purchases::HiddenForBuyer)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Purchases::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-purchases-good_id")
                            .from(Purchases::Table, Purchases::GoodId)
                            .to(Goods::Table, Goods::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-purchases-seller_id")
                    .table(Purchases::Table)
                    .col(Purchases::SellerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-purchases-buyer_id")
                    .table(Purchases::Table)
                    .col(Purchases::BuyerId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Applications
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Applications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Applications::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Applications::GoodId).string().not_null())
                    .col(ColumnDef::new(Applications::OwnerId).string().not_null())
                    .col(ColumnDef::new(Applications::ApplicantId).string().not_null())
                    .col(ColumnDef::new(Applications::Kind).string().not_null())
                    .col(
                        ColumnDef::new(Applications::Quantity)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Applications::StartDate).date())
                    .col(ColumnDef::new(Applications::EndDate).date())
                    .col(
                        ColumnDef::new(Applications::TotalPrice)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Applications::Status).string().not_null())
                    .col(ColumnDef::new(Applications::Message).string())
                    .col(ColumnDef::new(Applications::PaymentMethod).string())
                    .col(ColumnDef::new(Applications::PostalCode).string())
                    .col(ColumnDef::new(Applications::Address).string())
                    .col(ColumnDef::new(Applications::ApprovedAt).timestamp())
                    .col(ColumnDef::new(Applications::ShippedAt).timestamp())
                    .col(ColumnDef::new(Applications::ReceivedAt).timestamp())
                    .col(ColumnDef::new(Applications::ReturnedAt).timestamp())
                    .col(ColumnDef::new(Applications::CompletedAt).timestamp())
                    .col(ColumnDef::new(Applications::CanceledAt).timestamp())
                    .col(
                        ColumnDef::new(Applications::HiddenForOwner)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Applications::HiddenForApplicant)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Applications::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-applications-good_id")
                            .from(Applications::Table, Applications::GoodId)
                            .to(Goods::Table, Goods::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-applications-owner_id")
                    .table(Applications::Table)
                    .col(Applications::OwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-applications-applicant_id")
                    .table(Applications::Table)
                    .col(Applications::ApplicantId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Shipments
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Shipments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Shipments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Shipments::TradeKind).string().not_null())
                    .col(ColumnDef::new(Shipments::TradeId).string().not_null())
                    .col(ColumnDef::new(Shipments::Direction).string().not_null())
                    .col(ColumnDef::new(Shipments::SenderName).string().not_null())
                    .col(ColumnDef::new(Shipments::SenderPhone).string().not_null())
                    .col(ColumnDef::new(Shipments::SenderAddress).string().not_null())
                    .col(ColumnDef::new(Shipments::RecipientName).string().not_null())
                    .col(ColumnDef::new(Shipments::RecipientPhone).string().not_null())
                    .col(
                        ColumnDef::new(Shipments::RecipientAddress)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Shipments::TrackingNumber)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Shipments::Status).string().not_null())
                    .col(ColumnDef::new(Shipments::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Shipments::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // One record per (trade, direction); the upsert relies on it.
        manager
            .create_index(
                Index::create()
                    .name("idx-shipments-trade-direction-unique")
                    .table(Shipments::Table)
                    .col(Shipments::TradeKind)
                    .col(Shipments::TradeId)
                    .col(Shipments::Direction)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Channels
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Channels::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Channels::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Channels::GoodId).string().not_null())
                    .col(ColumnDef::new(Channels::UserA).string().not_null())
                    .col(ColumnDef::new(Channels::UserB).string().not_null())
                    .col(ColumnDef::new(Channels::TradeKind).string())
                    .col(ColumnDef::new(Channels::TradeId).string())
                    .col(ColumnDef::new(Channels::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-channels-good_id")
                            .from(Channels::Table, Channels::GoodId)
                            .to(Goods::Table, Goods::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one channel per trade; NULLs (pre-transaction channels)
        // stay distinct.
        manager
            .create_index(
                Index::create()
                    .name("idx-channels-trade-unique")
                    .table(Channels::Table)
                    .col(Channels::TradeKind)
                    .col(Channels::TradeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-channels-good_id")
                    .table(Channels::Table)
                    .col(Channels::GoodId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 8. Notifications
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notifications::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Notifications::UserId).string().not_null())
                    .col(ColumnDef::new(Notifications::Kind).string().not_null())
                    .col(ColumnDef::new(Notifications::Title).string().not_null())
                    .col(ColumnDef::new(Notifications::Body).string().not_null())
                    .col(ColumnDef::new(Notifications::Link).string())
                    .col(ColumnDef::new(Notifications::TradeKind).string())
                    .col(ColumnDef::new(Notifications::TradeId).string())
                    .col(
                        ColumnDef::new(Notifications::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Notifications::ReadAt).timestamp())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-notifications-user_id")
                            .from(Notifications::Table, Notifications::UserId)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-notifications-user_id-created_at")
                    .table(Notifications::Table)
                    .col(Notifications::UserId)
                    .col(Notifications::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Notifications::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Channels::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Shipments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Applications::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Purchases::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Rentals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Goods::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
