//! Initial schema for the shop ledger.
//!
//! - `categories`: product groups used by revenue reports
//! - `products`: sellable goods, including composite bouquets
//! - `materials`: wrapping and accessories priced per unit, never stocked
//! - `bouquet_templates` / `bouquet_template_items`: bouquet recipes
//! - `inventory`: one stock row per product
//! - `transactions`: the append-only ledger

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    Name,
    NameNorm,
}

#[derive(Iden)]
enum Products {
    Table,
    Id,
    Name,
    NameNorm,
    CategoryId,
    VatRate,
    IsComposite,
    CreatedAt,
}

#[derive(Iden)]
enum Materials {
    Table,
    Id,
    Name,
    NameNorm,
    UnitPriceMinor,
    VatRate,
}

#[derive(Iden)]
enum BouquetTemplates {
    Table,
    Id,
    Name,
    NameNorm,
    Description,
    BasePriceMinor,
    CreatedAt,
}

#[derive(Iden)]
enum BouquetTemplateItems {
    Table,
    Id,
    TemplateId,
    Position,
    ProductId,
    MaterialId,
    Quantity,
}

#[derive(Iden)]
enum Inventory {
    Table,
    ProductId,
    Quantity,
    UnitPurchasePriceMinor,
    LastUpdated,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    BatchId,
    BatchLine,
    Kind,
    ProductId,
    TemplateId,
    Quantity,
    UnitPriceMinor,
    TotalPriceMinor,
    VatRate,
    VatAmountMinor,
    Category,
    PaymentMethod,
    InventoryLinked,
    ReversesTransactionId,
    Note,
    OccurredAt,
    CreatedBy,
    IdempotencyKey,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Categories
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::NameNorm).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-name_norm-unique")
                    .table(Categories::Table)
                    .col(Categories::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Products
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Products::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Products::Name).string().not_null())
                    .col(ColumnDef::new(Products::NameNorm).string().not_null())
                    .col(ColumnDef::new(Products::CategoryId).string())
                    .col(
                        ColumnDef::new(Products::VatRate)
                            .integer()
                            .not_null()
                            .default(19),
                    )
                    .col(
                        ColumnDef::new(Products::IsComposite)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Products::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-products-category_id")
                            .from(Products::Table, Products::CategoryId)
                            .to(Categories::Table, Categories::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // A bouquet may share its name with a stocked flower.
        manager
            .create_index(
                Index::create()
                    .name("idx-products-name_norm-composite-unique")
                    .table(Products::Table)
                    .col(Products::NameNorm)
                    .col(Products::IsComposite)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Materials
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Materials::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Materials::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Materials::Name).string().not_null())
                    .col(ColumnDef::new(Materials::NameNorm).string().not_null())
                    .col(
                        ColumnDef::new(Materials::UnitPriceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Materials::VatRate)
                            .integer()
                            .not_null()
                            .default(19),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-materials-name_norm-unique")
                    .table(Materials::Table)
                    .col(Materials::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Bouquet templates
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BouquetTemplates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BouquetTemplates::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BouquetTemplates::Name).string().not_null())
                    .col(
                        ColumnDef::new(BouquetTemplates::NameNorm)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BouquetTemplates::Description).string())
                    .col(
                        ColumnDef::new(BouquetTemplates::BasePriceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BouquetTemplates::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bouquet_templates-name_norm-unique")
                    .table(BouquetTemplates::Table)
                    .col(BouquetTemplates::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BouquetTemplateItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BouquetTemplateItems::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BouquetTemplateItems::TemplateId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BouquetTemplateItems::Position)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BouquetTemplateItems::ProductId).string())
                    .col(ColumnDef::new(BouquetTemplateItems::MaterialId).string())
                    .col(
                        ColumnDef::new(BouquetTemplateItems::Quantity)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bouquet_template_items-template_id")
                            .from(
                                BouquetTemplateItems::Table,
                                BouquetTemplateItems::TemplateId,
                            )
                            .to(BouquetTemplates::Table, BouquetTemplates::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bouquet_template_items-product_id")
                            .from(
                                BouquetTemplateItems::Table,
                                BouquetTemplateItems::ProductId,
                            )
                            .to(Products::Table, Products::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bouquet_template_items-material_id")
                            .from(
                                BouquetTemplateItems::Table,
                                BouquetTemplateItems::MaterialId,
                            )
                            .to(Materials::Table, Materials::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bouquet_template_items-template_id")
                    .table(BouquetTemplateItems::Table)
                    .col(BouquetTemplateItems::TemplateId)
                    .col(BouquetTemplateItems::Position)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bouquet_template_items-material_id")
                    .table(BouquetTemplateItems::Table)
                    .col(BouquetTemplateItems::MaterialId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Inventory
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Inventory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Inventory::ProductId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Inventory::Quantity)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Inventory::UnitPurchasePriceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Inventory::LastUpdated)
                            .timestamp()
                            .not_null(),
                    )
                    .check(Expr::col(Inventory::Quantity).gte(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-inventory-product_id")
                            .from(Inventory::Table, Inventory::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::BatchId).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::BatchLine)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(ColumnDef::new(Transactions::ProductId).string())
                    .col(ColumnDef::new(Transactions::TemplateId).string())
                    .col(
                        ColumnDef::new(Transactions::Quantity)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::UnitPriceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::TotalPriceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::VatRate).integer())
                    .col(
                        ColumnDef::new(Transactions::VatAmountMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Transactions::Category).string())
                    .col(ColumnDef::new(Transactions::PaymentMethod).string())
                    .col(
                        ColumnDef::new(Transactions::InventoryLinked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Transactions::ReversesTransactionId).string())
                    .col(ColumnDef::new(Transactions::Note).string())
                    .col(
                        ColumnDef::new(Transactions::OccurredAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::CreatedBy).string().not_null())
                    .col(ColumnDef::new(Transactions::IdempotencyKey).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-batch_id")
                    .table(Transactions::Table)
                    .col(Transactions::BatchId)
                    .col(Transactions::BatchLine)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-occurred_at")
                    .table(Transactions::Table)
                    .col(Transactions::OccurredAt)
                    .col(Transactions::Id)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-product_id")
                    .table(Transactions::Table)
                    .col(Transactions::ProductId)
                    .to_owned(),
            )
            .await?;

        // At most one storno per sale. NULLs never collide.
        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-reverses-unique")
                    .table(Transactions::Table)
                    .col(Transactions::ReversesTransactionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-idempotency_key")
                    .table(Transactions::Table)
                    .col(Transactions::CreatedBy)
                    .col(Transactions::IdempotencyKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Inventory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BouquetTemplateItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BouquetTemplates::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Materials::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        Ok(())
    }
}
