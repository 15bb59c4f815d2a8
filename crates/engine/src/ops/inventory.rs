use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseTransaction, QueryFilter, QueryOrder,
    sea_query::Expr, prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, EntityKind, InventoryEntry, Product, ResultEngine, StockItem, inventory,
    products,
};

use super::Engine;

pub(super) async fn find_entry(
    db: &impl ConnectionTrait,
    product_id: Uuid,
) -> ResultEngine<Option<InventoryEntry>> {
    inventory::Entity::find_by_id(product_id.to_string())
        .one(db)
        .await?
        .map(InventoryEntry::try_from)
        .transpose()
}

/// Quantity on hand; a product without an entry has none.
pub(super) async fn quantity_on_hand(
    db: &impl ConnectionTrait,
    product_id: Uuid,
) -> ResultEngine<i64> {
    Ok(find_entry(db, product_id)
        .await?
        .map_or(0, |entry| entry.quantity))
}

/// Apply `delta` to a product's stock and optionally record a new unit cost.
///
/// Decrements only match rows with enough stock left, so two concurrent
/// sales of the last item cannot both succeed. A missing entry is created on
/// the first increment.
pub(super) async fn adjust(
    db_tx: &DatabaseTransaction,
    product_id: Uuid,
    delta: i64,
    unit_cost_minor: Option<i64>,
) -> ResultEngine<InventoryEntry> {
    if delta == 0 {
        return Err(EngineError::validation("quantity", "stock change must not be 0"));
    }
    let now = Utc::now();

    let mut update = inventory::Entity::update_many()
        .col_expr(
            inventory::Column::Quantity,
            Expr::col(inventory::Column::Quantity).add(delta),
        )
        .col_expr(inventory::Column::LastUpdated, Expr::value(now))
        .filter(inventory::Column::ProductId.eq(product_id.to_string()));
    if let Some(cost) = unit_cost_minor {
        update = update.col_expr(inventory::Column::UnitPurchasePriceMinor, Expr::value(cost));
    }
    if delta < 0 {
        update = update.filter(inventory::Column::Quantity.gte(-delta));
    }
    let result = update.exec(db_tx).await?;

    if result.rows_affected == 0 {
        match find_entry(db_tx, product_id).await? {
            Some(entry) => {
                return Err(EngineError::InsufficientStock {
                    product_id,
                    requested: -delta,
                    available: entry.quantity,
                });
            }
            None if delta < 0 => {
                return Err(EngineError::InsufficientStock {
                    product_id,
                    requested: -delta,
                    available: 0,
                });
            }
            None => {
                let entry = InventoryEntry {
                    product_id,
                    quantity: delta,
                    unit_purchase_price_minor: unit_cost_minor.unwrap_or(0),
                    last_updated: now,
                };
                inventory::ActiveModel::from(&entry).insert(db_tx).await?;
                return Ok(entry);
            }
        }
    }

    find_entry(db_tx, product_id)
        .await?
        .ok_or_else(|| EngineError::not_found(EntityKind::InventoryEntry, product_id))
}

fn stock_items(
    rows: Vec<(inventory::Model, Option<products::Model>)>,
) -> ResultEngine<Vec<StockItem>> {
    rows.into_iter()
        .filter_map(|(entry, product)| product.map(|product| (entry, product)))
        .map(|(entry, product)| {
            Ok(StockItem {
                product: Product::try_from(product)?,
                entry: InventoryEntry::try_from(entry)?,
            })
        })
        .collect()
}

impl Engine {
    /// Current stock of a product (0 when it was never stocked).
    pub async fn stock_quantity(&self, product_id: Uuid) -> ResultEngine<i64> {
        self.product(product_id).await?;
        quantity_on_hand(&self.database, product_id).await
    }

    pub async fn inventory_entry(&self, product_id: Uuid) -> ResultEngine<InventoryEntry> {
        find_entry(&self.database, product_id)
            .await?
            .ok_or_else(|| EngineError::not_found(EntityKind::InventoryEntry, product_id))
    }

    /// Every stocked product, lowest quantity first.
    pub async fn inventory(&self) -> ResultEngine<Vec<StockItem>> {
        let rows = inventory::Entity::find()
            .find_also_related(products::Entity)
            .order_by_asc(inventory::Column::Quantity)
            .order_by_asc(products::Column::Name)
            .all(&self.database)
            .await?;
        stock_items(rows)
    }

    /// Products whose quantity is at or below `threshold`.
    pub async fn low_stock(&self, threshold: i64) -> ResultEngine<Vec<StockItem>> {
        let rows = inventory::Entity::find()
            .filter(inventory::Column::Quantity.lte(threshold))
            .find_also_related(products::Entity)
            .order_by_asc(inventory::Column::Quantity)
            .order_by_asc(products::Column::Name)
            .all(&self.database)
            .await?;
        stock_items(rows)
    }
}
