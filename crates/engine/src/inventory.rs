//! On-hand stock, one entry per product.
//!
//! `quantity` never goes below zero: every decrement is a conditional update
//! that only matches while enough stock is left.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, EntityKind, Product, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub product_id: Uuid,
    pub quantity: i64,
    /// Cost of the most recent purchase, used to price write-offs and
    /// template costing.
    pub unit_purchase_price_minor: i64,
    pub last_updated: DateTime<Utc>,
}

/// An inventory entry together with its product, for stock lists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockItem {
    pub product: Product,
    pub entry: InventoryEntry,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "inventory")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub product_id: String,
    pub quantity: i64,
    pub unit_purchase_price_minor: i64,
    pub last_updated: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::products::Entity",
        from = "Column::ProductId",
        to = "super::products::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Product,
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&InventoryEntry> for ActiveModel {
    fn from(entry: &InventoryEntry) -> Self {
        Self {
            product_id: ActiveValue::Set(entry.product_id.to_string()),
            quantity: ActiveValue::Set(entry.quantity),
            unit_purchase_price_minor: ActiveValue::Set(entry.unit_purchase_price_minor),
            last_updated: ActiveValue::Set(entry.last_updated),
        }
    }
}

impl TryFrom<Model> for InventoryEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            product_id: parse_uuid(&model.product_id, EntityKind::Product)?,
            quantity: model.quantity,
            unit_purchase_price_minor: model.unit_purchase_price_minor,
            last_updated: model.last_updated,
        })
    }
}
