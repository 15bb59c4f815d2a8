//! Sellable goods, both purchased stock and produced bouquets.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, EntityKind, VatRate, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub category_id: Option<Uuid>,
    pub vat_rate: VatRate,
    /// Produced from a template rather than purchased.
    pub is_composite: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub name_norm: String,
    pub category_id: Option<String>,
    pub vat_rate: i32,
    pub is_composite: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Category,
    #[sea_orm(has_one = "super::inventory::Entity")]
    Inventory,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::inventory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Inventory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Product {
    pub(crate) fn active_model(&self, name_norm: String) -> ActiveModel {
        ActiveModel {
            id: ActiveValue::Set(self.id.to_string()),
            name: ActiveValue::Set(self.name.clone()),
            name_norm: ActiveValue::Set(name_norm),
            category_id: ActiveValue::Set(self.category_id.map(|id| id.to_string())),
            vat_rate: ActiveValue::Set(self.vat_rate.stored()),
            is_composite: ActiveValue::Set(self.is_composite),
            created_at: ActiveValue::Set(self.created_at),
        }
    }
}

impl TryFrom<Model> for Product {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, EntityKind::Product)?,
            name: model.name,
            category_id: model
                .category_id
                .as_deref()
                .map(|id| parse_uuid(id, EntityKind::Category))
                .transpose()?,
            vat_rate: VatRate::from_stored(model.vat_rate)?,
            is_composite: model.is_composite,
            created_at: model.created_at,
        })
    }
}
