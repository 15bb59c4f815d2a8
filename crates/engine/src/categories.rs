//! Product categories (Schnittblumen, Topfpflanzen, Sträuße, ...).

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, EntityKind, util::parse_uuid};

/// Category that receives freshly produced bouquets when it exists.
pub const BOUQUET_CATEGORY: &str = "Sträuße";
/// Reporting bucket for revenue rows without a category.
pub const FALLBACK_CATEGORY: &str = "Sonstiges";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    #[sea_orm(unique)]
    pub name_norm: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::products::Entity")]
    Products,
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Category {
    pub(crate) fn active_model(&self, name_norm: String) -> ActiveModel {
        ActiveModel {
            id: ActiveValue::Set(self.id.to_string()),
            name: ActiveValue::Set(self.name.clone()),
            name_norm: ActiveValue::Set(name_norm),
        }
    }
}

impl TryFrom<Model> for Category {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, EntityKind::Category)?,
            name: model.name,
        })
    }
}
