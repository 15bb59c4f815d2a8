//! Non-stocked bouquet materials (ribbon, wrapping, foam). They only feed
//! template costing and are never tracked in inventory.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, EntityKind, VatRate, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub id: Uuid,
    pub name: String,
    pub unit_price_minor: i64,
    pub vat_rate: VatRate,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "materials")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    #[sea_orm(unique)]
    pub name_norm: String,
    pub unit_price_minor: i64,
    pub vat_rate: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Material {
    pub(crate) fn active_model(&self, name_norm: String) -> ActiveModel {
        ActiveModel {
            id: ActiveValue::Set(self.id.to_string()),
            name: ActiveValue::Set(self.name.clone()),
            name_norm: ActiveValue::Set(name_norm),
            unit_price_minor: ActiveValue::Set(self.unit_price_minor),
            vat_rate: ActiveValue::Set(self.vat_rate.stored()),
        }
    }
}

impl TryFrom<Model> for Material {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, EntityKind::Material)?,
            name: model.name,
            unit_price_minor: model.unit_price_minor,
            vat_rate: VatRate::from_stored(model.vat_rate)?,
        })
    }
}
