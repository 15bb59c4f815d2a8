//! Bouquet templates: named recipes of products and materials with a
//! suggested sale price.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, EntityKind,
    util::{name_key, parse_uuid},
};

/// What a template line consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Ingredient {
    /// Stocked product, deducted from inventory on production.
    Product(Uuid),
    /// Material, only used for costing.
    Material(Uuid),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateItem {
    pub ingredient: Ingredient,
    pub quantity: i64,
}

impl TemplateItem {
    pub fn new(ingredient: Ingredient, quantity: i64) -> Self {
        Self {
            ingredient,
            quantity,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BouquetTemplate {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub base_price_minor: i64,
    pub created_at: DateTime<Utc>,
    pub items: Vec<TemplateItem>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bouquet_templates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    /// Lookup key of `name`, unique; also keys the template's composite product.
    pub name_norm: String,
    pub description: Option<String>,
    pub base_price_minor: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bouquet_template_items::Entity")]
    Items,
}

impl Related<super::bouquet_template_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&BouquetTemplate> for ActiveModel {
    fn from(template: &BouquetTemplate) -> Self {
        Self {
            id: ActiveValue::Set(template.id.to_string()),
            name: ActiveValue::Set(template.name.clone()),
            name_norm: ActiveValue::Set(name_key(&template.name)),
            description: ActiveValue::Set(template.description.clone()),
            base_price_minor: ActiveValue::Set(template.base_price_minor),
            created_at: ActiveValue::Set(template.created_at),
        }
    }
}

impl BouquetTemplate {
    /// Rebuild a template from its row and its item rows.
    pub(crate) fn from_rows(
        model: Model,
        mut items: Vec<super::bouquet_template_items::Model>,
    ) -> Result<Self, EngineError> {
        items.sort_by_key(|item| item.position);
        Ok(Self {
            id: parse_uuid(&model.id, EntityKind::Template)?,
            name: model.name,
            description: model.description,
            base_price_minor: model.base_price_minor,
            created_at: model.created_at,
            items: items
                .into_iter()
                .map(TemplateItem::try_from)
                .collect::<Result<_, _>>()?,
        })
    }
}
