//! Template lines. Exactly one of `product_id`/`material_id` is set.

use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, EntityKind, Ingredient, TemplateItem, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bouquet_template_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub template_id: String,
    pub position: i32,
    pub product_id: Option<String>,
    pub material_id: Option<String>,
    pub quantity: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bouquet_templates::Entity",
        from = "Column::TemplateId",
        to = "super::bouquet_templates::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Template,
}

impl Related<super::bouquet_templates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Template.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub(crate) fn active_model(template_id: Uuid, position: i32, item: &TemplateItem) -> ActiveModel {
    let (product_id, material_id) = match item.ingredient {
        Ingredient::Product(id) => (Some(id.to_string()), None),
        Ingredient::Material(id) => (None, Some(id.to_string())),
    };
    ActiveModel {
        id: ActiveValue::Set(Uuid::new_v4().to_string()),
        template_id: ActiveValue::Set(template_id.to_string()),
        position: ActiveValue::Set(position),
        product_id: ActiveValue::Set(product_id),
        material_id: ActiveValue::Set(material_id),
        quantity: ActiveValue::Set(item.quantity),
    }
}

impl TryFrom<Model> for TemplateItem {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let ingredient = match (model.product_id.as_deref(), model.material_id.as_deref()) {
            (Some(id), None) => Ingredient::Product(parse_uuid(id, EntityKind::Product)?),
            (None, Some(id)) => Ingredient::Material(parse_uuid(id, EntityKind::Material)?),
            _ => {
                return Err(EngineError::validation(
                    "template_item",
                    format!("item {} must reference one product or one material", model.id),
                ));
            }
        };
        Ok(TemplateItem::new(ingredient, model.quantity))
    }
}
