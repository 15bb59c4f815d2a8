use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{
    BouquetTemplate, CostLine, EngineError, EntityKind, Ingredient, NewTemplate,
    QuickBouquetQuote, ResultEngine, TemplateCosting, TemplateItem, bouquet_template_items,
    bouquet_templates,
    util::{name_key, normalize_optional_text, normalize_required_name, require_non_negative},
};

use super::{
    Engine,
    catalog::{find_material, find_product},
    inventory::find_entry,
    with_tx,
};

pub(super) async fn load_template(
    db: &impl ConnectionTrait,
    id: Uuid,
) -> ResultEngine<BouquetTemplate> {
    let model = bouquet_templates::Entity::find_by_id(id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| EngineError::not_found(EntityKind::Template, id))?;
    let items = bouquet_template_items::Entity::find()
        .filter(bouquet_template_items::Column::TemplateId.eq(id.to_string()))
        .order_by_asc(bouquet_template_items::Column::Position)
        .all(db)
        .await?;
    BouquetTemplate::from_rows(model, items)
}

/// Check every reference exists and fold repeated ingredients into one line,
/// keeping first-appearance order.
pub(super) async fn checked_items(
    db: &impl ConnectionTrait,
    items: &[TemplateItem],
) -> ResultEngine<Vec<TemplateItem>> {
    if items.is_empty() {
        return Err(EngineError::validation("items", "must not be empty"));
    }
    let mut merged: Vec<TemplateItem> = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity <= 0 {
            return Err(EngineError::validation("quantity", "must be > 0"));
        }
        if let Some(existing) = merged
            .iter_mut()
            .find(|existing| existing.ingredient == item.ingredient)
        {
            existing.quantity = existing
                .quantity
                .checked_add(item.quantity)
                .ok_or_else(|| EngineError::validation("quantity", "too large"))?;
            continue;
        }
        match item.ingredient {
            Ingredient::Product(id) => {
                find_product(db, id).await?;
            }
            Ingredient::Material(id) => {
                find_material(db, id).await?;
            }
        }
        merged.push(*item);
    }
    Ok(merged)
}

async fn cost_lines(
    db: &impl ConnectionTrait,
    items: &[TemplateItem],
) -> ResultEngine<Vec<CostLine>> {
    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        let (name, unit_cost_minor) = match item.ingredient {
            Ingredient::Product(id) => {
                let product = find_product(db, id).await?;
                let cost = find_entry(db, id)
                    .await?
                    .map_or(0, |entry| entry.unit_purchase_price_minor);
                (product.name, cost)
            }
            Ingredient::Material(id) => {
                let material = find_material(db, id).await?;
                (material.name, material.unit_price_minor)
            }
        };
        lines.push(CostLine {
            ingredient: item.ingredient,
            name,
            quantity: item.quantity,
            unit_cost_minor,
            total_minor: item.quantity * unit_cost_minor,
        });
    }
    Ok(lines)
}

async fn ensure_unique_name(
    db_tx: &DatabaseTransaction,
    name: &str,
    except: Option<Uuid>,
) -> ResultEngine<()> {
    let mut query = bouquet_templates::Entity::find()
        .filter(bouquet_templates::Column::NameNorm.eq(name_key(name)));
    if let Some(id) = except {
        query = query.filter(bouquet_templates::Column::Id.ne(id.to_string()));
    }
    if query.one(db_tx).await?.is_some() {
        return Err(EngineError::ExistingKey(name.to_string()));
    }
    Ok(())
}

async fn insert_items(
    db_tx: &DatabaseTransaction,
    template_id: Uuid,
    items: &[TemplateItem],
) -> ResultEngine<()> {
    for (position, item) in items.iter().enumerate() {
        let position = i32::try_from(position)
            .map_err(|_| EngineError::validation("items", "too many items"))?;
        bouquet_template_items::active_model(template_id, position, item)
            .insert(db_tx)
            .await?;
    }
    Ok(())
}

impl Engine {
    pub async fn create_template(&self, cmd: NewTemplate) -> ResultEngine<BouquetTemplate> {
        let name = normalize_required_name(&cmd.name, "name")?;
        require_non_negative(cmd.base_price_minor, "base_price")?;
        with_tx!(self, |db_tx| {
            ensure_unique_name(&db_tx, &name, None).await?;
            let items = checked_items(&db_tx, &cmd.items).await?;
            let template = BouquetTemplate {
                id: Uuid::new_v4(),
                name,
                description: normalize_optional_text(cmd.description.as_deref()),
                base_price_minor: cmd.base_price_minor,
                created_at: Utc::now(),
                items,
            };
            bouquet_templates::ActiveModel::from(&template)
                .insert(&db_tx)
                .await?;
            insert_items(&db_tx, template.id, &template.items).await?;
            tracing::info!(template_id = %template.id, name = %template.name, "template created");
            Ok(template)
        })
    }

    /// Replace a template's fields and items.
    pub async fn update_template(
        &self,
        id: Uuid,
        cmd: NewTemplate,
    ) -> ResultEngine<BouquetTemplate> {
        let name = normalize_required_name(&cmd.name, "name")?;
        require_non_negative(cmd.base_price_minor, "base_price")?;
        with_tx!(self, |db_tx| {
            let existing = load_template(&db_tx, id).await?;
            ensure_unique_name(&db_tx, &name, Some(id)).await?;
            let items = checked_items(&db_tx, &cmd.items).await?;

            let template = BouquetTemplate {
                id,
                name,
                description: normalize_optional_text(cmd.description.as_deref()),
                base_price_minor: cmd.base_price_minor,
                created_at: existing.created_at,
                items,
            };
            let mut active = bouquet_templates::ActiveModel::from(&template);
            active.id = ActiveValue::Unchanged(id.to_string());
            active.update(&db_tx).await?;

            bouquet_template_items::Entity::delete_many()
                .filter(bouquet_template_items::Column::TemplateId.eq(id.to_string()))
                .exec(&db_tx)
                .await?;
            insert_items(&db_tx, id, &template.items).await?;
            tracing::info!(template_id = %id, "template updated");
            Ok(template)
        })
    }

    pub async fn delete_template(&self, id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            load_template(&db_tx, id).await?;
            bouquet_template_items::Entity::delete_many()
                .filter(bouquet_template_items::Column::TemplateId.eq(id.to_string()))
                .exec(&db_tx)
                .await?;
            bouquet_templates::Entity::delete_by_id(id.to_string())
                .exec(&db_tx)
                .await?;
            tracing::info!(template_id = %id, "template deleted");
            Ok(())
        })
    }

    pub async fn template(&self, id: Uuid) -> ResultEngine<BouquetTemplate> {
        load_template(&self.database, id).await
    }

    pub async fn templates(&self) -> ResultEngine<Vec<BouquetTemplate>> {
        let ids = bouquet_templates::Entity::find()
            .order_by_asc(bouquet_templates::Column::Name)
            .all(&self.database)
            .await?;
        let mut out = Vec::with_capacity(ids.len());
        for model in ids {
            let items = bouquet_template_items::Entity::find()
                .filter(bouquet_template_items::Column::TemplateId.eq(model.id.clone()))
                .all(&self.database)
                .await?;
            out.push(BouquetTemplate::from_rows(model, items)?);
        }
        Ok(out)
    }

    /// Ingredient cost of a template at current purchase prices, plus labor.
    pub async fn template_costing(&self, id: Uuid) -> ResultEngine<TemplateCosting> {
        let template = load_template(&self.database, id).await?;
        let lines = cost_lines(&self.database, &template.items).await?;
        Ok(TemplateCosting::new(
            lines,
            self.settings.labor_surcharge_percent,
            template.base_price_minor,
        ))
    }

    /// Price hint for a bouquet assembled at the counter.
    pub async fn quick_bouquet_quote(
        &self,
        items: &[TemplateItem],
    ) -> ResultEngine<QuickBouquetQuote> {
        let items = checked_items(&self.database, items).await?;
        let cost_minor = cost_lines(&self.database, &items)
            .await?
            .iter()
            .map(|line| line.total_minor)
            .sum();
        Ok(QuickBouquetQuote::from_cost(cost_minor))
    }
}
