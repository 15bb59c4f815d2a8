use chrono::Utc;
use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Category, EngineError, EntityKind, InventoryEntry, Material, MaterialUpdate, NewMaterial,
    NewProduct, Product, ProductUpdate, ResultEngine, VatRate, bouquet_template_items,
    categories, inventory, materials, products,
    util::{name_key, normalize_required_name, require_non_negative},
};

use super::{Engine, with_tx};

pub(super) async fn find_product(db: &impl ConnectionTrait, id: Uuid) -> ResultEngine<Product> {
    let model = products::Entity::find_by_id(id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| EngineError::not_found(EntityKind::Product, id))?;
    Product::try_from(model)
}

/// Case-insensitive lookup among purchased (`composite == false`) or
/// produced products.
pub(super) async fn find_product_by_name(
    db: &impl ConnectionTrait,
    name: &str,
    composite: bool,
) -> ResultEngine<Option<Product>> {
    products::Entity::find()
        .filter(products::Column::NameNorm.eq(name_key(name)))
        .filter(products::Column::IsComposite.eq(composite))
        .one(db)
        .await?
        .map(Product::try_from)
        .transpose()
}

pub(super) async fn insert_product(
    db: &impl ConnectionTrait,
    name: &str,
    category_id: Option<Uuid>,
    vat_rate: VatRate,
    is_composite: bool,
) -> ResultEngine<Product> {
    if let Some(category_id) = category_id {
        find_category(db, category_id).await?;
    }
    let product = Product {
        id: Uuid::new_v4(),
        name: name.to_string(),
        category_id,
        vat_rate,
        is_composite,
        created_at: Utc::now(),
    };
    product.active_model(name_key(name)).insert(db).await?;
    tracing::info!(product_id = %product.id, name, is_composite, "product created");
    Ok(product)
}

pub(super) async fn find_category(db: &impl ConnectionTrait, id: Uuid) -> ResultEngine<Category> {
    let model = categories::Entity::find_by_id(id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| EngineError::not_found(EntityKind::Category, id))?;
    Category::try_from(model)
}

pub(super) async fn find_category_by_name(
    db: &impl ConnectionTrait,
    name: &str,
) -> ResultEngine<Option<Category>> {
    categories::Entity::find()
        .filter(categories::Column::NameNorm.eq(name_key(name)))
        .one(db)
        .await?
        .map(Category::try_from)
        .transpose()
}

pub(super) async fn find_material(db: &impl ConnectionTrait, id: Uuid) -> ResultEngine<Material> {
    let model = materials::Entity::find_by_id(id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| EngineError::not_found(EntityKind::Material, id))?;
    Material::try_from(model)
}

impl Engine {
    pub async fn create_category(&self, name: &str) -> ResultEngine<Category> {
        let name = normalize_required_name(name, "name")?;
        with_tx!(self, |db_tx| {
            if find_category_by_name(&db_tx, &name).await?.is_some() {
                return Err(EngineError::ExistingKey(name));
            }
            let category = Category {
                id: Uuid::new_v4(),
                name: name.clone(),
            };
            category.active_model(name_key(&name)).insert(&db_tx).await?;
            tracing::info!(category_id = %category.id, name = %category.name, "category created");
            Ok(category)
        })
    }

    pub async fn categories(&self) -> ResultEngine<Vec<Category>> {
        categories::Entity::find()
            .order_by_asc(categories::Column::Name)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Category::try_from)
            .collect()
    }

    /// Register a purchasable product with an empty inventory entry.
    pub async fn create_product(&self, cmd: NewProduct) -> ResultEngine<Product> {
        let name = normalize_required_name(&cmd.name, "name")?;
        let initial_cost = cmd
            .initial_unit_cost_minor
            .map(|cost| require_non_negative(cost, "unit_cost"))
            .transpose()?
            .unwrap_or(0);
        with_tx!(self, |db_tx| {
            if find_product_by_name(&db_tx, &name, false).await?.is_some() {
                return Err(EngineError::ExistingKey(name));
            }
            let product = insert_product(&db_tx, &name, cmd.category_id, cmd.vat_rate, false).await?;
            let entry = InventoryEntry {
                product_id: product.id,
                quantity: 0,
                unit_purchase_price_minor: initial_cost,
                last_updated: product.created_at,
            };
            inventory::ActiveModel::from(&entry).insert(&db_tx).await?;
            Ok(product)
        })
    }

    pub async fn update_product(&self, id: Uuid, update: ProductUpdate) -> ResultEngine<Product> {
        let name = update
            .name
            .as_deref()
            .map(|name| normalize_required_name(name, "name"))
            .transpose()?;
        with_tx!(self, |db_tx| {
            let mut product = find_product(&db_tx, id).await?;
            let mut active = products::ActiveModel {
                id: ActiveValue::Unchanged(id.to_string()),
                ..Default::default()
            };

            if let Some(name) = name {
                let taken = products::Entity::find()
                    .filter(products::Column::NameNorm.eq(name_key(&name)))
                    .filter(products::Column::IsComposite.eq(product.is_composite))
                    .filter(products::Column::Id.ne(id.to_string()))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if taken {
                    return Err(EngineError::ExistingKey(name));
                }
                active.name_norm = ActiveValue::Set(name_key(&name));
                active.name = ActiveValue::Set(name.clone());
                product.name = name;
            }
            if let Some(category_id) = update.category_id {
                if let Some(category_id) = category_id {
                    find_category(&db_tx, category_id).await?;
                }
                active.category_id = ActiveValue::Set(category_id.map(|id| id.to_string()));
                product.category_id = category_id;
            }
            if let Some(vat_rate) = update.vat_rate {
                active.vat_rate = ActiveValue::Set(vat_rate.stored());
                product.vat_rate = vat_rate;
            }

            if active.is_changed() {
                active.update(&db_tx).await?;
            }
            Ok(product)
        })
    }

    pub async fn product(&self, id: Uuid) -> ResultEngine<Product> {
        find_product(&self.database, id).await
    }

    pub async fn product_by_name(&self, name: &str) -> ResultEngine<Option<Product>> {
        find_product_by_name(&self.database, name, false).await
    }

    pub async fn products(&self) -> ResultEngine<Vec<Product>> {
        products::Entity::find()
            .order_by_asc(products::Column::Name)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Product::try_from)
            .collect()
    }

    pub async fn create_material(&self, cmd: NewMaterial) -> ResultEngine<Material> {
        let name = normalize_required_name(&cmd.name, "name")?;
        require_non_negative(cmd.unit_price_minor, "unit_price")?;
        with_tx!(self, |db_tx| {
            let taken = materials::Entity::find()
                .filter(materials::Column::NameNorm.eq(name_key(&name)))
                .one(&db_tx)
                .await?
                .is_some();
            if taken {
                return Err(EngineError::ExistingKey(name));
            }
            let material = Material {
                id: Uuid::new_v4(),
                name: name.clone(),
                unit_price_minor: cmd.unit_price_minor,
                vat_rate: cmd.vat_rate,
            };
            material.active_model(name_key(&name)).insert(&db_tx).await?;
            tracing::info!(material_id = %material.id, name = %material.name, "material created");
            Ok(material)
        })
    }

    pub async fn update_material(
        &self,
        id: Uuid,
        update: MaterialUpdate,
    ) -> ResultEngine<Material> {
        let name = update
            .name
            .as_deref()
            .map(|name| normalize_required_name(name, "name"))
            .transpose()?;
        if let Some(price) = update.unit_price_minor {
            require_non_negative(price, "unit_price")?;
        }
        with_tx!(self, |db_tx| {
            let mut material = find_material(&db_tx, id).await?;
            if let Some(name) = name {
                let taken = materials::Entity::find()
                    .filter(materials::Column::NameNorm.eq(name_key(&name)))
                    .filter(materials::Column::Id.ne(id.to_string()))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if taken {
                    return Err(EngineError::ExistingKey(name));
                }
                material.name = name;
            }
            if let Some(price) = update.unit_price_minor {
                material.unit_price_minor = price;
            }
            if let Some(vat_rate) = update.vat_rate {
                material.vat_rate = vat_rate;
            }
            let mut active = material.active_model(name_key(&material.name));
            active.id = ActiveValue::Unchanged(id.to_string());
            active.update(&db_tx).await?;
            Ok(material)
        })
    }

    /// Delete a material no template uses.
    pub async fn delete_material(&self, id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            find_material(&db_tx, id).await?;
            let in_use = bouquet_template_items::Entity::find()
                .filter(bouquet_template_items::Column::MaterialId.eq(id.to_string()))
                .one(&db_tx)
                .await?;
            if let Some(item) = in_use {
                return Err(EngineError::validation(
                    "material_id",
                    format!("material is used by template {}", item.template_id),
                ));
            }
            materials::Entity::delete_by_id(id.to_string())
                .exec(&db_tx)
                .await?;
            tracing::info!(material_id = %id, "material deleted");
            Ok(())
        })
    }

    pub async fn material(&self, id: Uuid) -> ResultEngine<Material> {
        find_material(&self.database, id).await
    }

    pub async fn materials(&self) -> ResultEngine<Vec<Material>> {
        materials::Entity::find()
            .order_by_asc(materials::Column::Name)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Material::try_from)
            .collect()
    }
}
