//! Bouquet production and bouquet sales.
//!
//! Both consume the stocked ingredients of a recipe. Stock is checked for
//! every ingredient before the first one is touched, so a bouquet is either
//! fully built or nothing changes.

use sea_orm::{DatabaseTransaction, TransactionTrait};
use uuid::Uuid;

use crate::{
    BOUQUET_CATEGORY, CompositeSaleCmd, CompositeSource, EngineError, Ingredient, Movement,
    OperationReceipt, ProduceCmd, ResultEngine, TemplateItem,
    util::{line_total, normalize_required_name, require_positive},
};

use super::{
    Engine,
    catalog::{find_category_by_name, find_product, find_product_by_name, insert_product},
    inventory,
    ledger::Batch,
    sales::{SaleLine, sell_product},
    templates::{checked_items, load_template},
    with_tx,
};

/// Product quantities needed for `multiplier` bouquets, first-appearance
/// order, repeated products summed.
fn product_requirements(
    items: &[TemplateItem],
    multiplier: i64,
) -> ResultEngine<Vec<(Uuid, i64)>> {
    let mut needs: Vec<(Uuid, i64)> = Vec::new();
    for item in items {
        let Ingredient::Product(product_id) = item.ingredient else {
            continue;
        };
        let needed = item
            .quantity
            .checked_mul(multiplier)
            .ok_or_else(|| EngineError::validation("quantity", "too large"))?;
        if let Some((_, total)) = needs.iter_mut().find(|(id, _)| *id == product_id) {
            *total += needed;
        } else {
            needs.push((product_id, needed));
        }
    }
    Ok(needs)
}

/// Take the ingredients of `multiplier` bouquets out of stock and add one
/// usage row per product to `batch`.
async fn consume_ingredients(
    db_tx: &DatabaseTransaction,
    batch: &mut Batch,
    items: &[TemplateItem],
    multiplier: i64,
    template_id: Option<Uuid>,
    note: &str,
) -> ResultEngine<()> {
    let needs = product_requirements(items, multiplier)?;

    for (product_id, needed) in &needs {
        find_product(db_tx, *product_id).await?;
        let available = inventory::quantity_on_hand(db_tx, *product_id).await?;
        if available < *needed {
            return Err(EngineError::InsufficientStock {
                product_id: *product_id,
                requested: *needed,
                available,
            });
        }
    }

    for (product_id, needed) in needs {
        inventory::adjust(db_tx, product_id, -needed, None).await?;
        batch.push_line(
            Movement::usage(product_id, template_id, needed)?,
            Some(note.to_string()),
        );
    }
    Ok(())
}

impl Engine {
    /// Build `multiplier` bouquets from a template into stock.
    ///
    /// Ingredients are deducted with one usage row each, the composite
    /// product (named after the template) is created on first production and
    /// its stock grows by `multiplier`. The headline production row is valued
    /// at the template's base price.
    pub async fn produce_bouquet(&self, cmd: ProduceCmd) -> ResultEngine<OperationReceipt> {
        let result = self.write_production(&cmd).await;
        self.settle_idempotent(result, &cmd.user_id, &cmd.meta).await
    }

    async fn write_production(&self, cmd: &ProduceCmd) -> ResultEngine<OperationReceipt> {
        require_positive(cmd.multiplier, "multiplier")?;

        with_tx!(self, |db_tx| {
            if let Some(receipt) = self.replay(&db_tx, &cmd.user_id, &cmd.meta).await? {
                return Ok(receipt);
            }

            let template = load_template(&db_tx, cmd.template_id).await?;
            line_total(cmd.multiplier, template.base_price_minor)?;

            let mut batch = Batch::new(&cmd.user_id, &cmd.meta);
            let usage_note = format!(
                "used for production: {} (x{})",
                template.name, cmd.multiplier
            );
            consume_ingredients(
                &db_tx,
                &mut batch,
                &template.items,
                cmd.multiplier,
                Some(template.id),
                &usage_note,
            )
            .await?;

            let composite = match find_product_by_name(&db_tx, &template.name, true).await? {
                Some(product) => product,
                None => {
                    let category_id = find_category_by_name(&db_tx, BOUQUET_CATEGORY)
                        .await?
                        .map(|category| category.id);
                    insert_product(
                        &db_tx,
                        &template.name,
                        category_id,
                        self.settings.default_vat_rate,
                        true,
                    )
                    .await?
                }
            };
            inventory::adjust(&db_tx, composite.id, cmd.multiplier, Some(0)).await?;

            let note = batch.note().map(ToString::to_string);
            batch.push_headline(
                Movement::production(
                    composite.id,
                    template.id,
                    cmd.multiplier,
                    template.base_price_minor,
                )?,
                note,
            );
            let receipt = self.commit_batch(&db_tx, batch).await?;
            tracing::info!(
                batch_id = %receipt.batch_id,
                template_id = %template.id,
                product_id = %composite.id,
                multiplier = cmd.multiplier,
                "bouquets produced"
            );
            Ok(receipt)
        })
    }

    /// Sell a bouquet.
    ///
    /// A stocked composite product sells like any product. A template or a
    /// free ingredient list is assembled on the spot: ingredients are
    /// deducted with usage rows, then one bouquet sale row at
    /// `sale_price * quantity` is written at the default VAT rate.
    pub async fn sell_composite(&self, cmd: CompositeSaleCmd) -> ResultEngine<OperationReceipt> {
        let result = self.write_composite_sale(&cmd).await;
        self.settle_idempotent(result, &cmd.user_id, &cmd.meta).await
    }

    async fn write_composite_sale(
        &self,
        cmd: &CompositeSaleCmd,
    ) -> ResultEngine<OperationReceipt> {
        require_positive(cmd.quantity, "quantity")?;
        require_positive(cmd.sale_price_minor, "sale_price")?;
        line_total(cmd.quantity, cmd.sale_price_minor)?;
        if let CompositeSource::AdHoc { label, .. } = &cmd.source {
            normalize_required_name(label, "label")?;
        }

        with_tx!(self, |db_tx| {
            if let Some(receipt) = self.replay(&db_tx, &cmd.user_id, &cmd.meta).await? {
                return Ok(receipt);
            }

            let mut batch = Batch::new(&cmd.user_id, &cmd.meta);
            match &cmd.source {
                CompositeSource::Stocked { product_id } => {
                    let product = find_product(&db_tx, *product_id).await?;
                    if !product.is_composite {
                        return Err(EngineError::validation(
                            "product_id",
                            format!("{} is not a bouquet", product.name),
                        ));
                    }
                    sell_product(
                        &db_tx,
                        &mut batch,
                        &product,
                        SaleLine {
                            inventory_linked: true,
                            quantity: cmd.quantity,
                            unit_price_minor: cmd.sale_price_minor,
                            category: None,
                            fallback_category: Some(BOUQUET_CATEGORY),
                            payment_method: cmd.payment_method,
                        },
                    )
                    .await?;
                }
                CompositeSource::FromTemplate { template_id } => {
                    let template = load_template(&db_tx, *template_id).await?;
                    self.assemble_and_sell(
                        &db_tx,
                        &mut batch,
                        cmd,
                        &template.items,
                        Some(template.id),
                        &template.name,
                    )
                    .await?;
                }
                CompositeSource::AdHoc { label, ingredients } => {
                    let items = checked_items(&db_tx, ingredients).await?;
                    let label = normalize_required_name(label, "label")?;
                    self.assemble_and_sell(&db_tx, &mut batch, cmd, &items, None, &label)
                        .await?;
                }
            }

            let receipt = self.commit_batch(&db_tx, batch).await?;
            tracing::info!(
                batch_id = %receipt.batch_id,
                quantity = cmd.quantity,
                sale_price_minor = cmd.sale_price_minor,
                "bouquet sold"
            );
            Ok(receipt)
        })
    }

    async fn assemble_and_sell(
        &self,
        db_tx: &DatabaseTransaction,
        batch: &mut Batch,
        cmd: &CompositeSaleCmd,
        items: &[TemplateItem],
        template_id: Option<Uuid>,
        label: &str,
    ) -> ResultEngine<()> {
        let usage_note = format!("used for bouquet sale: {label} (x{})", cmd.quantity);
        consume_ingredients(db_tx, batch, items, cmd.quantity, template_id, &usage_note).await?;

        let movement = Movement::sale_bouquet(
            template_id,
            cmd.quantity,
            cmd.sale_price_minor,
            self.settings.default_vat_rate,
            Some(BOUQUET_CATEGORY.to_string()),
            cmd.payment_method,
        )?;
        let note = batch
            .note()
            .map_or_else(|| label.to_string(), ToString::to_string);
        batch.push_headline(movement, Some(note));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requirements_merge_repeated_products_and_skip_materials() {
        let rose = Uuid::new_v4();
        let fern = Uuid::new_v4();
        let ribbon = Uuid::new_v4();
        let items = vec![
            TemplateItem::new(Ingredient::Product(rose), 5),
            TemplateItem::new(Ingredient::Material(ribbon), 1),
            TemplateItem::new(Ingredient::Product(fern), 2),
            TemplateItem::new(Ingredient::Product(rose), 1),
        ];
        let needs = product_requirements(&items, 3).unwrap();
        assert_eq!(needs, vec![(rose, 18), (fern, 6)]);
    }

    #[test]
    fn requirements_overflow_is_rejected() {
        let items = vec![TemplateItem::new(Ingredient::Product(Uuid::new_v4()), i64::MAX)];
        assert!(product_requirements(&items, 2).is_err());
    }
}
