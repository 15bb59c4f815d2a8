use sea_orm::{DatabaseTransaction, TransactionTrait};

use crate::{
    EngineError, Movement, OperationReceipt, PaymentMethod, Product, ResultEngine, SaleCmd,
    util::{line_total, normalize_optional_text, require_positive},
};

use super::{
    Engine,
    catalog::{find_category, find_product},
    inventory,
    ledger::Batch,
    with_tx,
};

/// Product sale line: checks and takes stock when linked, then adds the
/// headline row to `batch`.
pub(super) async fn sell_product(
    db_tx: &DatabaseTransaction,
    batch: &mut Batch,
    product: &Product,
    line: SaleLine,
) -> ResultEngine<()> {
    let category = match line.category {
        Some(category) => Some(category),
        None => match product.category_id {
            Some(category_id) => Some(find_category(db_tx, category_id).await?.name),
            None => line.fallback_category.map(ToString::to_string),
        },
    };
    let movement = Movement::sale(
        Some(product.id),
        line.inventory_linked,
        line.quantity,
        line.unit_price_minor,
        product.vat_rate,
        category,
        line.payment_method,
    )?;
    if line.inventory_linked {
        inventory::adjust(db_tx, product.id, -line.quantity, None).await?;
    }
    let note = batch.note().map(ToString::to_string);
    batch.push_headline(movement, note);
    Ok(())
}

pub(super) struct SaleLine {
    pub(super) inventory_linked: bool,
    pub(super) quantity: i64,
    pub(super) unit_price_minor: i64,
    pub(super) category: Option<String>,
    pub(super) fallback_category: Option<&'static str>,
    pub(super) payment_method: PaymentMethod,
}

impl Engine {
    /// Sell a product, or record a free sale without one.
    ///
    /// An inventory linked sale takes `quantity` out of stock first and fails
    /// with [`EngineError::InsufficientStock`] when not enough is left. VAT is
    /// the product's rate, or the shop default for free sales.
    pub async fn record_sale(&self, cmd: SaleCmd) -> ResultEngine<OperationReceipt> {
        let result = self.write_sale(&cmd).await;
        self.settle_idempotent(result, &cmd.user_id, &cmd.meta).await
    }

    async fn write_sale(&self, cmd: &SaleCmd) -> ResultEngine<OperationReceipt> {
        require_positive(cmd.quantity, "quantity")?;
        require_positive(cmd.unit_price_minor, "unit_price")?;
        line_total(cmd.quantity, cmd.unit_price_minor)?;
        let category = normalize_optional_text(cmd.category.as_deref());
        if cmd.inventory_linked && cmd.product_id.is_none() {
            return Err(EngineError::validation(
                "product_id",
                "an inventory linked sale needs a product",
            ));
        }
        if cmd.product_id.is_none() && category.is_none() {
            return Err(EngineError::validation(
                "category",
                "a free sale needs a category",
            ));
        }

        with_tx!(self, |db_tx| {
            if let Some(receipt) = self.replay(&db_tx, &cmd.user_id, &cmd.meta).await? {
                return Ok(receipt);
            }

            let mut batch = Batch::new(&cmd.user_id, &cmd.meta);
            match cmd.product_id {
                Some(product_id) => {
                    let product = find_product(&db_tx, product_id).await?;
                    sell_product(
                        &db_tx,
                        &mut batch,
                        &product,
                        SaleLine {
                            inventory_linked: cmd.inventory_linked,
                            quantity: cmd.quantity,
                            unit_price_minor: cmd.unit_price_minor,
                            category,
                            fallback_category: None,
                            payment_method: cmd.payment_method,
                        },
                    )
                    .await?;
                }
                None => {
                    let movement = Movement::sale(
                        None,
                        false,
                        cmd.quantity,
                        cmd.unit_price_minor,
                        self.settings.default_vat_rate,
                        category,
                        cmd.payment_method,
                    )?;
                    let note = batch.note().map(ToString::to_string);
                    batch.push_headline(movement, note);
                }
            }

            let receipt = self.commit_batch(&db_tx, batch).await?;
            tracing::info!(
                batch_id = %receipt.batch_id,
                product_id = ?cmd.product_id,
                quantity = cmd.quantity,
                linked = cmd.inventory_linked,
                "sale recorded"
            );
            Ok(receipt)
        })
    }
}
