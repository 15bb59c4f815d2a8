use sea_orm::TransactionTrait;

use crate::{
    EngineError, Movement, OperationReceipt, ProductRef, PurchaseCmd, ResultEngine,
    util::{line_total, normalize_required_name, require_positive},
};

use super::{
    Engine,
    catalog::{find_product, find_product_by_name, insert_product},
    inventory,
    ledger::Batch,
    with_tx,
};

impl Engine {
    /// Restock a product from a supplier.
    ///
    /// A product given by name is matched case-insensitively and created on
    /// first delivery. Stock grows by `quantity` and the entry remembers
    /// `unit_price_minor` as the latest purchase cost.
    pub async fn record_purchase(&self, cmd: PurchaseCmd) -> ResultEngine<OperationReceipt> {
        let result = self.write_purchase(&cmd).await;
        self.settle_idempotent(result, &cmd.user_id, &cmd.meta).await
    }

    async fn write_purchase(&self, cmd: &PurchaseCmd) -> ResultEngine<OperationReceipt> {
        require_positive(cmd.quantity, "quantity")?;
        require_positive(cmd.unit_price_minor, "unit_price")?;
        line_total(cmd.quantity, cmd.unit_price_minor)?;
        let product_ref = match &cmd.product {
            ProductRef::Named {
                name,
                category_id,
                vat_rate,
            } => ProductRef::Named {
                name: normalize_required_name(name, "name")?,
                category_id: *category_id,
                vat_rate: *vat_rate,
            },
            existing => existing.clone(),
        };

        with_tx!(self, |db_tx| {
            if let Some(receipt) = self.replay(&db_tx, &cmd.user_id, &cmd.meta).await? {
                return Ok(receipt);
            }

            let product = match &product_ref {
                ProductRef::Existing(id) => find_product(&db_tx, *id).await?,
                ProductRef::Named {
                    name,
                    category_id,
                    vat_rate,
                } => match find_product_by_name(&db_tx, name, false).await? {
                    Some(product) => product,
                    None => {
                        let vat_rate = vat_rate.unwrap_or(self.settings.default_vat_rate);
                        insert_product(&db_tx, name, *category_id, vat_rate, false).await?
                    }
                },
            };
            if product.is_composite {
                return Err(EngineError::validation(
                    "product_id",
                    format!("{} is produced from a template, not purchased", product.name),
                ));
            }

            inventory::adjust(
                &db_tx,
                product.id,
                cmd.quantity,
                Some(cmd.unit_price_minor),
            )
            .await?;

            let mut batch = Batch::new(&cmd.user_id, &cmd.meta);
            let note = batch.note().map(ToString::to_string);
            batch.push_headline(
                Movement::purchase(product.id, cmd.quantity, cmd.unit_price_minor)?,
                note,
            );
            let receipt = self.commit_batch(&db_tx, batch).await?;
            tracing::info!(
                batch_id = %receipt.batch_id,
                product_id = %product.id,
                quantity = cmd.quantity,
                unit_price_minor = cmd.unit_price_minor,
                "purchase recorded"
            );
            Ok(receipt)
        })
    }
}
