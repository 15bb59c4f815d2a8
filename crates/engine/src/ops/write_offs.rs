use sea_orm::TransactionTrait;

use crate::{
    EngineError, Movement, OperationReceipt, ResultEngine, WriteOffCmd,
    util::require_positive,
};

use super::{Engine, catalog::find_product, inventory, ledger::Batch, with_tx};

impl Engine {
    /// Take goods out of stock as waste, personal use, gift or discount.
    ///
    /// The row is valued at the latest purchase cost of the product.
    pub async fn record_write_off(&self, cmd: WriteOffCmd) -> ResultEngine<OperationReceipt> {
        let result = self.write_write_off(&cmd).await;
        self.settle_idempotent(result, &cmd.user_id, &cmd.meta).await
    }

    async fn write_write_off(&self, cmd: &WriteOffCmd) -> ResultEngine<OperationReceipt> {
        require_positive(cmd.quantity, "quantity")?;

        with_tx!(self, |db_tx| {
            if let Some(receipt) = self.replay(&db_tx, &cmd.user_id, &cmd.meta).await? {
                return Ok(receipt);
            }

            find_product(&db_tx, cmd.product_id).await?;
            let Some(entry) = inventory::find_entry(&db_tx, cmd.product_id).await? else {
                return Err(EngineError::InsufficientStock {
                    product_id: cmd.product_id,
                    requested: cmd.quantity,
                    available: 0,
                });
            };
            let movement = Movement::write_off(
                cmd.reason,
                cmd.product_id,
                cmd.quantity,
                entry.unit_purchase_price_minor,
            )?;
            inventory::adjust(&db_tx, cmd.product_id, -cmd.quantity, None).await?;

            let mut batch = Batch::new(&cmd.user_id, &cmd.meta);
            let note = batch.note().map(ToString::to_string);
            batch.push_headline(movement, note);
            let receipt = self.commit_batch(&db_tx, batch).await?;
            tracing::info!(
                batch_id = %receipt.batch_id,
                product_id = %cmd.product_id,
                quantity = cmd.quantity,
                reason = cmd.reason.as_str(),
                "write-off recorded"
            );
            Ok(receipt)
        })
    }
}
