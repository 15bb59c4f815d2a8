use sea_orm::{QueryFilter, TransactionTrait, prelude::*};

use crate::{
    EngineError, Movement, OperationReceipt, ResultEngine, StornoCmd, transactions,
};

use super::{
    Engine, inventory,
    ledger::{Batch, find_transaction, is_busy},
    with_tx,
};

/// Attempts at a storno that keeps losing the SQLite write lock.
const STORNO_ATTEMPTS: usize = 3;

impl Engine {
    /// Cancel a sale with a storno row carrying the negated amounts and VAT.
    ///
    /// Stock comes back only when the sale took it out of inventory. Usage
    /// rows of a bouquet sale stay as they are: the flowers were used.
    /// A sale can be cancelled once; a second attempt fails with
    /// [`EngineError::AlreadyCancelled`].
    pub async fn storno(&self, cmd: StornoCmd) -> ResultEngine<OperationReceipt> {
        let mut result = self.write_storno(&cmd).await;
        // The loser of a concurrent storno on SQLite sees the lock held by
        // the winner; a fresh attempt reads the winner's committed row.
        for _ in 1..STORNO_ATTEMPTS {
            match &result {
                Err(err) if is_busy(err) => result = self.write_storno(&cmd).await,
                _ => break,
            }
        }
        // Otherwise a lost race surfaces as the unique index on
        // `reverses_transaction_id`.
        if let Err(EngineError::Database(_)) = &result {
            if let Some(receipt) = self.replay(&self.database, &cmd.user_id, &cmd.meta).await? {
                return Ok(receipt);
            }
            // Another storno of the same sale committed first.
            if self.storno_for(cmd.transaction_id).await?.is_some() {
                return Err(EngineError::AlreadyCancelled {
                    transaction_id: cmd.transaction_id,
                });
            }
        }
        result
    }

    async fn write_storno(&self, cmd: &StornoCmd) -> ResultEngine<OperationReceipt> {
        with_tx!(self, |db_tx| {
            if let Some(receipt) = self.replay(&db_tx, &cmd.user_id, &cmd.meta).await? {
                return Ok(receipt);
            }

            let original = find_transaction(&db_tx, cmd.transaction_id).await?;
            let movement = Movement::storno_of(&original)?;

            let cancelled = transactions::Entity::find()
                .filter(
                    transactions::Column::ReversesTransactionId
                        .eq(cmd.transaction_id.to_string()),
                )
                .one(&db_tx)
                .await?
                .is_some();
            if cancelled {
                return Err(EngineError::AlreadyCancelled {
                    transaction_id: cmd.transaction_id,
                });
            }

            if let Some((product_id, delta)) = movement.stock_delta() {
                inventory::adjust(&db_tx, product_id, delta, None).await?;
            }

            let mut batch = Batch::new(&cmd.user_id, &cmd.meta);
            let note = match batch.note() {
                Some(reason) => format!("storno of {}: {reason}", original.id),
                None => format!("storno of {}", original.id),
            };
            batch.push_headline(movement, Some(note));
            let receipt = self.commit_batch(&db_tx, batch).await?;
            tracing::info!(
                batch_id = %receipt.batch_id,
                reverses = %original.id,
                "sale cancelled"
            );
            Ok(receipt)
        })
    }
}
