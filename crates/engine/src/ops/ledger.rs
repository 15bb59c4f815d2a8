//! Appending and reading ledger rows.
//!
//! An operation writes one batch: zero or more usage lines followed by a
//! headline row whose id is the batch id. Only the headline carries the
//! idempotency key, so a replay finds the headline and reloads its batch.

use base64::Engine as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    Condition, ConnectionTrait, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect,
    RuntimeErr, SqlErr, TransactionTrait, prelude::*, sqlx,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, EntityKind, Movement, ResultEngine, Transaction, TransactionKind, TxMeta,
    transactions,
    util::{normalize_optional_text, parse_uuid},
};

use super::{Engine, with_tx};

/// The rows one operation wrote, in write order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationReceipt {
    pub batch_id: Uuid,
    pub transactions: Vec<Transaction>,
    /// `true` when an earlier operation with the same idempotency key was
    /// returned instead of writing again.
    pub replayed: bool,
}

impl OperationReceipt {
    pub fn headline(&self) -> Option<&Transaction> {
        self.transactions.iter().find(|tx| tx.is_headline())
    }

    pub fn of_kind(&self, kind: TransactionKind) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().filter(move |tx| tx.kind() == kind)
    }
}

/// Filters for listing transactions.
///
/// `from` is inclusive and `to` is exclusive (`[from, to)`), both in UTC.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// If present, acts as an allow-list of kinds to return.
    pub kinds: Option<Vec<TransactionKind>>,
    pub product_id: Option<Uuid>,
}

impl TransactionListFilter {
    pub(crate) fn validate(&self) -> ResultEngine<()> {
        if let (Some(from), Some(to)) = (self.from, self.to)
            && from >= to
        {
            return Err(EngineError::validation("range", "from must be < to"));
        }
        if self.kinds.as_ref().is_some_and(|k| k.is_empty()) {
            return Err(EngineError::validation("kinds", "must not be empty"));
        }
        Ok(())
    }
}

trait ApplyTxFilters: QueryFilter + Sized {
    fn apply_tx_filters(self, filter: &TransactionListFilter) -> Self;
}

impl<T> ApplyTxFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_tx_filters(mut self, filter: &TransactionListFilter) -> Self {
        if let Some(from) = filter.from {
            self = self.filter(transactions::Column::OccurredAt.gte(from));
        }
        if let Some(to) = filter.to {
            self = self.filter(transactions::Column::OccurredAt.lt(to));
        }
        if let Some(kinds) = &filter.kinds {
            let kinds: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
            self = self.filter(transactions::Column::Kind.is_in(kinds));
        }
        if let Some(product_id) = filter.product_id {
            self = self.filter(transactions::Column::ProductId.eq(product_id.to_string()));
        }
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct TransactionsCursor {
    occurred_at: DateTime<Utc>,
    transaction_id: String,
}

impl TransactionsCursor {
    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::InvalidCursor("invalid transactions cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::InvalidCursor("invalid transactions cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::InvalidCursor("invalid transactions cursor".to_string()))
    }
}

/// Rows of one operation, collected before anything is written.
pub(super) struct Batch {
    id: Uuid,
    created_by: String,
    occurred_at: DateTime<Utc>,
    idempotency_key: Option<String>,
    note: Option<String>,
    lines: Vec<Transaction>,
}

impl Batch {
    pub(super) fn new(user_id: &str, meta: &TxMeta) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_by: user_id.to_string(),
            occurred_at: meta.occurred_at,
            idempotency_key: normalize_optional_text(meta.idempotency_key.as_deref()),
            note: normalize_optional_text(meta.note.as_deref()),
            lines: Vec::new(),
        }
    }

    /// Operator note attached to the whole operation.
    pub(super) fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// A supporting row (ingredient usage).
    pub(super) fn push_line(&mut self, movement: Movement, note: Option<String>) {
        self.lines.push(Transaction {
            id: Uuid::new_v4(),
            batch_id: self.id,
            occurred_at: self.occurred_at,
            created_by: self.created_by.clone(),
            note,
            idempotency_key: None,
            movement,
        });
    }

    /// The row that carries the operation's amounts.
    pub(super) fn push_headline(&mut self, movement: Movement, note: Option<String>) {
        self.lines.push(Transaction {
            id: self.id,
            batch_id: self.id,
            occurred_at: self.occurred_at,
            created_by: self.created_by.clone(),
            note,
            idempotency_key: self.idempotency_key.clone(),
            movement,
        });
    }
}

pub(super) fn is_unique_violation(err: &EngineError) -> bool {
    matches!(
        err,
        EngineError::Database(db_err)
            if matches!(db_err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
    )
}

/// SQLite refused the write because another connection holds the lock.
pub(super) fn is_busy(err: &EngineError) -> bool {
    let (EngineError::Database(DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(db_err))))
    | EngineError::Database(DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(
        db_err,
    ))))) = err
    else {
        return false;
    };
    // SQLITE_BUSY and its extended codes share the low byte 5.
    db_err
        .code()
        .and_then(|code| code.parse::<i32>().ok())
        .is_some_and(|code| code & 0xff == 5)
}

async fn load_batch(
    db: &impl ConnectionTrait,
    batch_id: Uuid,
) -> ResultEngine<Vec<Transaction>> {
    transactions::Entity::find()
        .filter(transactions::Column::BatchId.eq(batch_id.to_string()))
        .order_by_asc(transactions::Column::BatchLine)
        .all(db)
        .await?
        .into_iter()
        .map(Transaction::try_from)
        .collect()
}

pub(super) async fn find_transaction(
    db: &impl ConnectionTrait,
    id: Uuid,
) -> ResultEngine<Transaction> {
    let model = transactions::Entity::find_by_id(id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| EngineError::not_found(EntityKind::Transaction, id))?;
    Transaction::try_from(model)
}

impl Engine {
    /// Returns the earlier batch written by `user_id` with the same
    /// idempotency key, if any.
    pub(super) async fn replay(
        &self,
        db: &impl ConnectionTrait,
        user_id: &str,
        meta: &TxMeta,
    ) -> ResultEngine<Option<OperationReceipt>> {
        let Some(key) = normalize_optional_text(meta.idempotency_key.as_deref()) else {
            return Ok(None);
        };
        let existing = transactions::Entity::find()
            .filter(transactions::Column::CreatedBy.eq(user_id.to_string()))
            .filter(transactions::Column::IdempotencyKey.eq(key))
            .one(db)
            .await?;
        let Some(existing) = existing else {
            return Ok(None);
        };

        let batch_id = parse_uuid(&existing.batch_id, EntityKind::Transaction)?;
        tracing::debug!(%batch_id, user_id, "idempotent replay");
        Ok(Some(OperationReceipt {
            batch_id,
            transactions: load_batch(db, batch_id).await?,
            replayed: true,
        }))
    }

    /// Inserts every row of `batch` in order.
    pub(super) async fn commit_batch(
        &self,
        db_tx: &DatabaseTransaction,
        batch: Batch,
    ) -> ResultEngine<OperationReceipt> {
        for (line, tx) in batch.lines.iter().enumerate() {
            let line = i32::try_from(line)
                .map_err(|_| EngineError::validation("batch", "too many rows"))?;
            transactions::active_model(tx, line).insert(db_tx).await?;
        }
        Ok(OperationReceipt {
            batch_id: batch.id,
            transactions: batch.lines,
            replayed: false,
        })
    }

    /// Turns a lost idempotency race into a replay.
    ///
    /// Two writers with the same key can both pass the replay check; the
    /// second one then hits the unique index on `(created_by,
    /// idempotency_key)` and its DB transaction is rolled back. The winner's
    /// batch is returned instead.
    pub(super) async fn settle_idempotent(
        &self,
        result: ResultEngine<OperationReceipt>,
        user_id: &str,
        meta: &TxMeta,
    ) -> ResultEngine<OperationReceipt> {
        match result {
            Err(err) if is_unique_violation(&err) => {
                match self.replay(&self.database, user_id, meta).await? {
                    Some(receipt) => Ok(receipt),
                    None => Err(err),
                }
            }
            other => other,
        }
    }

    /// Reload the receipt of an earlier operation.
    pub async fn receipt(&self, batch_id: Uuid) -> ResultEngine<OperationReceipt> {
        let transactions = load_batch(&self.database, batch_id).await?;
        if transactions.is_empty() {
            return Err(EngineError::not_found(EntityKind::Transaction, batch_id));
        }
        Ok(OperationReceipt {
            batch_id,
            transactions,
            replayed: false,
        })
    }

    pub async fn transaction(&self, id: Uuid) -> ResultEngine<Transaction> {
        find_transaction(&self.database, id).await
    }

    /// The storno written for `transaction_id`, if it was cancelled.
    pub async fn storno_for(&self, transaction_id: Uuid) -> ResultEngine<Option<Transaction>> {
        transactions::Entity::find()
            .filter(
                transactions::Column::ReversesTransactionId.eq(transaction_id.to_string()),
            )
            .one(&self.database)
            .await?
            .map(Transaction::try_from)
            .transpose()
    }

    pub async fn list_transactions(
        &self,
        limit: u64,
        filter: &TransactionListFilter,
    ) -> ResultEngine<Vec<Transaction>> {
        let (items, _next) = self.list_transactions_page(limit, None, filter).await?;
        Ok(items)
    }

    /// Lists transactions with cursor-based pagination.
    ///
    /// Pagination is newest → older by `(occurred_at DESC, id DESC)`; pass the
    /// returned cursor back to fetch the next page.
    pub async fn list_transactions_page(
        &self,
        limit: u64,
        cursor: Option<&str>,
        filter: &TransactionListFilter,
    ) -> ResultEngine<(Vec<Transaction>, Option<String>)> {
        filter.validate()?;
        with_tx!(self, |db_tx| {
            let limit_plus_one = limit.saturating_add(1);
            let mut query = transactions::Entity::find()
                .order_by_desc(transactions::Column::OccurredAt)
                .order_by_desc(transactions::Column::Id)
                .limit(limit_plus_one);

            if let Some(cursor) = cursor {
                let cursor = TransactionsCursor::decode(cursor)?;
                query = query.filter(
                    Condition::any()
                        .add(transactions::Column::OccurredAt.lt(cursor.occurred_at))
                        .add(
                            Condition::all()
                                .add(transactions::Column::OccurredAt.eq(cursor.occurred_at))
                                .add(transactions::Column::Id.lt(cursor.transaction_id)),
                        ),
                );
            }
            query = query.apply_tx_filters(filter);

            let rows = query.all(&db_tx).await?;
            let has_more = rows.len() as u64 > limit;

            let out = rows
                .into_iter()
                .take(usize::try_from(limit).unwrap_or(usize::MAX))
                .map(Transaction::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;

            let next_cursor = if has_more {
                out.last()
                    .map(|tx| TransactionsCursor {
                        occurred_at: tx.occurred_at,
                        transaction_id: tx.id.to_string(),
                    })
                    .map(|c| c.encode())
                    .transpose()?
            } else {
                None
            };

            Ok::<_, EngineError>((out, next_cursor))
        })
    }
}

