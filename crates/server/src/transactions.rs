//! Transactions API endpoints

use api_types::transaction::{TransactionList, TransactionListResponse, TransactionView};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use uuid::Uuid;

use crate::{ServerError, server::ServerState, views};

const DEFAULT_LIMIT: u64 = 50;

fn parse_kinds(kinds: &str) -> Result<Vec<engine::TransactionKind>, engine::EngineError> {
    kinds
        .split(',')
        .map(str::trim)
        .filter(|kind| !kind.is_empty())
        .map(engine::TransactionKind::try_from)
        .collect()
}

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<TransactionList>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let kinds = query.kinds.as_deref().map(parse_kinds).transpose()?;
    let filter = engine::TransactionListFilter {
        from: query.from.map(|dt| dt.with_timezone(&Utc)),
        to: query.to.map(|dt| dt.with_timezone(&Utc)),
        kinds,
        product_id: query.product_id,
    };

    let (txs, next_cursor) = state
        .engine
        .list_transactions_page(
            query.limit.unwrap_or(DEFAULT_LIMIT),
            query.cursor.as_deref(),
            &filter,
        )
        .await?;

    Ok(Json(TransactionListResponse {
        transactions: txs.iter().map(views::transaction).collect(),
        next_cursor,
    }))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionView>, ServerError> {
    let tx = state.engine.transaction(id).await?;
    Ok(Json(views::transaction(&tx)))
}
