//! Stock API endpoints.

use api_types::inventory::{InventoryQuery, InventoryResponse, StockView};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use uuid::Uuid;

use crate::{ServerError, server::ServerState, views};

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<InventoryQuery>,
) -> Result<Json<InventoryResponse>, ServerError> {
    let items = match query.low_stock {
        Some(threshold) => state.engine.low_stock(threshold).await?,
        None => state.engine.inventory().await?,
    };
    Ok(Json(InventoryResponse {
        items: items.into_iter().map(views::stock).collect(),
    }))
}

/// Stock of one product. A product never stocked reports zero.
pub async fn get(
    State(state): State<ServerState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<StockView>, ServerError> {
    let product = state.engine.product(product_id).await?;
    let view = match state.engine.inventory_entry(product_id).await {
        Ok(entry) => views::stock(engine::StockItem { product, entry }),
        Err(engine::EngineError::NotFound { .. }) => StockView {
            product_id,
            name: product.name,
            is_composite: product.is_composite,
            quantity: 0,
            unit_purchase_price_minor: 0,
            last_updated: views::utc_offset(Utc::now()),
        },
        Err(err) => return Err(err.into()),
    };
    Ok(Json(view))
}
