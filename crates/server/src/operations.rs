//! Ledger write endpoints: purchases, sales, production, write-offs, stornos.

use api_types::operation::{
    BouquetSaleNew, OperationReceipt, ProductionNew, PurchaseNew, SaleNew, StornoNew,
    WriteOffNew,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, FixedOffset, Utc};
use uuid::Uuid;

use crate::{
    ServerError,
    server::{Operator, ServerState},
    views,
};

type Created = (StatusCode, Json<OperationReceipt>);

fn tx_meta(
    note: Option<String>,
    idempotency_key: Option<String>,
    occurred_at: Option<DateTime<FixedOffset>>,
) -> engine::TxMeta {
    engine::TxMeta {
        note,
        idempotency_key,
        occurred_at: occurred_at
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now),
    }
}

/// `201` for a new batch, `200` when an idempotency key replayed one.
fn created(receipt: engine::OperationReceipt) -> Created {
    let status = if receipt.replayed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    (status, Json(views::receipt(&receipt)))
}

pub async fn purchase_new(
    Extension(operator): Extension<Operator>,
    State(state): State<ServerState>,
    Json(payload): Json<PurchaseNew>,
) -> Result<Created, ServerError> {
    let product = match (payload.product_id, payload.product_name) {
        (Some(id), None) => engine::ProductRef::Existing(id),
        (None, Some(name)) => engine::ProductRef::Named {
            name,
            category_id: payload.category_id,
            vat_rate: payload.vat_rate.map(views::engine_vat_rate),
        },
        (None, None) => {
            return Err(ServerError::Generic(
                "either product_id or product_name is required".to_string(),
            ));
        }
        (Some(_), Some(_)) => {
            return Err(ServerError::Generic(
                "provide only one of product_id or product_name".to_string(),
            ));
        }
    };
    let meta = tx_meta(payload.note, payload.idempotency_key, payload.occurred_at);
    let cmd = engine::PurchaseCmd::new(
        operator.0,
        product,
        payload.quantity,
        payload.unit_price_minor,
        meta.occurred_at,
    )
    .meta(meta);

    Ok(created(state.engine.record_purchase(cmd).await?))
}

pub async fn sale_new(
    Extension(operator): Extension<Operator>,
    State(state): State<ServerState>,
    Json(payload): Json<SaleNew>,
) -> Result<Created, ServerError> {
    let meta = tx_meta(payload.note, payload.idempotency_key, payload.occurred_at);
    let mut cmd = engine::SaleCmd::new(
        operator.0,
        payload.quantity,
        payload.unit_price_minor,
        meta.occurred_at,
    )
    .meta(meta);
    if let Some(product_id) = payload.product_id {
        cmd = cmd.product(product_id);
        if payload.inventory_linked == Some(false) {
            cmd = cmd.unlinked();
        }
    }
    if let Some(category) = payload.category {
        cmd = cmd.category(category);
    }
    if let Some(method) = payload.payment_method {
        cmd = cmd.payment_method(views::engine_payment_method(method));
    }

    Ok(created(state.engine.record_sale(cmd).await?))
}

pub async fn bouquet_sale_new(
    Extension(operator): Extension<Operator>,
    State(state): State<ServerState>,
    Json(payload): Json<BouquetSaleNew>,
) -> Result<Created, ServerError> {
    let source = match (payload.product_id, payload.template_id, payload.ingredients) {
        (Some(product_id), None, None) => engine::CompositeSource::Stocked { product_id },
        (None, Some(template_id), None) => engine::CompositeSource::FromTemplate { template_id },
        (None, None, Some(ingredients)) => engine::CompositeSource::AdHoc {
            label: payload.label.unwrap_or_else(|| "Strauß".to_string()),
            ingredients: ingredients.iter().map(views::engine_template_item).collect(),
        },
        _ => {
            return Err(ServerError::Generic(
                "provide exactly one of product_id, template_id or ingredients".to_string(),
            ));
        }
    };
    let meta = tx_meta(payload.note, payload.idempotency_key, payload.occurred_at);
    let mut cmd = engine::CompositeSaleCmd::new(
        operator.0,
        source,
        payload.quantity,
        payload.sale_price_minor,
        meta.occurred_at,
    )
    .meta(meta);
    if let Some(method) = payload.payment_method {
        cmd = cmd.payment_method(views::engine_payment_method(method));
    }

    Ok(created(state.engine.sell_composite(cmd).await?))
}

pub async fn production_new(
    Extension(operator): Extension<Operator>,
    State(state): State<ServerState>,
    Json(payload): Json<ProductionNew>,
) -> Result<Created, ServerError> {
    let meta = tx_meta(payload.note, payload.idempotency_key, payload.occurred_at);
    let cmd = engine::ProduceCmd::new(
        operator.0,
        payload.template_id,
        payload.multiplier,
        meta.occurred_at,
    )
    .meta(meta);

    Ok(created(state.engine.produce_bouquet(cmd).await?))
}

pub async fn write_off_new(
    Extension(operator): Extension<Operator>,
    State(state): State<ServerState>,
    Json(payload): Json<WriteOffNew>,
) -> Result<Created, ServerError> {
    let meta = tx_meta(payload.note, payload.idempotency_key, payload.occurred_at);
    let cmd = engine::WriteOffCmd::new(
        operator.0,
        payload.product_id,
        payload.quantity,
        views::engine_write_off_reason(payload.reason),
        meta.occurred_at,
    )
    .meta(meta);

    Ok(created(state.engine.record_write_off(cmd).await?))
}

pub async fn storno_new(
    Extension(operator): Extension<Operator>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StornoNew>,
) -> Result<Created, ServerError> {
    let meta = tx_meta(payload.note, payload.idempotency_key, payload.occurred_at);
    let cmd = engine::StornoCmd::new(operator.0, id, meta.occurred_at).meta(meta);

    Ok(created(state.engine.storno(cmd).await?))
}

pub async fn receipt(
    State(state): State<ServerState>,
    Path(batch_id): Path<Uuid>,
) -> Result<Json<OperationReceipt>, ServerError> {
    let receipt = state.engine.receipt(batch_id).await?;
    Ok(Json(views::receipt(&receipt)))
}
