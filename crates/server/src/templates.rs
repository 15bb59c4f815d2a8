//! Bouquet template API endpoints.

use api_types::template::{
    QuickQuoteRequest, QuickQuoteResponse, TemplateCostingView, TemplateListResponse,
    TemplateSave, TemplateView,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, views};

fn new_template(payload: TemplateSave) -> engine::NewTemplate {
    let mut cmd = engine::NewTemplate::new(payload.name, payload.base_price_minor);
    cmd.description = payload.description;
    cmd.items = payload.items.iter().map(views::engine_template_item).collect();
    cmd
}

pub async fn list(
    State(state): State<ServerState>,
) -> Result<Json<TemplateListResponse>, ServerError> {
    let templates = state
        .engine
        .templates()
        .await?
        .into_iter()
        .map(views::template)
        .collect();
    Ok(Json(TemplateListResponse { templates }))
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<TemplateSave>,
) -> Result<(StatusCode, Json<TemplateView>), ServerError> {
    let template = state.engine.create_template(new_template(payload)).await?;
    Ok((StatusCode::CREATED, Json(views::template(template))))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TemplateView>, ServerError> {
    let template = state.engine.template(id).await?;
    Ok(Json(views::template(template)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TemplateSave>,
) -> Result<Json<TemplateView>, ServerError> {
    let template = state
        .engine
        .update_template(id, new_template(payload))
        .await?;
    Ok(Json(views::template(template)))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_template(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn costing(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TemplateCostingView>, ServerError> {
    let costing = state.engine.template_costing(id).await?;
    Ok(Json(views::costing(costing)))
}

pub async fn quick_quote(
    State(state): State<ServerState>,
    Json(payload): Json<QuickQuoteRequest>,
) -> Result<Json<QuickQuoteResponse>, ServerError> {
    let items: Vec<_> = payload.items.iter().map(views::engine_template_item).collect();
    let quote = state.engine.quick_bouquet_quote(&items).await?;
    Ok(Json(QuickQuoteResponse {
        cost_minor: quote.cost_minor,
        suggested_price_minor: quote.suggested_price_minor,
    }))
}
