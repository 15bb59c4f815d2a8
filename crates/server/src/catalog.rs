//! Categories, products and materials API endpoints.

use api_types::catalog::{
    CategoryCreate, CategoryListResponse, CategoryView, MaterialCreate, MaterialListResponse,
    MaterialUpdate, MaterialView, ProductCreate, ProductListResponse, ProductUpdate, ProductView,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, views};

pub async fn list_categories(
    State(state): State<ServerState>,
) -> Result<Json<CategoryListResponse>, ServerError> {
    let categories = state
        .engine
        .categories()
        .await?
        .into_iter()
        .map(views::category)
        .collect();
    Ok(Json(CategoryListResponse { categories }))
}

pub async fn create_category(
    State(state): State<ServerState>,
    Json(payload): Json<CategoryCreate>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    let category = state.engine.create_category(&payload.name).await?;
    Ok((StatusCode::CREATED, Json(views::category(category))))
}

pub async fn list_products(
    State(state): State<ServerState>,
) -> Result<Json<ProductListResponse>, ServerError> {
    let products = state
        .engine
        .products()
        .await?
        .into_iter()
        .map(views::product)
        .collect();
    Ok(Json(ProductListResponse { products }))
}

pub async fn create_product(
    State(state): State<ServerState>,
    Json(payload): Json<ProductCreate>,
) -> Result<(StatusCode, Json<ProductView>), ServerError> {
    let vat_rate = payload
        .vat_rate
        .map_or(state.engine.settings().default_vat_rate, views::engine_vat_rate);
    let mut cmd = engine::NewProduct::new(payload.name, vat_rate);
    cmd.category_id = payload.category_id;
    cmd.initial_unit_cost_minor = payload.initial_unit_cost_minor;

    let product = state.engine.create_product(cmd).await?;
    Ok((StatusCode::CREATED, Json(views::product(product))))
}

pub async fn get_product(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductView>, ServerError> {
    let product = state.engine.product(id).await?;
    Ok(Json(views::product(product)))
}

pub async fn update_product(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProductUpdate>,
) -> Result<Json<ProductView>, ServerError> {
    let category_id = if payload.clear_category {
        Some(None)
    } else {
        payload.category_id.map(Some)
    };
    let product = state
        .engine
        .update_product(
            id,
            engine::ProductUpdate {
                name: payload.name,
                category_id,
                vat_rate: payload.vat_rate.map(views::engine_vat_rate),
            },
        )
        .await?;
    Ok(Json(views::product(product)))
}

pub async fn list_materials(
    State(state): State<ServerState>,
) -> Result<Json<MaterialListResponse>, ServerError> {
    let materials = state
        .engine
        .materials()
        .await?
        .into_iter()
        .map(views::material)
        .collect();
    Ok(Json(MaterialListResponse { materials }))
}

pub async fn create_material(
    State(state): State<ServerState>,
    Json(payload): Json<MaterialCreate>,
) -> Result<(StatusCode, Json<MaterialView>), ServerError> {
    let vat_rate = payload
        .vat_rate
        .map_or(state.engine.settings().default_vat_rate, views::engine_vat_rate);
    let material = state
        .engine
        .create_material(engine::NewMaterial::new(
            payload.name,
            payload.unit_price_minor,
            vat_rate,
        ))
        .await?;
    Ok((StatusCode::CREATED, Json(views::material(material))))
}

pub async fn update_material(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MaterialUpdate>,
) -> Result<Json<MaterialView>, ServerError> {
    let material = state
        .engine
        .update_material(
            id,
            engine::MaterialUpdate {
                name: payload.name,
                unit_price_minor: payload.unit_price_minor,
                vat_rate: payload.vat_rate.map(views::engine_vat_rate),
            },
        )
        .await?;
    Ok(Json(views::material(material)))
}

pub async fn delete_material(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_material(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
