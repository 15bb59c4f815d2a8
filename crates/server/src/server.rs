use axum::{
    Router,
    extract::Request,
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Error as AxumError, Header},
};

use std::sync::Arc;

use crate::{catalog, inventory, operations, reports, templates, transactions};
use engine::Engine;

static OPERATOR_HEADER: axum::http::HeaderName =
    axum::http::HeaderName::from_static("x-operator");

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Name of the person at the till, recorded as `created_by` on every row.
#[derive(Clone, Debug)]
pub struct Operator(pub String);

/// `TypedHeader` for the operator header
///
/// Requests must contain a non-empty "x-operator" entry in the header.
#[derive(Debug)]
struct OperatorHeader(String);

impl Header for OperatorHeader {
    fn name() -> &'static axum::http::HeaderName {
        &OPERATOR_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        let value = values.next().ok_or_else(AxumError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(AxumError::invalid());
        };
        let value = value.trim();
        if value.is_empty() {
            return Err(AxumError::invalid());
        }

        Ok(OperatorHeader(value.to_string()))
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        match axum::http::HeaderValue::from_str(&self.0) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode x-operator header"),
        }
    }
}

async fn operator(
    operator_header: Option<TypedHeader<OperatorHeader>>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(OperatorHeader(name))) = operator_header else {
        return Err(StatusCode::BAD_REQUEST);
    };

    request.extensions_mut().insert(Operator(name));
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/categories", get(catalog::list_categories).post(catalog::create_category))
        .route("/products", get(catalog::list_products).post(catalog::create_product))
        .route(
            "/products/{id}",
            get(catalog::get_product).patch(catalog::update_product),
        )
        .route("/materials", get(catalog::list_materials).post(catalog::create_material))
        .route(
            "/materials/{id}",
            axum::routing::patch(catalog::update_material).delete(catalog::delete_material),
        )
        .route("/templates", get(templates::list).post(templates::create))
        .route(
            "/templates/{id}",
            get(templates::get)
                .put(templates::update)
                .delete(templates::delete),
        )
        .route("/templates/{id}/costing", get(templates::costing))
        .route("/quotes", post(templates::quick_quote))
        .route("/inventory", get(inventory::list))
        .route("/inventory/{product_id}", get(inventory::get))
        .route("/purchases", post(operations::purchase_new))
        .route("/sales", post(operations::sale_new))
        .route("/sales/bouquet", post(operations::bouquet_sale_new))
        .route("/productions", post(operations::production_new))
        .route("/write-offs", post(operations::write_off_new))
        .route("/receipts/{batch_id}", get(operations::receipt))
        .route("/transactions", get(transactions::list))
        .route("/transactions/{id}", get(transactions::get))
        .route("/transactions/{id}/storno", post(operations::storno_new))
        .route("/reports", get(reports::sales))
        .route_layer(middleware::from_fn(operator))
        .with_state(state)
}

pub async fn run(engine: Engine, bind: &str) {
    let listener = match tokio::net::TcpListener::bind(bind).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {bind}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Method, Request as HttpRequest},
    };
    use http_body_util::BodyExt;
    use migration::MigratorTrait;
    use sea_orm::Database;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;

    async fn app() -> Router {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let engine = Engine::builder().database(db).build().await.unwrap();
        router(ServerState {
            engine: Arc::new(engine),
        })
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = HttpRequest::builder()
            .method(method)
            .uri(uri)
            .header("x-operator", "anna")
            .header("content-type", "application/json");
        let body = match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn missing_operator_is_rejected() {
        let app = app().await;
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/products")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn purchase_sale_and_storno_round_trip() {
        let app = app().await;

        let (status, purchase) = call(
            &app,
            Method::POST,
            "/purchases",
            Some(json!({
                "product_name": "Rose rot",
                "quantity": 50,
                "unit_price_minor": 120,
                "idempotency_key": "delivery-1",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(purchase["transactions"][0]["created_by"], "anna");
        let product_id = purchase["transactions"][0]["product_id"]
            .as_str()
            .unwrap()
            .to_string();

        let (status, replay) = call(
            &app,
            Method::POST,
            "/purchases",
            Some(json!({
                "product_name": "Rose rot",
                "quantity": 50,
                "unit_price_minor": 120,
                "idempotency_key": "delivery-1",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(replay["replayed"], true);

        let (status, sale) = call(
            &app,
            Method::POST,
            "/sales",
            Some(json!({
                "product_id": product_id,
                "quantity": 3,
                "unit_price_minor": 250,
                "payment_method": "card",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let row = &sale["transactions"][0];
        assert_eq!(row["kind"], "sale");
        assert_eq!(row["total_price_minor"], 750);
        assert_eq!(row["vat_amount_minor"], 120);
        assert_eq!(row["vat_rate"], 19);
        let sale_id = row["id"].as_str().unwrap().to_string();

        let (_, entry) = call(&app, Method::GET, &format!("/inventory/{product_id}"), None).await;
        assert_eq!(entry["quantity"], 47);

        let storno_uri = format!("/transactions/{sale_id}/storno");
        let (status, storno) =
            call(&app, Method::POST, &storno_uri, Some(json!({ "note": "Kunde" }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(storno["transactions"][0]["total_price_minor"], -750);
        assert_eq!(storno["transactions"][0]["reverses_transaction_id"], sale_id);

        let (status, _) = call(&app, Method::POST, &storno_uri, Some(json!({}))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, entry) = call(&app, Method::GET, &format!("/inventory/{product_id}"), None).await;
        assert_eq!(entry["quantity"], 50);
    }

    #[tokio::test]
    async fn overselling_maps_to_422() {
        let app = app().await;
        let (_, purchase) = call(
            &app,
            Method::POST,
            "/purchases",
            Some(json!({ "product_name": "Tulpe", "quantity": 2, "unit_price_minor": 80 })),
        )
        .await;
        let product_id = purchase["transactions"][0]["product_id"].clone();

        let (status, body) = call(
            &app,
            Method::POST,
            "/sales",
            Some(json!({ "product_id": product_id, "quantity": 3, "unit_price_minor": 150 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().starts_with("Insufficient stock"));
    }

    #[tokio::test]
    async fn transactions_list_filters_by_kind() {
        let app = app().await;
        call(
            &app,
            Method::POST,
            "/sales",
            Some(json!({ "quantity": 1, "unit_price_minor": 500, "category": "Deko" })),
        )
        .await;

        let (status, list) = call(&app, Method::GET, "/transactions?kinds=sale,storno", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["transactions"].as_array().unwrap().len(), 1);
        assert_eq!(list["transactions"][0]["category"], "Deko");

        let (status, _) = call(&app, Method::GET, "/transactions?kinds=refund", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, report) = call(&app, Method::GET, "/reports?granularity=month", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["vat_total"]["gross_minor"], 500);
    }
}
