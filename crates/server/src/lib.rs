use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{run, run_with_listener, spawn_with_listener};

mod catalog;
mod inventory;
mod operations;
mod reports;
mod server;
mod templates;
mod transactions;
mod views;

pub mod types {
    pub mod catalog {
        pub use api_types::catalog::{
            CategoryCreate, CategoryListResponse, CategoryView, MaterialCreate,
            MaterialListResponse, MaterialUpdate, MaterialView, ProductCreate,
            ProductListResponse, ProductUpdate, ProductView,
        };
    }

    pub mod template {
        pub use api_types::template::{
            CostLineView, IngredientKind, QuickQuoteRequest, QuickQuoteResponse,
            TemplateCostingView, TemplateItemView, TemplateListResponse, TemplateSave,
            TemplateView,
        };
    }

    pub mod inventory {
        pub use api_types::inventory::{InventoryQuery, InventoryResponse, StockView};
    }

    pub mod operation {
        pub use api_types::operation::{
            BouquetSaleNew, OperationReceipt, PaymentMethod, ProductionNew, PurchaseNew,
            SaleNew, StornoNew, WriteOffNew, WriteOffReason,
        };
    }

    pub mod transaction {
        pub use api_types::transaction::{
            TransactionKind, TransactionList, TransactionListResponse, TransactionView,
        };
    }

    pub mod report {
        pub use api_types::report::{Granularity, ReportQuery, SalesReportResponse};
    }
}

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) | EngineError::AlreadyCancelled { .. } => {
            StatusCode::CONFLICT
        }
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InsufficientStock { .. }
        | EngineError::Validation { .. }
        | EngineError::InvalidCursor(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use engine::EntityKind;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::NotFound {
            kind: EntityKind::Product,
            id: "x".to_string(),
        })
        .into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflicts_map_to_409() {
        let res = ServerError::from(EngineError::ExistingKey("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);

        let res = ServerError::from(EngineError::AlreadyCancelled {
            transaction_id: Uuid::new_v4(),
        })
        .into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn business_rejections_map_to_422() {
        let res = ServerError::from(EngineError::InsufficientStock {
            product_id: Uuid::new_v4(),
            requested: 3,
            available: 2,
        })
        .into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let res = ServerError::from(EngineError::Validation {
            field: "quantity",
            reason: "must be > 0".to_string(),
        })
        .into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn database_errors_hide_details() {
        let res = ServerError::from(EngineError::Database(sea_orm::DbErr::Custom(
            "disk I/O error".to_string(),
        )))
        .into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
