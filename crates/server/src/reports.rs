//! Sales report endpoint.

use api_types::report::{ReportQuery, SalesReportResponse};
use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;

use crate::{ServerError, server::ServerState, views};

pub async fn sales(
    State(state): State<ServerState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<SalesReportResponse>, ServerError> {
    let filter = engine::ReportFilter {
        from: query.from.map(|dt| dt.with_timezone(&Utc)),
        to: query.to.map(|dt| dt.with_timezone(&Utc)),
        granularity: views::engine_granularity(query.granularity.unwrap_or_default()),
    };
    let report = state.engine.sales_report(filter).await?;
    Ok(Json(views::sales_report(report)))
}
