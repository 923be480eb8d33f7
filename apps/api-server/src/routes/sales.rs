//! Sales API.

use apotheca_core::{CoreError, SaleRecord, SaleRequest};
use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery};
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/sales", get(list).post(create))
        .route("/api/sales/{id}", get(get_by_id))
}

/// Paging for the sales history. Out-of-range values are clamped by the
/// repository.
#[derive(Debug, Default, Deserialize)]
pub struct SalesQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/sales?limit=&offset= - newest first
async fn list(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    ApiQuery(query): ApiQuery<SalesQuery>,
) -> ApiResult<ApiResponse<Vec<SaleRecord>>> {
    let sales = state.db.sales().list(query.limit, query.offset).await?;
    Ok(ApiResponse::ok(sales))
}

/// GET /api/sales/{id}
async fn get_by_id(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<SaleRecord>> {
    let sale = state
        .db
        .sales()
        .get(&id)
        .await?
        .ok_or_else(|| CoreError::SaleNotFound(id.clone()))?;
    Ok(ApiResponse::ok(sale))
}

/// POST /api/sales - record a sale as the calling user
async fn create(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiJson(req): ApiJson<SaleRequest>,
) -> ApiResult<ApiResponse<SaleRecord>> {
    let sale = state.db.sales().create_sale(&req, &identity).await?;
    Ok(ApiResponse::ok_with_message(sale, "Sale recorded"))
}
