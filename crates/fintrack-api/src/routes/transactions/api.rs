//! Transactions API endpoints - JSON in, JSON envelope out
//!
//! Endpoints:
//! - create_transaction: POST /transactions
//! - list_transactions: GET /transactions
//! - transaction_stats: GET /transactions/stats
//! - get_transaction: GET /transactions/:id
//! - update_transaction: PUT /transactions/:id
//! - delete_transaction: DELETE /transactions/:id

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use fintrack_core::{
    ListQuery, Pagination, StatsGroup, StatsQuery, StatsSummary, Transaction, TransactionPayload,
};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::AppState;

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Serialize)]
pub struct TransactionData {
    pub transaction: Transaction,
}

#[derive(Debug, Serialize)]
pub struct TransactionListData {
    pub transactions: Vec<Transaction>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct StatsData {
    pub groups: Vec<StatsGroup>,
    pub summary: StatsSummary,
}

#[derive(Debug, Serialize)]
pub struct DeletedData {
    pub id: String,
}

fn body(payload: Result<Json<TransactionPayload>, JsonRejection>) -> Result<TransactionPayload, ApiError> {
    payload
        .map(|Json(p)| p)
        .map_err(|e| ApiError::BadRequest { message: e.body_text() })
}

fn query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query
        .map(|Query(q)| q)
        .map_err(|e| ApiError::BadRequest { message: e.body_text() })
}

pub async fn create_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<TransactionPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<TransactionData>>), ApiError> {
    let payload = body(payload)?;
    let transaction = state
        .service
        .create(&user.user_id, &payload)
        .await
        .map_err(ApiError::during("create", &user))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Transaction created successfully", TransactionData { transaction })),
    ))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    params: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<TransactionListData> {
    let params = query(params)?;
    let page = state
        .service
        .list(&user.user_id, &params)
        .await
        .map_err(ApiError::during("list", &user))?;

    Ok(Json(ApiResponse::ok(
        "Transactions retrieved successfully",
        TransactionListData {
            transactions: page.transactions,
            pagination: page.pagination,
        },
    )))
}

pub async fn transaction_stats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    params: Result<Query<StatsQuery>, QueryRejection>,
) -> ApiResult<StatsData> {
    let params = query(params)?;
    let report = state
        .service
        .stats(&user.user_id, &params)
        .await
        .map_err(ApiError::during("stats", &user))?;

    Ok(Json(ApiResponse::ok(
        "Transaction stats retrieved successfully",
        StatsData {
            groups: report.groups,
            summary: report.summary,
        },
    )))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<TransactionData> {
    let transaction = state
        .service
        .get_by_id(&user.user_id, &id)
        .await
        .map_err(ApiError::during("get", &user))?;

    Ok(Json(ApiResponse::ok("Transaction retrieved successfully", TransactionData { transaction })))
}

pub async fn update_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<TransactionPayload>, JsonRejection>,
) -> ApiResult<TransactionData> {
    let payload = body(payload)?;
    let transaction = state
        .service
        .update(&user.user_id, &id, &payload)
        .await
        .map_err(ApiError::during("update", &user))?;

    Ok(Json(ApiResponse::ok("Transaction updated successfully", TransactionData { transaction })))
}

pub async fn delete_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<DeletedData> {
    let id = state
        .service
        .delete(&user.user_id, &id)
        .await
        .map_err(ApiError::during("delete", &user))?;

    Ok(Json(ApiResponse::ok("Transaction deleted successfully", DeletedData { id: id.to_string() })))
}
