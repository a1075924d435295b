//! Transaction handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppError, AppState, MAX_PAGE_LIMIT};
use spendscan_core::db::TransactionInsertResult;
use spendscan_core::models::{NewTransaction, Transaction};
use spendscan_core::normalize::{normalize_merchant, parse_amount, parse_manual_date};
use spendscan_core::Aggregator;

/// Query parameters for listing transactions
#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

#[derive(Serialize)]
pub struct TransactionResponse {
    pub transactions: Vec<Transaction>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// GET /api/transactions - List transactions, newest first
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TransactionQuery>,
) -> Result<Json<TransactionResponse>, AppError> {
    // Input validation: clamp pagination parameters
    let limit = params.limit.clamp(1, MAX_PAGE_LIMIT);
    let offset = params.offset.max(0);

    let transactions = state.db.list_transactions(limit, offset)?;
    let total = state.db.count_transactions()?;

    Ok(Json(TransactionResponse {
        transactions,
        total,
        limit,
        offset,
    }))
}

/// Request body for a manually entered transaction
///
/// `date` accepts `YYYY-MM-DD` or the statement's `DD/MM/YY`; `amount` accepts
/// the same text forms as statement exports (thousands separators allowed).
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub date: String,
    pub merchant: String,
    pub amount: String,
}

#[derive(Serialize)]
pub struct CreatedTransaction {
    pub id: i64,
    #[serde(flatten)]
    pub record: NewTransaction,
}

/// POST /api/transactions - Add a transaction by hand
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<CreatedTransaction>), AppError> {
    let merchant = normalize_merchant(&req.merchant);
    if merchant.is_empty() {
        return Err(AppError::bad_request("Merchant is required"));
    }
    let date = parse_manual_date(&req.date).map_err(|e| AppError::bad_request(&e.to_string()))?;
    let amount = parse_amount(&req.amount).map_err(|e| AppError::bad_request(&e.to_string()))?;

    let record = NewTransaction {
        date,
        merchant,
        amount,
    };

    let id = match state.db.insert_transaction(&record)? {
        TransactionInsertResult::Inserted(id) => id,
        TransactionInsertResult::Duplicate(_) => {
            return Err(AppError::conflict(
                "A transaction with this date, merchant and amount already exists",
            ));
        }
    };

    Aggregator::new(&state.db, &state.categories).recompute()?;
    info!(id, merchant = %record.merchant, "Added manual transaction");

    Ok((StatusCode::CREATED, Json(CreatedTransaction { id, record })))
}
