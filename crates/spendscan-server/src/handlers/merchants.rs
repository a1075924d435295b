//! Merchant aggregate handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::{AppError, AppState};
use spendscan_core::models::MerchantAggregate;
use spendscan_core::Aggregator;

/// GET /api/merchants - List all merchant aggregates
pub async fn list_merchants(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MerchantAggregate>>, AppError> {
    let merchants = state.db.list_merchants()?;
    Ok(Json(merchants))
}

/// GET /api/merchants/:id - Get one merchant aggregate
pub async fn get_merchant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<MerchantAggregate>, AppError> {
    let merchant = state
        .db
        .get_merchant(id)?
        .ok_or_else(|| AppError::not_found("Merchant not found"))?;
    Ok(Json(merchant))
}

#[derive(Debug, Deserialize)]
pub struct SetCategoryRequest {
    pub category: String,
}

/// POST /api/merchants/:id - Override a merchant's category
pub async fn set_merchant_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<SetCategoryRequest>,
) -> Result<Json<MerchantAggregate>, AppError> {
    let updated = Aggregator::new(&state.db, &state.categories)
        .set_category(id, &req.category)
        .map_err(AppError::from_core)?;
    Ok(Json(updated))
}

/// POST /api/merchants/:id/reset - Drop the override and use the default mapping
pub async fn reset_merchant_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<MerchantAggregate>, AppError> {
    let updated = Aggregator::new(&state.db, &state.categories)
        .reset_category(id)
        .map_err(AppError::from_core)?;
    Ok(Json(updated))
}
