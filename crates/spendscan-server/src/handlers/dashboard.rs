//! Dashboard and chart handlers

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{AppError, AppState};
use spendscan_core::models::{MerchantAggregate, Transaction};
use spendscan_core::Aggregator;

/// Transactions shown on the dashboard
const RECENT_TRANSACTIONS: i64 = 50;

#[derive(Serialize)]
pub struct DashboardResponse {
    pub recent_transactions: Vec<Transaction>,
    pub total_transactions: i64,
    pub merchants: Vec<MerchantAggregate>,
    pub category_totals: BTreeMap<String, Decimal>,
    pub categories: Vec<String>,
}

/// GET /api/dashboard - Everything the dashboard page renders
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardResponse>, AppError> {
    let recent_transactions = state.db.list_transactions(RECENT_TRANSACTIONS, 0)?;
    let total_transactions = state.db.count_transactions()?;
    let merchants = state.db.list_merchants()?;
    let category_totals = Aggregator::new(&state.db, &state.categories).totals_by_category()?;

    Ok(Json(DashboardResponse {
        recent_transactions,
        total_transactions,
        merchants,
        category_totals,
        categories: state.categories.categories().to_vec(),
    }))
}

/// GET /api/pie_data - Spend per category
pub async fn get_pie_data(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BTreeMap<String, Decimal>>, AppError> {
    let totals = Aggregator::new(&state.db, &state.categories).totals_by_category()?;
    Ok(Json(totals))
}

/// GET /api/categories - Configured category labels
pub async fn list_categories(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.categories.categories().to_vec())
}
