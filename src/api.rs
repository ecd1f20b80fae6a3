// 🌐 HTTP API - thin transport over the report operations
// Every handler runs its store work on the blocking pool; the store is synchronous.

use crate::db::SaleRecord;
use crate::distribution::{category_distribution, CategoryCount};
use crate::error::{ReportError, ReportResult};
use crate::histogram::{price_histogram, BucketCount};
use crate::listing::{all_records, list_records, ListParams};
use crate::pagination::Paginated;
use crate::statistics::{monthly_statistics, MonthlyStatistics};
use crate::store::RecordStore;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn RecordStore>,
}

impl AppState {
    pub fn new<S: RecordStore + 'static>(store: S) -> Self {
        AppState {
            store: Arc::new(store),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    Report(ReportError),
    Join(tokio::task::JoinError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Report(ReportError::Validation(e)) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Report(ReportError::Store(e)) => {
                tracing::error!(error = %e, "store query failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::Join(e) => {
                tracing::error!(error = %e, "report task did not complete");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Run a report operation against the store off the async runtime
async fn run_report<T, F>(state: &AppState, op: F) -> Result<Json<T>, ApiError>
where
    F: FnOnce(&dyn RecordStore) -> ReportResult<T> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(&state.store);

    tokio::task::spawn_blocking(move || op(store.as_ref()))
        .await
        .map_err(ApiError::Join)?
        .map(Json)
        .map_err(ApiError::Report)
}

// ============================================================================
// Query parameters (all optional strings; the core validates)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    month: Option<String>,
    search: Option<String>,
    page: Option<String>,
    #[serde(rename = "perPage")]
    per_page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    month: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MonthYearQuery {
    month: Option<String>,
    year: Option<String>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json("OK")
}

/// GET /api/transactions - Paginated search
async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<SaleRecord>>, ApiError> {
    run_report(&state, move |store| {
        let params = ListParams {
            month: query.month.as_deref(),
            search: query.search.as_deref(),
            page: query.page.as_deref(),
            per_page: query.per_page.as_deref(),
        };
        list_records(store, &params)
    })
    .await
}

/// GET /api/transactions/all - Every record, unfiltered
async fn get_all_transactions(
    State(state): State<AppState>,
) -> Result<Json<Vec<SaleRecord>>, ApiError> {
    run_report(&state, |store| all_records(store)).await
}

/// GET /api/statistics?month=YYYY-MM
async fn get_statistics(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthlyStatistics>, ApiError> {
    run_report(&state, move |store| {
        monthly_statistics(store, query.month.as_deref())
    })
    .await
}

/// GET /api/bar-chart/monthly?month=M&year=YYYY
async fn get_bar_chart(
    State(state): State<AppState>,
    Query(query): Query<MonthYearQuery>,
) -> Result<Json<Vec<BucketCount>>, ApiError> {
    run_report(&state, move |store| {
        price_histogram(store, query.month.as_deref(), query.year.as_deref())
    })
    .await
}

/// GET /api/pie-chart?month=M
async fn get_pie_chart(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Vec<CategoryCount>>, ApiError> {
    run_report(&state, move |store| {
        category_distribution(store, query.month.as_deref())
    })
    .await
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/transactions", get(list_transactions))
        .route("/transactions/all", get(get_all_transactions))
        .route("/statistics", get(get_statistics))
        .route("/bar-chart/monthly", get(get_bar_chart))
        .route("/pie-chart", get(get_pie_chart))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
