//! HTTP handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use billtrack_shared::{BilltrackError, Record};

use crate::AppState;

/// Body returned when the listing itself could not be scraped.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    error: &'static str,
}

/// A fatal pipeline failure, rendered as HTTP 500.
#[derive(Debug)]
pub struct ApiError(BilltrackError);

impl From<BilltrackError> for ApiError {
    fn from(err: BilltrackError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "failed to scrape bills");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody {
                error: "Failed to fetch bills",
            }),
        )
            .into_response()
    }
}

/// `GET /api/bills`: run the full scrape and return every record.
///
/// Partial detail failures still return 200; only a listing failure is an error.
pub async fn bills_handler(State(state): State<AppState>) -> Result<Json<Vec<Record>>, ApiError> {
    let records = state.service.list_bills().await?;
    Ok(Json(records))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// `GET /health`: liveness only; never touches upstream.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
