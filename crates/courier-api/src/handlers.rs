//! HTTP handlers.

use axum::extract::{Path, State};
use axum::Json;
use tracing::info;
use uuid::Uuid;

use courier_core::model::JobResult;

use crate::dto::{ApiResponse, DistributeResponse, HealthResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/health
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// POST /api/distribute/{id}
///
/// Runs one distribution pass over the uploaded job result. The id is an
/// opaque caller-supplied identifier echoed back on success.
pub async fn distribute(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(job): Json<JobResult>,
) -> Result<Json<ApiResponse<DistributeResponse>>, ApiError> {
    info!("Received job result upload '{id}'");
    let cancel = state.shutdown.child_token();
    let mut jobs = vec![job];
    let output = state.distributor.run(&mut jobs, &cancel).await?;
    info!("Upload '{id}' was distributed ({} bytes of results)", output.len());
    Ok(Json(ApiResponse::ok(DistributeResponse { id })))
}
