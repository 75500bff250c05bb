use axum::{extract::State, routing::post, Json, Router};

use crate::controllers::gps_controller::GpsController;
use crate::dto::gps_dto::{GpsSampleRequest, GpsSampleResponse};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_gps_router() -> Router<AppState> {
    Router::new().route("/position", post(ingest_position))
}

async fn ingest_position(
    State(state): State<AppState>,
    Json(request): Json<GpsSampleRequest>,
) -> Result<Json<GpsSampleResponse>, AppError> {
    let controller = GpsController::new(state);
    let response = controller.ingest(request).await?;
    Ok(Json(response))
}
