use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::controllers::zone_controller::ZoneController;
use crate::dto::common::ApiResponse;
use crate::dto::zone_dto::{CreateZoneRequest, ZoneResponse};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_zone_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_zone))
        .route("/", get(list_zones))
}

async fn create_zone(
    State(state): State<AppState>,
    Json(request): Json<CreateZoneRequest>,
) -> Result<Json<ApiResponse<ZoneResponse>>, AppError> {
    let controller = ZoneController::new(state.pool.clone());
    let response = controller.create(request).await?;
    Ok(Json(response))
}

async fn list_zones(
    State(state): State<AppState>,
) -> Result<Json<Vec<ZoneResponse>>, AppError> {
    let controller = ZoneController::new(state.pool.clone());
    let response = controller.list().await?;
    Ok(Json(response))
}
