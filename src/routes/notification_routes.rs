use axum::{extract::State, routing::get, Extension, Json, Router};

use crate::controllers::notification_controller::NotificationController;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::notification::Notification;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_notification_router() -> Router<AppState> {
    Router::new().route("/", get(list_notifications))
}

async fn list_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let controller = NotificationController::new(state.pool.clone());
    let response = controller.list_recent(user.user_id).await?;
    Ok(Json(response))
}
