use axum::{
    extract::{Query, State},
    routing::{get, post},
    Extension, Json, Router,
};

use crate::controllers::wallet_controller::WalletController;
use crate::dto::common::ApiResponse;
use crate::dto::wallet_dto::{
    BalanceResponse, PendingTollSummaryResponse, RechargeRequest, RechargeResponse,
    TransactionHistoryQuery, TransactionResponse,
};
use crate::middleware::auth::AuthenticatedUser;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_wallet_router() -> Router<AppState> {
    Router::new()
        .route("/balance", get(get_balance))
        .route("/recharge", post(recharge))
        .route("/transactions", get(transaction_history))
        .route("/pending", get(pending_summary))
}

async fn get_balance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<BalanceResponse>, AppError> {
    let controller = WalletController::new(state);
    let response = controller.get_balance(user.user_id).await?;
    Ok(Json(response))
}

async fn recharge(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<RechargeRequest>,
) -> Result<Json<ApiResponse<RechargeResponse>>, AppError> {
    let controller = WalletController::new(state);
    let response = controller.recharge(user.user_id, request).await?;
    Ok(Json(response))
}

async fn transaction_history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<TransactionHistoryQuery>,
) -> Result<Json<Vec<TransactionResponse>>, AppError> {
    let controller = WalletController::new(state);
    let response = controller.history(user.user_id, query).await?;
    Ok(Json(response))
}

async fn pending_summary(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<PendingTollSummaryResponse>, AppError> {
    let controller = WalletController::new(state);
    let response = controller.pending_summary(user.user_id).await?;
    Ok(Json(response))
}
