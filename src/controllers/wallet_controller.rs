//! Controller de wallet
//!
//! Balance, recargas, historial de transacciones y resumen de peajes
//! pendientes del usuario autenticado.

use chrono::Utc;
use uuid::Uuid;

use crate::dto::common::ApiResponse;
use crate::dto::wallet_dto::{
    BalanceResponse, PendingTollSummaryResponse, RechargeRequest, RechargeResponse,
    TransactionHistoryQuery, TransactionResponse,
};
use crate::services::wallet_ledger::WalletLedger;
use crate::state::AppState;
use crate::utils::errors::AppError;

const DEFAULT_HISTORY_LIMIT: i64 = 50;
const MAX_HISTORY_LIMIT: i64 = 200;

pub struct WalletController {
    ledger: WalletLedger,
    state: AppState,
}

impl WalletController {
    pub fn new(state: AppState) -> Self {
        Self {
            ledger: WalletLedger::new(state.pool.clone(), &state.config),
            state,
        }
    }

    pub async fn get_balance(&self, user_id: Uuid) -> Result<BalanceResponse, AppError> {
        let wallet = crate::repositories::wallet_repository::WalletRepository::new(
            self.state.pool.clone(),
        )
        .find_by_user(user_id)
        .await?;

        let (balance, last_updated) = match wallet {
            Some(w) => (w.balance, w.updated_at),
            None => (rust_decimal::Decimal::ZERO, Utc::now()),
        };

        Ok(BalanceResponse {
            balance,
            balance_formatted: format!("₹{}", balance),
            last_updated,
            user_id,
        })
    }

    pub async fn recharge(
        &self,
        user_id: Uuid,
        request: RechargeRequest,
    ) -> Result<ApiResponse<RechargeResponse>, AppError> {
        let (new_balance, tx) = self
            .ledger
            .recharge(user_id, request.amount, request.description)
            .await?;

        Ok(ApiResponse::success_with_message(
            RechargeResponse {
                transaction_id: tx.id,
                amount: tx.amount,
                new_balance,
            },
            "Recarga aplicada exitosamente".to_string(),
        ))
    }

    pub async fn history(
        &self,
        user_id: Uuid,
        query: TransactionHistoryQuery,
    ) -> Result<Vec<TransactionResponse>, AppError> {
        let limit = query
            .limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);
        let offset = query.offset.unwrap_or(0).max(0);

        let txs = self.ledger.history(user_id, limit, offset).await?;
        Ok(txs.into_iter().map(TransactionResponse::from).collect())
    }

    pub async fn pending_summary(
        &self,
        user_id: Uuid,
    ) -> Result<PendingTollSummaryResponse, AppError> {
        let overview = self.ledger.pending_overview(user_id).await?;

        Ok(PendingTollSummaryResponse {
            pending_count: overview.pending_count,
            total_pending_amount: overview.total_pending_amount,
            current_wallet_balance: overview.current_wallet_balance,
            can_process_all: overview.can_process_all,
        })
    }
}
