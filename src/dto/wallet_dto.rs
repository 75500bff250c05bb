//! DTOs de wallet y transacciones

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response de balance de wallet
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub balance: Decimal,
    pub balance_formatted: String,
    pub last_updated: DateTime<Utc>,
    pub user_id: Uuid,
}

/// Request de recarga (callback de éxito del gateway de pago)
#[derive(Debug, Deserialize)]
pub struct RechargeRequest {
    pub amount: Decimal,
    pub description: Option<String>,
}

/// Response de recarga
#[derive(Debug, Serialize)]
pub struct RechargeResponse {
    pub transaction_id: Uuid,
    pub amount: Decimal,
    pub new_balance: Decimal,
}

/// Filtros de historial de transacciones
#[derive(Debug, Deserialize)]
pub struct TransactionHistoryQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Transacción individual en el historial
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub tx_type: String,
    pub amount: Decimal,
    pub amount_formatted: String,
    pub tx_status: String,
    pub description: Option<String>,
    pub journey_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<crate::models::transaction::Transaction> for TransactionResponse {
    fn from(tx: crate::models::transaction::Transaction) -> Self {
        Self {
            id: tx.id,
            tx_type: tx.tx_type,
            amount: tx.amount,
            amount_formatted: format!("₹{}", tx.amount),
            tx_status: tx.tx_status,
            description: tx.description,
            journey_id: tx.journey_id,
            created_at: tx.created_at,
        }
    }
}

/// Resumen de peajes pendientes de un usuario
#[derive(Debug, Serialize)]
pub struct PendingTollSummaryResponse {
    pub pending_count: i64,
    pub total_pending_amount: Decimal,
    pub current_wallet_balance: Decimal,
    pub can_process_all: bool,
}
