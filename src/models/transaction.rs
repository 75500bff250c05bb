//! Modelo de Transaction
//!
//! Registro append-only de movimientos de dinero. El monto es inmutable
//! después de creada; el estado solo transiciona pending→completed o
//! pending→failed, nunca en reversa.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Tipo de transacción
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Toll,
    Recharge,
    Refund,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Toll => "toll",
            TransactionType::Recharge => "recharge",
            TransactionType::Refund => "refund",
        }
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "toll" => Ok(TransactionType::Toll),
            "recharge" => Ok(TransactionType::Recharge),
            "refund" => Ok(TransactionType::Refund),
            other => Err(format!("unknown transaction type '{}'", other)),
        }
    }
}

/// Estado de transacción
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }

    /// Transiciones válidas: pending→completed, pending→failed.
    /// completed y failed son terminales.
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        matches!(
            (self, next),
            (TransactionStatus::Pending, TransactionStatus::Completed)
                | (TransactionStatus::Pending, TransactionStatus::Failed)
        )
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "completed" => Ok(TransactionStatus::Completed),
            "failed" => Ok(TransactionStatus::Failed),
            other => Err(format!("unknown transaction status '{}'", other)),
        }
    }
}

/// Transaction - mapea a la tabla `transactions`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tx_type: String,
    pub amount: Decimal,
    pub tx_status: String,
    pub description: Option<String>,
    pub journey_id: Option<Uuid>,
    /// Clave de idempotencia de la liquidación que registró esta
    /// transacción; solo la llevan los cobros de pórtico
    pub settlement_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn status(&self) -> Option<TransactionStatus> {
        TransactionStatus::from_str(&self.tx_status).ok()
    }

    pub fn is_pending_toll(&self) -> bool {
        self.tx_type == TransactionType::Toll.as_str()
            && self.tx_status == TransactionStatus::Pending.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions_from_pending() {
        assert!(TransactionStatus::Pending.can_transition_to(TransactionStatus::Completed));
        assert!(TransactionStatus::Pending.can_transition_to(TransactionStatus::Failed));
    }

    #[test]
    fn test_terminal_states_have_no_transitions() {
        for terminal in [TransactionStatus::Completed, TransactionStatus::Failed] {
            assert!(!terminal.can_transition_to(TransactionStatus::Pending));
            assert!(!terminal.can_transition_to(TransactionStatus::Completed));
            assert!(!terminal.can_transition_to(TransactionStatus::Failed));
        }
    }

    #[test]
    fn test_type_and_status_roundtrip() {
        for t in [TransactionType::Toll, TransactionType::Recharge, TransactionType::Refund] {
            assert_eq!(TransactionType::from_str(t.as_str()).unwrap(), t);
        }
        for s in [
            TransactionStatus::Pending,
            TransactionStatus::Completed,
            TransactionStatus::Failed,
        ] {
            assert_eq!(TransactionStatus::from_str(s.as_str()).unwrap(), s);
        }
    }
}
