//! Modelo de WalletAccount
//!
//! Balance 1:1 con el usuario. Se muta únicamente a través de las
//! operaciones deduct/credit del ledger, nunca por asignación directa,
//! para preservar el rastro de auditoría append-only.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// WalletAccount - mapea a la tabla `wallets`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WalletAccount {
    pub id: Uuid,
    pub user_id: Uuid,
    pub balance: Decimal,
    pub updated_at: DateTime<Utc>,
}
