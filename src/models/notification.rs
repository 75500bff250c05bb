//! Modelo de Notification
//!
//! Notificaciones al usuario por eventos del pipeline (entrada a zona,
//! salida con peaje pendiente, pago procesado, saldo insuficiente).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Notification - mapea a la tabla `notifications`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

pub const NOTIFICATION_ZONE_ENTRY: &str = "zone_entry";
pub const NOTIFICATION_ZONE_EXIT_PENDING: &str = "zone_exit_pending";
pub const NOTIFICATION_TOLL_PROCESSED: &str = "toll_processed";
pub const NOTIFICATION_INSUFFICIENT_BALANCE: &str = "insufficient_balance";
