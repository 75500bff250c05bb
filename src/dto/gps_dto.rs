//! DTOs de ingestión GPS
//!
//! Payload que envían los dispositivos/simuladores y la respuesta del
//! pipeline de geofencing.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Muestra GPS entrante. El vehículo se identifica por `vehicle_id` o
/// por `device_id` (los dispositivos embebidos solo conocen su device).
#[derive(Debug, Clone, Deserialize)]
pub struct GpsSampleRequest {
    pub vehicle_id: Option<Uuid>,
    pub device_id: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_gate_crossing: bool,
}

/// Acción resultante de procesar una muestra GPS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ZoneAction {
    #[serde(rename = "ENTERED")]
    Entered,
    #[serde(rename = "CONTINUED")]
    Continued,
    #[serde(rename = "EXITED")]
    Exited,
    #[serde(rename = "GATE_CROSSED")]
    GateCrossed,
    #[serde(rename = "NONE")]
    None,
}

/// Resumen de liquidación expuesto a los colaboradores de pago/notificación
#[derive(Debug, Clone, Serialize)]
pub struct SettlementSummary {
    pub amount_charged: Decimal,
    pub pending_balance: Decimal,
    pub wallet_balance_after: Decimal,
    pub transaction_ids: Vec<Uuid>,
}

/// Respuesta de la ingestión GPS
#[derive(Debug, Serialize)]
pub struct GpsSampleResponse {
    pub zone_action: ZoneAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journey_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement: Option<SettlementSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_action_serializes_screaming_case() {
        assert_eq!(serde_json::to_string(&ZoneAction::GateCrossed).unwrap(), "\"GATE_CROSSED\"");
        assert_eq!(serde_json::to_string(&ZoneAction::Entered).unwrap(), "\"ENTERED\"");
    }

    #[test]
    fn test_gps_request_gate_flag_defaults_false() {
        let req: GpsSampleRequest = serde_json::from_str(
            r#"{"device_id":"ESP32_001","latitude":10.975,"longitude":76.9,"timestamp":"2025-10-10T10:30:00Z"}"#,
        )
        .unwrap();
        assert!(!req.is_gate_crossing);
        assert_eq!(req.device_id.as_deref(), Some("ESP32_001"));
        assert!(req.vehicle_id.is_none());
    }
}
