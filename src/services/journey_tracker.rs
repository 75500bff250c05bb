//! Máquina de estados de journeys
//!
//! Procesa cada muestra GPS bajo el lock del vehículo: detecta entrada,
//! avance, salida y cruces de pórtico, acumula distancia con haversine
//! y dispara la liquidación cuando corresponde. Las transiciones son:
//!
//!   sin journey + fuera de zona  → NONE
//!   sin journey + dentro de zona → ENTERED (se crea el journey)
//!   journey activo + dentro      → CONTINUED (aunque cambie la zona)
//!   journey activo + fuera       → EXITED (peaje diferido, sin wallet)
//!   flag de pórtico              → liquidación inmediata (GATE_CROSSED;
//!                                  si la muestra además entra o sale de
//!                                  la zona, la acción refleja eso)
//!
//! Una muestra más vieja que la última procesada se rechaza con 409;
//! una muestra duplicada o tardía sobre un journey ya cerrado es un
//! no-op (idempotencia).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::dto::gps_dto::{GpsSampleResponse, SettlementSummary, ZoneAction};
use crate::models::journey::Journey;
use crate::models::notification::{
    NOTIFICATION_INSUFFICIENT_BALANCE, NOTIFICATION_TOLL_PROCESSED, NOTIFICATION_ZONE_ENTRY,
    NOTIFICATION_ZONE_EXIT_PENDING,
};
use crate::models::vehicle::Vehicle;
use crate::models::zone::{RateTable, ZoneMatch};
use crate::repositories::journey_repository::JourneyRepository;
use crate::repositories::notification_repository::NotificationRepository;
use crate::repositories::zone_repository::ZoneRepository;
use crate::services::fare::compute_fare;
use crate::services::geofencing::{primary_zone, DbZoneLookup, ZoneLookup};
use crate::services::settlement::{SettlementEngine, SettlementOutcome};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::geo::{clamp_distance_delta, haversine_km, GeoPoint};

/// Orden de una muestra respecto de la última procesada del journey
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOrder {
    InOrder,
    Duplicate,
    OutOfOrder,
}

/// Comparar el timestamp de la muestra con el último procesado.
/// Igualdad exacta se trata como duplicado (reintento del dispositivo),
/// no como violación de orden.
pub fn check_sample_order(last: DateTime<Utc>, sample: DateTime<Utc>) -> SampleOrder {
    if sample > last {
        SampleOrder::InOrder
    } else if sample == last {
        SampleOrder::Duplicate
    } else {
        SampleOrder::OutOfOrder
    }
}

/// Respuesta para una muestra que ya no tiene efecto (duplicada o
/// llegada después del cierre del journey): sin acción, sin transacción
/// y sin liquidación
fn stale_sample_response(journey_id: Option<Uuid>) -> GpsSampleResponse {
    GpsSampleResponse {
        zone_action: ZoneAction::None,
        journey_id,
        transaction_id: None,
        zone_name: None,
        settlement: None,
    }
}

/// Un pórtico sin journey activo solo liquida si la muestra es más
/// nueva que la última persistida del vehículo: el reenvío del pórtico
/// que cerró el journey no debe volver a tocar el wallet.
fn is_replayed_gate_sample(
    last_processed: Option<DateTime<Utc>>,
    sample: DateTime<Utc>,
) -> bool {
    match last_processed {
        Some(last) => check_sample_order(last, sample) != SampleOrder::InOrder,
        None => false,
    }
}

/// Clave de idempotencia del cobro que dispara una muestra de pórtico:
/// un reintento de la misma muestra reusa la clave y el motor de
/// liquidación no vuelve a deducir
fn gate_settlement_key(scope: Uuid, timestamp: DateTime<Utc>) -> String {
    format!("gate:{}:{}", scope, timestamp.timestamp_millis())
}

/// Resolver el resultado del cierre de un journey. `None` significa que
/// ya estaba cerrado: la muestra tardía se responde como no-op, sin
/// transacción ni liquidación.
fn exit_outcome(
    journey_id: Uuid,
    closed: Option<Journey>,
) -> Result<Journey, GpsSampleResponse> {
    closed.ok_or_else(|| stale_sample_response(Some(journey_id)))
}

pub struct JourneyTracker {
    state: AppState,
    zone_lookup: Box<dyn ZoneLookup>,
}

impl JourneyTracker {
    pub fn new(state: AppState) -> Self {
        let zone_lookup = Box::new(DbZoneLookup::new(state.pool.clone()));
        Self { state, zone_lookup }
    }

    /// Procesar una muestra GPS de un vehículo ya resuelto.
    ///
    /// Las muestras de un mismo vehículo se serializan con su lock; las
    /// de vehículos distintos avanzan en paralelo sin contención.
    pub async fn process_sample(
        &self,
        vehicle: &Vehicle,
        point: GeoPoint,
        timestamp: DateTime<Utc>,
        is_gate_crossing: bool,
    ) -> Result<GpsSampleResponse, AppError> {
        let lock = self.state.lock_for_vehicle(vehicle.id).await;
        let _guard = lock.lock().await;

        // Un backend espacial caído aborta la muestra con 502; el
        // dispositivo la reintenta y nada se cobra de menos
        let zone = primary_zone(self.zone_lookup.as_ref(), point).await?;

        let journeys = JourneyRepository::new(self.state.pool.clone());
        let journey = journeys.active_by_vehicle(vehicle.id).await?;

        if let Some(ref j) = journey {
            match check_sample_order(j.last_sample_time, timestamp) {
                SampleOrder::OutOfOrder => {
                    return Err(AppError::OutOfOrderSample(format!(
                        "sample at {} is older than last processed {} for vehicle '{}'",
                        timestamp, j.last_sample_time, vehicle.id
                    )));
                }
                SampleOrder::Duplicate => {
                    return Ok(stale_sample_response(Some(j.id)));
                }
                SampleOrder::InOrder => {}
            }
        }

        // Sin journey activo no hay timestamp de referencia en memoria:
        // un pórtico reenviado después del cierre se deduplica contra la
        // última muestra persistida del vehículo
        if is_gate_crossing && journey.is_none() {
            let last = journeys.last_sample_time(vehicle.id).await?;
            if is_replayed_gate_sample(last, timestamp) {
                return Ok(stale_sample_response(None));
            }
        }

        if is_gate_crossing {
            return self.handle_gate(vehicle, journey, zone, point, timestamp).await;
        }

        match (journey, zone) {
            (None, None) => Ok(GpsSampleResponse {
                zone_action: ZoneAction::None,
                journey_id: None,
                transaction_id: None,
                zone_name: None,
                settlement: None,
            }),
            (None, Some(zone)) => self.handle_entry(vehicle, &zone, point, timestamp).await,
            (Some(journey), Some(_)) => self.handle_progress(&journey, point, timestamp).await,
            (Some(journey), None) => self.handle_exit(vehicle, journey, point, timestamp).await,
        }
    }

    async fn handle_entry(
        &self,
        vehicle: &Vehicle,
        zone: &ZoneMatch,
        point: GeoPoint,
        timestamp: DateTime<Utc>,
    ) -> Result<GpsSampleResponse, AppError> {
        let journeys = JourneyRepository::new(self.state.pool.clone());
        let journey = journeys
            .create_entry(vehicle.id, zone.zone.id, zone.road.id, point, timestamp)
            .await?;

        info!(
            "🚗 Vehículo {} entró a la zona '{}' (journey {})",
            vehicle.plate_number, zone.zone.name, journey.id
        );

        self.notify(
            vehicle.user_id,
            NOTIFICATION_ZONE_ENTRY,
            "Toll zone entered".to_string(),
            format!("Vehicle {} entered toll zone '{}'", vehicle.plate_number, zone.zone.name),
            Some(serde_json::json!({ "journey_id": journey.id, "zone_id": zone.zone.id })),
        )
        .await;

        Ok(GpsSampleResponse {
            zone_action: ZoneAction::Entered,
            journey_id: Some(journey.id),
            transaction_id: None,
            zone_name: Some(zone.zone.name.clone()),
            settlement: None,
        })
    }

    /// Avance dentro de la zona. Un cambio de zona sin salir al medio
    /// también es avance: el journey original sigue acumulando.
    async fn handle_progress(
        &self,
        journey: &Journey,
        point: GeoPoint,
        timestamp: DateTime<Utc>,
    ) -> Result<GpsSampleResponse, AppError> {
        let delta = clamp_distance_delta(haversine_km(journey.last_point(), point));
        let journeys = JourneyRepository::new(self.state.pool.clone());
        let updated = journeys
            .update_progress(
                journey.id,
                point,
                timestamp,
                journey.total_distance_km + delta,
                journey.unbilled_distance_km + delta,
            )
            .await?;

        Ok(GpsSampleResponse {
            zone_action: ZoneAction::Continued,
            journey_id: Some(updated.id),
            transaction_id: None,
            zone_name: None,
            settlement: None,
        })
    }

    /// Salida de zona sin pórtico: el tramo no facturado queda como
    /// peaje pendiente y el wallet no se toca.
    async fn handle_exit(
        &self,
        vehicle: &Vehicle,
        journey: Journey,
        point: GeoPoint,
        timestamp: DateTime<Utc>,
    ) -> Result<GpsSampleResponse, AppError> {
        let delta = clamp_distance_delta(haversine_km(journey.last_point(), point));
        let total = journey.total_distance_km + delta;
        let unbilled = journey.unbilled_distance_km + delta;

        let journeys = JourneyRepository::new(self.state.pool.clone());
        let finalized = journeys.finalize_exit(journey.id, point, timestamp, total).await?;
        let closed = match exit_outcome(journey.id, finalized) {
            Ok(closed) => closed,
            // Otro worker ya cerró el journey: muestra tardía, no-op
            Err(response) => return Ok(response),
        };

        let rates = self.rates_for_road(journey.toll_road_id).await?;
        let leg_cost = compute_fare(unbilled, vehicle.parsed_type(), &rates);

        let mut transaction_id = None;
        if leg_cost > Decimal::ZERO {
            let engine = SettlementEngine::new(self.state.pool.clone(), &self.state.config);
            let tx = engine
                .defer_leg(
                    vehicle.user_id,
                    Some(closed.id),
                    leg_cost,
                    &format!("Toll for {:.2} km (zone exit)", unbilled),
                )
                .await?;
            transaction_id = Some(tx.id);

            self.notify(
                vehicle.user_id,
                NOTIFICATION_ZONE_EXIT_PENDING,
                "Toll pending".to_string(),
                format!(
                    "Vehicle {} left the toll zone. ₹{} will be collected at the next toll gate",
                    vehicle.plate_number, leg_cost
                ),
                Some(serde_json::json!({ "journey_id": closed.id, "amount": leg_cost })),
            )
            .await;
        }

        info!(
            "🏁 Vehículo {} salió de zona: {:.2} km recorridos, peaje diferido {}",
            vehicle.plate_number, total, leg_cost
        );

        Ok(GpsSampleResponse {
            zone_action: ZoneAction::Exited,
            journey_id: Some(closed.id),
            transaction_id,
            zone_name: None,
            settlement: None,
        })
    }

    /// Cruce de pórtico: liquidación inmediata del tramo no facturado
    /// más todos los pendientes. Si además la muestra cae fuera de la
    /// zona, el journey se cierra después de liquidar, con tramo ya en 0.
    async fn handle_gate(
        &self,
        vehicle: &Vehicle,
        journey: Option<Journey>,
        zone: Option<ZoneMatch>,
        point: GeoPoint,
        timestamp: DateTime<Utc>,
    ) -> Result<GpsSampleResponse, AppError> {
        let engine = SettlementEngine::new(self.state.pool.clone(), &self.state.config);
        let journeys = JourneyRepository::new(self.state.pool.clone());

        let Some(journey) = journey else {
            // Pórtico sin journey activo: tramo cero, solo se intenta
            // saldar la deuda pendiente acumulada. Si la muestra además
            // cae dentro de una zona, la entrada ocurre igual.
            let outcome = engine
                .settle_at_gate(
                    vehicle.user_id,
                    None,
                    Decimal::ZERO,
                    "Pending toll settlement at gate",
                    &gate_settlement_key(vehicle.id, timestamp),
                )
                .await?;
            self.notify_settlement(vehicle, &outcome).await;

            if let Some(zone) = zone {
                let mut response = self.handle_entry(vehicle, &zone, point, timestamp).await?;
                response.transaction_id = outcome.transaction_ids.first().copied();
                response.settlement = Some(summary(&outcome));
                return Ok(response);
            }

            return Ok(GpsSampleResponse {
                zone_action: ZoneAction::GateCrossed,
                journey_id: None,
                transaction_id: outcome.transaction_ids.first().copied(),
                zone_name: None,
                settlement: Some(summary(&outcome)),
            });
        };

        let delta = clamp_distance_delta(haversine_km(journey.last_point(), point));
        let total = journey.total_distance_km + delta;
        let unbilled = journey.unbilled_distance_km + delta;

        let rates = self.rates_for_road(journey.toll_road_id).await?;
        let leg_cost = compute_fare(unbilled, vehicle.parsed_type(), &rates);

        let outcome = engine
            .settle_at_gate(
                vehicle.user_id,
                Some(journey.id),
                leg_cost,
                &format!("Toll for {:.2} km (gate crossing)", unbilled),
                &gate_settlement_key(journey.id, timestamp),
            )
            .await?;
        self.notify_settlement(vehicle, &outcome).await;

        // El tramo quedó facturado (cobrado o diferido): el acumulador
        // no facturado vuelve a cero en ambos casos. Si la muestra cayó
        // fuera de la zona, el pórtico liquida primero y el journey se
        // cierra después, ya sin tramo por facturar.
        let (zone_action, journey_id) = match zone {
            Some(_) => {
                let updated =
                    journeys.update_progress(journey.id, point, timestamp, total, 0.0).await?;
                (ZoneAction::GateCrossed, updated.id)
            }
            None => {
                let id = match journeys.finalize_exit(journey.id, point, timestamp, total).await? {
                    Some(closed) => closed.id,
                    None => journey.id,
                };
                (ZoneAction::Exited, id)
            }
        };

        info!(
            "🛂 Pórtico cruzado por {}: tramo {:.2} km, cobrado {} (degradado: {})",
            vehicle.plate_number, unbilled, outcome.amount_charged, outcome.degraded
        );

        Ok(GpsSampleResponse {
            zone_action,
            journey_id: Some(journey_id),
            transaction_id: outcome.transaction_ids.last().copied(),
            zone_name: zone.map(|z| z.zone.name),
            settlement: Some(summary(&outcome)),
        })
    }

    async fn rates_for_road(&self, toll_road_id: Uuid) -> Result<RateTable, AppError> {
        ZoneRepository::new(self.state.pool.clone())
            .rate_table_for_road(toll_road_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!("toll road '{}' vanished mid-journey", toll_road_id))
            })
    }

    async fn notify_settlement(&self, vehicle: &Vehicle, outcome: &SettlementOutcome) {
        if outcome.amount_charged > Decimal::ZERO {
            self.notify(
                vehicle.user_id,
                NOTIFICATION_TOLL_PROCESSED,
                "Toll charged".to_string(),
                format!(
                    "₹{} charged at toll gate. Wallet balance: ₹{}",
                    outcome.amount_charged, outcome.wallet_balance_after
                ),
                Some(serde_json::json!({ "amount": outcome.amount_charged })),
            )
            .await;
        }
        if outcome.pending_balance_after > Decimal::ZERO {
            self.notify(
                vehicle.user_id,
                NOTIFICATION_INSUFFICIENT_BALANCE,
                "Insufficient balance".to_string(),
                format!(
                    "₹{} pending. Recharge your wallet to clear it at the next gate",
                    outcome.pending_balance_after
                ),
                Some(serde_json::json!({ "pending": outcome.pending_balance_after })),
            )
            .await;
        }
    }

    /// Las notificaciones son best effort: un fallo se loguea y no
    /// interrumpe el pipeline
    async fn notify(
        &self,
        user_id: Uuid,
        kind: &str,
        title: String,
        message: String,
        data: Option<serde_json::Value>,
    ) {
        let repo = NotificationRepository::new(self.state.pool.clone());
        if let Err(e) = repo.create(user_id, kind, title, message, data).await {
            warn!("⚠️ No se pudo crear la notificación '{}': {}", kind, e);
        }
    }
}

fn summary(outcome: &SettlementOutcome) -> SettlementSummary {
    SettlementSummary {
        amount_charged: outcome.amount_charged,
        pending_balance: outcome.pending_balance_after,
        wallet_balance_after: outcome.wallet_balance_after,
        transaction_ids: outcome.transaction_ids.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::journey::JOURNEY_STATUS_EXITED;
    use chrono::Duration;

    fn closed_journey() -> Journey {
        let now = Utc::now();
        Journey {
            id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            zone_id: Uuid::new_v4(),
            toll_road_id: Uuid::new_v4(),
            entry_lat: 10.975,
            entry_lon: 76.9,
            entry_time: now - Duration::minutes(30),
            last_lat: 10.98,
            last_lon: 76.91,
            last_sample_time: now,
            exit_lat: Some(10.98),
            exit_lon: Some(76.91),
            exit_time: Some(now),
            total_distance_km: 15.25,
            unbilled_distance_km: 0.0,
            journey_status: JOURNEY_STATUS_EXITED.to_string(),
            created_at: now - Duration::minutes(30),
        }
    }

    #[test]
    fn test_sample_order_detection() {
        let last = Utc::now();
        assert_eq!(check_sample_order(last, last + Duration::seconds(5)), SampleOrder::InOrder);
        assert_eq!(check_sample_order(last, last), SampleOrder::Duplicate);
        assert_eq!(
            check_sample_order(last, last - Duration::seconds(5)),
            SampleOrder::OutOfOrder
        );
    }

    #[test]
    fn test_exit_replayed_after_close_is_noop_without_charge() {
        // El cierre ya lo hizo otra muestra: la tardía responde NONE y
        // no produce transacción ni liquidación
        let id = Uuid::new_v4();
        let response = exit_outcome(id, None).unwrap_err();
        assert_eq!(response.zone_action, ZoneAction::None);
        assert_eq!(response.journey_id, Some(id));
        assert!(response.transaction_id.is_none());
        assert!(response.settlement.is_none());
    }

    #[test]
    fn test_exit_with_fresh_close_proceeds_to_billing() {
        let journey = closed_journey();
        let closed = exit_outcome(journey.id, Some(journey.clone()));
        assert_eq!(closed.unwrap().id, journey.id);
    }

    #[test]
    fn test_gate_replay_detection_without_active_journey() {
        let last = Utc::now();
        // Sin historial no hay nada que deduplicar
        assert!(!is_replayed_gate_sample(None, last));
        // Muestra más nueva que la última persistida: liquidar normal
        assert!(!is_replayed_gate_sample(Some(last), last + Duration::seconds(5)));
        // Reenvío exacto del pórtico que cerró el journey
        assert!(is_replayed_gate_sample(Some(last), last));
        // Muestra más vieja que el cierre
        assert!(is_replayed_gate_sample(Some(last), last - Duration::seconds(5)));
    }

    #[test]
    fn test_gate_settlement_key_is_stable_per_sample() {
        let scope = Uuid::new_v4();
        let ts = Utc::now();
        // El reintento de la misma muestra produce la misma clave
        assert_eq!(gate_settlement_key(scope, ts), gate_settlement_key(scope, ts));
        // Otra muestra u otro journey producen claves distintas
        assert_ne!(
            gate_settlement_key(scope, ts),
            gate_settlement_key(scope, ts + Duration::seconds(1))
        );
        assert_ne!(gate_settlement_key(scope, ts), gate_settlement_key(Uuid::new_v4(), ts));
    }
}
