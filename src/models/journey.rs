//! Modelo de Journey
//!
//! Un journey es el recorrido de un vehículo dentro de una zona de
//! peaje: punto/hora de entrada, último sample procesado (para ordenar
//! muestras y acumular distancia), salida (nullable hasta el exit) y
//! los acumuladores de distancia. Como máximo un journey activo por
//! vehículo.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::geo::GeoPoint;

pub const JOURNEY_STATUS_ACTIVE: &str = "active";
pub const JOURNEY_STATUS_EXITED: &str = "exited";

/// Journey - mapea a la tabla `journeys`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Journey {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub zone_id: Uuid,
    pub toll_road_id: Uuid,
    pub entry_lat: f64,
    pub entry_lon: f64,
    pub entry_time: DateTime<Utc>,
    pub last_lat: f64,
    pub last_lon: f64,
    pub last_sample_time: DateTime<Utc>,
    pub exit_lat: Option<f64>,
    pub exit_lon: Option<f64>,
    pub exit_time: Option<DateTime<Utc>>,
    /// Distancia total acumulada del journey (solo crece)
    pub total_distance_km: f64,
    /// Distancia desde el último punto de liquidación (entrada o gate);
    /// se resetea a 0 en cada cruce de gate
    pub unbilled_distance_km: f64,
    pub journey_status: String,
    pub created_at: DateTime<Utc>,
}

impl Journey {
    pub fn is_active(&self) -> bool {
        self.journey_status == JOURNEY_STATUS_ACTIVE
    }

    pub fn last_point(&self) -> GeoPoint {
        GeoPoint::new(self.last_lat, self.last_lon)
    }
}
