//! DTOs de configuración de zonas y tarifas

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::zone::{TollRoad, TollZone};
use crate::utils::geo::GeoPoint;

/// Request para crear una zona con su vía y tarifas.
/// El anillo debe venir cerrado; se valida con `InvalidPolygon` al crear,
/// nunca en tiempo de query.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateZoneRequest {
    #[validate(length(min = 3, max = 100))]
    pub name: String,

    pub boundary: Vec<GeoPoint>,

    #[validate(length(min = 3, max = 100))]
    pub road_name: String,

    pub rate_per_km: Decimal,

    pub minimum_fare: Option<Decimal>,

    /// Overrides de tarifa por tipo de vehículo (car/bike/bus/truck)
    pub vehicle_type_rates: Option<HashMap<String, Decimal>>,
}

/// Response de zona
#[derive(Debug, Serialize)]
pub struct ZoneResponse {
    pub id: Uuid,
    pub name: String,
    pub boundary: Vec<GeoPoint>,
    pub zone_status: String,
    pub road_id: Uuid,
    pub road_name: String,
    pub rate_per_km: Decimal,
    pub minimum_fare: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl ZoneResponse {
    pub fn from_parts(zone: TollZone, road: TollRoad) -> Self {
        Self {
            id: zone.id,
            name: zone.name,
            boundary: zone.boundary.0,
            zone_status: zone.zone_status,
            road_id: road.id,
            road_name: road.name,
            rate_per_km: road.rate_per_km,
            minimum_fare: road.minimum_fare,
            created_at: zone.created_at,
        }
    }
}
