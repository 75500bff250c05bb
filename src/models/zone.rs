//! Modelos de zona de peaje
//!
//! Una `TollZone` es un polígono geográfico (anillo cerrado de vértices
//! lat/lon) con una `TollRoad` asociada que define la tarifa por km, la
//! tarifa mínima opcional y overrides por tipo de vehículo.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::vehicle::VehicleType;
use crate::utils::geo::GeoPoint;

pub const ZONE_STATUS_ACTIVE: &str = "active";
pub const ZONE_STATUS_INACTIVE: &str = "inactive";

/// Zona de peaje - mapea a la tabla `toll_zones`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TollZone {
    pub id: Uuid,
    pub name: String,
    /// Anillo cerrado: primer vértice == último vértice
    pub boundary: Json<Vec<GeoPoint>>,
    pub zone_status: String,
    pub created_at: DateTime<Utc>,
}

impl TollZone {
    pub fn is_active(&self) -> bool {
        self.zone_status == ZONE_STATUS_ACTIVE
    }
}

/// Vía de peaje asociada a una zona - mapea a la tabla `toll_roads`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TollRoad {
    pub id: Uuid,
    pub zone_id: Uuid,
    pub name: String,
    pub rate_per_km: Decimal,
    pub minimum_fare: Option<Decimal>,
    pub road_status: String,
    pub created_at: DateTime<Utc>,
}

/// Override de tarifa por tipo de vehículo - tabla `vehicle_type_rates`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VehicleTypeRate {
    pub id: Uuid,
    pub toll_road_id: Uuid,
    pub vehicle_type: String,
    pub rate_per_km: Decimal,
}

/// Tabla de tarifas resuelta para una vía: tarifa base, mínimo opcional
/// y overrides por tipo de vehículo
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    pub base_rate_per_km: Decimal,
    pub minimum_fare: Option<Decimal>,
    pub type_overrides: HashMap<VehicleType, Decimal>,
}

impl RateTable {
    pub fn flat(rate_per_km: Decimal) -> Self {
        Self {
            base_rate_per_km: rate_per_km,
            minimum_fare: None,
            type_overrides: HashMap::new(),
        }
    }

    /// Tarifa por km para el tipo dado: override por tipo tiene
    /// precedencia sobre la tarifa base de la vía
    pub fn rate_for(&self, vehicle_type: Option<VehicleType>) -> Decimal {
        vehicle_type
            .and_then(|t| self.type_overrides.get(&t).copied())
            .unwrap_or(self.base_rate_per_km)
    }
}

/// Resultado de la detección de pertenencia a zona: la zona, su vía
/// activa y la tabla de tarifas ya resuelta
#[derive(Debug, Clone)]
pub struct ZoneMatch {
    pub zone: TollZone,
    pub road: TollRoad,
    pub rates: RateTable,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    #[test]
    fn test_rate_for_uses_override_when_present() {
        let mut rates = RateTable::flat(d("8"));
        rates.type_overrides.insert(VehicleType::Truck, d("12.5"));
        assert_eq!(rates.rate_for(Some(VehicleType::Truck)), d("12.5"));
        assert_eq!(rates.rate_for(Some(VehicleType::Car)), d("8"));
    }

    #[test]
    fn test_rate_for_falls_back_to_base_for_unknown_type() {
        let rates = RateTable::flat(d("8"));
        assert_eq!(rates.rate_for(None), d("8"));
    }
}
