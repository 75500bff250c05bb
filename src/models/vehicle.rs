//! Modelo de Vehicle
//!
//! Mapea a la tabla `vehicles`. Identidad inmutable (id, placa, device);
//! metadata mutable. El borrado es lógico vía `vehicle_status` para que
//! las referencias históricas de journeys/transacciones sigan válidas.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Tipo de vehículo - determina la tarifa por km aplicable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Car,
    Bike,
    Bus,
    Truck,
}

impl VehicleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Car => "car",
            VehicleType::Bike => "bike",
            VehicleType::Bus => "bus",
            VehicleType::Truck => "truck",
        }
    }
}

impl FromStr for VehicleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "car" => Ok(VehicleType::Car),
            "bike" => Ok(VehicleType::Bike),
            "bus" => Ok(VehicleType::Bus),
            "truck" => Ok(VehicleType::Truck),
            other => Err(format!("unknown vehicle type '{}'", other)),
        }
    }
}

/// Estado del vehículo (soft delete)
pub const VEHICLE_STATUS_ACTIVE: &str = "active";
pub const VEHICLE_STATUS_INACTIVE: &str = "inactive";

/// Vehicle principal - mapea a la tabla `vehicles`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plate_number: String,
    pub vehicle_type: String,
    pub device_id: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub color: Option<String>,
    pub vehicle_status: String,
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn is_active(&self) -> bool {
        self.vehicle_status == VEHICLE_STATUS_ACTIVE
    }

    /// Tipo parseado; `None` si el valor almacenado no se reconoce
    /// (en ese caso el cálculo de tarifa cae a la tarifa base de la vía)
    pub fn parsed_type(&self) -> Option<VehicleType> {
        VehicleType::from_str(&self.vehicle_type).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_type_roundtrip() {
        for t in [VehicleType::Car, VehicleType::Bike, VehicleType::Bus, VehicleType::Truck] {
            assert_eq!(VehicleType::from_str(t.as_str()).unwrap(), t);
        }
    }

    #[test]
    fn test_vehicle_type_rejects_unknown() {
        assert!(VehicleType::from_str("hovercraft").is_err());
    }

    #[test]
    fn test_vehicle_type_case_insensitive() {
        assert_eq!(VehicleType::from_str(" Truck ").unwrap(), VehicleType::Truck);
    }
}
