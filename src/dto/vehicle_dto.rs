//! DTOs de Vehicle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::vehicle::Vehicle;

/// Request para registrar un vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(length(min = 4, max = 20))]
    pub plate_number: String,

    /// car | bike | bus | truck
    #[validate(length(min = 3, max = 10))]
    pub vehicle_type: String,

    #[validate(length(min = 3, max = 64))]
    pub device_id: Option<String>,

    #[validate(length(min = 2, max = 50))]
    pub make: Option<String>,

    #[validate(length(min = 1, max = 50))]
    pub model: Option<String>,

    #[validate(length(min = 2, max = 30))]
    pub color: Option<String>,
}

/// Response de vehículo para la API
#[derive(Debug, Serialize)]
pub struct VehicleResponse {
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

impl From<Vehicle> for VehicleResponse {
    fn from(vehicle: Vehicle) -> Self {
        Self {
            id: vehicle.id,
            user_id: vehicle.user_id,
            plate_number: vehicle.plate_number,
            vehicle_type: vehicle.vehicle_type,
            device_id: vehicle.device_id,
            make: vehicle.make,
            model: vehicle.model,
            color: vehicle.color,
            vehicle_status: vehicle.vehicle_status,
            created_at: vehicle.created_at,
        }
    }
}
