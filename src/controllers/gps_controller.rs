//! Controller de ingestión GPS
//!
//! Valida la muestra, resuelve el vehículo (por id o por device) y
//! delega en la máquina de estados de journeys.

use crate::dto::gps_dto::{GpsSampleRequest, GpsSampleResponse};
use crate::models::vehicle::Vehicle;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::services::journey_tracker::JourneyTracker;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::validation::validate_coordinates;

pub struct GpsController {
    state: AppState,
}

impl GpsController {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub async fn ingest(&self, request: GpsSampleRequest) -> Result<GpsSampleResponse, AppError> {
        let point = validate_coordinates(request.latitude, request.longitude).map_err(|_| {
            AppError::BadRequest(format!(
                "Coordinates out of range: ({}, {})",
                request.latitude, request.longitude
            ))
        })?;

        let vehicle = self.resolve_vehicle(&request).await?;
        if !vehicle.is_active() {
            return Err(AppError::BadRequest(format!(
                "Vehicle '{}' is inactive",
                vehicle.id
            )));
        }

        let tracker = JourneyTracker::new(self.state.clone());
        tracker
            .process_sample(&vehicle, point, request.timestamp, request.is_gate_crossing)
            .await
    }

    /// El vehículo llega identificado por `vehicle_id` (apps) o por
    /// `device_id` (dispositivos embebidos que solo conocen su device)
    async fn resolve_vehicle(&self, request: &GpsSampleRequest) -> Result<Vehicle, AppError> {
        let repository = VehicleRepository::new(self.state.pool.clone());

        if let Some(vehicle_id) = request.vehicle_id {
            return repository.find_by_id(vehicle_id).await?.ok_or_else(|| {
                AppError::NotFound(format!("Vehicle with id '{}' not found", vehicle_id))
            });
        }

        if let Some(ref device_id) = request.device_id {
            return repository.find_by_device_id(device_id).await?.ok_or_else(|| {
                AppError::NotFound(format!("No active vehicle for device '{}'", device_id))
            });
        }

        Err(AppError::BadRequest(
            "Either vehicle_id or device_id is required".to_string(),
        ))
    }
}
