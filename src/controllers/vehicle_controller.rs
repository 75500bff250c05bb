//! Controller de vehículos

use std::str::FromStr;

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common::ApiResponse;
use crate::dto::vehicle_dto::{CreateVehicleRequest, VehicleResponse};
use crate::models::vehicle::VehicleType;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::utils::errors::AppError;

pub struct VehicleController {
    repository: VehicleRepository,
}

impl VehicleController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: VehicleRepository::new(pool),
        }
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        request: CreateVehicleRequest,
    ) -> Result<ApiResponse<VehicleResponse>, AppError> {
        request.validate()?;

        // El tipo determina la tarifa aplicable: se rechaza temprano si
        // no es uno de los conocidos
        let vehicle_type = VehicleType::from_str(&request.vehicle_type)
            .map_err(|e| AppError::BadRequest(e))?;

        if self.repository.plate_exists(&request.plate_number).await? {
            return Err(AppError::Conflict(format!(
                "Vehicle with plate '{}' already exists",
                request.plate_number
            )));
        }

        let vehicle = self
            .repository
            .create(
                user_id,
                request.plate_number,
                vehicle_type.as_str().to_string(),
                request.device_id,
                request.make,
                request.model,
                request.color,
            )
            .await?;

        Ok(ApiResponse::success_with_message(
            VehicleResponse::from(vehicle),
            "Vehículo registrado exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: Uuid, user_id: Uuid) -> Result<VehicleResponse, AppError> {
        let vehicle = self
            .repository
            .find_by_id(id)
            .await?
            .filter(|v| v.user_id == user_id)
            .ok_or_else(|| AppError::NotFound("Vehículo no encontrado".to_string()))?;

        Ok(VehicleResponse::from(vehicle))
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<VehicleResponse>, AppError> {
        let vehicles = self.repository.find_by_user(user_id).await?;
        Ok(vehicles.into_iter().map(VehicleResponse::from).collect())
    }

    pub async fn deactivate(&self, id: Uuid, user_id: Uuid) -> Result<VehicleResponse, AppError> {
        let vehicle = self.repository.deactivate(id, user_id).await?;
        Ok(VehicleResponse::from(vehicle))
    }
}
