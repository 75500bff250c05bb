//! Controller de zonas de peaje
//!
//! La validación del polígono ocurre acá, al configurar la zona. Un
//! anillo inválido nunca llega a la base: el detector de pertenencia
//! asume anillos cerrados y bien formados.

use sqlx::PgPool;
use validator::Validate;

use crate::dto::common::ApiResponse;
use crate::dto::zone_dto::{CreateZoneRequest, ZoneResponse};
use crate::repositories::zone_repository::ZoneRepository;
use crate::utils::errors::AppError;
use crate::utils::geo::validate_ring;

pub struct ZoneController {
    repository: ZoneRepository,
}

impl ZoneController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ZoneRepository::new(pool),
        }
    }

    pub async fn create(
        &self,
        request: CreateZoneRequest,
    ) -> Result<ApiResponse<ZoneResponse>, AppError> {
        request.validate()?;
        validate_ring(&request.boundary)?;

        if request.rate_per_km <= rust_decimal::Decimal::ZERO {
            return Err(AppError::InvalidAmount(format!(
                "rate_per_km must be positive, got {}",
                request.rate_per_km
            )));
        }

        let (zone, road) = self
            .repository
            .create_zone_with_road(
                request.name,
                request.boundary,
                request.road_name,
                request.rate_per_km,
                request.minimum_fare,
                request.vehicle_type_rates.unwrap_or_default(),
            )
            .await?;

        Ok(ApiResponse::success_with_message(
            ZoneResponse::from_parts(zone, road),
            "Zona de peaje creada exitosamente".to_string(),
        ))
    }

    pub async fn list(&self) -> Result<Vec<ZoneResponse>, AppError> {
        let zones = self.repository.list_zones().await?;
        Ok(zones
            .into_iter()
            .map(|(zone, road)| ZoneResponse::from_parts(zone, road))
            .collect())
    }
}
