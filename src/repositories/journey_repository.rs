//! Repositorio de journeys
//!
//! El slot de journey activo por vehículo es exclusivo: como máximo un
//! journey `active` por vehículo. La serialización por vehículo la
//! garantiza el lock en AppState; aquí solo persistimos el estado.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::journey::{Journey, JOURNEY_STATUS_ACTIVE, JOURNEY_STATUS_EXITED};
use crate::utils::errors::AppError;
use crate::utils::geo::GeoPoint;

pub struct JourneyRepository {
    pool: PgPool,
}

impl JourneyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn active_by_vehicle(&self, vehicle_id: Uuid) -> Result<Option<Journey>, AppError> {
        let journey = sqlx::query_as::<_, Journey>(
            "SELECT * FROM journeys WHERE vehicle_id = $1 AND journey_status = $2",
        )
        .bind(vehicle_id)
        .bind(JOURNEY_STATUS_ACTIVE)
        .fetch_optional(&self.pool)
        .await?;

        Ok(journey)
    }

    /// Última muestra persistida del vehículo en cualquier journey,
    /// activo o cerrado. Deduplica pórticos reenviados cuando ya no hay
    /// journey activo contra el cual ordenar.
    pub async fn last_sample_time(
        &self,
        vehicle_id: Uuid,
    ) -> Result<Option<DateTime<Utc>>, AppError> {
        let row: (Option<DateTime<Utc>>,) =
            sqlx::query_as("SELECT MAX(last_sample_time) FROM journeys WHERE vehicle_id = $1")
                .bind(vehicle_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(row.0)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Journey>, AppError> {
        let journey = sqlx::query_as::<_, Journey>("SELECT * FROM journeys WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(journey)
    }

    /// Crear el journey al detectar entrada a zona
    pub async fn create_entry(
        &self,
        vehicle_id: Uuid,
        zone_id: Uuid,
        toll_road_id: Uuid,
        entry_point: GeoPoint,
        entry_time: DateTime<Utc>,
    ) -> Result<Journey, AppError> {
        let journey = sqlx::query_as::<_, Journey>(
            r#"
            INSERT INTO journeys (
                id, vehicle_id, zone_id, toll_road_id,
                entry_lat, entry_lon, entry_time,
                last_lat, last_lon, last_sample_time,
                total_distance_km, unbilled_distance_km,
                journey_status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $5, $6, $7, 0, 0, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(vehicle_id)
        .bind(zone_id)
        .bind(toll_road_id)
        .bind(entry_point.latitude)
        .bind(entry_point.longitude)
        .bind(entry_time)
        .bind(JOURNEY_STATUS_ACTIVE)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(journey)
    }

    /// Avanzar el journey con una muestra nueva: último punto, hora y
    /// los dos acumuladores de distancia
    pub async fn update_progress(
        &self,
        id: Uuid,
        point: GeoPoint,
        sample_time: DateTime<Utc>,
        total_distance_km: f64,
        unbilled_distance_km: f64,
    ) -> Result<Journey, AppError> {
        let journey = sqlx::query_as::<_, Journey>(
            r#"
            UPDATE journeys
            SET last_lat = $2, last_lon = $3, last_sample_time = $4,
                total_distance_km = $5, unbilled_distance_km = $6
            WHERE id = $1 AND journey_status = $7
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(point.latitude)
        .bind(point.longitude)
        .bind(sample_time)
        .bind(total_distance_km)
        .bind(unbilled_distance_km)
        .bind(JOURNEY_STATUS_ACTIVE)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Active journey not found".to_string()))?;

        Ok(journey)
    }

    /// Finalizar el journey con los datos de salida. Idempotente: si el
    /// journey ya no está activo retorna None (muestra duplicada/tardía).
    pub async fn finalize_exit(
        &self,
        id: Uuid,
        exit_point: GeoPoint,
        exit_time: DateTime<Utc>,
        total_distance_km: f64,
    ) -> Result<Option<Journey>, AppError> {
        let journey = sqlx::query_as::<_, Journey>(
            r#"
            UPDATE journeys
            SET exit_lat = $2, exit_lon = $3, exit_time = $4,
                last_lat = $2, last_lon = $3, last_sample_time = $4,
                total_distance_km = $5, unbilled_distance_km = 0,
                journey_status = $6
            WHERE id = $1 AND journey_status = $7
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(exit_point.latitude)
        .bind(exit_point.longitude)
        .bind(exit_time)
        .bind(total_distance_km)
        .bind(JOURNEY_STATUS_EXITED)
        .bind(JOURNEY_STATUS_ACTIVE)
        .fetch_optional(&self.pool)
        .await?;

        Ok(journey)
    }
}
