//! Repositorio de zonas de peaje
//!
//! Crea zonas con su vía y overrides de tarifa, y carga las zonas
//! activas con sus tablas de tarifas ya resueltas para la detección
//! de pertenencia.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::vehicle::VehicleType;
use crate::models::zone::{
    RateTable, TollRoad, TollZone, VehicleTypeRate, ZoneMatch, ZONE_STATUS_ACTIVE,
};
use crate::utils::errors::AppError;
use crate::utils::geo::GeoPoint;

pub struct ZoneRepository {
    pool: PgPool,
}

impl ZoneRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Crear zona + vía + overrides de tarifa en una sola transacción.
    /// El polígono ya viene validado por el controller (InvalidPolygon
    /// es un error de configuración, no de runtime).
    pub async fn create_zone_with_road(
        &self,
        name: String,
        boundary: Vec<GeoPoint>,
        road_name: String,
        rate_per_km: Decimal,
        minimum_fare: Option<Decimal>,
        type_rates: HashMap<String, Decimal>,
    ) -> Result<(TollZone, TollRoad), AppError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let zone = sqlx::query_as::<_, TollZone>(
            r#"
            INSERT INTO toll_zones (id, name, boundary, zone_status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(Json(boundary))
        .bind(ZONE_STATUS_ACTIVE)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let road = sqlx::query_as::<_, TollRoad>(
            r#"
            INSERT INTO toll_roads (id, zone_id, name, rate_per_km, minimum_fare, road_status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(zone.id)
        .bind(road_name)
        .bind(rate_per_km)
        .bind(minimum_fare)
        .bind(ZONE_STATUS_ACTIVE)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        for (vehicle_type, rate) in type_rates {
            sqlx::query(
                r#"
                INSERT INTO vehicle_type_rates (id, toll_road_id, vehicle_type, rate_per_km)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(road.id)
            .bind(vehicle_type)
            .bind(rate)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok((zone, road))
    }

    pub async fn list_zones(&self) -> Result<Vec<(TollZone, TollRoad)>, AppError> {
        let zones = sqlx::query_as::<_, TollZone>(
            "SELECT * FROM toll_zones ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut result = Vec::with_capacity(zones.len());
        for zone in zones {
            let road = sqlx::query_as::<_, TollRoad>(
                "SELECT * FROM toll_roads WHERE zone_id = $1 ORDER BY created_at ASC LIMIT 1",
            )
            .bind(zone.id)
            .fetch_optional(&self.pool)
            .await?;

            if let Some(road) = road {
                result.push((zone, road));
            }
        }

        Ok(result)
    }

    /// Cargar todas las zonas activas con vía y tarifas resueltas,
    /// ordenadas por fecha de creación (orden determinístico para la
    /// zona primaria). Cualquier error de infraestructura aquí se
    /// traduce a GeometryQueryFailed en el detector.
    pub async fn active_zone_matches(&self) -> Result<Vec<ZoneMatch>, AppError> {
        let zones = sqlx::query_as::<_, TollZone>(
            "SELECT * FROM toll_zones WHERE zone_status = $1 ORDER BY created_at ASC",
        )
        .bind(ZONE_STATUS_ACTIVE)
        .fetch_all(&self.pool)
        .await?;

        let mut matches = Vec::with_capacity(zones.len());
        for zone in zones {
            let road = sqlx::query_as::<_, TollRoad>(
                r#"
                SELECT * FROM toll_roads
                WHERE zone_id = $1 AND road_status = $2
                ORDER BY created_at ASC
                LIMIT 1
                "#,
            )
            .bind(zone.id)
            .bind(ZONE_STATUS_ACTIVE)
            .fetch_optional(&self.pool)
            .await?;

            let Some(road) = road else {
                // Zona sin vía activa: no genera peaje
                continue;
            };

            let overrides = sqlx::query_as::<_, VehicleTypeRate>(
                "SELECT * FROM vehicle_type_rates WHERE toll_road_id = $1",
            )
            .bind(road.id)
            .fetch_all(&self.pool)
            .await?;

            let mut type_overrides = HashMap::new();
            for row in overrides {
                if let Ok(vt) = VehicleType::from_str(&row.vehicle_type) {
                    type_overrides.insert(vt, row.rate_per_km);
                }
            }

            let rates = RateTable {
                base_rate_per_km: road.rate_per_km,
                minimum_fare: road.minimum_fare,
                type_overrides,
            };

            matches.push(ZoneMatch { zone, road, rates });
        }

        Ok(matches)
    }

    /// Tabla de tarifas de una vía puntual (para liquidaciones fuera de
    /// una zona, p. ej. gate sin journey activo)
    pub async fn rate_table_for_road(&self, road_id: Uuid) -> Result<Option<RateTable>, AppError> {
        let road = sqlx::query_as::<_, TollRoad>("SELECT * FROM toll_roads WHERE id = $1")
            .bind(road_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(road) = road else {
            return Ok(None);
        };

        let overrides = sqlx::query_as::<_, VehicleTypeRate>(
            "SELECT * FROM vehicle_type_rates WHERE toll_road_id = $1",
        )
        .bind(road.id)
        .fetch_all(&self.pool)
        .await?;

        let mut type_overrides = HashMap::new();
        for row in overrides {
            if let Ok(vt) = VehicleType::from_str(&row.vehicle_type) {
                type_overrides.insert(vt, row.rate_per_km);
            }
        }

        Ok(Some(RateTable {
            base_rate_per_km: road.rate_per_km,
            minimum_fare: road.minimum_fare,
            type_overrides,
        }))
    }
}
