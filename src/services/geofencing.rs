//! Detección de pertenencia a zona
//!
//! Evalúa cada muestra GPS contra los polígonos de las zonas activas.
//! El acceso a las geometrías está detrás del trait `ZoneLookup` para
//! poder testear la detección con zonas en memoria; la implementación
//! de producción carga desde PostgreSQL y traduce cualquier error de
//! infraestructura a `GeometryQueryFailed`. Un backend caído NUNCA se
//! reporta como "cero zonas": eso cobraría de menos en silencio.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crate::models::zone::ZoneMatch;
use crate::repositories::zone_repository::ZoneRepository;
use crate::utils::errors::AppError;
use crate::utils::geo::{point_in_ring, GeoPoint};

/// Fuente de zonas activas con sus tarifas resueltas
#[async_trait]
pub trait ZoneLookup: Send + Sync {
    /// Zonas activas en orden determinístico (creación ascendente)
    async fn active_zones(&self) -> Result<Vec<ZoneMatch>, AppError>;
}

/// Implementación de producción sobre PostgreSQL
pub struct DbZoneLookup {
    repository: ZoneRepository,
}

impl DbZoneLookup {
    pub fn new(pool: PgPool) -> Self {
        Self { repository: ZoneRepository::new(pool) }
    }
}

#[async_trait]
impl ZoneLookup for DbZoneLookup {
    async fn active_zones(&self) -> Result<Vec<ZoneMatch>, AppError> {
        // El fallo de infraestructura se distingue del conjunto vacío
        // legítimo
        self.repository.active_zone_matches().await.map_err(|e| match e {
            AppError::Database(db) => AppError::GeometryQueryFailed(db.to_string()),
            other => other,
        })
    }
}

/// Zonas que contienen el punto, en orden determinístico
pub async fn zones_containing(
    lookup: &dyn ZoneLookup,
    point: GeoPoint,
) -> Result<Vec<ZoneMatch>, AppError> {
    let zones = lookup.active_zones().await?;
    let matches: Vec<ZoneMatch> = zones
        .into_iter()
        .filter(|m| point_in_ring(point, &m.zone.boundary.0))
        .collect();

    debug!(
        "📍 Punto ({}, {}) dentro de {} zona(s)",
        point.latitude,
        point.longitude,
        matches.len()
    );
    Ok(matches)
}

/// Zona primaria para el punto: con zonas solapadas gana la más antigua
/// (la primera en el orden determinístico)
pub async fn primary_zone(
    lookup: &dyn ZoneLookup,
    point: GeoPoint,
) -> Result<Option<ZoneMatch>, AppError> {
    Ok(zones_containing(lookup, point).await?.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;
    use sqlx::types::Json;
    use uuid::Uuid;

    use crate::models::zone::{RateTable, TollRoad, TollZone, ZONE_STATUS_ACTIVE};

    struct StaticZones {
        zones: Vec<ZoneMatch>,
    }

    #[async_trait]
    impl ZoneLookup for StaticZones {
        async fn active_zones(&self) -> Result<Vec<ZoneMatch>, AppError> {
            Ok(self.zones.clone())
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl ZoneLookup for FailingBackend {
        async fn active_zones(&self) -> Result<Vec<ZoneMatch>, AppError> {
            Err(AppError::GeometryQueryFailed("connection refused".to_string()))
        }
    }

    fn zone_match(name: &str, ring: Vec<GeoPoint>, age_hours: i64) -> ZoneMatch {
        let zone_id = Uuid::new_v4();
        let created = Utc::now() - Duration::hours(age_hours);
        ZoneMatch {
            zone: TollZone {
                id: zone_id,
                name: name.to_string(),
                boundary: Json(ring),
                zone_status: ZONE_STATUS_ACTIVE.to_string(),
                created_at: created,
            },
            road: TollRoad {
                id: Uuid::new_v4(),
                zone_id,
                name: format!("{} road", name),
                rate_per_km: Decimal::from_str_exact("8").unwrap(),
                minimum_fare: None,
                road_status: ZONE_STATUS_ACTIVE.to_string(),
                created_at: created,
            },
            rates: RateTable::flat(Decimal::from_str_exact("8").unwrap()),
        }
    }

    fn square(lat0: f64, lon0: f64, side: f64) -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(lat0, lon0),
            GeoPoint::new(lat0, lon0 + side),
            GeoPoint::new(lat0 + side, lon0 + side),
            GeoPoint::new(lat0 + side, lon0),
            GeoPoint::new(lat0, lon0),
        ]
    }

    #[tokio::test]
    async fn test_point_inside_single_zone() {
        let lookup = StaticZones { zones: vec![zone_match("NH-544", square(10.0, 76.0, 1.0), 1)] };
        let found = zones_containing(&lookup, GeoPoint::new(10.5, 76.5)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].zone.name, "NH-544");
    }

    #[tokio::test]
    async fn test_point_outside_all_zones_is_empty_not_error() {
        let lookup = StaticZones { zones: vec![zone_match("NH-544", square(10.0, 76.0, 1.0), 1)] };
        let found = zones_containing(&lookup, GeoPoint::new(20.0, 80.0)).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_overlapping_zones_primary_is_oldest() {
        // Dos zonas solapadas: la más antigua va primera en el orden
        let lookup = StaticZones {
            zones: vec![
                zone_match("older", square(10.0, 76.0, 2.0), 48),
                zone_match("newer", square(10.5, 76.5, 2.0), 1),
            ],
        };
        let point = GeoPoint::new(11.0, 77.0);
        let both = zones_containing(&lookup, point).await.unwrap();
        assert_eq!(both.len(), 2);

        let primary = primary_zone(&lookup, point).await.unwrap().unwrap();
        assert_eq!(primary.zone.name, "older");
    }

    #[tokio::test]
    async fn test_backend_failure_surfaces_as_geometry_error() {
        let result = zones_containing(&FailingBackend, GeoPoint::new(10.5, 76.5)).await;
        assert!(matches!(result, Err(AppError::GeometryQueryFailed(_))));
    }
}
