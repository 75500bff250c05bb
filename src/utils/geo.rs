//! Utilidades geométricas
//!
//! Distancia great-circle (haversine), test punto-en-polígono por
//! ray casting y validación de anillos de zona.

use serde::{Deserialize, Serialize};

use crate::utils::errors::AppError;

/// Radio medio de la Tierra en kilómetros
const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Par latitud/longitud en grados
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Verificar que las coordenadas están en rango ±90/±180
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Distancia haversine entre dos puntos, en kilómetros
pub fn haversine_km(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlat = (to.latitude - from.latitude).to_radians();
    let dlon = (to.longitude - from.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Delta de distancia defensivo contra jitter GPS: los valores
/// negativos o NaN se truncan a 0 en lugar de fallar.
pub fn clamp_distance_delta(delta_km: f64) -> f64 {
    if delta_km.is_finite() && delta_km > 0.0 {
        delta_km
    } else {
        0.0
    }
}

/// Test punto-en-polígono por ray casting sobre un anillo cerrado.
/// El anillo debe venir cerrado (primer vértice == último vértice).
pub fn point_in_ring(point: GeoPoint, ring: &[GeoPoint]) -> bool {
    if ring.len() < 4 {
        return false;
    }

    let mut inside = false;
    // El anillo está cerrado, el segmento final se recorre igual
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let vi = ring[i];
        let vj = ring[j];

        let intersects = ((vi.latitude > point.latitude) != (vj.latitude > point.latitude))
            && (point.longitude
                < (vj.longitude - vi.longitude) * (point.latitude - vi.latitude)
                    / (vj.latitude - vi.latitude)
                    + vi.longitude);

        if intersects {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Validar un anillo de zona al momento de configuración.
///
/// Reglas: anillo cerrado (primer vértice == último), al menos 3
/// vértices distintos antes de cerrar, y todas las coordenadas en rango.
pub fn validate_ring(ring: &[GeoPoint]) -> Result<(), AppError> {
    if ring.len() < 4 {
        return Err(AppError::InvalidPolygon(format!(
            "Polygon ring needs at least 4 vertices (closed), got {}",
            ring.len()
        )));
    }

    if let Some(bad) = ring.iter().find(|p| !p.is_valid()) {
        return Err(AppError::InvalidPolygon(format!(
            "Vertex out of range: ({}, {})",
            bad.latitude, bad.longitude
        )));
    }

    let first = ring[0];
    let last = ring[ring.len() - 1];
    if first != last {
        return Err(AppError::InvalidPolygon(
            "Polygon ring must be closed (first vertex == last vertex)".to_string(),
        ));
    }

    // Contar vértices distintos sin el cierre
    let open = &ring[..ring.len() - 1];
    let mut distinct: Vec<GeoPoint> = Vec::with_capacity(open.len());
    for p in open {
        if !distinct.iter().any(|d| d == p) {
            distinct.push(*p);
        }
    }
    if distinct.len() < 3 {
        return Err(AppError::InvalidPolygon(format!(
            "Polygon ring needs at least 3 distinct vertices, got {}",
            distinct.len()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_ring() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(10.0, 76.0),
            GeoPoint::new(10.0, 77.0),
            GeoPoint::new(11.0, 77.0),
            GeoPoint::new(11.0, 76.0),
            GeoPoint::new(10.0, 76.0),
        ]
    }

    #[test]
    fn test_haversine_known_distance() {
        // Bangalore -> Coimbatore, aprox 225 km
        let blr = GeoPoint::new(12.9716, 77.5946);
        let cbe = GeoPoint::new(11.0168, 76.9558);
        let d = haversine_km(blr, cbe);
        assert!((d - 225.0).abs() < 10.0, "distance was {}", d);
    }

    #[test]
    fn test_haversine_zero_for_same_point() {
        let p = GeoPoint::new(10.975, 76.9);
        assert!(haversine_km(p, p) < 1e-9);
    }

    #[test]
    fn test_clamp_distance_delta() {
        assert_eq!(clamp_distance_delta(1.25), 1.25);
        assert_eq!(clamp_distance_delta(-0.3), 0.0);
        assert_eq!(clamp_distance_delta(f64::NAN), 0.0);
        assert_eq!(clamp_distance_delta(f64::INFINITY), 0.0);
    }

    #[test]
    fn test_point_in_ring_inside_and_outside() {
        let ring = square_ring();
        assert!(point_in_ring(GeoPoint::new(10.5, 76.5), &ring));
        assert!(!point_in_ring(GeoPoint::new(9.5, 76.5), &ring));
        assert!(!point_in_ring(GeoPoint::new(10.5, 78.0), &ring));
    }

    #[test]
    fn test_validate_ring_accepts_square() {
        assert!(validate_ring(&square_ring()).is_ok());
    }

    #[test]
    fn test_validate_ring_rejects_open_ring() {
        let mut ring = square_ring();
        ring.pop();
        let err = validate_ring(&ring).unwrap_err();
        assert!(matches!(err, AppError::InvalidPolygon(_)));
    }

    #[test]
    fn test_validate_ring_rejects_degenerate() {
        let p = GeoPoint::new(10.0, 76.0);
        let ring = vec![p, p, p, p];
        let err = validate_ring(&ring).unwrap_err();
        assert!(matches!(err, AppError::InvalidPolygon(_)));
    }

    #[test]
    fn test_validate_ring_rejects_out_of_range_vertex() {
        let ring = vec![
            GeoPoint::new(95.0, 76.0),
            GeoPoint::new(10.0, 77.0),
            GeoPoint::new(11.0, 77.0),
            GeoPoint::new(95.0, 76.0),
        ];
        let err = validate_ring(&ring).unwrap_err();
        assert!(matches!(err, AppError::InvalidPolygon(_)));
    }
}
