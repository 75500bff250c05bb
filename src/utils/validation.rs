//! Utilidades de validación
//!
//! Helpers de validación que no salen de la derive de `validator`.

use validator::ValidationError;

use crate::utils::geo::GeoPoint;

/// Validar coordenadas GPS en rango ±90/±180
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<GeoPoint, ValidationError> {
    let point = GeoPoint::new(latitude, longitude);
    if !point.is_valid() {
        let mut error = ValidationError::new("coordinates");
        error.add_param("latitude".into(), &latitude);
        error.add_param("longitude".into(), &longitude);
        return Err(error);
    }
    Ok(point)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_coordinates() {
        assert!(validate_coordinates(10.975, 76.9).is_ok());
        assert!(validate_coordinates(91.0, 76.9).is_err());
        assert!(validate_coordinates(10.0, -181.0).is_err());
        assert!(validate_coordinates(f64::NAN, 0.0).is_err());
    }
}
