//! Cálculo de tarifas
//!
//! Función pura y determinística: distancia → monto. La tarifa por km
//! se resuelve por tipo de vehículo con fallback a la tarifa base de la
//! vía; el mínimo configurado se aplica después.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::vehicle::VehicleType;
use crate::models::zone::RateTable;

/// Calcular el monto de peaje para una distancia en km.
///
/// - distancia ≤ 0 o no representable → 0 (nunca tarifas negativas)
/// - redondeo a 2 decimales, half-up
/// - `minimum_fare` solo se aplica si está configurado en la vía
pub fn compute_fare(distance_km: f64, vehicle_type: Option<VehicleType>, rates: &RateTable) -> Decimal {
    let Some(distance) = Decimal::from_f64(distance_km) else {
        return Decimal::ZERO;
    };
    if distance <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let rate = rates.rate_for(vehicle_type);
    let mut amount =
        (distance * rate).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    if let Some(minimum) = rates.minimum_fare {
        if amount < minimum {
            amount = minimum;
        }
    }

    amount
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    fn flat_rate_8() -> RateTable {
        RateTable::flat(d("8"))
    }

    #[test]
    fn test_scenario_distances_at_base_rate() {
        // Los montos de los escenarios de liquidación: ₹8/km
        assert_eq!(compute_fare(15.25, Some(VehicleType::Car), &flat_rate_8()), d("122.00"));
        assert_eq!(compute_fare(10.0, Some(VehicleType::Car), &flat_rate_8()), d("80.00"));
        assert_eq!(compute_fare(3.0, Some(VehicleType::Car), &flat_rate_8()), d("24.00"));
    }

    #[test]
    fn test_zero_and_negative_distance_yield_zero() {
        let rates = RateTable {
            base_rate_per_km: d("8"),
            minimum_fare: Some(d("5")),
            type_overrides: HashMap::new(),
        };
        // El mínimo NO aplica cuando no hubo distancia
        assert_eq!(compute_fare(0.0, None, &rates), Decimal::ZERO);
        assert_eq!(compute_fare(-2.5, None, &rates), Decimal::ZERO);
        assert_eq!(compute_fare(f64::NAN, None, &rates), Decimal::ZERO);
    }

    #[test]
    fn test_rounds_half_up_to_two_decimals() {
        // 0.25 km * 0.1/km = 0.025 → 0.03 con half-up (banker's daría 0.02)
        let rates = RateTable::flat(d("0.1"));
        assert_eq!(compute_fare(0.25, None, &rates), d("0.03"));
    }

    #[test]
    fn test_minimum_fare_floor() {
        let rates = RateTable {
            base_rate_per_km: d("8"),
            minimum_fare: Some(d("5")),
            type_overrides: HashMap::new(),
        };
        // 0.5 km * 8 = 4.00, por debajo del mínimo
        assert_eq!(compute_fare(0.5, None, &rates), d("5"));
        // 1 km * 8 = 8.00, por encima del mínimo
        assert_eq!(compute_fare(1.0, None, &rates), d("8.00"));
    }

    #[test]
    fn test_type_override_takes_precedence_then_minimum() {
        let mut overrides = HashMap::new();
        overrides.insert(VehicleType::Bike, d("4"));
        let rates = RateTable {
            base_rate_per_km: d("8"),
            minimum_fare: Some(d("5")),
            type_overrides: overrides,
        };
        // 1 km en bike: 4.00 por override, luego sube al mínimo 5
        assert_eq!(compute_fare(1.0, Some(VehicleType::Bike), &rates), d("5"));
        // 2 km en bike: 8.00, sin piso
        assert_eq!(compute_fare(2.0, Some(VehicleType::Bike), &rates), d("8.00"));
        // El tipo sin override usa la tarifa base
        assert_eq!(compute_fare(2.0, Some(VehicleType::Car), &rates), d("16.00"));
    }
}
