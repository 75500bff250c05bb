//! Rutas de la API

pub mod gps_routes;
pub mod notification_routes;
pub mod vehicle_routes;
pub mod wallet_routes;
pub mod zone_routes;
