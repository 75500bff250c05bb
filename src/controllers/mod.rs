//! Controllers HTTP

pub mod gps_controller;
pub mod notification_controller;
pub mod vehicle_controller;
pub mod wallet_controller;
pub mod zone_controller;
