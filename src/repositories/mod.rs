//! Capa de acceso a datos (SQLx sobre PostgreSQL)

pub mod journey_repository;
pub mod notification_repository;
pub mod transaction_repository;
pub mod vehicle_repository;
pub mod wallet_repository;
pub mod zone_repository;
