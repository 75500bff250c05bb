//! DTOs de request/response de la API

pub mod common;
pub mod gps_dto;
pub mod vehicle_dto;
pub mod wallet_dto;
pub mod zone_dto;
