//! Modelos de datos
//!
//! Structs tipados que mapean al schema PostgreSQL. Reemplazan las
//! formas duck-typed del acceso a datos con contratos explícitos por
//! entidad, validados en el borde.

pub mod journey;
pub mod notification;
pub mod transaction;
pub mod vehicle;
pub mod wallet;
pub mod zone;
