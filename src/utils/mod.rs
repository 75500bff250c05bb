//! Utilidades compartidas

pub mod errors;
pub mod geo;
pub mod retry;
pub mod validation;
