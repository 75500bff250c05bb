//! Lógica de negocio
//!
//! Los servicios separan la decisión (funciones puras: tarifas, plan de
//! liquidación, orden de muestras) de la orquestación asíncrona sobre
//! los repositorios.

pub mod fare;
pub mod geofencing;
pub mod journey_tracker;
pub mod settlement;
pub mod wallet_ledger;
