//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum, incluyendo el registro de locks por
//! vehículo que serializa las muestras GPS de un mismo vehículo.

use std::collections::HashMap;
use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::config::environment::EnvironmentConfig;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    /// Un mutex por vehículo: las muestras del mismo vehículo se aplican
    /// en orden de llegada y nunca en paralelo; vehículos distintos son
    /// completamente independientes.
    vehicle_locks: Arc<RwLock<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl AppState {
    pub fn new(pool: PgPool, config: EnvironmentConfig) -> Self {
        Self {
            pool,
            config,
            vehicle_locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Obtener (o crear) el lock de serialización para un vehículo
    pub async fn lock_for_vehicle(&self, vehicle_id: Uuid) -> Arc<Mutex<()>> {
        {
            let locks = self.vehicle_locks.read().await;
            if let Some(lock) = locks.get(&vehicle_id) {
                return lock.clone();
            }
        }

        let mut locks = self.vehicle_locks.write().await;
        locks
            .entry(vehicle_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Cantidad de locks registrados (para monitoreo)
    pub async fn tracked_vehicles(&self) -> usize {
        self.vehicle_locks.read().await.len()
    }
}
