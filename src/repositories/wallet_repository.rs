//! Repositorio de wallets
//!
//! Las mutaciones de balance pasan por `balance_for_update` +
//! `apply_delta` dentro de una transacción SQL: el lock de fila
//! linealiza deducciones y recargas concurrentes del mismo usuario.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::wallet::WalletAccount;
use crate::utils::errors::AppError;

pub struct WalletRepository {
    pool: PgPool,
}

impl WalletRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Option<WalletAccount>, AppError> {
        let wallet =
            sqlx::query_as::<_, WalletAccount>("SELECT * FROM wallets WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(wallet)
    }

    pub async fn get_balance(&self, user_id: Uuid) -> Result<Decimal, AppError> {
        let row: Option<(Decimal,)> =
            sqlx::query_as("SELECT balance FROM wallets WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(b,)| b).unwrap_or(Decimal::ZERO))
    }

    /// Leer el balance con lock de fila (SELECT ... FOR UPDATE). Toda
    /// decisión de deducción se toma contra este valor bloqueado.
    pub async fn balance_for_update(
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<Decimal, AppError> {
        let row: Option<(Decimal,)> =
            sqlx::query_as("SELECT balance FROM wallets WHERE user_id = $1 FOR UPDATE")
                .bind(user_id)
                .fetch_optional(&mut *conn)
                .await?;

        row.map(|(b,)| b)
            .ok_or_else(|| AppError::NotFound(format!("Wallet for user '{}' not found", user_id)))
    }

    /// Aplicar un delta (positivo = crédito, negativo = deducción) a la
    /// fila ya bloqueada. El CHECK de no-negatividad del schema es la
    /// última línea de defensa; el caller ya validó contra el balance
    /// bloqueado.
    pub async fn apply_delta(
        conn: &mut PgConnection,
        user_id: Uuid,
        delta: Decimal,
    ) -> Result<Decimal, AppError> {
        let row: (Decimal,) = sqlx::query_as(
            r#"
            UPDATE wallets
            SET balance = balance + $2, updated_at = $3
            WHERE user_id = $1
            RETURNING balance
            "#,
        )
        .bind(user_id)
        .bind(delta)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

        Ok(row.0)
    }
}
