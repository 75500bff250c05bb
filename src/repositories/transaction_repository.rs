//! Repositorio de transacciones
//!
//! El registro es append-only: el monto nunca se modifica y el estado
//! solo avanza pending→completed o pending→failed. El pending balance
//! de un usuario es SIEMPRE la suma de sus transacciones toll/pending
//! en la base - nunca una variable en memoria.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::transaction::{Transaction, TransactionStatus, TransactionType};
use crate::utils::errors::AppError;

pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transaction>, AppError> {
        let txs = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT * FROM transactions
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(txs)
    }

    /// Peajes pendientes de un usuario, más antiguos primero (orden de
    /// liquidación)
    pub async fn pending_tolls(&self, user_id: Uuid) -> Result<Vec<Transaction>, AppError> {
        let txs = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT * FROM transactions
            WHERE user_id = $1 AND tx_type = $2 AND tx_status = $3
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .bind(TransactionType::Toll.as_str())
        .bind(TransactionStatus::Pending.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(txs)
    }

    /// Suma de peajes pendientes (el pending balance materializado)
    pub async fn sum_pending(&self, user_id: Uuid) -> Result<Decimal, AppError> {
        let row: (Option<Decimal>,) = sqlx::query_as(
            r#"
            SELECT SUM(amount) FROM transactions
            WHERE user_id = $1 AND tx_type = $2 AND tx_status = $3
            "#,
        )
        .bind(user_id)
        .bind(TransactionType::Toll.as_str())
        .bind(TransactionStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0.unwrap_or(Decimal::ZERO))
    }

    /// Insertar una transacción fuera de una transacción SQL (recargas,
    /// registro degradado tras fallo de liquidación)
    pub async fn insert(
        &self,
        user_id: Uuid,
        tx_type: TransactionType,
        amount: Decimal,
        status: TransactionStatus,
        description: Option<String>,
        journey_id: Option<Uuid>,
    ) -> Result<Transaction, AppError> {
        let mut conn = self.pool.acquire().await?;
        Self::insert_in_tx(
            &mut conn, user_id, tx_type, amount, status, description, journey_id, None,
        )
        .await
    }

    /// Insertar dentro de una transacción SQL en curso. Los cobros de
    /// pórtico llevan `settlement_key` para que un reintento detecte una
    /// liquidación ya confirmada.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert_in_tx(
        conn: &mut PgConnection,
        user_id: Uuid,
        tx_type: TransactionType,
        amount: Decimal,
        status: TransactionStatus,
        description: Option<String>,
        journey_id: Option<Uuid>,
        settlement_key: Option<String>,
    ) -> Result<Transaction, AppError> {
        let now = Utc::now();
        let tx = sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions (id, user_id, tx_type, amount, tx_status, description, journey_id, settlement_key, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(tx_type.as_str())
        .bind(amount)
        .bind(status.as_str())
        .bind(description)
        .bind(journey_id)
        .bind(settlement_key)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        Ok(tx)
    }

    /// Transacciones registradas bajo una clave de liquidación, con lock
    /// de fila. Si hay filas, un intento anterior ya confirmó ese cobro.
    pub async fn find_by_settlement_key(
        conn: &mut PgConnection,
        key: &str,
    ) -> Result<Vec<Transaction>, AppError> {
        let txs = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT * FROM transactions
            WHERE settlement_key = $1
            ORDER BY created_at ASC
            FOR UPDATE
            "#,
        )
        .bind(key)
        .fetch_all(&mut *conn)
        .await?;

        Ok(txs)
    }

    /// Peajes pendientes con lock de fila, más antiguos primero, para
    /// liquidación dentro de una transacción SQL
    pub async fn pending_tolls_for_update(
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<Vec<Transaction>, AppError> {
        let txs = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT * FROM transactions
            WHERE user_id = $1 AND tx_type = $2 AND tx_status = $3
            ORDER BY created_at ASC
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .bind(TransactionType::Toll.as_str())
        .bind(TransactionStatus::Pending.as_str())
        .fetch_all(&mut *conn)
        .await?;

        Ok(txs)
    }

    /// Marcar un grupo de pendientes como completados (all-or-nothing:
    /// el caller solo invoca esto cuando el total quedó cubierto).
    /// El filtro por estado pending hace la operación idempotente.
    pub async fn complete_pending_group(
        conn: &mut PgConnection,
        ids: &[Uuid],
    ) -> Result<u64, AppError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET tx_status = $2, updated_at = $3
            WHERE id = ANY($1) AND tx_status = $4
            "#,
        )
        .bind(ids)
        .bind(TransactionStatus::Completed.as_str())
        .bind(Utc::now())
        .bind(TransactionStatus::Pending.as_str())
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }
}
