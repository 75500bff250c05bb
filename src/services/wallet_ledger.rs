//! Ledger de wallet
//!
//! Operaciones de wallet expuestas por la API: balance, recarga e
//! historial. Las recargas pasan por la misma transacción SQL con lock
//! de fila que usa el motor de liquidación, así una recarga concurrente
//! con un cobro en pórtico se linealiza en la base y nunca se pierde
//! dinero. El saldo pendiente nunca vive en memoria: siempre es la suma
//! de transacciones toll/pending.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::config::environment::EnvironmentConfig;
use crate::models::transaction::{Transaction, TransactionStatus, TransactionType};
use crate::repositories::transaction_repository::TransactionRepository;
use crate::repositories::wallet_repository::WalletRepository;
use crate::utils::errors::AppError;

/// Resumen de deuda pendiente contra el saldo actual
#[derive(Debug, Clone)]
pub struct PendingOverview {
    pub pending_count: i64,
    pub total_pending_amount: Decimal,
    pub current_wallet_balance: Decimal,
    pub can_process_all: bool,
}

pub struct WalletLedger {
    pool: PgPool,
    op_timeout: std::time::Duration,
}

impl WalletLedger {
    pub fn new(pool: PgPool, config: &EnvironmentConfig) -> Self {
        Self { pool, op_timeout: config.wallet_op_timeout() }
    }

    pub async fn balance(&self, user_id: Uuid) -> Result<Decimal, AppError> {
        WalletRepository::new(self.pool.clone()).get_balance(user_id).await
    }

    /// Acreditar una recarga. El monto debe ser estrictamente positivo;
    /// el crédito y su transacción completed se confirman juntos.
    ///
    /// A diferencia de la liquidación en pórtico, acá el timeout SÍ se
    /// propaga al caller: la recarga es una operación interactiva y el
    /// usuario debe saber que no se aplicó.
    pub async fn recharge(
        &self,
        user_id: Uuid,
        amount: Decimal,
        description: Option<String>,
    ) -> Result<(Decimal, Transaction), AppError> {
        if amount <= Decimal::ZERO {
            return Err(AppError::InvalidAmount(format!(
                "Recharge amount must be positive, got {}",
                amount
            )));
        }

        let result = tokio::time::timeout(self.op_timeout, async {
            let mut tx = self.pool.begin().await?;

            // El lock de fila serializa contra liquidaciones concurrentes
            WalletRepository::balance_for_update(&mut tx, user_id).await?;
            let new_balance = WalletRepository::apply_delta(&mut tx, user_id, amount).await?;
            let recorded = TransactionRepository::insert_in_tx(
                &mut tx,
                user_id,
                TransactionType::Recharge,
                amount,
                TransactionStatus::Completed,
                description.or_else(|| Some("Wallet recharge".to_string())),
                None,
                None,
            )
            .await?;

            tx.commit().await?;
            Ok::<_, AppError>((new_balance, recorded))
        })
        .await
        .map_err(|_| {
            AppError::WalletOperationTimeout(format!(
                "recharge for user '{}' exceeded {:?}",
                user_id, self.op_timeout
            ))
        })??;

        info!(
            "💰 Recarga aplicada: usuario {} +{} (nuevo saldo {})",
            user_id, amount, result.0
        );
        Ok(result)
    }

    pub async fn history(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transaction>, AppError> {
        TransactionRepository::new(self.pool.clone())
            .find_by_user(user_id, limit, offset)
            .await
    }

    /// Resumen de peajes pendientes contra el saldo actual
    pub async fn pending_overview(&self, user_id: Uuid) -> Result<PendingOverview, AppError> {
        let repo = TransactionRepository::new(self.pool.clone());
        let pending = repo.pending_tolls(user_id).await?;
        let total_pending_amount: Decimal = pending.iter().map(|t| t.amount).sum();
        let current_wallet_balance = self.balance(user_id).await?;

        Ok(PendingOverview {
            pending_count: pending.len() as i64,
            total_pending_amount,
            current_wallet_balance,
            can_process_all: can_process_all(total_pending_amount, current_wallet_balance),
        })
    }
}

/// Hay deuda y el saldo la cubre completa (recordar: los pendientes se
/// liquidan todo-o-nada)
fn can_process_all(total_pending: Decimal, balance: Decimal) -> bool {
    total_pending > Decimal::ZERO && balance >= total_pending
}

/// Resultado de una deducción total-o-parcial
#[derive(Debug, Clone, Copy)]
pub struct DeductOutcome {
    pub deducted: Decimal,
    pub new_balance: Decimal,
}

/// Deducción atómica contra la fila de wallet ya bloqueada por la
/// transacción SQL del caller. Cobra hasta `amount` sin dejar el balance
/// negativo. Solo el motor de liquidación pasa por acá; nunca se expone
/// a la API.
pub async fn deduct_in_tx(
    conn: &mut PgConnection,
    user_id: Uuid,
    amount: Decimal,
) -> Result<DeductOutcome, AppError> {
    let balance = WalletRepository::balance_for_update(conn, user_id).await?;
    let deducted = amount.max(Decimal::ZERO).min(balance);

    let new_balance = if deducted > Decimal::ZERO {
        WalletRepository::apply_delta(conn, user_id, -deducted).await?
    } else {
        balance
    };

    Ok(DeductOutcome { deducted, new_balance })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    #[test]
    fn test_can_process_all_requires_debt_and_coverage() {
        // Sin deuda no hay nada que procesar
        assert!(!can_process_all(Decimal::ZERO, d("100")));
        // Deuda cubierta por el saldo
        assert!(can_process_all(d("72"), d("100")));
        assert!(can_process_all(d("72"), d("72")));
        // Saldo insuficiente
        assert!(!can_process_all(d("72"), d("50")));
    }
}
