//! Motor de liquidación de peajes
//!
//! En un cruce de pórtico se intenta cobrar el tramo actual MÁS todos
//! los peajes pendientes acumulados, todo-o-nada sobre los pendientes
//! previos. En una salida de zona sin pórtico no se toca el wallet: el
//! tramo queda como transacción pendiente.
//!
//! La decisión de cobro es una función pura (`plan_gate_settlement`)
//! sobre el balance y los pendientes ya bloqueados; la aplicación ocurre
//! en UNA transacción SQL con locks de fila, con timeout por intento y
//! reintentos acotados. Si la infraestructura no responde, el pipeline
//! GPS igual completa: se registra una transacción failed y el monto del
//! tramo se preserva como pendiente.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::environment::EnvironmentConfig;
use crate::models::transaction::{Transaction, TransactionStatus, TransactionType};
use crate::repositories::transaction_repository::TransactionRepository;
use crate::repositories::wallet_repository::WalletRepository;
use crate::services::wallet_ledger::deduct_in_tx;
use crate::utils::errors::AppError;
use crate::utils::retry::RetryPolicy;

/// Un peaje pendiente a considerar en la liquidación
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEntry {
    pub id: Uuid,
    pub amount: Decimal,
}

impl From<&Transaction> for PendingEntry {
    fn from(tx: &Transaction) -> Self {
        Self { id: tx.id, amount: tx.amount }
    }
}

/// Plan de liquidación en pórtico, calculado contra el balance bloqueado.
///
/// Invariante de conservación: `leg + sum(pending) == deduct + leg_pending
/// + sum(pendientes no completados)`.
#[derive(Debug, Clone, PartialEq)]
pub struct GatePlan {
    /// Monto total a deducir del wallet
    pub deduct: Decimal,
    /// Pendientes previos que pasan a completed (todos o ninguno)
    pub complete_prior: Vec<Uuid>,
    /// Porción del tramo actual que se registra como toll completed
    pub leg_completed: Decimal,
    /// Porción del tramo actual que queda como toll pending
    pub leg_pending: Decimal,
}

impl GatePlan {
    pub fn cleared_all_pending(&self) -> bool {
        self.leg_pending == Decimal::ZERO
    }
}

/// Decidir la liquidación en pórtico.
///
/// Si el balance cubre `leg + pendientes`, se deduce el total y todos
/// los pendientes previos se completan. Si no alcanza, los pendientes
/// previos quedan intactos (nunca liquidación parcial del grupo) y del
/// tramo actual se cobra lo que el balance permita; el resto queda
/// pendiente.
pub fn plan_gate_settlement(
    leg_cost: Decimal,
    balance: Decimal,
    pending: &[PendingEntry],
) -> GatePlan {
    let pending_total: Decimal = pending.iter().map(|p| p.amount).sum();
    let total_due = leg_cost + pending_total;

    if balance >= total_due {
        return GatePlan {
            deduct: total_due,
            complete_prior: pending.iter().map(|p| p.id).collect(),
            leg_completed: leg_cost,
            leg_pending: Decimal::ZERO,
        };
    }

    // Balance insuficiente: cobrar del tramo actual lo que se pueda
    let immediate = balance.max(Decimal::ZERO).min(leg_cost);
    GatePlan {
        deduct: immediate,
        complete_prior: Vec::new(),
        leg_completed: immediate,
        leg_pending: leg_cost - immediate,
    }
}

/// Resultado de una liquidación, para la respuesta del pipeline GPS
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
    pub amount_charged: Decimal,
    pub wallet_balance_after: Decimal,
    pub pending_balance_after: Decimal,
    pub transaction_ids: Vec<Uuid>,
    pub cleared_all_pending: bool,
    /// true si la infraestructura falló y el cobro quedó diferido
    pub degraded: bool,
}

/// Reconstruir el resultado visible de una liquidación ya confirmada a
/// partir de las transacciones registradas bajo su clave. Lo cobrado es
/// la porción completed del tramo; el wallet y los pendientes se
/// reportan como están ahora.
fn replay_outcome(
    already: &[Transaction],
    balance: Decimal,
    pending_total: Decimal,
) -> SettlementOutcome {
    let amount_charged = already
        .iter()
        .filter(|t| t.tx_status == TransactionStatus::Completed.as_str())
        .map(|t| t.amount)
        .sum();

    SettlementOutcome {
        amount_charged,
        wallet_balance_after: balance,
        pending_balance_after: pending_total,
        cleared_all_pending: pending_total == Decimal::ZERO,
        transaction_ids: already.iter().map(|t| t.id).collect(),
        degraded: false,
    }
}

pub struct SettlementEngine {
    pool: PgPool,
    policy: RetryPolicy,
    op_timeout: std::time::Duration,
}

impl SettlementEngine {
    pub fn new(pool: PgPool, config: &EnvironmentConfig) -> Self {
        Self {
            pool,
            policy: RetryPolicy {
                max_attempts: config.settlement_max_retries,
                ..RetryPolicy::default()
            },
            op_timeout: config.wallet_op_timeout(),
        }
    }

    /// Liquidar en un cruce de pórtico: tramo actual + pendientes.
    ///
    /// Nunca retorna error por saldo insuficiente ni por fallo de
    /// infraestructura; en ese último caso el resultado viene marcado
    /// como degradado y la deuda queda registrada como pendiente.
    ///
    /// `settlement_key` identifica la muestra que dispara el cobro: si
    /// un intento anterior alcanzó a confirmar pero se reportó como
    /// timeout, el reintento encuentra sus transacciones bajo la clave
    /// y no vuelve a deducir.
    pub async fn settle_at_gate(
        &self,
        user_id: Uuid,
        journey_id: Option<Uuid>,
        leg_cost: Decimal,
        description: &str,
        settlement_key: &str,
    ) -> Result<SettlementOutcome, AppError> {
        let attempt = || async move {
            tokio::time::timeout(
                self.op_timeout,
                self.settle_attempt(user_id, journey_id, leg_cost, description, settlement_key),
            )
            .await
            .unwrap_or_else(|_| {
                Err(AppError::WalletOperationTimeout(format!(
                    "gate settlement for user '{}' exceeded {:?}",
                    user_id, self.op_timeout
                )))
            })
        };

        match self.policy.run(attempt).await {
            Ok(outcome) => {
                info!(
                    "💳 Liquidación en pórtico: usuario {} cobrado {} (pendiente restante {})",
                    user_id, outcome.amount_charged, outcome.pending_balance_after
                );
                Ok(outcome)
            }
            Err(e) => {
                error!(
                    "❌ Liquidación agotó reintentos para usuario {}: {}. Degradando a pendiente",
                    user_id, e
                );
                self.record_degraded(user_id, journey_id, leg_cost, description)
                    .await
            }
        }
    }

    /// Diferir el tramo de una salida de zona sin pórtico: se registra
    /// como peaje pendiente y el wallet no se toca.
    pub async fn defer_leg(
        &self,
        user_id: Uuid,
        journey_id: Option<Uuid>,
        leg_cost: Decimal,
        description: &str,
    ) -> Result<Transaction, AppError> {
        let repo = TransactionRepository::new(self.pool.clone());
        let tx = repo
            .insert(
                user_id,
                TransactionType::Toll,
                leg_cost,
                TransactionStatus::Pending,
                Some(description.to_string()),
                journey_id,
            )
            .await?;

        info!(
            "🕓 Peaje diferido: usuario {} debe {} (transacción {})",
            user_id, leg_cost, tx.id
        );
        Ok(tx)
    }

    /// Un intento de liquidación: todo dentro de una transacción SQL.
    /// Balance y pendientes se leen con lock de fila, el plan se calcula
    /// contra esos valores y las mutaciones se aplican antes del commit.
    async fn settle_attempt(
        &self,
        user_id: Uuid,
        journey_id: Option<Uuid>,
        leg_cost: Decimal,
        description: &str,
        settlement_key: &str,
    ) -> Result<SettlementOutcome, AppError> {
        let mut tx = self.pool.begin().await?;

        // Un intento anterior pudo confirmar justo cuando venció su
        // timeout; sus transacciones quedan bajo la clave y este
        // reintento solo reporta el estado actual, sin volver a cobrar
        let already = TransactionRepository::find_by_settlement_key(&mut tx, settlement_key).await?;
        if !already.is_empty() {
            let balance = WalletRepository::balance_for_update(&mut tx, user_id).await?;
            let pending = TransactionRepository::pending_tolls_for_update(&mut tx, user_id).await?;
            let pending_total: Decimal = pending.iter().map(|p| p.amount).sum();
            tx.commit().await?;

            warn!(
                "🔁 Liquidación '{}' ya confirmada por un intento anterior; no se recobra",
                settlement_key
            );
            return Ok(replay_outcome(&already, balance, pending_total));
        }

        let balance = WalletRepository::balance_for_update(&mut tx, user_id).await?;
        let pending = TransactionRepository::pending_tolls_for_update(&mut tx, user_id).await?;
        let pending_total: Decimal = pending.iter().map(|p| p.amount).sum();

        let entries: Vec<PendingEntry> = pending.iter().map(PendingEntry::from).collect();
        let plan = plan_gate_settlement(leg_cost, balance, &entries);

        // El plan garantiza deduct <= balance; la deducción reusa la
        // fila ya bloqueada
        let deduction = deduct_in_tx(&mut tx, user_id, plan.deduct).await?;
        let wallet_balance_after = deduction.new_balance;

        TransactionRepository::complete_pending_group(&mut tx, &plan.complete_prior).await?;

        let mut transaction_ids: Vec<Uuid> = plan.complete_prior.clone();
        if plan.leg_completed > Decimal::ZERO {
            let completed = TransactionRepository::insert_in_tx(
                &mut tx,
                user_id,
                TransactionType::Toll,
                plan.leg_completed,
                TransactionStatus::Completed,
                Some(description.to_string()),
                journey_id,
                Some(settlement_key.to_string()),
            )
            .await?;
            transaction_ids.push(completed.id);
        }
        if plan.leg_pending > Decimal::ZERO {
            let deferred = TransactionRepository::insert_in_tx(
                &mut tx,
                user_id,
                TransactionType::Toll,
                plan.leg_pending,
                TransactionStatus::Pending,
                Some(format!("{} (insufficient balance)", description)),
                journey_id,
                Some(settlement_key.to_string()),
            )
            .await?;
            transaction_ids.push(deferred.id);
        }

        tx.commit().await?;

        let pending_balance_after = if plan.complete_prior.is_empty() {
            pending_total + plan.leg_pending
        } else {
            plan.leg_pending
        };

        Ok(SettlementOutcome {
            amount_charged: plan.deduct,
            wallet_balance_after,
            pending_balance_after,
            cleared_all_pending: pending_balance_after == Decimal::ZERO,
            transaction_ids,
            degraded: false,
        })
    }

    /// Registro degradado tras agotar reintentos: una transacción failed
    /// deja rastro del intento y una pending preserva el monto del tramo.
    /// Best effort: si incluso esto falla, solo se loguea - la muestra
    /// GPS nunca se rechaza por el wallet.
    async fn record_degraded(
        &self,
        user_id: Uuid,
        journey_id: Option<Uuid>,
        leg_cost: Decimal,
        description: &str,
    ) -> Result<SettlementOutcome, AppError> {
        let repo = TransactionRepository::new(self.pool.clone());
        let mut transaction_ids = Vec::new();

        match repo
            .insert(
                user_id,
                TransactionType::Toll,
                leg_cost,
                TransactionStatus::Failed,
                Some(format!("{} (settlement failed)", description)),
                journey_id,
            )
            .await
        {
            Ok(tx) => transaction_ids.push(tx.id),
            Err(e) => warn!("⚠️ No se pudo registrar transacción failed: {}", e),
        }

        if leg_cost > Decimal::ZERO {
            match repo
                .insert(
                    user_id,
                    TransactionType::Toll,
                    leg_cost,
                    TransactionStatus::Pending,
                    Some(format!("{} (deferred after failure)", description)),
                    journey_id,
                )
                .await
            {
                Ok(tx) => transaction_ids.push(tx.id),
                Err(e) => warn!("⚠️ No se pudo preservar el peaje como pendiente: {}", e),
            }
        }

        let wallet_balance_after =
            WalletRepository::new(self.pool.clone()).get_balance(user_id).await.unwrap_or(Decimal::ZERO);
        let pending_balance_after =
            repo.sum_pending(user_id).await.unwrap_or(Decimal::ZERO);

        Ok(SettlementOutcome {
            amount_charged: Decimal::ZERO,
            wallet_balance_after,
            pending_balance_after,
            cleared_all_pending: false,
            transaction_ids,
            degraded: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    fn pending(amounts: &[&str]) -> Vec<PendingEntry> {
        amounts
            .iter()
            .map(|a| PendingEntry { id: Uuid::new_v4(), amount: d(a) })
            .collect()
    }

    #[test]
    fn test_gate_with_sufficient_balance_and_no_pending() {
        // 15.25 km a ₹8/km con ₹500 de saldo
        let plan = plan_gate_settlement(d("122"), d("500"), &[]);
        assert_eq!(plan.deduct, d("122"));
        assert!(plan.complete_prior.is_empty());
        assert_eq!(plan.leg_completed, d("122"));
        assert_eq!(plan.leg_pending, Decimal::ZERO);
        assert!(plan.cleared_all_pending());
    }

    #[test]
    fn test_gate_with_insufficient_balance_defers_shortfall() {
        // Saldo 50 contra tramo de 122: se cobran 50, quedan 72 pendientes
        let plan = plan_gate_settlement(d("122"), d("50"), &[]);
        assert_eq!(plan.deduct, d("50"));
        assert_eq!(plan.leg_completed, d("50"));
        assert_eq!(plan.leg_pending, d("72"));
        assert!(!plan.cleared_all_pending());
    }

    #[test]
    fn test_gate_clears_pending_group_when_balance_covers_total() {
        // Pendientes 72 + tramo 80 = 152 contra saldo 200
        let prior = pending(&["72"]);
        let plan = plan_gate_settlement(d("80"), d("200"), &prior);
        assert_eq!(plan.deduct, d("152"));
        assert_eq!(plan.complete_prior, vec![prior[0].id]);
        assert_eq!(plan.leg_completed, d("80"));
        assert_eq!(plan.leg_pending, Decimal::ZERO);
    }

    #[test]
    fn test_pending_group_is_all_or_nothing() {
        // Saldo 100 no cubre 80 + 72: los pendientes previos quedan
        // intactos aunque el saldo alcanzaría para algunos
        let prior = pending(&["30", "42"]);
        let plan = plan_gate_settlement(d("80"), d("100"), &prior);
        assert!(plan.complete_prior.is_empty());
        assert_eq!(plan.deduct, d("80"));
        assert_eq!(plan.leg_completed, d("80"));
        assert_eq!(plan.leg_pending, Decimal::ZERO);
    }

    #[test]
    fn test_zero_leg_gate_still_clears_pending() {
        // Pórtico sin viaje activo: tramo 0, solo se liquidan pendientes
        let prior = pending(&["24", "48"]);
        let plan = plan_gate_settlement(Decimal::ZERO, d("100"), &prior);
        assert_eq!(plan.deduct, d("72"));
        assert_eq!(plan.complete_prior.len(), 2);
        assert_eq!(plan.leg_completed, Decimal::ZERO);
        assert_eq!(plan.leg_pending, Decimal::ZERO);
    }

    #[test]
    fn test_zero_balance_defers_entire_leg() {
        let plan = plan_gate_settlement(d("122"), Decimal::ZERO, &[]);
        assert_eq!(plan.deduct, Decimal::ZERO);
        assert_eq!(plan.leg_completed, Decimal::ZERO);
        assert_eq!(plan.leg_pending, d("122"));
    }

    #[test]
    fn test_conservation_of_debt() {
        // leg + pendientes antes == deducido + pendientes después
        let cases = [
            (d("122"), d("500"), pending(&[])),
            (d("122"), d("50"), pending(&[])),
            (d("80"), d("200"), pending(&["72"])),
            (d("80"), d("100"), pending(&["30", "42"])),
            (Decimal::ZERO, d("10"), pending(&["24"])),
        ];
        for (leg, balance, prior) in cases {
            let pending_before: Decimal = prior.iter().map(|p| p.amount).sum();
            let plan = plan_gate_settlement(leg, balance, &prior);
            let pending_after = if plan.complete_prior.is_empty() {
                pending_before + plan.leg_pending
            } else {
                plan.leg_pending
            };
            assert_eq!(leg + pending_before, plan.deduct + pending_after);
        }
    }

    fn recorded(amount: &str, status: TransactionStatus, key: &str) -> Transaction {
        let now = chrono::Utc::now();
        Transaction {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            tx_type: TransactionType::Toll.as_str().to_string(),
            amount: d(amount),
            tx_status: status.as_str().to_string(),
            description: None,
            journey_id: None,
            settlement_key: Some(key.to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_replayed_settlement_reports_without_recharging() {
        // El primer intento confirmó 50 cobrados y 72 diferidos antes de
        // que su timeout se reportara; el reintento encuentra las filas
        // bajo la clave y solo reconstruye el resultado
        let key = "gate:a:1";
        let already = vec![
            recorded("50", TransactionStatus::Completed, key),
            recorded("72", TransactionStatus::Pending, key),
        ];
        let outcome = replay_outcome(&already, d("0"), d("72"));
        assert_eq!(outcome.amount_charged, d("50"));
        assert_eq!(outcome.pending_balance_after, d("72"));
        assert!(!outcome.cleared_all_pending);
        assert!(!outcome.degraded);
        assert_eq!(outcome.transaction_ids.len(), 2);
    }

    #[test]
    fn test_replayed_settlement_with_everything_charged() {
        let already = vec![recorded("122", TransactionStatus::Completed, "gate:b:1")];
        let outcome = replay_outcome(&already, d("378"), Decimal::ZERO);
        assert_eq!(outcome.amount_charged, d("122"));
        assert_eq!(outcome.wallet_balance_after, d("378"));
        assert!(outcome.cleared_all_pending);
    }

    #[test]
    fn test_deduction_never_exceeds_balance() {
        for (leg, balance, prior) in [
            (d("122"), d("50"), pending(&["999"])),
            (d("0.01"), Decimal::ZERO, pending(&[])),
            (d("500"), d("499.99"), pending(&[])),
        ] {
            let plan = plan_gate_settlement(leg, balance, &prior);
            assert!(plan.deduct <= balance.max(Decimal::ZERO));
        }
    }
}
