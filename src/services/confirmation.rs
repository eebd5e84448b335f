//! Two-phase payout confirmation.
//!
//! Propose lets the operator review the transaction against the settlement
//! reference they typed; it never mutates. Commit is the single mutating
//! call and rides on the store's optimistic guard, so retrying it after a
//! transient failure cannot apply the payout twice: the second attempt
//! surfaces as a conflict the caller resolves by re-fetching the record.

use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::ports::TransactionStore;
use crate::domain::status::{StatusGroup, TrxStatus};
use crate::domain::transaction::{Transaction, TrxType, TrxUpdate};
use crate::error::AppError;

/// What the operator reviews before committing.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConfirmationPreview {
    pub trx_id: String,
    #[schema(value_type = String)]
    pub amount: bigdecimal::BigDecimal,
    pub ccy: String,
    pub trx_method: Option<String>,
    pub reference_id: String,
}

#[derive(Clone)]
pub struct ConfirmationCoordinator {
    store: Arc<dyn TransactionStore>,
}

impl ConfirmationCoordinator {
    pub fn new(store: Arc<dyn TransactionStore>) -> Self {
        Self { store }
    }

    fn normalize_reference(reference_id: &str) -> Result<String, AppError> {
        let trimmed = reference_id.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "reference_id must not be empty".to_string(),
            ));
        }
        Ok(trimmed.to_string())
    }

    fn require_payout(tx: &Transaction) -> Result<(), AppError> {
        if tx.trx_type != TrxType::Payout {
            return Err(AppError::Validation(format!(
                "transaction {} is a {}, only payouts can be confirmed",
                tx.trx_id, tx.trx_type
            )));
        }
        Ok(())
    }

    /// Phase one: validate the reference and return the review payload.
    /// Freely retryable or abandonable; no state is touched.
    pub async fn propose(
        &self,
        trx_id: &str,
        reference_id: &str,
    ) -> Result<ConfirmationPreview, AppError> {
        let reference = Self::normalize_reference(reference_id)?;
        let tx = self.store.get(trx_id).await?;
        Self::require_payout(&tx)?;
        if tx.status.group() != StatusGroup::Processing {
            return Err(AppError::Conflict(format!(
                "transaction {} is already {}",
                tx.trx_id, tx.status
            )));
        }

        Ok(ConfirmationPreview {
            trx_id: tx.trx_id,
            amount: tx.amount,
            ccy: tx.ccy,
            trx_method: tx.trx_method,
            reference_id: reference,
        })
    }

    /// Phase two: commit the settlement reference and finalize the payout.
    ///
    /// Runs `transition(expected = pending, new = success)`; a status that
    /// already advanced comes back as `Conflict` verbatim. The coordinator
    /// never retries on its own: the reference is irreversible once written,
    /// so retry-vs-abort is the caller's decision.
    pub async fn commit(&self, trx_id: &str, reference_id: &str) -> Result<Transaction, AppError> {
        let reference = Self::normalize_reference(reference_id)?;
        let tx = self.store.get(trx_id).await?;
        Self::require_payout(&tx)?;

        let update = TrxUpdate {
            reference_id: Some(reference.clone()),
            ..Default::default()
        };
        let updated = self
            .store
            .transition(trx_id, TrxStatus::Pending, TrxStatus::Success, update)
            .await?;

        tracing::info!(trx_id, reference = %reference, "payout confirmed");
        Ok(updated)
    }
}
