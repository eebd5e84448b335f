//! Store port: the contract between the core and its persistence backends.
//!
//! The console, coordinator, and aggregator only ever talk to
//! [`TransactionStore`]; the Postgres adapter serves production and the
//! in-memory adapter serves tests and local demos.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::status::TrxStatus;
use super::transaction::{Transaction, TrxType, TrxUpdate};

/// Largest page a single query may request.
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    /// The optimistic guard rejected a transition, or a write-once field
    /// would have been overwritten. Callers must re-fetch and reassess.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Query filter. `trx_id` is a case-sensitive substring match; the creation
/// range is inclusive of `created_from` and exclusive of `created_to`.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub trx_type: Option<TrxType>,
    pub status: Option<TrxStatus>,
    pub trx_id: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

/// One page of query results, newest first.
#[derive(Debug, Clone)]
pub struct TransactionPage {
    pub items: Vec<Transaction>,
    pub total: i64,
    pub total_pages: i64,
    pub page: i64,
    pub page_size: i64,
}

/// Per-status rollup used by the stats projection.
#[derive(Debug, Clone)]
pub struct StatusBucket {
    pub status: TrxStatus,
    pub count: i64,
    pub amount: BigDecimal,
}

/// Shared pagination validation. Pages are 1-indexed.
pub fn validate_page_input(page: i64, page_size: i64) -> StoreResult<()> {
    if page < 1 {
        return Err(StoreError::InvalidInput(format!(
            "page must be >= 1, got {}",
            page
        )));
    }
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(StoreError::InvalidInput(format!(
            "page_size must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, page_size
        )));
    }
    Ok(())
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Inserts a new record. A duplicate `trx_id` is a conflict; identifiers
    /// are never reused.
    async fn insert(&self, tx: Transaction) -> StoreResult<Transaction>;

    async fn get(&self, trx_id: &str) -> StoreResult<Transaction>;

    /// Filtered, paginated query ordered by `created_at` descending. A page
    /// past the end returns an empty item list with the correct totals.
    async fn query(
        &self,
        filter: &TransactionFilter,
        page: i64,
        page_size: i64,
    ) -> StoreResult<TransactionPage>;

    /// The only mutation entry point. Atomically verifies the record exists
    /// and its status equals `expected`, then applies `new_status` and the
    /// accompanying fields. Transitions on the same `trx_id` are
    /// linearizable; reads of other records are not blocked.
    async fn transition(
        &self,
        trx_id: &str,
        expected: TrxStatus,
        new_status: TrxStatus,
        update: TrxUpdate,
    ) -> StoreResult<Transaction>;

    /// Per-status count and amount totals for records of `trx_type` created
    /// within `[from, to)`.
    async fn status_breakdown(
        &self,
        trx_type: TrxType,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<StatusBucket>>;

    /// Connectivity probe for health reporting.
    async fn ping(&self) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_pagination() {
        assert!(validate_page_input(0, 20).is_err());
        assert!(validate_page_input(-3, 20).is_err());
        assert!(validate_page_input(1, 0).is_err());
        assert!(validate_page_input(1, MAX_PAGE_SIZE + 1).is_err());
        assert!(validate_page_input(1, 1).is_ok());
        assert!(validate_page_input(7, MAX_PAGE_SIZE).is_ok());
    }
}
