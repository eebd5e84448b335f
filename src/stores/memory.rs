//! In-memory implementation of the TransactionStore port.
//!
//! Test double and local-demo backend. The whole record set sits behind one
//! RwLock; the write critical section only covers the lookup-check-apply of
//! a single record, so transitions stay linearizable per `trx_id` while
//! reads proceed concurrently the rest of the time.

use std::collections::HashMap;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::ports::{
    validate_page_input, StatusBucket, StoreError, StoreResult, TransactionFilter,
    TransactionPage, TransactionStore,
};
use crate::domain::status::TrxStatus;
use crate::domain::transaction::{Transaction, TrxType, TrxUpdate};

#[derive(Default)]
pub struct InMemoryTransactionStore {
    records: RwLock<HashMap<String, Transaction>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(filter: &TransactionFilter, tx: &Transaction) -> bool {
    if let Some(trx_type) = filter.trx_type {
        if tx.trx_type != trx_type {
            return false;
        }
    }
    if let Some(status) = filter.status {
        if tx.status != status {
            return false;
        }
    }
    if let Some(needle) = &filter.trx_id {
        if !tx.trx_id.contains(needle.as_str()) {
            return false;
        }
    }
    if let Some(from) = filter.created_from {
        if tx.created_at < from {
            return false;
        }
    }
    if let Some(to) = filter.created_to {
        if tx.created_at >= to {
            return false;
        }
    }
    true
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn insert(&self, tx: Transaction) -> StoreResult<Transaction> {
        let mut records = self.records.write().await;
        if records.contains_key(&tx.trx_id) {
            return Err(StoreError::Conflict(format!(
                "transaction {} already exists",
                tx.trx_id
            )));
        }
        records.insert(tx.trx_id.clone(), tx.clone());
        Ok(tx)
    }

    async fn get(&self, trx_id: &str) -> StoreResult<Transaction> {
        self.records
            .read()
            .await
            .get(trx_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("transaction {} not found", trx_id)))
    }

    async fn query(
        &self,
        filter: &TransactionFilter,
        page: i64,
        page_size: i64,
    ) -> StoreResult<TransactionPage> {
        validate_page_input(page, page_size)?;

        let records = self.records.read().await;
        let mut hits: Vec<&Transaction> =
            records.values().filter(|tx| matches(filter, tx)).collect();
        // Newest first; trx_id breaks ties so paging is deterministic.
        hits.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.trx_id.cmp(&b.trx_id))
        });

        let total = hits.len() as i64;
        let total_pages = (total + page_size - 1) / page_size;
        let offset = ((page - 1) * page_size) as usize;
        let items = hits
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .cloned()
            .collect();

        Ok(TransactionPage {
            items,
            total,
            total_pages,
            page,
            page_size,
        })
    }

    async fn transition(
        &self,
        trx_id: &str,
        expected: TrxStatus,
        new_status: TrxStatus,
        update: TrxUpdate,
    ) -> StoreResult<Transaction> {
        let mut records = self.records.write().await;
        let current = records
            .get(trx_id)
            .ok_or_else(|| StoreError::NotFound(format!("transaction {} not found", trx_id)))?;

        let updated = current.apply_transition(expected, new_status, &update, Utc::now())?;
        records.insert(trx_id.to_string(), updated.clone());

        tracing::debug!(
            trx_id,
            from = %expected,
            to = %new_status,
            "transaction transitioned"
        );
        Ok(updated)
    }

    async fn status_breakdown(
        &self,
        trx_type: TrxType,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<StatusBucket>> {
        let records = self.records.read().await;
        let mut buckets: HashMap<TrxStatus, (i64, BigDecimal)> = HashMap::new();
        for tx in records.values() {
            if tx.trx_type != trx_type || tx.created_at < from || tx.created_at >= to {
                continue;
            }
            let entry = buckets
                .entry(tx.status)
                .or_insert_with(|| (0, BigDecimal::from(0)));
            entry.0 += 1;
            entry.1 = entry.1.clone() + tx.amount.clone();
        }

        Ok(buckets
            .into_iter()
            .map(|(status, (count, amount))| StatusBucket {
                status,
                count,
                amount,
            })
            .collect())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
