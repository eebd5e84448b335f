//! Daily statistics projection over the transaction store.
//!
//! A pure read-side view: recomputed on every query, never persisted. The
//! day boundary is the UTC calendar day, applied uniformly to all callers.

use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{Duration, NaiveTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::ports::{StatusBucket, TransactionStore};
use crate::domain::status::StatusGroup;
use crate::domain::transaction::TrxType;
use crate::error::AppError;

/// Summary counters for one day of one transaction type.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DailyStats {
    #[schema(value_type = String)]
    pub total_amount: BigDecimal,
    pub total_count: i64,
    pub success_count: i64,
    /// Percentage, rounded to two decimals; 0 when there are no records.
    pub success_rate: f64,
    pub pending_count: i64,
}

impl DailyStats {
    fn zero() -> Self {
        Self {
            total_amount: BigDecimal::from(0),
            total_count: 0,
            success_count: 0,
            success_rate: 0.0,
            pending_count: 0,
        }
    }
}

#[derive(Clone)]
pub struct StatsAggregator {
    store: Arc<dyn TransactionStore>,
}

impl StatsAggregator {
    pub fn new(store: Arc<dyn TransactionStore>) -> Self {
        Self { store }
    }

    /// Stats for records of `trx_type` created during the current UTC day.
    /// An empty result set yields all-zero stats, never an error.
    pub async fn today(&self, trx_type: TrxType) -> Result<DailyStats, AppError> {
        let day_start = Utc::now()
            .date_naive()
            .and_time(NaiveTime::MIN)
            .and_utc();
        let day_end = day_start + Duration::days(1);

        let buckets = self
            .store
            .status_breakdown(trx_type, day_start, day_end)
            .await?;
        Ok(fold(buckets))
    }
}

fn fold(buckets: Vec<StatusBucket>) -> DailyStats {
    let mut stats = DailyStats::zero();
    for bucket in buckets {
        stats.total_count += bucket.count;
        stats.total_amount = &stats.total_amount + &bucket.amount;
        match bucket.status.group() {
            StatusGroup::Success => stats.success_count += bucket.count,
            StatusGroup::Processing => stats.pending_count += bucket.count,
            _ => {}
        }
    }
    stats.success_rate = success_rate(stats.success_count, stats.total_count);
    stats
}

fn success_rate(success_count: i64, total_count: i64) -> f64 {
    if total_count == 0 {
        return 0.0;
    }
    let rate = success_count as f64 / total_count as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}
