//! Postgres implementation of the TransactionStore port.
//!
//! Transitions run inside a database transaction with `SELECT ... FOR
//! UPDATE`, so concurrent commits for the same `trx_id` serialize on the row
//! lock and the second one fails the optimistic guard instead of
//! double-applying.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use crate::domain::ports::{
    validate_page_input, StatusBucket, StoreError, StoreResult, TransactionFilter,
    TransactionPage, TransactionStore,
};
use crate::domain::status::TrxStatus;
use crate::domain::transaction::{Transaction, TrxType, TrxUpdate};

const SELECT_COLUMNS: &str = "trx_id, trx_type, trx_method, trx_mode, amount, ccy, \
     fee_amount, fee_ccy, status, channel_trx_id, reference_id, res_code, res_msg, \
     reason, remark, country, detail, created_at, updated_at, completed_at";

#[derive(Clone)]
pub struct PostgresTransactionStore {
    pool: PgPool,
}

impl PostgresTransactionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_sqlx(err: sqlx::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &TransactionFilter) {
    builder.push(" WHERE 1 = 1");
    if let Some(trx_type) = filter.trx_type {
        builder.push(" AND trx_type = ").push_bind(trx_type.as_str());
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(needle) = &filter.trx_id {
        builder
            .push(" AND trx_id LIKE ")
            .push_bind(format!("%{}%", needle));
    }
    if let Some(from) = filter.created_from {
        builder.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.created_to {
        builder.push(" AND created_at < ").push_bind(to);
    }
}

#[async_trait]
impl TransactionStore for PostgresTransactionStore {
    async fn insert(&self, tx: Transaction) -> StoreResult<Transaction> {
        let result = sqlx::query(
            r#"
            INSERT INTO transactions (
                trx_id, trx_type, trx_method, trx_mode, amount, ccy,
                fee_amount, fee_ccy, status, channel_trx_id, reference_id,
                res_code, res_msg, reason, remark, country, detail,
                created_at, updated_at, completed_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20
            )
            "#,
        )
        .bind(&tx.trx_id)
        .bind(tx.trx_type.as_str())
        .bind(&tx.trx_method)
        .bind(&tx.trx_mode)
        .bind(&tx.amount)
        .bind(&tx.ccy)
        .bind(&tx.fee_amount)
        .bind(&tx.fee_ccy)
        .bind(tx.status.as_str())
        .bind(&tx.channel_trx_id)
        .bind(&tx.reference_id)
        .bind(&tx.res_code)
        .bind(&tx.res_msg)
        .bind(&tx.reason)
        .bind(&tx.remark)
        .bind(&tx.country)
        .bind(&tx.detail)
        .bind(tx.created_at)
        .bind(tx.updated_at)
        .bind(tx.completed_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(tx),
            Err(sqlx::Error::Database(db)) if db.code().as_deref() == Some("23505") => Err(
                StoreError::Conflict(format!("transaction {} already exists", tx.trx_id)),
            ),
            Err(err) => Err(map_sqlx(err)),
        }
    }

    async fn get(&self, trx_id: &str) -> StoreResult<Transaction> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {} FROM transactions WHERE trx_id = $1",
            SELECT_COLUMNS
        ))
        .bind(trx_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        match row {
            Some(row) => row.into_domain(),
            None => Err(StoreError::NotFound(format!(
                "transaction {} not found",
                trx_id
            ))),
        }
    }

    async fn query(
        &self,
        filter: &TransactionFilter,
        page: i64,
        page_size: i64,
    ) -> StoreResult<TransactionPage> {
        validate_page_input(page, page_size)?;

        let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM transactions");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?;

        let mut data_query =
            QueryBuilder::new(format!("SELECT {} FROM transactions", SELECT_COLUMNS));
        push_filters(&mut data_query, filter);
        data_query
            .push(" ORDER BY created_at DESC, trx_id ASC LIMIT ")
            .push_bind(page_size)
            .push(" OFFSET ")
            .push_bind((page - 1) * page_size);
        let rows: Vec<TransactionRow> = data_query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        let items = rows
            .into_iter()
            .map(|row| row.into_domain())
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(TransactionPage {
            items,
            total,
            total_pages: (total + page_size - 1) / page_size,
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
        let mut db_tx = self.pool.begin().await.map_err(map_sqlx)?;

        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {} FROM transactions WHERE trx_id = $1 FOR UPDATE",
            SELECT_COLUMNS
        ))
        .bind(trx_id)
        .fetch_optional(&mut *db_tx)
        .await
        .map_err(map_sqlx)?;

        let current = match row {
            Some(row) => row.into_domain()?,
            None => {
                return Err(StoreError::NotFound(format!(
                    "transaction {} not found",
                    trx_id
                )))
            }
        };

        // Dropping db_tx on the error path rolls the row lock back.
        let updated = current.apply_transition(expected, new_status, &update, Utc::now())?;

        sqlx::query(
            r#"
            UPDATE transactions SET
                status = $2, channel_trx_id = $3, reference_id = $4,
                res_code = $5, res_msg = $6, reason = $7,
                updated_at = $8, completed_at = $9
            WHERE trx_id = $1
            "#,
        )
        .bind(&updated.trx_id)
        .bind(updated.status.as_str())
        .bind(&updated.channel_trx_id)
        .bind(&updated.reference_id)
        .bind(&updated.res_code)
        .bind(&updated.res_msg)
        .bind(&updated.reason)
        .bind(updated.updated_at)
        .bind(updated.completed_at)
        .execute(&mut *db_tx)
        .await
        .map_err(map_sqlx)?;

        db_tx.commit().await.map_err(map_sqlx)?;

        tracing::info!(
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
        let rows = sqlx::query(
            r#"
            SELECT status, COUNT(*) AS count, COALESCE(SUM(amount), 0) AS amount
            FROM transactions
            WHERE trx_type = $1 AND created_at >= $2 AND created_at < $3
            GROUP BY status
            "#,
        )
        .bind(trx_type.as_str())
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        rows.into_iter()
            .map(|row| {
                let code: String = row.get("status");
                let status = parse_stored_status(&code)?;
                Ok(StatusBucket {
                    status,
                    count: row.get::<i64, _>("count"),
                    amount: row.get::<BigDecimal, _>("amount"),
                })
            })
            .collect()
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(map_sqlx)
    }
}

fn parse_stored_status(code: &str) -> StoreResult<TrxStatus> {
    TrxStatus::parse(code).ok_or_else(|| {
        StoreError::Unavailable(format!("stored status code '{}' is not canonical", code))
    })
}

/// Internal row type for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    trx_id: String,
    trx_type: String,
    trx_method: Option<String>,
    trx_mode: Option<String>,
    amount: BigDecimal,
    ccy: String,
    fee_amount: Option<BigDecimal>,
    fee_ccy: Option<String>,
    status: String,
    channel_trx_id: Option<String>,
    reference_id: Option<String>,
    res_code: Option<String>,
    res_msg: Option<String>,
    reason: Option<String>,
    remark: Option<String>,
    country: Option<String>,
    detail: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TransactionRow {
    fn into_domain(self) -> StoreResult<Transaction> {
        let status = parse_stored_status(&self.status)?;
        let trx_type = TrxType::parse(&self.trx_type).ok_or_else(|| {
            StoreError::Unavailable(format!(
                "stored trx_type '{}' is not canonical",
                self.trx_type
            ))
        })?;

        Ok(Transaction {
            trx_id: self.trx_id,
            trx_type,
            trx_method: self.trx_method,
            trx_mode: self.trx_mode,
            amount: self.amount,
            ccy: self.ccy,
            fee_amount: self.fee_amount,
            fee_ccy: self.fee_ccy,
            status,
            channel_trx_id: self.channel_trx_id,
            reference_id: self.reference_id,
            res_code: self.res_code,
            res_msg: self.res_msg,
            reason: self.reason,
            remark: self.remark,
            country: self.country,
            detail: self.detail,
            created_at: self.created_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
        })
    }
}
