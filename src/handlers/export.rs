//! CSV export of filtered transaction records.
//!
//! Pages through the store with the same filters the list endpoint takes
//! and renders the full result set as a CSV attachment.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

use crate::domain::transaction::Transaction;
use crate::error::AppError;
use crate::AppState;

use super::transactions::build_filter;

/// Batch size for paging through the store.
const EXPORT_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ExportParams {
    pub trx_type: Option<String>,
    pub status: Option<String>,
    pub trx_id: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Flat row shape for the CSV writer; optional fields render empty.
#[derive(Serialize)]
struct TransactionCsvRow {
    trx_id: String,
    trx_type: String,
    trx_method: String,
    amount: String,
    ccy: String,
    status: String,
    channel_trx_id: String,
    reference_id: String,
    created_at: String,
    updated_at: String,
    completed_at: String,
}

impl From<&Transaction> for TransactionCsvRow {
    fn from(tx: &Transaction) -> Self {
        TransactionCsvRow {
            trx_id: tx.trx_id.clone(),
            trx_type: tx.trx_type.as_str().to_string(),
            trx_method: tx.trx_method.clone().unwrap_or_default(),
            amount: tx.amount.to_string(),
            ccy: tx.ccy.clone(),
            status: tx.status.as_str().to_string(),
            channel_trx_id: tx.channel_trx_id.clone().unwrap_or_default(),
            reference_id: tx.reference_id.clone().unwrap_or_default(),
            created_at: tx.created_at.to_rfc3339(),
            updated_at: tx.updated_at.to_rfc3339(),
            completed_at: tx
                .completed_at
                .map(|ts| ts.to_rfc3339())
                .unwrap_or_default(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/transactions/export",
    params(ExportParams),
    responses(
        (status = 200, description = "CSV attachment of matching transactions", content_type = "text/csv"),
        (status = 400, description = "Invalid filter input")
    ),
    tag = "Transactions"
)]
pub async fn export_transactions(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> Result<Response, AppError> {
    let filter = build_filter(
        &params.trx_type,
        &params.status,
        &params.trx_id,
        &params.from,
        &params.to,
    )?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut page = 1;
    loop {
        let batch = state.store.query(&filter, page, EXPORT_PAGE_SIZE).await?;
        for tx in &batch.items {
            writer
                .serialize(TransactionCsvRow::from(tx))
                .map_err(|err| AppError::Internal(format!("csv write failed: {}", err)))?;
        }
        if page >= batch.total_pages {
            break;
        }
        page += 1;
    }

    let data = writer
        .into_inner()
        .map_err(|err| AppError::Internal(format!("csv flush failed: {}", err)))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"transactions.csv\"",
            ),
        ],
        data,
    )
        .into_response())
}
