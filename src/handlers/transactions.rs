//! Console query surface: list, detail, today's stats, and the two-phase
//! confirmation endpoints.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::TransactionFilter;
use crate::domain::status::TrxStatus;
use crate::domain::transaction::{Transaction, TrxType};
use crate::error::AppError;
use crate::AppState;

const DEFAULT_PAGE_SIZE: i64 = 20;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListParams {
    /// Filter by direction: payin or payout.
    pub trx_type: Option<String>,
    /// Filter by canonical status code.
    pub status: Option<String>,
    /// Substring match on the transaction identifier.
    pub trx_id: Option<String>,
    /// Creation time lower bound, RFC 3339 or YYYY-MM-DD.
    pub from: Option<String>,
    /// Creation time upper bound, RFC 3339 or YYYY-MM-DD (whole day).
    pub to: Option<String>,
    /// 1-indexed page, default 1.
    pub page: Option<i64>,
    /// Page size, default 20, max 100.
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct StatsParams {
    /// Transaction type to aggregate, default payout.
    pub trx_type: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ConfirmRequest {
    /// Settlement reference issued by the banking/UPI channel.
    pub reference_id: String,
}

/// API representation of a transaction record.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionView {
    pub trx_id: String,
    pub trx_type: String,
    pub trx_method: Option<String>,
    pub trx_mode: Option<String>,
    pub amount: String,
    pub ccy: String,
    pub fee_amount: Option<String>,
    pub fee_ccy: Option<String>,
    pub status: String,
    pub status_name: String,
    pub status_color: String,
    pub channel_trx_id: Option<String>,
    pub reference_id: Option<String>,
    pub res_code: Option<String>,
    pub res_msg: Option<String>,
    pub reason: Option<String>,
    pub remark: Option<String>,
    pub country: Option<String>,
    #[schema(value_type = Object)]
    pub detail: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&Transaction> for TransactionView {
    fn from(tx: &Transaction) -> Self {
        TransactionView {
            trx_id: tx.trx_id.clone(),
            trx_type: tx.trx_type.as_str().to_string(),
            trx_method: tx.trx_method.clone(),
            trx_mode: tx.trx_mode.clone(),
            amount: tx.amount.to_string(),
            ccy: tx.ccy.clone(),
            fee_amount: tx.fee_amount.as_ref().map(|fee| fee.to_string()),
            fee_ccy: tx.fee_ccy.clone(),
            status: tx.status.as_str().to_string(),
            status_name: tx.status.display_name().to_string(),
            status_color: tx.status.color().as_str().to_string(),
            channel_trx_id: tx.channel_trx_id.clone(),
            reference_id: tx.reference_id.clone(),
            res_code: tx.res_code.clone(),
            res_msg: tx.res_msg.clone(),
            reason: tx.reason.clone(),
            remark: tx.remark.clone(),
            country: tx.country.clone(),
            detail: tx.detail.clone(),
            created_at: tx.created_at,
            updated_at: tx.updated_at,
            completed_at: tx.completed_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionListResponse {
    pub items: Vec<TransactionView>,
    pub total: i64,
    pub total_pages: i64,
    pub page: i64,
    pub page_size: i64,
}

pub(crate) fn parse_trx_type(raw: &str) -> Result<TrxType, AppError> {
    TrxType::parse(raw)
        .ok_or_else(|| AppError::Validation(format!("unknown trx_type '{}'", raw)))
}

fn parse_status(raw: &str) -> Result<TrxStatus, AppError> {
    TrxStatus::parse(raw)
        .ok_or_else(|| AppError::Validation(format!("unknown status code '{}'", raw)))
}

/// Parses a time bound, accepting RFC 3339 timestamps or bare dates. A bare
/// date used as an upper bound covers that whole day (exclusive next
/// midnight), matching the inclusive-from/exclusive-to filter contract.
fn parse_time_bound(raw: &str, upper: bool) -> Result<DateTime<Utc>, AppError> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let midnight = date.and_time(NaiveTime::MIN).and_utc();
        return Ok(if upper {
            midnight + Duration::days(1)
        } else {
            midnight
        });
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| AppError::Validation(format!("invalid timestamp '{}': {}", raw, err)))
}

pub(crate) fn build_filter(
    trx_type: &Option<String>,
    status: &Option<String>,
    trx_id: &Option<String>,
    from: &Option<String>,
    to: &Option<String>,
) -> Result<TransactionFilter, AppError> {
    let mut filter = TransactionFilter::default();
    if let Some(raw) = trx_type {
        filter.trx_type = Some(parse_trx_type(raw)?);
    }
    if let Some(raw) = status {
        filter.status = Some(parse_status(raw)?);
    }
    if let Some(needle) = trx_id {
        let needle = needle.trim();
        if !needle.is_empty() {
            filter.trx_id = Some(needle.to_string());
        }
    }
    if let Some(raw) = from {
        filter.created_from = Some(parse_time_bound(raw, false)?);
    }
    if let Some(raw) = to {
        filter.created_to = Some(parse_time_bound(raw, true)?);
    }
    Ok(filter)
}

#[utoipa::path(
    get,
    path = "/transactions",
    params(ListParams),
    responses(
        (status = 200, description = "One page of matching transactions", body = TransactionListResponse),
        (status = 400, description = "Invalid filter or pagination input")
    ),
    tag = "Transactions"
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = build_filter(
        &params.trx_type,
        &params.status,
        &params.trx_id,
        &params.from,
        &params.to,
    )?;
    let page = params.page.unwrap_or(1);
    let page_size = params.page_size.unwrap_or(DEFAULT_PAGE_SIZE);

    let result = state.store.query(&filter, page, page_size).await?;

    Ok(Json(TransactionListResponse {
        items: result.items.iter().map(TransactionView::from).collect(),
        total: result.total,
        total_pages: result.total_pages,
        page: result.page,
        page_size: result.page_size,
    }))
}

#[utoipa::path(
    get,
    path = "/transactions/{trx_id}",
    params(("trx_id" = String, Path, description = "Transaction identifier")),
    responses(
        (status = 200, description = "Transaction detail", body = TransactionView),
        (status = 404, description = "Unknown transaction")
    ),
    tag = "Transactions"
)]
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(trx_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let tx = state.store.get(&trx_id).await?;
    Ok(Json(TransactionView::from(&tx)))
}

#[utoipa::path(
    get,
    path = "/transactions/stats/today",
    params(StatsParams),
    responses(
        (status = 200, description = "Today's summary counters", body = crate::services::stats::DailyStats)
    ),
    tag = "Transactions"
)]
pub async fn today_stats(
    State(state): State<AppState>,
    Query(params): Query<StatsParams>,
) -> Result<impl IntoResponse, AppError> {
    let trx_type = match &params.trx_type {
        Some(raw) => parse_trx_type(raw)?,
        None => TrxType::Payout,
    };
    let stats = state.stats.today(trx_type).await?;
    Ok(Json(stats))
}

#[utoipa::path(
    post,
    path = "/transactions/{trx_id}/confirm/propose",
    params(("trx_id" = String, Path, description = "Transaction identifier")),
    request_body = ConfirmRequest,
    responses(
        (status = 200, description = "Review payload for the commit dialog", body = crate::services::confirmation::ConfirmationPreview),
        (status = 400, description = "Empty reference or non-payout transaction"),
        (status = 404, description = "Unknown transaction"),
        (status = 409, description = "Transaction no longer awaits confirmation")
    ),
    tag = "Transactions"
)]
pub async fn propose_confirmation(
    State(state): State<AppState>,
    Path(trx_id): Path<String>,
    Json(body): Json<ConfirmRequest>,
) -> Result<impl IntoResponse, AppError> {
    let preview = state.coordinator.propose(&trx_id, &body.reference_id).await?;
    Ok(Json(preview))
}

#[utoipa::path(
    post,
    path = "/transactions/{trx_id}/confirm",
    params(("trx_id" = String, Path, description = "Transaction identifier")),
    request_body = ConfirmRequest,
    responses(
        (status = 200, description = "Payout confirmed; record is terminal", body = TransactionView),
        (status = 400, description = "Empty reference or non-payout transaction"),
        (status = 404, description = "Unknown transaction"),
        (status = 409, description = "Status already advanced; re-fetch before deciding")
    ),
    tag = "Transactions"
)]
pub async fn commit_confirmation(
    State(state): State<AppState>,
    Path(trx_id): Path<String>,
    Json(body): Json<ConfirmRequest>,
) -> Result<impl IntoResponse, AppError> {
    let updated = state.coordinator.commit(&trx_id, &body.reference_id).await?;
    Ok(Json(TransactionView::from(&updated)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_dates_as_day_bounds() {
        let from = parse_time_bound("2026-08-07", false).unwrap();
        let to = parse_time_bound("2026-08-07", true).unwrap();
        assert_eq!(to - from, Duration::days(1));
        assert_eq!(from.to_rfc3339(), "2026-08-07T00:00:00+00:00");
    }

    #[test]
    fn parses_rfc3339_timestamps() {
        let ts = parse_time_bound("2026-08-07T12:30:00+05:30", false).unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-08-07T07:00:00+00:00");
    }

    #[test]
    fn rejects_garbage_timestamps() {
        assert!(parse_time_bound("not-a-date", false).is_err());
        assert!(parse_time_bound("07/08/2026", true).is_err());
    }

    #[test]
    fn filter_rejects_unknown_codes() {
        assert!(build_filter(&Some("sideways".into()), &None, &None, &None, &None).is_err());
        assert!(build_filter(&None, &Some("bogus".into()), &None, &None, &None).is_err());
    }

    #[test]
    fn filter_normalizes_inputs() {
        let filter = build_filter(
            &Some("PAYOUT".into()),
            &Some("Pending".into()),
            &Some("  T-1  ".into()),
            &None,
            &None,
        )
        .unwrap();
        assert_eq!(filter.trx_type, Some(TrxType::Payout));
        assert_eq!(filter.status, Some(TrxStatus::Pending));
        assert_eq!(filter.trx_id.as_deref(), Some("T-1"));
    }

    #[test]
    fn blank_search_terms_are_dropped() {
        let filter = build_filter(&None, &None, &Some("   ".into()), &None, &None).unwrap();
        assert!(filter.trx_id.is_none());
    }
}
