//! Transaction domain entity and lifecycle rules.
//!
//! The entity is framework-agnostic; adapters map it to their own row types.
//! All state changes funnel through [`Transaction::apply_transition`], which
//! enforces the optimistic-concurrency guard and the write-once fields.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::ports::StoreError;
use super::status::TrxStatus;

/// Direction of a transaction: inbound collection or outbound disbursement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrxType {
    Payin,
    Payout,
}

impl TrxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrxType::Payin => "payin",
            TrxType::Payout => "payout",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "payin" => Some(TrxType::Payin),
            "payout" => Some(TrxType::Payout),
            _ => None,
        }
    }
}

impl std::fmt::Display for TrxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TrxType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TrxType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TrxType::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown trx_type '{}'", raw)))
    }
}

/// A payout/payin transaction record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub trx_id: String,
    pub trx_type: TrxType,
    pub trx_method: Option<String>,
    pub trx_mode: Option<String>,
    pub amount: BigDecimal,
    pub ccy: String,
    pub fee_amount: Option<BigDecimal>,
    pub fee_ccy: Option<String>,
    pub status: TrxStatus,
    /// Provider-side identifier, set by the channel.
    pub channel_trx_id: Option<String>,
    /// Settlement reference (flow no). Written exactly once, via confirmation.
    pub reference_id: Option<String>,
    pub res_code: Option<String>,
    pub res_msg: Option<String>,
    pub reason: Option<String>,
    pub remark: Option<String>,
    pub country: Option<String>,
    /// Structured diagnostic payload, opaque to the core.
    pub detail: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set iff the status is terminal.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn new(
        trx_id: impl Into<String>,
        trx_type: TrxType,
        amount: BigDecimal,
        ccy: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            trx_id: trx_id.into(),
            trx_type,
            trx_method: None,
            trx_mode: None,
            amount,
            ccy: ccy.into(),
            fee_amount: None,
            fee_ccy: None,
            status: TrxStatus::Pending,
            channel_trx_id: None,
            reference_id: None,
            res_code: None,
            res_msg: None,
            reason: None,
            remark: None,
            country: None,
            detail: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Applies a guarded state transition, returning the updated record.
    ///
    /// Fails with `Conflict` when the current status does not match
    /// `expected`, when the state machine forbids `expected -> new_status`,
    /// or when the update would overwrite an already-recorded settlement
    /// reference. Diagnostic fields are written once and kept afterwards.
    pub fn apply_transition(
        &self,
        expected: TrxStatus,
        new_status: TrxStatus,
        update: &TrxUpdate,
        now: DateTime<Utc>,
    ) -> Result<Transaction, StoreError> {
        if self.status != expected {
            return Err(StoreError::Conflict(format!(
                "transaction {} is {}, expected {}",
                self.trx_id, self.status, expected
            )));
        }
        if !expected.can_transition_to(new_status) {
            return Err(StoreError::Conflict(format!(
                "transaction {} cannot move from {} to {}",
                self.trx_id, expected, new_status
            )));
        }

        let mut next = self.clone();

        if let Some(reference) = &update.reference_id {
            match &next.reference_id {
                Some(existing) if existing != reference => {
                    return Err(StoreError::Conflict(format!(
                        "transaction {} already carries settlement reference {}",
                        self.trx_id, existing
                    )));
                }
                _ => next.reference_id = Some(reference.clone()),
            }
        }
        set_once(&mut next.channel_trx_id, &update.channel_trx_id);
        set_once(&mut next.res_code, &update.res_code);
        set_once(&mut next.res_msg, &update.res_msg);
        set_once(&mut next.reason, &update.reason);

        next.status = new_status;
        next.updated_at = now;
        if new_status.is_terminal() {
            next.completed_at = Some(now);
        }

        Ok(next)
    }
}

fn set_once(slot: &mut Option<String>, value: &Option<String>) {
    if slot.is_none() {
        if let Some(v) = value {
            *slot = Some(v.clone());
        }
    }
}

/// Field updates accompanying a state transition.
#[derive(Debug, Clone, Default)]
pub struct TrxUpdate {
    pub reference_id: Option<String>,
    pub channel_trx_id: Option<String>,
    pub res_code: Option<String>,
    pub res_msg: Option<String>,
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn payout(status: TrxStatus) -> Transaction {
        let mut tx = Transaction::new(
            "T-1",
            TrxType::Payout,
            BigDecimal::from_str("1000.00").unwrap(),
            "INR",
        );
        tx.status = status;
        tx
    }

    #[test]
    fn transition_rejects_stale_expected_status() {
        let tx = payout(TrxStatus::Processing);
        let err = tx
            .apply_transition(
                TrxStatus::Pending,
                TrxStatus::Success,
                &TrxUpdate::default(),
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn transition_rejects_terminal_source_even_when_expected_matches() {
        let tx = payout(TrxStatus::Success);
        let err = tx
            .apply_transition(
                TrxStatus::Success,
                TrxStatus::Failed,
                &TrxUpdate::default(),
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn successful_confirm_stamps_reference_and_completion() {
        let tx = payout(TrxStatus::Pending);
        let update = TrxUpdate {
            reference_id: Some("REF123".to_string()),
            ..Default::default()
        };
        let now = Utc::now();
        let updated = tx
            .apply_transition(TrxStatus::Pending, TrxStatus::Success, &update, now)
            .unwrap();

        assert_eq!(updated.status, TrxStatus::Success);
        assert_eq!(updated.reference_id.as_deref(), Some("REF123"));
        assert_eq!(updated.completed_at, Some(now));
        assert_eq!(updated.updated_at, now);
        assert!(updated.updated_at >= updated.created_at);
    }

    #[test]
    fn settlement_reference_is_write_once() {
        let mut tx = payout(TrxStatus::Pending);
        tx.reference_id = Some("REF123".to_string());

        let update = TrxUpdate {
            reference_id: Some("REF456".to_string()),
            ..Default::default()
        };
        let err = tx
            .apply_transition(TrxStatus::Pending, TrxStatus::Success, &update, Utc::now())
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(tx.reference_id.as_deref(), Some("REF123"));
    }

    #[test]
    fn rewriting_the_same_reference_is_a_no_op() {
        let mut tx = payout(TrxStatus::Pending);
        tx.reference_id = Some("REF123".to_string());

        let update = TrxUpdate {
            reference_id: Some("REF123".to_string()),
            ..Default::default()
        };
        let updated = tx
            .apply_transition(TrxStatus::Pending, TrxStatus::Success, &update, Utc::now())
            .unwrap();
        assert_eq!(updated.reference_id.as_deref(), Some("REF123"));
    }

    #[test]
    fn diagnostic_fields_are_kept_once_populated() {
        let tx = payout(TrxStatus::Pending);
        let first = TrxUpdate {
            res_code: Some("0000".to_string()),
            res_msg: Some("accepted".to_string()),
            ..Default::default()
        };
        let mid = tx
            .apply_transition(TrxStatus::Pending, TrxStatus::Processing, &first, Utc::now())
            .unwrap();
        assert_eq!(mid.res_code.as_deref(), Some("0000"));
        assert!(mid.completed_at.is_none());

        let second = TrxUpdate {
            res_code: Some("9999".to_string()),
            reason: Some("channel timeout".to_string()),
            ..Default::default()
        };
        let done = mid
            .apply_transition(
                TrxStatus::Processing,
                TrxStatus::Failed,
                &second,
                Utc::now(),
            )
            .unwrap();
        assert_eq!(done.res_code.as_deref(), Some("0000"));
        assert_eq!(done.reason.as_deref(), Some("channel timeout"));
        assert!(done.completed_at.is_some());
    }

    #[test]
    fn intermediate_transition_leaves_completed_at_unset() {
        let tx = payout(TrxStatus::Pending);
        let updated = tx
            .apply_transition(
                TrxStatus::Pending,
                TrxStatus::Submitted,
                &TrxUpdate::default(),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(updated.status, TrxStatus::Submitted);
        assert!(updated.completed_at.is_none());
    }
}
