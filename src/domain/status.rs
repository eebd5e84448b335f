//! Canonical transaction status registry.
//!
//! Single source of truth for status codes, their display names, color
//! classification, and coarse grouping. Raw codes arriving from channels or
//! legacy records are normalized here, at the ingestion boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Canonical transaction lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrxStatus {
    Pending,
    Processing,
    Submitted,
    Confirming,
    Success,
    Completed,
    Failed,
    Cancelled,
    Expired,
}

/// Coarse status group used for aggregation and action gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusGroup {
    Processing,
    Success,
    Failed,
    Inactive,
}

/// Presentation color class for a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusColor {
    Success,
    Error,
    Warning,
    Processing,
    Info,
    Neutral,
}

/// All canonical statuses, in lifecycle order.
pub const ALL_STATUSES: [TrxStatus; 9] = [
    TrxStatus::Pending,
    TrxStatus::Processing,
    TrxStatus::Submitted,
    TrxStatus::Confirming,
    TrxStatus::Success,
    TrxStatus::Completed,
    TrxStatus::Failed,
    TrxStatus::Cancelled,
    TrxStatus::Expired,
];

impl TrxStatus {
    /// Canonical wire code.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrxStatus::Pending => "pending",
            TrxStatus::Processing => "processing",
            TrxStatus::Submitted => "submitted",
            TrxStatus::Confirming => "confirming",
            TrxStatus::Success => "success",
            TrxStatus::Completed => "completed",
            TrxStatus::Failed => "failed",
            TrxStatus::Cancelled => "cancelled",
            TrxStatus::Expired => "expired",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TrxStatus::Pending => "Pending",
            TrxStatus::Processing => "Processing",
            TrxStatus::Submitted => "Submitted",
            TrxStatus::Confirming => "Confirming",
            TrxStatus::Success => "Success",
            TrxStatus::Completed => "Completed",
            TrxStatus::Failed => "Failed",
            TrxStatus::Cancelled => "Cancelled",
            TrxStatus::Expired => "Expired",
        }
    }

    pub fn color(&self) -> StatusColor {
        match self {
            TrxStatus::Pending => StatusColor::Warning,
            TrxStatus::Processing | TrxStatus::Submitted | TrxStatus::Confirming => {
                StatusColor::Processing
            }
            TrxStatus::Success | TrxStatus::Completed => StatusColor::Success,
            TrxStatus::Failed => StatusColor::Error,
            TrxStatus::Cancelled | TrxStatus::Expired => StatusColor::Neutral,
        }
    }

    pub fn group(&self) -> StatusGroup {
        match self {
            TrxStatus::Pending
            | TrxStatus::Processing
            | TrxStatus::Submitted
            | TrxStatus::Confirming => StatusGroup::Processing,
            TrxStatus::Success | TrxStatus::Completed => StatusGroup::Success,
            TrxStatus::Failed => StatusGroup::Failed,
            TrxStatus::Cancelled | TrxStatus::Expired => StatusGroup::Inactive,
        }
    }

    /// Terminal statuses permit no further transitions.
    pub fn is_terminal(&self) -> bool {
        self.group() != StatusGroup::Processing
    }

    /// Normalizes a raw status code to its canonical form.
    ///
    /// Accepts the canonical codes case-insensitively plus the legacy
    /// synonyms still seen on channel callbacks: `canceled`, `complete`,
    /// and the numeric result codes `"1"` (success) / `"0"` (failed).
    /// Returns `None` for anything else.
    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(TrxStatus::Pending),
            "processing" => Some(TrxStatus::Processing),
            "submitted" => Some(TrxStatus::Submitted),
            "confirming" => Some(TrxStatus::Confirming),
            "success" | "1" => Some(TrxStatus::Success),
            "completed" | "complete" => Some(TrxStatus::Completed),
            "failed" | "0" => Some(TrxStatus::Failed),
            "cancelled" | "canceled" => Some(TrxStatus::Cancelled),
            "expired" => Some(TrxStatus::Expired),
            _ => None,
        }
    }

    /// Whether the state machine permits moving from `self` to `next`.
    ///
    /// `completed` is a legacy success code accepted at ingestion; it is
    /// never produced by a transition.
    pub fn can_transition_to(self, next: TrxStatus) -> bool {
        use TrxStatus::*;
        match (self, next) {
            (Pending, Processing | Submitted | Confirming) => true,
            (Pending, Success | Failed | Cancelled | Expired) => true,
            (Processing, Submitted | Confirming | Success | Failed) => true,
            (Submitted, Confirming | Success | Failed) => true,
            (Confirming, Success | Failed) => true,
            _ => false,
        }
    }
}

impl StatusColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusColor::Success => "success",
            StatusColor::Error => "error",
            StatusColor::Warning => "warning",
            StatusColor::Processing => "processing",
            StatusColor::Info => "info",
            StatusColor::Neutral => "neutral",
        }
    }
}

impl fmt::Display for TrxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrxStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TrxStatus::parse(s).ok_or_else(|| format!("unknown status code '{}'", s))
    }
}

impl Serialize for TrxStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TrxStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Display name for a raw code; unknown codes fall back to the code itself.
pub fn display_name_for(code: &str) -> String {
    match TrxStatus::parse(code) {
        Some(status) => status.display_name().to_string(),
        None => code.to_string(),
    }
}

/// Color class for a raw code; unknown codes render neutral.
pub fn color_for(code: &str) -> StatusColor {
    TrxStatus::parse(code).map_or(StatusColor::Neutral, |s| s.color())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_is_never_empty() {
        for status in ALL_STATUSES {
            assert!(!status.display_name().is_empty());
            assert!(!status.as_str().is_empty());
        }
    }

    #[test]
    fn every_status_belongs_to_a_group() {
        assert_eq!(TrxStatus::Pending.group(), StatusGroup::Processing);
        assert_eq!(TrxStatus::Confirming.group(), StatusGroup::Processing);
        assert_eq!(TrxStatus::Success.group(), StatusGroup::Success);
        assert_eq!(TrxStatus::Completed.group(), StatusGroup::Success);
        assert_eq!(TrxStatus::Failed.group(), StatusGroup::Failed);
        assert_eq!(TrxStatus::Cancelled.group(), StatusGroup::Inactive);
        assert_eq!(TrxStatus::Expired.group(), StatusGroup::Inactive);
    }

    #[test]
    fn parse_normalizes_case_and_synonyms() {
        assert_eq!(TrxStatus::parse("PENDING"), Some(TrxStatus::Pending));
        assert_eq!(TrxStatus::parse(" Success "), Some(TrxStatus::Success));
        assert_eq!(TrxStatus::parse("canceled"), Some(TrxStatus::Cancelled));
        assert_eq!(TrxStatus::parse("complete"), Some(TrxStatus::Completed));
        assert_eq!(TrxStatus::parse("1"), Some(TrxStatus::Success));
        assert_eq!(TrxStatus::parse("0"), Some(TrxStatus::Failed));
        assert_eq!(TrxStatus::parse("bogus"), None);
    }

    #[test]
    fn roundtrips_through_canonical_code() {
        for status in ALL_STATUSES {
            assert_eq!(TrxStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn unknown_codes_fall_back_to_raw_display() {
        assert_eq!(display_name_for("pending"), "Pending");
        assert_eq!(display_name_for("weird-legacy-code"), "weird-legacy-code");
        assert_eq!(color_for("weird-legacy-code"), StatusColor::Neutral);
    }

    #[test]
    fn terminal_statuses_have_no_outgoing_transitions() {
        for status in ALL_STATUSES.into_iter().filter(|s| s.is_terminal()) {
            for next in ALL_STATUSES {
                assert!(
                    !status.can_transition_to(next),
                    "{} -> {} should be rejected",
                    status,
                    next
                );
            }
        }
    }

    #[test]
    fn pending_can_reach_every_outcome() {
        assert!(TrxStatus::Pending.can_transition_to(TrxStatus::Success));
        assert!(TrxStatus::Pending.can_transition_to(TrxStatus::Failed));
        assert!(TrxStatus::Pending.can_transition_to(TrxStatus::Cancelled));
        assert!(TrxStatus::Pending.can_transition_to(TrxStatus::Expired));
        assert!(TrxStatus::Pending.can_transition_to(TrxStatus::Processing));
    }

    #[test]
    fn in_flight_statuses_only_move_forward() {
        assert!(TrxStatus::Processing.can_transition_to(TrxStatus::Success));
        assert!(TrxStatus::Confirming.can_transition_to(TrxStatus::Failed));
        assert!(!TrxStatus::Processing.can_transition_to(TrxStatus::Pending));
        assert!(!TrxStatus::Confirming.can_transition_to(TrxStatus::Submitted));
        assert!(!TrxStatus::Processing.can_transition_to(TrxStatus::Cancelled));
        // completed is never a transition target
        assert!(!TrxStatus::Pending.can_transition_to(TrxStatus::Completed));
    }

    #[test]
    fn serde_uses_canonical_codes() {
        let json = serde_json::to_string(&TrxStatus::Confirming).unwrap();
        assert_eq!(json, r#""confirming""#);
        let back: TrxStatus = serde_json::from_str(r#""CANCELLED""#).unwrap();
        assert_eq!(back, TrxStatus::Cancelled);
        assert!(serde_json::from_str::<TrxStatus>(r#""nope""#).is_err());
    }
}
