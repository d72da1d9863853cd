//! Issued rewards and their lifecycle.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rules::RewardKind;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RewardStatus {
    Available,
    Redeemed,
    Expired,
}

/// A one-time benefit issued to a single client by a single rule
/// crossing (or by manual staff action, in which case `rule_id` is
/// absent). Legal transitions: `Available → Redeemed` and
/// `Available → Expired`; both are terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reward {
    pub id: Uuid,
    pub client_id: String,
    #[serde(default)]
    pub rule_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: RewardKind,
    /// Cents for `Credit`/`DiscountFixed`, a percentage for
    /// `DiscountPercent`; absent for `FreeService`.
    #[serde(default)]
    pub value: Option<u64>,
    /// Present only for `FreeService`.
    #[serde(default)]
    pub service_name: Option<String>,
    pub status: RewardStatus,
    pub expires_at: NaiveDate,
    #[serde(default)]
    pub redeemed_at: Option<DateTime<Utc>>,
    pub created_at: NaiveDate,
}

impl Reward {
    pub fn is_available(&self) -> bool {
        self.status == RewardStatus::Available
    }

    /// Whether the expiry sweep should pick this reward up on `today`.
    pub fn is_past_expiry(&self, today: NaiveDate) -> bool {
        self.expires_at < today
    }
}
