//! In-memory reward store with lifecycle transitions.

use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use fidelity_core::reward::{Reward, RewardStatus};
use fidelity_core::{FidelityError, FidelityResult};

/// Tally of rewards by lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub available: u64,
    pub redeemed: u64,
    pub expired: u64,
}

/// Concurrent reward collection. The store enforces the lifecycle —
/// `Available → Redeemed` via [`redeem`](RewardStore::redeem) and
/// `Available → Expired` via the periodic
/// [`expire_due`](RewardStore::expire_due) sweep — and rejects every
/// other transition.
#[derive(Debug, Default)]
pub struct RewardStore {
    rewards: DashMap<Uuid, Reward>,
}

impl RewardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, reward: Reward) {
        debug!(reward_id = %reward.id, client_id = %reward.client_id, "Reward stored");
        self.rewards.insert(reward.id, reward);
    }

    pub fn get(&self, id: Uuid) -> Option<Reward> {
        self.rewards.get(&id).map(|r| r.clone())
    }

    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// All rewards for a client, newest first.
    pub fn for_client(&self, client_id: &str) -> Vec<Reward> {
        let mut rewards: Vec<Reward> = self
            .rewards
            .iter()
            .filter(|r| r.client_id == client_id)
            .map(|r| r.clone())
            .collect();
        rewards.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rewards
    }

    /// Available rewards for a client, soonest expiry first.
    pub fn available_for_client(&self, client_id: &str) -> Vec<Reward> {
        let mut rewards: Vec<Reward> = self
            .rewards
            .iter()
            .filter(|r| r.client_id == client_id && r.is_available())
            .map(|r| r.clone())
            .collect();
        rewards.sort_by(|a, b| a.expires_at.cmp(&b.expires_at));
        rewards
    }

    /// Redeem a reward. Fails without state change unless the reward
    /// exists and is currently available.
    pub fn redeem(&self, id: Uuid, now: DateTime<Utc>) -> FidelityResult<Reward> {
        let mut entry = self
            .rewards
            .get_mut(&id)
            .ok_or_else(|| FidelityError::NotFound(format!("reward {id}")))?;

        if !entry.is_available() {
            return Err(FidelityError::RewardConflict {
                id,
                status: entry.status,
            });
        }

        entry.status = RewardStatus::Redeemed;
        entry.redeemed_at = Some(now);
        metrics::counter!("fidelity.rewards_redeemed").increment(1);
        info!(reward_id = %id, client_id = %entry.client_id, "Reward redeemed");
        Ok(entry.clone())
    }

    /// Expire every available reward strictly past its expiry date.
    /// Returns how many were expired. Meant to run from a periodic job;
    /// the evaluation engine never expires rewards inline.
    pub fn expire_due(&self, today: NaiveDate) -> usize {
        let mut expired = 0;
        for mut entry in self.rewards.iter_mut() {
            if entry.is_available() && entry.is_past_expiry(today) {
                entry.status = RewardStatus::Expired;
                expired += 1;
            }
        }
        if expired > 0 {
            metrics::counter!("fidelity.rewards_expired").increment(expired as u64);
            info!(count = expired, %today, "Expiry sweep completed");
        }
        expired
    }

    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for reward in self.rewards.iter() {
            match reward.status {
                RewardStatus::Available => counts.available += 1,
                RewardStatus::Redeemed => counts.redeemed += 1,
                RewardStatus::Expired => counts.expired += 1,
            }
        }
        counts
    }
}
