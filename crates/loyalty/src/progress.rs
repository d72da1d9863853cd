//! Progress toward the next reward, for display only.
//!
//! This read model is cyclic: it reports `current mod threshold`, so a
//! client who has already crossed a value threshold once sees a fresh
//! bar filling toward the next multiple. The engine's value and points
//! triggers are one-shot and will not fire again on that next multiple,
//! which makes this projection intentionally non-authoritative: never
//! derive issuance decisions from it.

use serde::Serialize;
use tracing::warn;

use fidelity_core::catalog::ServiceCatalog;
use fidelity_core::rules::{RuleRecord, RuleTrigger};
use fidelity_core::types::{Appointment, ClientState};

use crate::engine::{count_category_matches, count_service_matches};

/// Display row for one rule.
#[derive(Debug, Clone, Serialize)]
pub struct RuleProgress {
    pub rule_id: String,
    pub rule_name: String,
    /// Counter value within the current cycle.
    pub current: u64,
    pub threshold: u64,
    pub remaining: u64,
    /// `current / threshold`, in `[0.0, 1.0)`.
    pub fraction: f32,
}

/// Project a client's position against every active rule. Malformed
/// records are skipped, same as during evaluation.
pub fn project(
    rules: &[RuleRecord],
    state: &ClientState,
    prior_completed: &[Appointment],
    catalog: &impl ServiceCatalog,
    default_validity_days: u32,
) -> Vec<RuleProgress> {
    let mut rows = Vec::new();

    for record in rules {
        if !record.is_active {
            continue;
        }
        let rule = match record.compile(default_validity_days) {
            Ok(rule) => rule,
            Err(e) => {
                warn!(rule_id = %record.id, error = %e, "Skipping malformed rule in projection");
                continue;
            }
        };

        let (counter, threshold) = match &rule.trigger {
            RuleTrigger::ComboValue { threshold_cents } => {
                (state.total_spent_cents, *threshold_cents)
            }
            RuleTrigger::PointsConversion {
                threshold_points, ..
            } => (state.points_balance, *threshold_points),
            RuleTrigger::QuantityAccumulation {
                category_id,
                threshold_quantity,
            } => {
                let count: u64 = prior_completed
                    .iter()
                    .filter(|a| a.is_completed())
                    .map(|a| count_category_matches(&a.services, category_id, catalog))
                    .sum();
                (count, *threshold_quantity)
            }
            RuleTrigger::ServiceSpecific {
                service_id,
                service_name,
                threshold_quantity,
            } => {
                let count: u64 = prior_completed
                    .iter()
                    .filter(|a| a.is_completed())
                    .map(|a| {
                        count_service_matches(
                            &a.services,
                            service_id.as_deref(),
                            service_name.as_deref(),
                            catalog,
                        )
                    })
                    .sum();
                (count, *threshold_quantity)
            }
        };

        let current = counter % threshold;
        rows.push(RuleProgress {
            rule_id: rule.id,
            rule_name: rule.name,
            current,
            threshold,
            remaining: threshold - current,
            fraction: current as f32 / threshold as f32,
        });
    }

    rows
}
