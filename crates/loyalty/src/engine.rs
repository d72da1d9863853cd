//! Rule evaluation engine.
//!
//! Given one newly completed appointment and the client's ledger
//! snapshots from before and after it, decide which active fidelity
//! rules crossed their trigger threshold on exactly this appointment
//! and materialize one reward per crossing.
//!
//! Value and points triggers are one-shot edge-triggers: a rule fires
//! iff the threshold lies strictly above the `before` counter and at or
//! below the `after` counter, so a client whose lifetime counter is
//! already past the threshold never fires that rule again. The cyclic
//! view shown to clients lives in [`crate::progress`] and is not
//! authoritative.

use chrono::Days;
use tracing::{debug, warn};
use uuid::Uuid;

use fidelity_core::catalog::ServiceCatalog;
use fidelity_core::config::EngineConfig;
use fidelity_core::reward::{Reward, RewardStatus};
use fidelity_core::rules::{FidelityRule, RewardKind, RuleRecord, RuleTrigger};
use fidelity_core::types::{Appointment, ClientState, ServiceLine};

/// Everything one evaluation call needs. All borrowed, all immutable;
/// the engine holds no state between calls.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub appointment: &'a Appointment,
    pub before: &'a ClientState,
    pub after: &'a ClientState,
    /// The client's completed appointments prior to this one.
    pub prior_completed: &'a [Appointment],
    pub rules: &'a [RuleRecord],
}

/// Stateless rule evaluator.
pub struct FidelityEngine {
    config: EngineConfig,
}

impl FidelityEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Evaluate every active rule against one completed appointment.
    ///
    /// Inactive rules are ignored. Records that fail to compile are
    /// skipped with a warning; a bad rule never aborts the batch.
    /// Returns the rewards to persist, possibly empty, at most one per
    /// rule.
    pub fn evaluate(
        &self,
        ctx: &EvaluationContext<'_>,
        catalog: &impl ServiceCatalog,
    ) -> Vec<Reward> {
        let mut rewards = Vec::new();

        let prior: Vec<&Appointment> = ctx
            .prior_completed
            .iter()
            .filter(|a| a.client_id == ctx.appointment.client_id && a.is_completed())
            .collect();

        for record in ctx.rules {
            if !record.is_active {
                continue;
            }

            let rule = match record.compile(self.config.default_validity_days) {
                Ok(rule) => rule,
                Err(e) => {
                    metrics::counter!("fidelity.rules_skipped").increment(1);
                    warn!(rule_id = %record.id, error = %e, "Skipping malformed rule");
                    continue;
                }
            };

            if self.crosses(&rule, ctx, &prior, catalog) {
                let reward = build_reward(&rule, ctx.appointment);
                metrics::counter!("fidelity.rewards_issued").increment(1);
                debug!(
                    rule_id = %rule.id,
                    client_id = %ctx.appointment.client_id,
                    reward_id = %reward.id,
                    expires_at = %reward.expires_at,
                    "Rule crossed threshold, reward issued"
                );
                rewards.push(reward);
            }
        }

        rewards
    }

    /// Whether this appointment moved the relevant counter from below
    /// the rule's threshold to at-or-above it.
    fn crosses(
        &self,
        rule: &FidelityRule,
        ctx: &EvaluationContext<'_>,
        prior: &[&Appointment],
        catalog: &impl ServiceCatalog,
    ) -> bool {
        match &rule.trigger {
            RuleTrigger::ComboValue { threshold_cents } => {
                ctx.before.total_spent_cents < *threshold_cents
                    && *threshold_cents <= ctx.after.total_spent_cents
            }
            RuleTrigger::PointsConversion {
                threshold_points, ..
            } => {
                ctx.before.points_balance < *threshold_points
                    && *threshold_points <= ctx.after.points_balance
            }
            RuleTrigger::QuantityAccumulation {
                category_id,
                threshold_quantity,
            } => {
                let matches_before: u64 = prior
                    .iter()
                    .map(|a| count_category_matches(&a.services, category_id, catalog))
                    .sum();
                let matches_in_new =
                    count_category_matches(&ctx.appointment.services, category_id, catalog);
                matches_before < *threshold_quantity
                    && *threshold_quantity <= matches_before + matches_in_new
            }
            RuleTrigger::ServiceSpecific {
                service_id,
                service_name,
                threshold_quantity,
            } => {
                let matches_before: u64 = prior
                    .iter()
                    .map(|a| {
                        count_service_matches(
                            &a.services,
                            service_id.as_deref(),
                            service_name.as_deref(),
                            catalog,
                        )
                    })
                    .sum();
                let matches_in_new = count_service_matches(
                    &ctx.appointment.services,
                    service_id.as_deref(),
                    service_name.as_deref(),
                    catalog,
                );
                matches_before < *threshold_quantity
                    && *threshold_quantity <= matches_before + matches_in_new
            }
        }
    }
}

/// Services whose catalog category equals `category_id`. Names the
/// catalog does not know match nothing.
pub(crate) fn count_category_matches(
    services: &[ServiceLine],
    category_id: &str,
    catalog: &impl ServiceCatalog,
) -> u64 {
    services
        .iter()
        .filter(|s| catalog.resolve_category(&s.name) == Some(category_id))
        .count() as u64
}

/// Services matching one exact service: by catalog-resolved id, or by
/// literal name as a fallback for services predating the catalog.
pub(crate) fn count_service_matches(
    services: &[ServiceLine],
    service_id: Option<&str>,
    service_name: Option<&str>,
    catalog: &impl ServiceCatalog,
) -> u64 {
    services
        .iter()
        .filter(|s| {
            let by_id = service_id
                .is_some_and(|id| catalog.resolve_service_id(&s.name) == Some(id));
            let by_name = service_name.is_some_and(|name| s.name == name);
            by_id || by_name
        })
        .count() as u64
}

fn build_reward(rule: &FidelityRule, appointment: &Appointment) -> Reward {
    let expires_at = appointment
        .date
        .checked_add_days(Days::new(u64::from(rule.validity_days)))
        .unwrap_or(chrono::NaiveDate::MAX);

    let (title, value) = match &rule.trigger {
        RuleTrigger::PointsConversion { credit_cents, .. } => (
            format!("Crédito de R$ {:.2}", *credit_cents as f64 / 100.0),
            Some(*credit_cents),
        ),
        _ => {
            let title = rule
                .reward
                .service_name
                .clone()
                .unwrap_or_else(|| rule.name.clone());
            let value = match rule.reward.kind {
                RewardKind::Credit | RewardKind::DiscountFixed | RewardKind::DiscountPercent => {
                    rule.reward.value
                }
                RewardKind::FreeService => None,
            };
            (title, value)
        }
    };

    let service_name = match rule.reward.kind {
        RewardKind::FreeService => rule.reward.service_name.clone(),
        _ => None,
    };

    Reward {
        id: Uuid::new_v4(),
        client_id: appointment.client_id.clone(),
        rule_id: Some(rule.id.clone()),
        title,
        description: rule.description.clone(),
        kind: rule.reward.kind,
        value,
        service_name,
        status: RewardStatus::Available,
        expires_at,
        redeemed_at: None,
        created_at: appointment.date,
    }
}
