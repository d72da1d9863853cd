//! Booking pipeline: the serialization boundary around the engine.
//!
//! The engine itself is pure; the correctness hazard is two bookings
//! for the same client racing through "read ledger → evaluate → write"
//! on the same `before` snapshot and double-issuing a crossing. The
//! pipeline closes that window with a per-client mutex held across the
//! whole unit, so ledger update, evaluation, and persistence of the
//! appointment, client, and rewards commit together or not at all.

use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

use fidelity_core::catalog::ServiceCatalog;
use fidelity_core::config::EngineConfig;
use fidelity_core::reward::Reward;
use fidelity_core::rules::RuleRecord;
use fidelity_core::types::{Appointment, Client, ClientState, ServiceLine};
use fidelity_core::{FidelityError, FidelityResult};
use fidelity_loyalty::{apply_completed, EvaluationContext, FidelityEngine};

use crate::store::RewardStore;

/// What one completed booking produced.
#[derive(Debug, Clone)]
pub struct BookingOutcome {
    pub appointment: Appointment,
    pub new_rewards: Vec<Reward>,
    pub state_after: ClientState,
}

/// Owns clients, appointment history, rules, and rewards, and runs the
/// booking flow under per-client serialization.
pub struct BookingPipeline<C: ServiceCatalog> {
    engine: FidelityEngine,
    catalog: C,
    rules: RwLock<Vec<RuleRecord>>,
    clients: DashMap<String, Client>,
    history: DashMap<String, Vec<Appointment>>,
    rewards: RewardStore,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl<C: ServiceCatalog> BookingPipeline<C> {
    pub fn new(config: &EngineConfig, catalog: C, rules: Vec<RuleRecord>) -> Self {
        Self {
            engine: FidelityEngine::new(config),
            catalog,
            rules: RwLock::new(rules),
            clients: DashMap::new(),
            history: DashMap::new(),
            rewards: RewardStore::new(),
            locks: DashMap::new(),
        }
    }

    /// Replace the configured rules (staff edits take effect on the
    /// next booking).
    pub fn set_rules(&self, rules: Vec<RuleRecord>) {
        *self.rules.write() = rules;
    }

    pub fn register_client(&self, client: Client) {
        info!(client_id = %client.id, "Client registered");
        self.clients.insert(client.id.clone(), client);
    }

    /// Soft deactivation; the record and its history stay.
    pub fn deactivate_client(&self, client_id: &str) -> FidelityResult<()> {
        let mut client = self
            .clients
            .get_mut(client_id)
            .ok_or_else(|| FidelityError::NotFound(format!("client {client_id}")))?;
        client.is_active = false;
        Ok(())
    }

    pub fn client(&self, client_id: &str) -> Option<Client> {
        self.clients.get(client_id).map(|c| c.clone())
    }

    pub fn client_appointments(&self, client_id: &str) -> Vec<Appointment> {
        self.history
            .get(client_id)
            .map(|h| h.clone())
            .unwrap_or_default()
    }

    pub fn rewards(&self) -> &RewardStore {
        &self.rewards
    }

    /// Run one completed appointment through ledger update, rule
    /// evaluation, and persistence as a single serialized unit.
    pub fn complete_appointment(
        &self,
        client_id: &str,
        professional_id: &str,
        date: NaiveDate,
        services: Vec<ServiceLine>,
    ) -> FidelityResult<BookingOutcome> {
        let lock = self
            .locks
            .entry(client_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock();

        let before = {
            let client = self
                .clients
                .get(client_id)
                .ok_or_else(|| FidelityError::NotFound(format!("client {client_id}")))?;
            if !client.is_active {
                return Err(FidelityError::InactiveClient(client_id.to_string()));
            }
            client.ledger_state()
        };

        let appointment = Appointment::completed(
            Uuid::new_v4().to_string(),
            client_id,
            professional_id,
            date,
            services,
        );
        let after = apply_completed(&before, &appointment);

        let prior = self.client_appointments(client_id);
        let rules = self.rules.read().clone();
        let new_rewards = self.engine.evaluate(
            &EvaluationContext {
                appointment: &appointment,
                before: &before,
                after: &after,
                prior_completed: &prior,
                rules: &rules,
            },
            &self.catalog,
        );

        // Persist while still holding the client lock. The ledger write
        // re-checks the client so a concurrent deactivation cannot be
        // silently overwritten half-way.
        {
            let mut client = self
                .clients
                .get_mut(client_id)
                .ok_or_else(|| FidelityError::Persistence(format!("client {client_id} vanished")))?;
            client.apply_state(&after);
        }
        self.history
            .entry(client_id.to_string())
            .or_default()
            .push(appointment.clone());
        for reward in &new_rewards {
            self.rewards.insert(reward.clone());
        }

        info!(
            client_id = %client_id,
            appointment_id = %appointment.id,
            total_cents = appointment.total_cents,
            rewards_issued = new_rewards.len(),
            "Appointment completed"
        );

        Ok(BookingOutcome {
            appointment,
            new_rewards,
            state_after: after,
        })
    }
}
