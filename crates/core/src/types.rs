//! Domain types for the fidelity program: clients, their cumulative
//! ledger counters, and completed appointments.
//!
//! All monetary amounts are integer cents. Points are earned at one
//! point per whole currency unit spent.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A loyalty-program client. Counters are mutated exactly once per
/// completed appointment, by the ledger update, and only grow outside
/// of explicit administrative correction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub name: String,
    /// Unique per client; used as the login handle at the reception desk.
    pub phone: String,
    pub pin: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    pub points_balance: u64,
    pub total_spent_cents: u64,
    pub total_appointments: u64,
    #[serde(default)]
    pub last_visit: Option<NaiveDate>,
    /// Clients are soft-deactivated, never deleted.
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: NaiveDate,
}

fn default_true() -> bool {
    true
}

impl Client {
    /// Project the cumulative counters into a ledger snapshot. Callers
    /// must capture this *before* applying an appointment so the engine
    /// sees both sides of the crossing.
    pub fn ledger_state(&self) -> ClientState {
        ClientState {
            points_balance: self.points_balance,
            total_spent_cents: self.total_spent_cents,
            total_appointments: self.total_appointments,
            last_visit: self.last_visit,
        }
    }

    /// Write an updated ledger snapshot back onto the client record.
    pub fn apply_state(&mut self, state: &ClientState) {
        self.points_balance = state.points_balance;
        self.total_spent_cents = state.total_spent_cents;
        self.total_appointments = state.total_appointments;
        self.last_visit = state.last_visit;
    }
}

/// Immutable snapshot of a client's cumulative counters. The rule
/// engine receives one snapshot from before the appointment and one
/// from after; it never recomputes either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientState {
    pub points_balance: u64,
    pub total_spent_cents: u64,
    pub total_appointments: u64,
    pub last_visit: Option<NaiveDate>,
}

/// One service line on an appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceLine {
    pub name: String,
    pub price_cents: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Completed,
    Pending,
    Cancelled,
}

/// Client review left after an appointment. Deserialization goes
/// through the same rating validation as [`Review::new`], so a raw
/// record cannot smuggle in an out-of-range rating.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ReviewRecord")]
pub struct Review {
    /// 1..=5 stars.
    pub rating: u8,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReviewRecord {
    rating: u8,
    #[serde(default)]
    comment: Option<String>,
}

impl TryFrom<ReviewRecord> for Review {
    type Error = String;

    fn try_from(record: ReviewRecord) -> Result<Self, Self::Error> {
        Review::new(record.rating, record.comment)
            .ok_or_else(|| format!("rating {} out of range 1..=5", record.rating))
    }
}

impl Review {
    pub fn new(rating: u8, comment: Option<String>) -> Option<Self> {
        if (1..=5).contains(&rating) {
            Some(Self { rating, comment })
        } else {
            None
        }
    }
}

/// A booked visit. The booking flow creates these directly in
/// `Completed` status; `total_cents` and `points_earned` are fixed at
/// construction, before the ledger update and rule evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub client_id: String,
    pub professional_id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub time: Option<String>,
    pub status: AppointmentStatus,
    pub services: Vec<ServiceLine>,
    pub total_cents: u64,
    pub points_earned: u64,
    #[serde(default)]
    pub has_review: bool,
    #[serde(default)]
    pub review: Option<Review>,
}

impl Appointment {
    /// Build a completed appointment from its service lines. The total
    /// is the sum of line prices; points accrue at one per whole
    /// currency unit.
    pub fn completed(
        id: impl Into<String>,
        client_id: impl Into<String>,
        professional_id: impl Into<String>,
        date: NaiveDate,
        services: Vec<ServiceLine>,
    ) -> Self {
        let total_cents: u64 = services.iter().map(|s| s.price_cents).sum();
        Self {
            id: id.into(),
            client_id: client_id.into(),
            professional_id: professional_id.into(),
            date,
            time: None,
            status: AppointmentStatus::Completed,
            services,
            total_cents,
            points_earned: total_cents / 100,
            has_review: false,
            review: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == AppointmentStatus::Completed
    }
}
