//! Client ledger update.

use fidelity_core::types::{Appointment, ClientState};

/// Fold one completed appointment into a client's cumulative counters.
///
/// Pure, and called exactly once per appointment. Callers must keep
/// both the `before` snapshot and the returned `after` snapshot: the
/// rule engine needs both sides of the update to detect a threshold
/// crossing, and must never reconstruct `before` from a ledger that
/// may already have been mutated.
pub fn apply_completed(before: &ClientState, appointment: &Appointment) -> ClientState {
    ClientState {
        points_balance: before.points_balance + appointment.points_earned,
        total_spent_cents: before.total_spent_cents + appointment.total_cents,
        total_appointments: before.total_appointments + 1,
        last_visit: Some(appointment.date),
    }
}
