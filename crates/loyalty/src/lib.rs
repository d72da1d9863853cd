//! Fidelity rule evaluation — threshold-crossing detection over a
//! client's cumulative ledger, plus the pure ledger update and the
//! UI-facing progress projection.

pub mod engine;
pub mod ledger;
pub mod progress;

pub use engine::{EvaluationContext, FidelityEngine};
pub use ledger::apply_completed;
pub use progress::{project, RuleProgress};
