//! Reward persistence and lifecycle, plus the per-client serialized
//! booking pipeline that owns "read ledger → evaluate → write".

pub mod pipeline;
pub mod store;

pub use pipeline::{BookingOutcome, BookingPipeline};
pub use store::{RewardStore, StatusCounts};
