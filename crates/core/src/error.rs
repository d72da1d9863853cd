use thiserror::Error;
use uuid::Uuid;

use crate::reward::RewardStatus;

pub type FidelityResult<T> = Result<T, FidelityError>;

#[derive(Error, Debug)]
pub enum FidelityError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rule error: {0}")]
    Rule(#[from] crate::rules::RuleError),

    #[error("Reward {id} is {status:?}, expected available")]
    RewardConflict { id: Uuid, status: RewardStatus },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Client {0} is deactivated")]
    InactiveClient(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
