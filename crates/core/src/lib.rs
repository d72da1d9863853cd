pub mod catalog;
pub mod config;
pub mod error;
pub mod reward;
pub mod rules;
pub mod types;

pub use config::AppConfig;
pub use error::{FidelityError, FidelityResult};
