#![warn(clippy::unwrap_used)]

pub mod collaborators;
pub mod config;
pub mod error;
pub mod types;

pub use collaborators::{EventWindowSource, SaleRegistrar, SaleStore};
pub use config::AppConfig;
pub use error::{AttributionError, EngineResult};
