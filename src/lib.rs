pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{cli::LocalStorage, toml_config::TomlConfig};
pub use core::{etl::RoundingEngine, pipeline::RoundDatePipeline};
pub use domain::model::{OnRowError, RoundingSpec, RunSummary, Timestamp, Unit};
pub use domain::rounding::{round, DateRounder};
pub use utils::error::{Result, RoundingError};
