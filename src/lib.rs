pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::LocalStorage;
pub use app::{RecommendJob, RunSummary};
pub use crate::core::engine::{EngineSettings, RecommendationEngine};
pub use utils::error::{RecoError, Result};
