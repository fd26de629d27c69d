pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{cli::LocalStorage, CliConfig};

pub use adapters::{GooglePlacesClient, InMemoryStore};
pub use config::toml_config::AppConfig;
pub use core::{collector::BatchCollector, engine::CollectionEngine};
pub use server::AppState;
pub use utils::error::{LeadError, Result};
