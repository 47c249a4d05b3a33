//! Configuration for the Search API

use core_config::{FromEnv, ServerConfig, env_flag, env_optional};
use domain_search::SearchConfig;
use std::path::PathBuf;

pub use core_config::Environment;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub search: SearchConfig,
    pub environment: Environment,
    /// JSON catalog loaded into the in-memory repository at startup
    pub seed_path: Option<PathBuf>,
    /// Run a missing-embeddings backfill once the catalog is seeded
    pub backfill_on_start: bool,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?;
        let search = SearchConfig::from_env()?;

        let seed_path = env_optional("PRODUCTS_SEED_PATH").map(PathBuf::from);
        let backfill_on_start = env_flag("BACKFILL_ON_START", false)?;

        Ok(Self {
            server,
            search,
            environment,
            seed_path,
            backfill_on_start,
        })
    }
}
