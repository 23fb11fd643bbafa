//! Shared application state.

use std::time::Duration;

use anyhow::Result;
use reqwest::Client;

use crate::cache::TtlCache;
use crate::config::Config;
use shadewalk_core::models::Building;

/// Thread-safe state shared across request handlers.
pub struct AppState {
    pub config: Config,
    pub client: Client,
    pub building_cache: TtlCache<String, Vec<Building>>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.overpass_timeout_s.max(config.request_timeout_s)))
            .build()?;
        let building_cache = TtlCache::new(
            Duration::from_secs(config.building_cache_ttl_s),
            64,
        );
        Ok(Self {
            config,
            client,
            building_cache,
        })
    }
}
