use std::sync::Arc;

use anyhow::{Context, Result};
use staygrid_core::config::AppConfig;
use staygrid_core::{Aggregator, HttpFetcher, JsonMappingStore, OccupancyPolicy, TimelineStore};

pub type FeedAggregator = Aggregator<HttpFetcher, JsonMappingStore>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    aggregator: Arc<FeedAggregator>,
    policy: OccupancyPolicy,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(config.request_timeout()?)?;
        let mappings = JsonMappingStore::new(config.data_path());
        let aggregator = Aggregator::new(
            fetcher,
            mappings,
            Arc::new(TimelineStore::new()),
            config.all_feeds(),
        )
        .context("Could not load property mappings")?;

        Ok(Self::with_aggregator(Arc::new(aggregator), config.occupancy_policy))
    }

    pub fn with_aggregator(aggregator: Arc<FeedAggregator>, policy: OccupancyPolicy) -> Self {
        AppState { aggregator, policy }
    }

    pub fn aggregator(&self) -> &Arc<FeedAggregator> {
        &self.aggregator
    }

    pub fn policy(&self) -> OccupancyPolicy {
        self.policy
    }
}
