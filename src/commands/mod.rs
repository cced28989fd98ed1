pub mod add_feed;
pub mod assign;
pub mod grid;
pub mod rename;
pub mod reservations;

use std::sync::Arc;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use staygrid_core::config::AppConfig;
use staygrid_core::{Aggregator, HttpFetcher, JsonMappingStore, RefreshReport, TimelineStore};

use crate::render::pluralize;
use crate::utils::tui::create_spinner;

pub type FeedAggregator = Aggregator<HttpFetcher, JsonMappingStore>;

/// Load the config and build an aggregator over its feeds and mappings.
pub fn load() -> Result<(AppConfig, FeedAggregator)> {
    let config = AppConfig::load().context("Could not load config")?;
    let fetcher = HttpFetcher::new(config.request_timeout()?)?;
    let aggregator = Aggregator::new(
        fetcher,
        JsonMappingStore::new(config.data_path()),
        Arc::new(TimelineStore::new()),
        config.all_feeds(),
    )
    .context("Could not load property mappings")?;
    Ok((config, aggregator))
}

/// Run one refresh cycle, with a spinner while the feeds load.
pub async fn refresh(aggregator: &FeedAggregator) -> Result<RefreshReport> {
    let feeds = aggregator.feeds().len();
    if feeds == 0 {
        anyhow::bail!(
            "No feeds configured.\n\n\
            Add one with:\n  \
            staygrid add-feed <url> [--platform booking]"
        );
    }

    let spinner = create_spinner(format!("Fetching {} {}", feeds, pluralize("feed", feeds)));
    let report = aggregator.refresh().await;
    spinner.finish_and_clear();

    if report.feeds_failed > 0 {
        let warning = format!(
            "{} of {} {} could not be loaded",
            report.feeds_failed,
            feeds,
            pluralize("feed", feeds)
        );
        eprintln!("{}", warning.yellow());
    }
    Ok(report)
}
