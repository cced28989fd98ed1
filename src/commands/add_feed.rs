use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use staygrid_core::config::AppConfig;
use staygrid_core::feed::ingest;
use staygrid_core::{FeedSource, HttpFetcher, Platform};

use crate::render::pluralize;
use crate::utils::tui::create_spinner;

pub async fn run(url: &str, property: Option<&str>, platform: Platform) -> Result<()> {
    let (mut config, aggregator) = super::load()?;
    let property_key = match property {
        Some(key) => key.to_string(),
        None => aggregator.next_property_key(),
    };
    let source = FeedSource::new(&property_key, platform, url)?;

    // Try the feed once; a failure is reported but does not stop registration
    let fetcher = HttpFetcher::new(config.request_timeout()?)?;
    let spinner = create_spinner(format!("Checking {}", source.url));
    let checked = ingest(&fetcher, &source).await;
    spinner.finish_and_clear();

    config.upsert_feed(source.clone());
    let path = AppConfig::config_path()?;
    config
        .save_to(&path)
        .with_context(|| format!("Could not update {}", path.display()))?;

    println!(
        "{} Added {} feed for {}",
        "✓".green(),
        source.platform,
        source.property_key.bold()
    );
    match checked {
        Ok(feed) => {
            let count = feed.events.len();
            println!("   {} {} found", count, pluralize("event", count));
        }
        Err(e) => println!("   {}", e.to_string().yellow()),
    }

    Ok(())
}
