//! Feed sources and ingestion.
//!
//! One feed is one platform's ICS export for one property. Fetching goes
//! through [`FeedFetcher`] so the refresh cycle can run against HTTP in
//! production and against canned documents in tests.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::classify::{ClassifiedEvent, classify};
use crate::error::{StayGridError, StayGridResult};
use crate::ics::parse_feed;
use crate::platform::Platform;

const USER_AGENT: &str = concat!("staygrid/", env!("CARGO_PKG_VERSION"));

/// Where one (property, platform) calendar is published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub property_key: String,
    #[serde(default)]
    pub platform: Platform,
    pub url: String,
}

impl FeedSource {
    /// Validate and build a source. Nothing is created on error.
    pub fn new(property_key: &str, platform: Platform, url: &str) -> StayGridResult<Self> {
        let property_key = property_key.trim();
        if property_key.is_empty() {
            return Err(StayGridError::InvalidInput("property key is empty".into()));
        }
        let url = validate_feed_url(url)?;

        Ok(FeedSource {
            property_key: property_key.to_string(),
            platform,
            url: url.to_string(),
        })
    }

    pub fn key(&self) -> FeedKey {
        FeedKey {
            property_key: self.property_key.clone(),
            platform: self.platform,
        }
    }

    /// Calendar id embedded in platform export URLs (`.../ical/<id>.ics`).
    pub fn calendar_id(&self) -> Option<String> {
        let url = Url::parse(&self.url).ok()?;
        let mut segments = url.path_segments()?.peekable();
        while let Some(segment) = segments.next() {
            if segment == "ical" {
                let file = segments.peek()?;
                return file
                    .strip_suffix(".ics")
                    .filter(|id| !id.is_empty())
                    .map(str::to_string);
            }
        }
        None
    }
}

/// Each (property, platform) pair has at most one feed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FeedKey {
    pub property_key: String,
    pub platform: Platform,
}

/// Accepts http(s) and webcal addresses; webcal is fetched over https.
pub fn validate_feed_url(raw: &str) -> StayGridResult<Url> {
    let raw = raw.trim();
    let mut url = Url::parse(raw)
        .map_err(|e| StayGridError::InvalidInput(format!("invalid feed URL '{raw}': {e}")))?;

    match url.scheme() {
        "http" | "https" => {}
        "webcal" | "webcals" => {
            url = Url::parse(&format!("https{}", &raw[url.scheme().len()..])).map_err(|e| {
                StayGridError::InvalidInput(format!("invalid feed URL '{raw}': {e}"))
            })?;
        }
        other => {
            return Err(StayGridError::InvalidInput(format!(
                "unsupported feed URL scheme '{other}'"
            )));
        }
    }

    if url.host_str().is_none() {
        return Err(StayGridError::InvalidInput(format!(
            "feed URL '{raw}' has no host"
        )));
    }

    Ok(url)
}

/// Retrieves raw feed documents.
pub trait FeedFetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = StayGridResult<String>> + Send;
}

/// Fetches feeds over HTTP with a per-request timeout.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> StayGridResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| StayGridError::Config(format!("could not build HTTP client: {e}")))?;
        Ok(HttpFetcher { client, timeout })
    }
}

impl FeedFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> StayGridResult<String> {
        let fetch_error = |e: reqwest::Error| {
            if e.is_timeout() {
                StayGridError::FetchTimeout(self.timeout.as_secs())
            } else {
                StayGridError::Fetch {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        };

        let response = self.client.get(url).send().await.map_err(fetch_error)?;

        if !response.status().is_success() {
            return Err(StayGridError::Fetch {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        response.text().await.map_err(fetch_error)
    }
}

/// Result of ingesting one feed.
#[derive(Debug, Clone, Default)]
pub struct IngestedFeed {
    pub events: Vec<ClassifiedEvent>,
    /// Malformed VEVENTs that were skipped
    pub dropped: usize,
}

/// Fetch, parse and classify one feed.
pub async fn ingest<F: FeedFetcher>(fetcher: &F, source: &FeedSource) -> StayGridResult<IngestedFeed> {
    let body = fetcher.fetch(&source.url).await?;
    let document = parse_feed(&body)?;

    if document.dropped > 0 {
        tracing::warn!(
            property = %source.property_key,
            platform = %source.platform,
            dropped = document.dropped,
            "skipped malformed events"
        );
    }

    let events = document
        .events
        .into_iter()
        .map(|raw| classify(raw, &source.property_key, source.platform))
        .collect();

    Ok(IngestedFeed {
        events,
        dropped: document.dropped,
    })
}
