//! The refresh cycle and the operations that trigger it.
//!
//! [`Aggregator`] owns the registered feeds, the name and vendor mappings,
//! the last ingest result of every feed, and the [`TimelineStore`] readers
//! consume. Writers (refreshes and mapping edits) take turns on one async
//! mutex; readers only ever clone the current snapshot.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock};

use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::classify::ClassifiedEvent;
use crate::cleaning::{CleaningOffset, VendorAssignment, VendorMap};
use crate::error::{StayGridError, StayGridResult};
use crate::feed::{FeedFetcher, FeedKey, FeedSource, ingest};
use crate::mappings::MappingStore;
use crate::names::{PropertyNames, display_name_for, normalize_name};
use crate::platform::Platform;
use crate::store::{Snapshot, TimelineStore};
use crate::timeline::PropertyTimeline;

/// Last classification of each feed, tagged with the URL it came from.
type IngestCache = BTreeMap<FeedKey, CachedFeed>;

#[derive(Debug, Clone)]
struct CachedFeed {
    url: String,
    events: Vec<ClassifiedEvent>,
}

impl CachedFeed {
    fn new(source: &FeedSource, events: Vec<ClassifiedEvent>) -> Self {
        CachedFeed {
            url: source.url.clone(),
            events,
        }
    }
}

/// Outcome of one refresh cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub version: u64,
    pub feeds_ok: usize,
    pub feeds_failed: usize,
    pub events: usize,
    pub dropped_events: usize,
}

pub struct Aggregator<F: FeedFetcher, M: MappingStore> {
    fetcher: Arc<F>,
    mappings: M,
    store: Arc<TimelineStore>,
    feeds: RwLock<Arc<Vec<FeedSource>>>,
    names: RwLock<Arc<PropertyNames>>,
    vendors: RwLock<Arc<VendorMap>>,
    ingested: Mutex<IngestCache>,
}

impl<F: FeedFetcher, M: MappingStore> Aggregator<F, M> {
    /// Build an aggregator with mappings loaded from `mappings`.
    ///
    /// Feeds that fail validation are skipped with a warning, and a later
    /// feed for an already-registered (property, platform) is ignored.
    pub fn new(
        fetcher: F,
        mappings: M,
        store: Arc<TimelineStore>,
        feeds: Vec<FeedSource>,
    ) -> StayGridResult<Self> {
        let names = mappings.load_names()?;
        let vendors = mappings.load_vendors()?;

        let mut valid: Vec<FeedSource> = Vec::new();
        for feed in feeds {
            match FeedSource::new(&feed.property_key, feed.platform, &feed.url) {
                Ok(source) if valid.iter().any(|f| f.key() == source.key()) => {
                    tracing::warn!(property = %source.property_key, platform = %source.platform, "duplicate feed ignored");
                }
                Ok(source) => valid.push(source),
                Err(e) => tracing::warn!(property = %feed.property_key, error = %e, "invalid feed ignored"),
            }
        }

        Ok(Aggregator {
            fetcher: Arc::new(fetcher),
            mappings,
            store,
            feeds: RwLock::new(Arc::new(valid)),
            names: RwLock::new(Arc::new(names)),
            vendors: RwLock::new(Arc::new(vendors)),
            ingested: Mutex::new(IngestCache::new()),
        })
    }

    pub fn store(&self) -> &Arc<TimelineStore> {
        &self.store
    }

    /// Latest published snapshot, possibly one cycle stale.
    pub fn timelines(&self) -> Arc<Snapshot> {
        self.store.snapshot()
    }

    pub fn feeds(&self) -> Arc<Vec<FeedSource>> {
        read(&self.feeds)
    }

    pub fn names(&self) -> Arc<PropertyNames> {
        read(&self.names)
    }

    pub fn vendors(&self) -> Arc<VendorMap> {
        read(&self.vendors)
    }

    /// Fetch every feed concurrently and publish a complete new snapshot.
    ///
    /// A feed that fails contributes no events this cycle. It never affects
    /// other feeds, and the cycle itself always completes.
    pub async fn refresh(&self) -> RefreshReport {
        let feeds = self.feeds();
        tracing::info!(feeds = feeds.len(), "refreshing feeds");

        let mut tasks = JoinSet::new();
        for source in feeds.iter().cloned() {
            let fetcher = Arc::clone(&self.fetcher);
            tasks.spawn(async move {
                let result = ingest(fetcher.as_ref(), &source).await;
                (source, result)
            });
        }

        let mut report = RefreshReport::default();
        let mut fresh = IngestCache::new();
        while let Some(joined) = tasks.join_next().await {
            let (source, result) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::error!(error = %e, "feed task aborted, contributing no events this cycle");
                    report.feeds_failed += 1;
                    continue;
                }
            };
            match result {
                Ok(feed) => {
                    tracing::debug!(
                        property = %source.property_key,
                        platform = %source.platform,
                        events = feed.events.len(),
                        "feed loaded"
                    );
                    report.feeds_ok += 1;
                    report.events += feed.events.len();
                    report.dropped_events += feed.dropped;
                    fresh.insert(source.key(), CachedFeed::new(&source, feed.events));
                }
                Err(e) => {
                    tracing::warn!(
                        property = %source.property_key,
                        platform = %source.platform,
                        error = %e,
                        "feed failed, contributing no events this cycle"
                    );
                    report.feeds_failed += 1;
                    fresh.insert(source.key(), CachedFeed::new(&source, Vec::new()));
                }
            }
        }
        // A task that panicked left no result; its feed contributes nothing
        for source in feeds.iter() {
            fresh
                .entry(source.key())
                .or_insert_with(|| CachedFeed::new(source, Vec::new()));
        }

        let mut cache = self.ingested.lock().await;
        // Feeds registered or replaced while this cycle was fetching keep
        // their own result; a result fetched from a replaced URL is stale.
        let current_feeds = self.feeds();
        let mut next = IngestCache::new();
        for feed in current_feeds.iter() {
            let key = feed.key();
            let entry = fresh
                .remove(&key)
                .filter(|fetched| fetched.url == feed.url)
                .or_else(|| cache.remove(&key).filter(|cached| cached.url == feed.url));
            if let Some(entry) = entry {
                next.insert(key, entry);
            }
        }
        *cache = next;

        let timelines = self.build_all(&cache, &current_feeds);
        let snapshot = self.store.publish(timelines);
        report.version = snapshot.version;

        tracing::info!(
            version = report.version,
            ok = report.feeds_ok,
            failed = report.feeds_failed,
            events = report.events,
            "timelines updated"
        );
        report
    }

    /// Register (or replace) the feed of a (property, platform) pair and
    /// re-derive that property's timeline from a fresh fetch.
    ///
    /// Invalid input is rejected before anything is registered.
    pub async fn register_feed(
        &self,
        property_key: &str,
        platform: Platform,
        url: &str,
    ) -> StayGridResult<FeedSource> {
        let source = FeedSource::new(property_key, platform, url)?;

        let mut cache = self.ingested.lock().await;
        {
            let mut feeds = (*self.feeds()).clone();
            feeds.retain(|f| f.key() != source.key());
            feeds.push(source.clone());
            write(&self.feeds, feeds);
        }
        tracing::info!(property = %source.property_key, platform = %source.platform, "feed registered");

        let events = match ingest(self.fetcher.as_ref(), &source).await {
            Ok(feed) => feed.events,
            Err(e) => {
                tracing::warn!(property = %source.property_key, error = %e, "new feed failed on first fetch");
                Vec::new()
            }
        };
        cache.insert(source.key(), CachedFeed::new(&source, events));

        self.rebuild(&cache, [source.property_key.clone()]);
        Ok(source)
    }

    /// Key for a feed registered without one: `logement-<feeds + 1>`.
    pub fn next_property_key(&self) -> String {
        format!("logement-{}", self.feeds().len() + 1)
    }

    /// Persist a display name, then re-derive that property's timeline.
    ///
    /// If persisting fails, the in-memory names stay as they were.
    pub async fn set_display_name(&self, property_key: &str, name: &str) -> StayGridResult<()> {
        let property_key = required("property key", property_key)?;
        let name = normalize_name(name);
        if name.is_empty() {
            return Err(StayGridError::InvalidInput("display name is empty".into()));
        }

        let cache = self.ingested.lock().await;
        let mut names = (*self.names()).clone();
        names.insert(property_key.to_string(), name.clone());
        self.mappings.save_names(&names)?;
        write(&self.names, names);
        tracing::info!(property = %property_key, %name, "display name updated");

        self.rebuild(&cache, [property_key.to_string()]);
        Ok(())
    }

    /// Persist a vendor assignment, then re-derive that property's cleanings.
    pub async fn set_vendor(
        &self,
        property_key: &str,
        vendor: &str,
        offset: CleaningOffset,
    ) -> StayGridResult<()> {
        let property_key = required("property key", property_key)?;
        let vendor = required("vendor", vendor)?;

        let cache = self.ingested.lock().await;
        let mut vendors = (*self.vendors()).clone();
        vendors.insert(
            property_key.to_string(),
            VendorAssignment::new(vendor).with_offset(offset),
        );
        self.mappings.save_vendors(&vendors)?;
        write(&self.vendors, vendors);
        tracing::info!(property = %property_key, %vendor, %offset, "vendor assigned");

        self.rebuild(&cache, [property_key.to_string()]);
        Ok(())
    }

    fn build_all(&self, cache: &IngestCache, feeds: &[FeedSource]) -> BTreeMap<String, PropertyTimeline> {
        let properties: BTreeSet<String> = feeds.iter().map(|f| f.property_key.clone()).collect();
        properties
            .into_iter()
            .map(|key| {
                let timeline = self.build_one(cache, feeds, &key);
                (key, timeline)
            })
            .collect()
    }

    fn build_one(&self, cache: &IngestCache, feeds: &[FeedSource], property_key: &str) -> PropertyTimeline {
        let names = self.names();
        let vendors = self.vendors();
        let events = cache
            .iter()
            .filter(|(key, _)| key.property_key == property_key)
            .flat_map(|(_, cached)| cached.events.iter().cloned());

        PropertyTimeline::merge(
            property_key,
            display_name_for(property_key, &names, feeds),
            events,
            &vendors,
        )
    }

    /// Re-derive the given properties from cached events without fetching.
    fn rebuild(&self, cache: &IngestCache, properties: impl IntoIterator<Item = String>) {
        let feeds = self.feeds();
        let changed: BTreeMap<String, PropertyTimeline> = properties
            .into_iter()
            .filter(|key| feeds.iter().any(|f| &f.property_key == key))
            .map(|key| {
                let timeline = self.build_one(cache, &feeds, &key);
                (key, timeline)
            })
            .collect();
        if !changed.is_empty() {
            self.store.update(changed);
        }
    }
}

fn required<'a>(what: &str, value: &'a str) -> StayGridResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(StayGridError::InvalidInput(format!("{what} is empty")));
    }
    Ok(value)
}

fn read<T>(lock: &RwLock<Arc<T>>) -> Arc<T> {
    Arc::clone(&lock.read().unwrap_or_else(|e| e.into_inner()))
}

fn write<T>(lock: &RwLock<Arc<T>>, value: T) {
    *lock.write().unwrap_or_else(|e| e.into_inner()) = Arc::new(value);
}
