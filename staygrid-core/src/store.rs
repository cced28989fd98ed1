//! Current-snapshot holder.
//!
//! A refresh never edits timelines in place. It builds a new [`Snapshot`] and
//! swaps the shared pointer, so a reader always holds one complete cycle.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::timeline::PropertyTimeline;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    /// Incremented on every publish; 0 means nothing published yet
    pub version: u64,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub timelines: BTreeMap<String, Arc<PropertyTimeline>>,
}

impl Snapshot {
    pub fn timeline(&self, property_key: &str) -> Option<&PropertyTimeline> {
        self.timelines.get(property_key).map(Arc::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyTimeline> {
        self.timelines.values().map(Arc::as_ref)
    }
}

#[derive(Debug, Default)]
pub struct TimelineStore {
    current: RwLock<Arc<Snapshot>>,
}

impl TimelineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The latest published snapshot. The lock is held only to clone the `Arc`.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Replace every timeline. Properties missing from `timelines` disappear.
    pub fn publish(&self, timelines: BTreeMap<String, PropertyTimeline>) -> Arc<Snapshot> {
        self.swap(|previous| {
            timelines
                .into_iter()
                .map(|(key, timeline)| {
                    let shared = reuse_if_equal(previous.get(&key), timeline);
                    (key, shared)
                })
                .collect()
        })
    }

    /// Replace only the given timelines, keeping every other property as is.
    pub fn update(&self, changed: BTreeMap<String, PropertyTimeline>) -> Arc<Snapshot> {
        self.swap(|previous| {
            let mut next = previous.clone();
            for (key, timeline) in changed {
                let shared = reuse_if_equal(previous.get(&key), timeline);
                next.insert(key, shared);
            }
            next
        })
    }

    fn swap<F>(&self, build: F) -> Arc<Snapshot>
    where
        F: FnOnce(&BTreeMap<String, Arc<PropertyTimeline>>) -> BTreeMap<String, Arc<PropertyTimeline>>,
    {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        let next = Arc::new(Snapshot {
            version: guard.version + 1,
            refreshed_at: Some(Utc::now()),
            timelines: build(&guard.timelines),
        });
        *guard = Arc::clone(&next);
        next
    }
}

/// Unchanged properties keep pointing at the previous cycle's value.
fn reuse_if_equal(
    previous: Option<&Arc<PropertyTimeline>>,
    timeline: PropertyTimeline,
) -> Arc<PropertyTimeline> {
    match previous {
        Some(prev) if **prev == timeline => Arc::clone(prev),
        _ => Arc::new(timeline),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaning::VendorMap;

    fn timeline(key: &str, name: &str) -> PropertyTimeline {
        PropertyTimeline::merge(key, name.to_string(), Vec::new(), &VendorMap::new())
    }

    fn map(items: &[(&str, &str)]) -> BTreeMap<String, PropertyTimeline> {
        items
            .iter()
            .map(|(k, n)| (k.to_string(), timeline(k, n)))
            .collect()
    }

    #[test]
    fn starts_empty_at_version_zero() {
        let store = TimelineStore::new();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.version, 0);
        assert!(snapshot.timelines.is_empty());
        assert!(snapshot.refreshed_at.is_none());
    }

    #[test]
    fn publish_bumps_version_and_keeps_old_readers_intact() {
        let store = TimelineStore::new();
        let first = store.publish(map(&[("logement-1", "A")]));
        let reader = store.snapshot();

        let second = store.publish(map(&[("logement-2", "B")]));

        assert_eq!(first.version, 1);
        assert_eq!(second.version, 2);
        // A reader holding the old snapshot still sees the full old cycle
        assert!(reader.timeline("logement-1").is_some());
        assert!(reader.timeline("logement-2").is_none());
        assert!(store.snapshot().timeline("logement-1").is_none());
    }

    #[test]
    fn unchanged_timelines_are_shared_between_cycles() {
        let store = TimelineStore::new();
        let first = store.publish(map(&[("logement-1", "A"), ("logement-2", "B")]));
        let second = store.publish(map(&[("logement-1", "A"), ("logement-2", "B2")]));

        assert!(Arc::ptr_eq(
            &first.timelines["logement-1"],
            &second.timelines["logement-1"]
        ));
        assert!(!Arc::ptr_eq(
            &first.timelines["logement-2"],
            &second.timelines["logement-2"]
        ));
    }

    #[test]
    fn update_touches_only_given_properties() {
        let store = TimelineStore::new();
        let first = store.publish(map(&[("logement-1", "A"), ("logement-2", "B")]));
        let second = store.update(map(&[("logement-2", "Renamed")]));

        assert!(Arc::ptr_eq(
            &first.timelines["logement-1"],
            &second.timelines["logement-1"]
        ));
        assert_eq!(second.timeline("logement-2").unwrap().display_name, "Renamed");
    }
}
