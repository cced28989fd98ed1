//! Per-property merged timelines.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classify::{ClassifiedEvent, EventKind};
use crate::cleaning::{CleaningTask, VendorMap, derive_cleanings};

/// Everything known about one property for one refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyTimeline {
    pub property_key: String,
    pub display_name: String,
    /// Events from every platform, ordered by start
    pub events: Vec<ClassifiedEvent>,
    /// Derived from the stays above, ordered by schedule
    pub cleanings: Vec<CleaningTask>,
}

impl PropertyTimeline {
    /// Union the events of every feed of a property and derive its cleanings.
    ///
    /// Events belonging to other properties are ignored. Ordering is fully
    /// determined by the events, so the same input always merges to an equal
    /// timeline regardless of feed arrival order.
    pub fn merge(
        property_key: &str,
        display_name: String,
        events: impl IntoIterator<Item = ClassifiedEvent>,
        vendors: &VendorMap,
    ) -> Self {
        let mut events: Vec<ClassifiedEvent> = events
            .into_iter()
            .filter(|e| e.property_key == property_key)
            .collect();
        events.sort_by(|a, b| {
            a.start()
                .local_naive()
                .cmp(&b.start().local_naive())
                .then(a.platform.cmp(&b.platform))
                .then(a.id.cmp(&b.id))
                .then(a.end().local_naive().cmp(&b.end().local_naive()))
                .then(a.raw.summary.cmp(&b.raw.summary))
                .then(a.raw.description.cmp(&b.raw.description))
        });
        // Only exact repeats are dropped; distinct events sharing an id survive
        events.dedup();

        let cleanings = derive_cleanings(&events, vendors);

        PropertyTimeline {
            property_key: property_key.to_string(),
            display_name,
            events,
            cleanings,
        }
    }

    pub fn stays(&self) -> impl Iterator<Item = &ClassifiedEvent> {
        self.events.iter().filter(|e| e.is_stay())
    }

    pub fn blocks(&self) -> impl Iterator<Item = &ClassifiedEvent> {
        self.events.iter().filter(|e| e.kind.is_block())
    }

    /// Flat listing of the timeline, events first then cleanings.
    pub fn entries(&self) -> Vec<TimelineEntry> {
        let events = self.events.iter().map(|e| TimelineEntry {
            id: e.id,
            entry_type: EntryType::from(e.kind),
            property_key: self.property_key.clone(),
            name: self.display_name.clone(),
            start: e.start().to_string(),
            end: Some(e.end().to_string()),
            source: Some(e.platform.to_string()),
            guest: Some(e.guest_label.clone()),
            assigned_cleaner: None,
            stay_id: None,
        });
        let cleanings = self.cleanings.iter().map(|c| TimelineEntry {
            id: c.id,
            entry_type: EntryType::Cleaning,
            property_key: self.property_key.clone(),
            name: self.display_name.clone(),
            start: c.scheduled_at.to_string(),
            end: None,
            source: None,
            guest: None,
            assigned_cleaner: Some(c.assigned_vendor.clone()),
            stay_id: Some(c.stay_id),
        });
        events.chain(cleanings).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryType {
    Stay,
    PlatformPlaceholder,
    ManualBlock,
    Cleaning,
}

impl From<EventKind> for EntryType {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Stay => EntryType::Stay,
            EventKind::PlatformPlaceholder => EntryType::PlatformPlaceholder,
            EventKind::ManualBlock => EntryType::ManualBlock,
        }
    }
}

/// One row of the flat reservations listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub property_key: String,
    pub name: String,
    pub start: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_cleaner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stay_id: Option<Uuid>,
}
