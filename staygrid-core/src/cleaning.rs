//! Cleaning tasks derived from checkouts.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::classify::ClassifiedEvent;
use crate::error::{StayGridError, StayGridResult};
use crate::event::EventTime;

/// Vendor recorded for properties without an assignment.
pub const UNASSIGNED_VENDOR: &str = "unassigned";

const MAX_OFFSET_DAYS: i64 = 30;

/// Delay between checkout and the cleaning slot.
///
/// Stored as a human-readable duration (`"3h"`, `"1day"`), so hours and days
/// are both expressible per property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleaningOffset(Duration);

impl CleaningOffset {
    pub fn zero() -> Self {
        CleaningOffset(Duration::zero())
    }

    pub fn hours(hours: i64) -> Self {
        CleaningOffset(Duration::hours(hours))
    }

    pub fn days(days: i64) -> Self {
        CleaningOffset(Duration::days(days))
    }

    pub fn parse(input: &str) -> StayGridResult<Self> {
        let std_dur = humantime::parse_duration(input.trim()).map_err(|e| {
            StayGridError::InvalidInput(format!("invalid cleaning offset '{input}': {e}"))
        })?;
        let dur = Duration::from_std(std_dur)
            .ok()
            .filter(|d| *d <= Duration::days(MAX_OFFSET_DAYS))
            .ok_or_else(|| {
                StayGridError::InvalidInput(format!(
                    "cleaning offset '{input}' exceeds {MAX_OFFSET_DAYS} days"
                ))
            })?;
        Ok(CleaningOffset(dur))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl Default for CleaningOffset {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for CleaningOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.to_std() {
            Ok(std_dur) if !std_dur.is_zero() => {
                write!(f, "{}", humantime::format_duration(std_dur))
            }
            _ => write!(f, "0s"),
        }
    }
}

impl Serialize for CleaningOffset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CleaningOffset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        CleaningOffset::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Who cleans a property and how long after checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "VendorEntry")]
pub struct VendorAssignment {
    pub vendor: String,
    pub offset: CleaningOffset,
}

impl VendorAssignment {
    pub fn new(vendor: impl Into<String>) -> Self {
        VendorAssignment {
            vendor: vendor.into(),
            offset: CleaningOffset::zero(),
        }
    }

    pub fn with_offset(mut self, offset: CleaningOffset) -> Self {
        self.offset = offset;
        self
    }
}

/// Mapping files may hold a bare vendor name or the full assignment.
#[derive(Deserialize)]
#[serde(untagged)]
enum VendorEntry {
    Name(String),
    Full {
        vendor: String,
        #[serde(default)]
        offset: CleaningOffset,
    },
}

impl From<VendorEntry> for VendorAssignment {
    fn from(entry: VendorEntry) -> Self {
        match entry {
            VendorEntry::Name(vendor) => VendorAssignment::new(vendor),
            VendorEntry::Full { vendor, offset } => VendorAssignment { vendor, offset },
        }
    }
}

/// property key -> vendor assignment
pub type VendorMap = BTreeMap<String, VendorAssignment>;

/// Housekeeping slot following one stay's checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningTask {
    pub id: Uuid,
    pub property_key: String,
    /// The stay whose checkout triggered this task
    pub stay_id: Uuid,
    pub scheduled_at: EventTime,
    pub scheduled_date: NaiveDate,
    pub assigned_vendor: String,
}

impl CleaningTask {
    pub fn is_assigned(&self) -> bool {
        self.assigned_vendor != UNASSIGNED_VENDOR
    }
}

/// Derive one cleaning task per stay checkout.
///
/// Depends only on the given stays and mapping; non-stay events are ignored.
/// Output is ordered by scheduled time, then id.
pub fn derive_cleanings(events: &[ClassifiedEvent], vendors: &VendorMap) -> Vec<CleaningTask> {
    let mut tasks: Vec<CleaningTask> = events
        .iter()
        .filter(|e| e.is_stay())
        .map(|stay| {
            let assignment = vendors.get(&stay.property_key);
            let offset = assignment.map(|a| a.offset).unwrap_or_default();
            let vendor = assignment
                .map(|a| a.vendor.clone())
                .unwrap_or_else(|| UNASSIGNED_VENDOR.to_string());
            let scheduled_at = stay.end().shifted(offset.as_duration());

            CleaningTask {
                id: Uuid::new_v5(&stay.id, b"cleaning"),
                property_key: stay.property_key.clone(),
                stay_id: stay.id,
                scheduled_date: scheduled_at.date(),
                scheduled_at,
                assigned_vendor: vendor,
            }
        })
        .collect();

    tasks.sort_by(|a, b| {
        a.scheduled_at
            .local_naive()
            .cmp(&b.scheduled_at.local_naive())
            .then(a.id.cmp(&b.id))
    });
    tasks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::event::RawEvent;
    use crate::platform::Platform;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn stay(property: &str, uid: &str, from: NaiveDate, to: NaiveDate) -> ClassifiedEvent {
        let mut raw = RawEvent::new("Reserved", EventTime::Date(from), EventTime::Date(to));
        raw.uid = Some(uid.to_string());
        classify(raw, property, Platform::Airbnb)
    }

    #[test]
    fn schedules_on_checkout_day_by_default() {
        let stays = vec![stay("logement-1", "a", date(6, 1), date(6, 5))];
        let mut vendors = VendorMap::new();
        vendors.insert("logement-1".into(), VendorAssignment::new("Portos Nettoyage"));

        let tasks = derive_cleanings(&stays, &vendors);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].scheduled_date, date(6, 5));
        assert_eq!(tasks[0].assigned_vendor, "Portos Nettoyage");
        assert_eq!(tasks[0].stay_id, stays[0].id);
    }

    #[test]
    fn offset_can_be_days_or_hours() {
        let stays = vec![stay("logement-1", "a", date(6, 1), date(6, 5))];
        let mut vendors = VendorMap::new();

        vendors.insert(
            "logement-1".into(),
            VendorAssignment::new("Naira").with_offset(CleaningOffset::days(1)),
        );
        let tasks = derive_cleanings(&stays, &vendors);
        assert_eq!(tasks[0].scheduled_at, EventTime::Date(date(6, 6)));

        vendors.insert(
            "logement-1".into(),
            VendorAssignment::new("Naira").with_offset(CleaningOffset::hours(3)),
        );
        let tasks = derive_cleanings(&stays, &vendors);
        assert_eq!(tasks[0].scheduled_date, date(6, 5));
        assert_eq!(
            tasks[0].scheduled_at,
            EventTime::DateTimeFloating(date(6, 5).and_hms_opt(3, 0, 0).unwrap())
        );
    }

    #[test]
    fn offsets_parse_from_human_durations() {
        assert_eq!(CleaningOffset::parse("3h").unwrap(), CleaningOffset::hours(3));
        assert_eq!(CleaningOffset::parse(" 1day ").unwrap(), CleaningOffset::days(1));
        assert!(CleaningOffset::parse("soon").unwrap_err().is_invalid_input());
        assert!(CleaningOffset::parse("400days").unwrap_err().is_invalid_input());
    }

    #[test]
    fn unmapped_property_is_unassigned() {
        let stays = vec![stay("logement-9", "a", date(6, 1), date(6, 5))];
        let tasks = derive_cleanings(&stays, &VendorMap::new());
        assert_eq!(tasks[0].assigned_vendor, UNASSIGNED_VENDOR);
        assert!(!tasks[0].is_assigned());
    }

    #[test]
    fn derivation_is_idempotent() {
        let stays = vec![
            stay("logement-1", "b", date(6, 7), date(6, 9)),
            stay("logement-1", "a", date(6, 1), date(6, 5)),
            stay("logement-2", "c", date(6, 1), date(6, 5)),
        ];
        let mut vendors = VendorMap::new();
        vendors.insert("logement-1".into(), VendorAssignment::new("Cleansud"));

        let first = derive_cleanings(&stays, &vendors);
        let second = derive_cleanings(&stays, &vendors);
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert!(first.windows(2).all(|w| w[0].scheduled_date <= w[1].scheduled_date));
    }

    #[test]
    fn blocks_do_not_get_cleanings() {
        let raw = RawEvent::new(
            "Airbnb (Not available)",
            EventTime::Date(date(6, 1)),
            EventTime::Date(date(6, 5)),
        );
        let block = classify(raw, "logement-1", Platform::Airbnb);
        assert!(derive_cleanings(&[block], &VendorMap::new()).is_empty());
    }

    #[test]
    fn mapping_accepts_bare_names_and_full_entries() {
        let json = r#"{
            "logement-1": "Portos Nettoyage",
            "logement-2": { "vendor": "Cleansud", "offset": "3h" },
            "logement-3": { "vendor": "Naira" }
        }"#;
        let map: VendorMap = serde_json::from_str(json).unwrap();
        assert_eq!(map["logement-1"], VendorAssignment::new("Portos Nettoyage"));
        assert_eq!(map["logement-2"].offset, CleaningOffset::hours(3));
        assert_eq!(map["logement-3"].offset, CleaningOffset::zero());

        let written = serde_json::to_string(&map["logement-2"]).unwrap();
        assert_eq!(written, r#"{"vendor":"Cleansud","offset":"3h"}"#);
    }
}
