//! Event classification.
//!
//! Feeds carry no reliable semantics: a real guest stay, a platform's own
//! short blackout entry and a host's "Not available" block all arrive as
//! plain VEVENTs. [`classify`] runs one ordered rule table over each event;
//! the first matching rule decides its [`EventKind`].

use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::{EventTime, RawEvent};
use crate::platform::Platform;

/// Events shorter than this many hours with an empty or placeholder summary
/// are platform artifacts, never stays.
pub const PLACEHOLDER_MAX_HOURS: i64 = 20;

/// Lowercase phrases meaning "unit unavailable" (English, French).
pub const UNAVAILABLE_PHRASES: [&str; 2] = ["not available", "non disponible"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    Stay,
    PlatformPlaceholder,
    ManualBlock,
}

impl EventKind {
    pub fn is_block(&self) -> bool {
        !matches!(self, EventKind::Stay)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Stay => write!(f, "stay"),
            EventKind::PlatformPlaceholder => write!(f, "platform-placeholder"),
            EventKind::ManualBlock => write!(f, "manual-block"),
        }
    }
}

/// A feed event with its interpretation attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedEvent {
    /// Stable across refreshes for the same feed entry
    pub id: Uuid,
    pub property_key: String,
    pub platform: Platform,
    pub kind: EventKind,
    /// Display text; the raw summary, possibly empty
    pub guest_label: String,
    #[serde(flatten)]
    pub raw: RawEvent,
}

impl ClassifiedEvent {
    pub fn start(&self) -> &EventTime {
        &self.raw.start
    }

    pub fn end(&self) -> &EventTime {
        &self.raw.end
    }

    pub fn is_stay(&self) -> bool {
        self.kind == EventKind::Stay
    }
}

struct Rule {
    kind: EventKind,
    matches: fn(&RawEvent, Platform) -> bool,
}

/// Evaluated top to bottom. Placeholder comes first so a short
/// "Not available" entry is never taken for a host block or a stay.
const RULES: [Rule; 2] = [
    Rule {
        kind: EventKind::PlatformPlaceholder,
        matches: is_platform_placeholder,
    },
    Rule {
        kind: EventKind::ManualBlock,
        matches: is_manual_block,
    },
];

fn is_platform_placeholder(event: &RawEvent, _platform: Platform) -> bool {
    let short = event
        .duration()
        .is_some_and(|d| d < Duration::hours(PLACEHOLDER_MAX_HOURS));
    let summary = event.summary.trim().to_lowercase();
    short && (summary.is_empty() || UNAVAILABLE_PHRASES.contains(&summary.as_str()))
}

fn is_manual_block(event: &RawEvent, platform: Platform) -> bool {
    let summary = event.summary.to_lowercase();
    platform.is_primary()
        && UNAVAILABLE_PHRASES.iter().any(|p| summary.contains(p))
        && !event.has_description()
}

/// Pure function of the event fields and platform.
pub fn classify_kind(event: &RawEvent, platform: Platform) -> EventKind {
    RULES
        .iter()
        .find(|rule| (rule.matches)(event, platform))
        .map(|rule| rule.kind)
        .unwrap_or(EventKind::Stay)
}

pub fn classify(raw: RawEvent, property_key: &str, platform: Platform) -> ClassifiedEvent {
    let kind = classify_kind(&raw, platform);
    ClassifiedEvent {
        id: event_id(&raw, property_key, platform),
        property_key: property_key.to_string(),
        platform,
        kind,
        guest_label: raw.summary.clone(),
        raw,
    }
}

/// Deterministic id from the feed UID and interval. Feeds may reuse a UID
/// across VEVENTs (recurrence overrides), so the UID alone is not unique.
fn event_id(raw: &RawEvent, property_key: &str, platform: Platform) -> Uuid {
    let identity = match &raw.uid {
        Some(uid) => format!(
            "{property_key}/{platform}/uid/{uid}/{}/{}",
            raw.start, raw.end
        ),
        None => format!(
            "{property_key}/{platform}/span/{}/{}/{}",
            raw.start, raw.end, raw.summary
        ),
    };
    Uuid::new_v5(&Uuid::NAMESPACE_OID, identity.as_bytes())
}
