//! Feed-neutral event types.
//!
//! Every platform publishes its own flavour of ICS. The ingestor turns each
//! VEVENT into a [`RawEvent`], and everything downstream (classification,
//! cleaning derivation, projection) works exclusively with these types.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A point in time as published by a feed, preserving its ICS flavour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventTime {
    /// All-day value (`VALUE=DATE`)
    Date(NaiveDate),
    /// UTC date-time (`...Z`)
    DateTimeUtc(DateTime<Utc>),
    /// Wall-clock date-time without zone information
    DateTimeFloating(NaiveDateTime),
    /// Wall-clock date-time in a named zone (`TZID=...`)
    DateTimeZoned {
        datetime: NaiveDateTime,
        tzid: String,
    },
}

impl EventTime {
    /// Absolute instant of this time.
    ///
    /// Dates and floating times are read as UTC. Zoned times with an unknown
    /// TZID also fall back to UTC; `None` only for wall-clock times that do
    /// not exist in their zone (DST gaps).
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            EventTime::Date(d) => Some(d.and_time(NaiveTime::MIN).and_utc()),
            EventTime::DateTimeUtc(dt) => Some(*dt),
            EventTime::DateTimeFloating(naive) => Some(naive.and_utc()),
            EventTime::DateTimeZoned { datetime, tzid } => match tzid.parse::<chrono_tz::Tz>() {
                Ok(tz) => tz
                    .from_local_datetime(datetime)
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc)),
                Err(_) => Some(datetime.and_utc()),
            },
        }
    }

    /// Wall-clock date-time as the feed expressed it. Dates become midnight.
    pub fn local_naive(&self) -> NaiveDateTime {
        match self {
            EventTime::Date(d) => d.and_time(NaiveTime::MIN),
            EventTime::DateTimeUtc(dt) => dt.naive_utc(),
            EventTime::DateTimeFloating(naive) => *naive,
            EventTime::DateTimeZoned { datetime, .. } => *datetime,
        }
    }

    /// Calendar day this time falls on, in the feed's own wall clock.
    pub fn date(&self) -> NaiveDate {
        self.local_naive().date()
    }

    /// Shift by a duration while keeping the ICS flavour where possible.
    ///
    /// A date shifted by a non-whole number of days becomes a floating time.
    pub fn shifted(&self, offset: Duration) -> EventTime {
        match self {
            EventTime::Date(d) => {
                let whole_days = offset.num_seconds() % 86_400 == 0;
                if whole_days {
                    EventTime::Date(*d + offset)
                } else {
                    EventTime::DateTimeFloating(d.and_time(NaiveTime::MIN) + offset)
                }
            }
            EventTime::DateTimeUtc(dt) => EventTime::DateTimeUtc(*dt + offset),
            EventTime::DateTimeFloating(naive) => EventTime::DateTimeFloating(*naive + offset),
            EventTime::DateTimeZoned { datetime, tzid } => EventTime::DateTimeZoned {
                datetime: *datetime + offset,
                tzid: tzid.clone(),
            },
        }
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            EventTime::DateTimeUtc(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%SZ")),
            EventTime::DateTimeFloating(naive) => write!(f, "{}", naive.format("%Y-%m-%dT%H:%M:%S")),
            EventTime::DateTimeZoned { datetime, tzid } => {
                write!(f, "{} ({})", datetime.format("%Y-%m-%dT%H:%M:%S"), tzid)
            }
        }
    }
}

/// One VEVENT from a feed, before any interpretation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub uid: Option<String>,
    /// Platform-defined text; may be empty or a placeholder phrase
    pub summary: String,
    pub description: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
}

impl RawEvent {
    pub fn new(summary: impl Into<String>, start: EventTime, end: EventTime) -> Self {
        RawEvent {
            uid: None,
            summary: summary.into(),
            description: None,
            start,
            end,
        }
    }

    /// Elapsed time between start and end, if both resolve to instants.
    pub fn duration(&self) -> Option<Duration> {
        Some(self.end.to_utc()? - self.start.to_utc()?)
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end.date()
    }

    /// True when the description carries any non-whitespace text.
    pub fn has_description(&self) -> bool {
        self.description
            .as_deref()
            .is_some_and(|d| !d.trim().is_empty())
    }
}
