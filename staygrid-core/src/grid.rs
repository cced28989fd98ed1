//! Day-by-property occupancy grid.
//!
//! The grid is a read-only projection of the current timelines onto a date
//! window. Each cell gets exactly one verdict, with precedence
//! blocked > occupied > empty, and an optional cleaning badge on top.

use std::cmp::Ordering;

use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::classify::{ClassifiedEvent, EventKind};
use crate::error::{StayGridError, StayGridResult};
use crate::platform::Platform;
use crate::timeline::PropertyTimeline;

pub const DEFAULT_WINDOW_DAYS: u32 = 30;
pub const MAX_WINDOW_DAYS: u32 = 366;

pub const GENERIC_CLEANING_GLYPH: &str = "🧼";

/// Keyed by the lowercase first word of the vendor name.
const VENDOR_GLYPHS: [(&str, &str); 4] = [
    ("cleansud", "☀️"),
    ("portos", "🐟"),
    ("naira", "💇"),
    ("proconcept", "🥊"),
];

/// Badge glyph for a vendor; unknown vendors get the generic glyph.
pub fn vendor_glyph(vendor: &str) -> &'static str {
    let first_word = vendor
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();
    VENDOR_GLYPHS
        .iter()
        .find(|(key, _)| *key == first_word)
        .map(|(_, glyph)| *glyph)
        .unwrap_or(GENERIC_CLEANING_GLYPH)
}

/// Whether the checkout day itself counts as covered by an interval.
///
/// Feeds disagree on what their end boundary means, so this is an explicit
/// product setting. `InclusiveCheckout` paints both the arrival and the
/// departure day, which keeps a same-day turnover visible as two facts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OccupancyPolicy {
    #[default]
    InclusiveCheckout,
    ExclusiveCheckout,
}

impl OccupancyPolicy {
    pub fn covers(&self, start: NaiveDate, end: NaiveDate, day: NaiveDate) -> bool {
        if day < start || end < start {
            return false;
        }
        match self {
            OccupancyPolicy::InclusiveCheckout => day <= end,
            // A same-day interval still covers its own day
            OccupancyPolicy::ExclusiveCheckout => day < end || day == start,
        }
    }

    fn covers_event(&self, event: &ClassifiedEvent, day: NaiveDate) -> bool {
        self.covers(event.raw.start_date(), event.raw.end_date(), day)
    }
}

/// Contiguous run of days starting at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub days: u32,
}

impl DateWindow {
    pub fn new(start: NaiveDate, days: u32) -> Self {
        DateWindow { start, days }
    }

    /// The default 30-day window starting today (local time).
    pub fn from_today() -> Self {
        Self::new(Local::now().date_naive(), DEFAULT_WINDOW_DAYS)
    }

    /// Window from optional request parameters: defaults to 30 days from
    /// today, then moved by `page` whole windows.
    pub fn resolve(start: Option<NaiveDate>, days: Option<u32>, page: i64) -> StayGridResult<Self> {
        let days = days.unwrap_or(DEFAULT_WINDOW_DAYS);
        if days == 0 || days > MAX_WINDOW_DAYS {
            return Err(StayGridError::InvalidInput(format!(
                "days must be between 1 and {MAX_WINDOW_DAYS}, got {days}"
            )));
        }
        let start = start.unwrap_or_else(|| Local::now().date_naive());
        let window = Self::new(start, days).paged(page)?;
        // The last day must be representable too
        window
            .start
            .checked_add_signed(Duration::days(i64::from(days)))
            .ok_or_else(|| StayGridError::InvalidInput("date window out of range".into()))?;
        Ok(window)
    }

    /// Move by whole windows; `-1` is the previous page.
    pub fn paged(&self, pages: i64) -> StayGridResult<Self> {
        let out_of_range = || StayGridError::InvalidInput(format!("page {pages} is out of range"));
        let offset = pages
            .checked_mul(i64::from(self.days))
            .and_then(Duration::try_days)
            .ok_or_else(out_of_range)?;
        let start = self.start.checked_add_signed(offset).ok_or_else(out_of_range)?;
        Ok(Self::new(start, self.days))
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.days).map(move |i| self.start + Duration::days(i64::from(i)))
    }

    pub fn end(&self) -> NaiveDate {
        self.start + Duration::days(i64::from(self.days.saturating_sub(1)))
    }
}

impl Default for DateWindow {
    fn default() -> Self {
        Self::from_today()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridDay {
    pub date: NaiveDate,
    /// Short weekday name, e.g. "Mon"
    pub weekday: String,
    pub is_sunday: bool,
}

impl GridDay {
    fn new(date: NaiveDate) -> Self {
        GridDay {
            date,
            weekday: date.format("%a").to_string(),
            is_sunday: date.weekday() == Weekday::Sun,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockReason {
    /// Host-entered block; wins the visual treatment when both apply
    ManualBlock,
    PlatformPlaceholder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Occupancy {
    pub platform: Platform,
    pub is_entry: bool,
    pub is_exit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum CellVerdict {
    Empty,
    /// One entry per platform with a stay on this day
    Occupied { occupancies: Vec<Occupancy> },
    /// Every block kind covering this day, strongest first
    Blocked { reasons: Vec<BlockReason> },
}

impl CellVerdict {
    pub fn is_blocked(&self) -> bool {
        matches!(self, CellVerdict::Blocked { .. })
    }

    /// The reason that decides the blocked treatment.
    pub fn block_reason(&self) -> Option<BlockReason> {
        match self {
            CellVerdict::Blocked { reasons } => reasons.first().copied(),
            _ => None,
        }
    }

    pub fn occupancy(&self, platform: Platform) -> Option<&Occupancy> {
        match self {
            CellVerdict::Occupied { occupancies } => {
                occupancies.iter().find(|o| o.platform == platform)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleaningBadge {
    pub vendor: String,
    pub glyph: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridCell {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub verdict: CellVerdict,
    pub cleaning: Option<CleaningBadge>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GridRow {
    pub property_key: String,
    pub display_name: String,
    pub cells: Vec<GridCell>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Grid {
    pub window: DateWindow,
    pub policy: OccupancyPolicy,
    pub days: Vec<GridDay>,
    pub rows: Vec<GridRow>,
}

/// Project timelines onto a window. Rows are ordered by property key, with
/// numeric suffixes compared as numbers (`logement-2` before `logement-10`).
pub fn project<'a>(
    timelines: impl IntoIterator<Item = &'a PropertyTimeline>,
    window: DateWindow,
    policy: OccupancyPolicy,
) -> Grid {
    let mut rows: Vec<GridRow> = timelines
        .into_iter()
        .map(|timeline| GridRow {
            property_key: timeline.property_key.clone(),
            display_name: timeline.display_name.clone(),
            cells: window
                .dates()
                .map(|day| project_cell(timeline, day, policy))
                .collect(),
        })
        .collect();
    rows.sort_by(|a, b| natural_cmp(&a.property_key, &b.property_key));

    Grid {
        window,
        policy,
        days: window.dates().map(GridDay::new).collect(),
        rows,
    }
}

/// Verdict for one property on one day.
pub fn project_cell(timeline: &PropertyTimeline, day: NaiveDate, policy: OccupancyPolicy) -> GridCell {
    GridCell {
        date: day,
        verdict: verdict_for(timeline, day, policy),
        cleaning: cleaning_badge(timeline, day),
    }
}

fn verdict_for(timeline: &PropertyTimeline, day: NaiveDate, policy: OccupancyPolicy) -> CellVerdict {
    let mut reasons: Vec<BlockReason> = timeline
        .blocks()
        .filter(|e| policy.covers_event(e, day))
        .filter_map(|e| match e.kind {
            EventKind::ManualBlock => Some(BlockReason::ManualBlock),
            EventKind::PlatformPlaceholder => Some(BlockReason::PlatformPlaceholder),
            EventKind::Stay => None,
        })
        .collect();
    reasons.sort();
    reasons.dedup();
    if !reasons.is_empty() {
        return CellVerdict::Blocked { reasons };
    }

    let occupancies: Vec<Occupancy> = Platform::ALL
        .into_iter()
        .filter_map(|platform| {
            let covering: Vec<&ClassifiedEvent> = timeline
                .stays()
                .filter(|s| s.platform == platform && policy.covers_event(s, day))
                .collect();
            if covering.is_empty() {
                return None;
            }
            Some(Occupancy {
                platform,
                is_entry: covering.iter().any(|s| s.raw.start_date() == day),
                is_exit: covering.iter().any(|s| s.raw.end_date() == day),
            })
        })
        .collect();

    if occupancies.is_empty() {
        CellVerdict::Empty
    } else {
        CellVerdict::Occupied { occupancies }
    }
}

fn cleaning_badge(timeline: &PropertyTimeline, day: NaiveDate) -> Option<CleaningBadge> {
    timeline
        .cleanings
        .iter()
        .find(|c| c.scheduled_date == day)
        .map(|c| CleaningBadge {
            vendor: c.assigned_vendor.clone(),
            glyph: vendor_glyph(&c.assigned_vendor),
        })
}

fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (prefix_a, number_a) = split_numeric_suffix(a);
    let (prefix_b, number_b) = split_numeric_suffix(b);
    prefix_a
        .cmp(prefix_b)
        .then(number_a.cmp(&number_b))
        .then(a.cmp(b))
}

fn split_numeric_suffix(s: &str) -> (&str, Option<u64>) {
    let prefix_len = s.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    (&s[..prefix_len], s[prefix_len..].parse().ok())
}
