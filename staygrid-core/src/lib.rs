//! Core of staygrid.
//!
//! Reconciles booking-platform ICS feeds into one timeline per property:
//! - `ics` / `feed`: fetch and parse feeds into `RawEvent`s
//! - `classify`: stay / platform placeholder / manual block
//! - `cleaning`: cleaning tasks derived from checkouts
//! - `timeline` / `store`: merged per-property timelines and the current snapshot
//! - `grid`: day-by-property occupancy projection
//! - `aggregator`: the refresh cycle tying it all together

pub mod aggregator;
pub mod classify;
pub mod cleaning;
pub mod config;
pub mod error;
pub mod event;
pub mod feed;
pub mod grid;
pub mod ics;
pub mod mappings;
pub mod names;
pub mod platform;
pub mod store;
pub mod timeline;

pub use aggregator::{Aggregator, RefreshReport};
pub use classify::{ClassifiedEvent, EventKind, classify};
pub use cleaning::{CleaningOffset, CleaningTask, VendorAssignment, VendorMap};
pub use error::{StayGridError, StayGridResult};
pub use event::{EventTime, RawEvent};
pub use feed::{FeedFetcher, FeedSource, HttpFetcher};
pub use grid::{DateWindow, Grid, OccupancyPolicy, project};
pub use mappings::{JsonMappingStore, MappingStore};
pub use platform::Platform;
pub use store::{Snapshot, TimelineStore};
pub use timeline::{PropertyTimeline, TimelineEntry};
