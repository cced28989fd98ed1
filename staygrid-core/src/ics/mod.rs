//! ICS feed parsing.
//!
//! Platforms publish one VCALENDAR per listing; this module reads it according
//! to RFC 5545 and hands back feed-neutral events.

mod parse;

pub use parse::{FeedDocument, parse_feed};
