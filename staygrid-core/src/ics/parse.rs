//! Feed parsing using the icalendar crate's parser.

use icalendar::{
    DatePerhapsTime,
    parser::{Component, read_calendar, unfold},
};

use crate::error::{StayGridError, StayGridResult};
use crate::event::{EventTime, RawEvent};

/// Events read from one feed document.
#[derive(Debug, Default)]
pub struct FeedDocument {
    pub events: Vec<RawEvent>,
    /// VEVENTs skipped because a required field was missing or malformed
    pub dropped: usize,
}

/// Parse a whole ICS feed.
///
/// Fails only when the document itself is unreadable. A VEVENT without a
/// usable DTSTART/DTEND is dropped and counted; its siblings are kept.
pub fn parse_feed(content: &str) -> StayGridResult<FeedDocument> {
    if !content.trim_start().starts_with("BEGIN:VCALENDAR") {
        return Err(StayGridError::IcsParse(
            "document does not start with BEGIN:VCALENDAR".into(),
        ));
    }

    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).map_err(StayGridError::IcsParse)?;

    let mut document = FeedDocument::default();
    for vevent in calendar.components.iter().filter(|c| c.name == "VEVENT") {
        match parse_vevent(vevent) {
            Ok(event) => document.events.push(event),
            Err(reason) => {
                tracing::debug!(%reason, "dropping malformed VEVENT");
                document.dropped += 1;
            }
        }
    }

    Ok(document)
}

fn parse_vevent(vevent: &Component<'_>) -> Result<RawEvent, String> {
    let start = vevent
        .find_prop("DTSTART")
        .ok_or("missing DTSTART")
        .and_then(|p| DatePerhapsTime::try_from(p).map_err(|_| "unreadable DTSTART"))?;
    let end = vevent
        .find_prop("DTEND")
        .ok_or("missing DTEND")
        .and_then(|p| DatePerhapsTime::try_from(p).map_err(|_| "unreadable DTEND"))?;

    let uid = vevent.find_prop("UID").map(|p| p.val.to_string());
    let summary = vevent
        .find_prop("SUMMARY")
        .map(|p| unescape_text(&p.val.to_string()))
        .unwrap_or_default();
    let description = vevent
        .find_prop("DESCRIPTION")
        .map(|p| unescape_text(&p.val.to_string()));

    Ok(RawEvent {
        uid,
        summary,
        description,
        start: to_event_time(start),
        end: to_event_time(end),
    })
}

/// Convert icalendar's DatePerhapsTime to our EventTime, preserving timezone info
fn to_event_time(dpt: DatePerhapsTime) -> EventTime {
    match dpt {
        DatePerhapsTime::Date(d) => EventTime::Date(d),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            icalendar::CalendarDateTime::Utc(dt) => EventTime::DateTimeUtc(dt),
            icalendar::CalendarDateTime::Floating(naive) => EventTime::DateTimeFloating(naive),
            icalendar::CalendarDateTime::WithTimezone { date_time, tzid } => {
                EventTime::DateTimeZoned {
                    datetime: date_time,
                    tzid,
                }
            }
        },
    }
}

/// Undo RFC 5545 TEXT escaping (`\,` `\;` `\n` `\\`).
fn unescape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const AIRBNB_FEED: &str = "BEGIN:VCALENDAR\r\n\
PRODID:-//Airbnb Inc//Hosting Calendar 1.0//EN\r\n\
VERSION:2.0\r\n\
BEGIN:VEVENT\r\n\
DTSTAMP:20240520T101010Z\r\n\
DTSTART;VALUE=DATE:20240601\r\n\
DTEND;VALUE=DATE:20240605\r\n\
SUMMARY:Reserved\r\n\
UID:1418fb94e984-abc@airbnb.com\r\n\
DESCRIPTION:Reservation URL: https://www.airbnb.com/hosting/reservations/d\r\n \
etails/HMABC\\nPhone Number (Last 4 Digits): 1234\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
DTSTAMP:20240520T101010Z\r\n\
DTSTART;VALUE=DATE:20240610\r\n\
DTEND;VALUE=DATE:20240612\r\n\
SUMMARY:Airbnb (Not available)\r\n\
UID:7f3fa8b1-def@airbnb.com\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    #[test]
    fn parses_all_day_airbnb_events() {
        let doc = parse_feed(AIRBNB_FEED).expect("Should parse");
        assert_eq!(doc.events.len(), 2);
        assert_eq!(doc.dropped, 0);

        let stay = &doc.events[0];
        assert_eq!(stay.summary, "Reserved");
        assert_eq!(
            stay.start,
            EventTime::Date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
        );
        assert_eq!(
            stay.end,
            EventTime::Date(NaiveDate::from_ymd_opt(2024, 6, 5).unwrap())
        );
        assert_eq!(stay.uid.as_deref(), Some("1418fb94e984-abc@airbnb.com"));
        let description = stay.description.as_deref().expect("Should have description");
        assert!(description.contains("reservations/details/HMABC\nPhone"));

        let block = &doc.events[1];
        assert_eq!(block.summary, "Airbnb (Not available)");
        assert!(block.description.is_none());
    }

    #[test]
    fn drops_event_without_dtend_but_keeps_siblings() {
        let ics = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VEVENT\r\n\
UID:broken\r\n\
DTSTART:20240601T100000Z\r\n\
SUMMARY:Missing end\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:fine\r\n\
DTSTART:20240601T100000Z\r\n\
DTEND:20240601T120000Z\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

        let doc = parse_feed(ics).expect("Should parse");
        assert_eq!(doc.dropped, 1);
        assert_eq!(doc.events.len(), 1);
        assert_eq!(doc.events[0].uid.as_deref(), Some("fine"));
        // No SUMMARY means an empty summary, never a made-up title
        assert_eq!(doc.events[0].summary, "");
    }

    #[test]
    fn rejects_documents_that_are_not_calendars() {
        assert!(parse_feed("<html><body>502 Bad Gateway</body></html>").is_err());
        assert!(parse_feed("").is_err());
    }

    #[test]
    fn unescapes_text_values() {
        assert_eq!(unescape_text(r"Smith\, John\; VIP\nline"), "Smith, John; VIP\nline");
        assert_eq!(unescape_text(r"back\\slash"), r"back\slash");
    }
}
