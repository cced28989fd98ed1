//! Property display names.

use std::collections::BTreeMap;

use crate::feed::FeedSource;

/// property key -> operator-chosen display name
pub type PropertyNames = BTreeMap<String, String>;

/// Collapse runs of whitespace and trim.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Name shown for a property.
///
/// A configured name wins. Otherwise the name is built from the first feed
/// registered for the property: `Logement AIRBNB - 12345` when the export URL
/// carries a calendar id, `Logement AIRBNB` when it does not, and the bare
/// property key when there is no feed at all.
pub fn display_name_for(property_key: &str, names: &PropertyNames, feeds: &[FeedSource]) -> String {
    let configured = names
        .get(property_key)
        .map(|n| normalize_name(n))
        .filter(|n| !n.is_empty());
    if let Some(name) = configured {
        return name;
    }

    match feeds.iter().find(|f| f.property_key == property_key) {
        Some(feed) => {
            let platform = feed.platform.name().to_uppercase();
            match feed.calendar_id() {
                Some(id) => format!("Logement {platform} - {id}"),
                None => format!("Logement {platform}"),
            }
        }
        None => property_key.to_string(),
    }
}
