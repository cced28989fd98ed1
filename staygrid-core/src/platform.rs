//! Booking platforms that publish feeds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StayGridError;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Airbnb,
    Booking,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Airbnb, Platform::Booking];

    /// The platform whose "Not available" entries are host-entered blocks.
    pub const PRIMARY: Platform = Platform::Airbnb;

    pub fn name(&self) -> &'static str {
        match self {
            Platform::Airbnb => "airbnb",
            Platform::Booking => "booking",
        }
    }

    /// Prefix used for feed addresses in the environment (`AIRBNB_...`).
    pub fn env_prefix(&self) -> &'static str {
        match self {
            Platform::Airbnb => "AIRBNB",
            Platform::Booking => "BOOKING",
        }
    }

    pub fn is_primary(&self) -> bool {
        *self == Self::PRIMARY
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = StayGridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Platform::ALL
            .into_iter()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| StayGridError::UnknownPlatform(s.to_string()))
    }
}
