//! The six daily events.

use std::fmt;

use serde::Serialize;

/// One of the six canonical daily events, in chronological order.
///
/// Sunrise is not a prayer but bounds the fajr window, so it is part of
/// the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Prayer {
    Fajr,
    Sunrise,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl Prayer {
    /// All events in chronological order.
    pub const ALL: [Prayer; 6] = [
        Prayer::Fajr,
        Prayer::Sunrise,
        Prayer::Dhuhr,
        Prayer::Asr,
        Prayer::Maghrib,
        Prayer::Isha,
    ];

    /// Lowercase identifier, as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Prayer::Fajr => "fajr",
            Prayer::Sunrise => "sunrise",
            Prayer::Dhuhr => "dhuhr",
            Prayer::Asr => "asr",
            Prayer::Maghrib => "maghrib",
            Prayer::Isha => "isha",
        }
    }

    /// Capitalized name for display.
    pub fn display_name(&self) -> &'static str {
        match self {
            Prayer::Fajr => "Fajr",
            Prayer::Sunrise => "Sunrise",
            Prayer::Dhuhr => "Dhuhr",
            Prayer::Asr => "Asr",
            Prayer::Maghrib => "Maghrib",
            Prayer::Isha => "Isha",
        }
    }
}

impl fmt::Display for Prayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_matches_all() {
        let mut sorted = Prayer::ALL;
        sorted.sort();
        assert_eq!(sorted, Prayer::ALL);
    }

    #[test]
    fn names() {
        assert_eq!(Prayer::Maghrib.as_str(), "maghrib");
        assert_eq!(Prayer::Maghrib.to_string(), "Maghrib");
        assert_eq!(serde_json::to_string(&Prayer::Isha).unwrap(), "\"isha\"");
    }
}
