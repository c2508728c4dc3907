//! Weekly operating hours.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Day of week, ordered Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// All days in calendar order.
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Capitalized display label ("Monday").
    pub fn label(&self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monday" | "mon" => Ok(Weekday::Monday),
            "tuesday" | "tue" | "tues" => Ok(Weekday::Tuesday),
            "wednesday" | "wed" => Ok(Weekday::Wednesday),
            "thursday" | "thu" | "thurs" => Ok(Weekday::Thursday),
            "friday" | "fri" => Ok(Weekday::Friday),
            "saturday" | "sat" => Ok(Weekday::Saturday),
            "sunday" | "sun" => Ok(Weekday::Sunday),
            other => Err(format!("Unknown weekday: {}", other)),
        }
    }
}

/// Hours text per weekday ("9 AM - 5 PM", "Closed").
///
/// Deserializes from either a map keyed by weekday name or the older
/// `{ "open": .., "close": .. }` pair, which applies to every day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OperatingHours(BTreeMap<Weekday, String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum WireHours {
    Range { open: String, close: String },
    Days(BTreeMap<String, Option<String>>),
}

impl<'de> Deserialize<'de> for OperatingHours {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hours = match WireHours::deserialize(deserializer)? {
            WireHours::Range { open, close } => OperatingHours::uniform(format!("{} - {}", open, close)),
            WireHours::Days(days) => days
                .into_iter()
                .filter_map(|(day, hours)| {
                    let day = day.parse::<Weekday>().ok()?;
                    let hours = hours.filter(|h| !h.trim().is_empty())?;
                    Some((day, hours))
                })
                .collect(),
        };
        Ok(hours)
    }
}

impl FromIterator<(Weekday, String)> for OperatingHours {
    fn from_iter<I: IntoIterator<Item = (Weekday, String)>>(iter: I) -> Self {
        OperatingHours(iter.into_iter().collect())
    }
}

impl OperatingHours {
    /// Same hours text on every day of the week.
    pub fn uniform(hours: impl Into<String>) -> Self {
        let hours = hours.into();
        Weekday::ALL.iter().map(|d| (*d, hours.clone())).collect()
    }

    pub fn get(&self, day: Weekday) -> Option<&str> {
        self.0.get(&day).map(String::as_str)
    }

    pub fn set(&mut self, day: Weekday, hours: impl Into<String>) {
        self.0.insert(day, hours.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
