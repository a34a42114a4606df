use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::models::InputError;

/// Full month names, indexed by 0-based month
pub const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

/// Weekdays in display order (Monday first)
pub const WEEKDAY_ORDER: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// A calendar day, written as `YYYY-MM-DD` at every boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// 0-based month (January = 0)
    pub fn month0(&self) -> u32 {
        self.0.month0()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// The `YYYY-MM` key of the month this day belongs to
    pub fn month_key(&self) -> String {
        month_key(self.year(), self.month0())
    }

    /// Statement style date: `DD/MM/YYYY`
    pub fn display_short(&self) -> String {
        self.0.format("%d/%m/%Y").to_string()
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DateKey {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        // chrono accepts unpadded fields, the key format does not
        if s.len() != 10 {
            return Err(InputError::InvalidDate(s.to_string()));
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(DateKey)
            .map_err(|_| InputError::InvalidDate(s.to_string()))
    }
}

impl Serialize for DateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Build the key for `day` of a 0-based month.
/// Returns None when the date does not exist.
pub fn date_key(year: i32, month0: u32, day: u32) -> Option<DateKey> {
    NaiveDate::from_ymd_opt(year, month0 + 1, day).map(DateKey)
}

/// Number of days in a 0-based month, 0 for an out of range month
pub fn days_in_month(year: i32, month0: u32) -> u32 {
    if month0 > 11 {
        return 0;
    }
    let (next_year, next_month) = if month0 == 11 {
        (year + 1, 1)
    } else {
        (year, month0 + 2)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(0)
}

pub fn weekday_of(key: &DateKey) -> Weekday {
    key.0.weekday()
}

/// Weekday identifier with Sunday = 0 ... Saturday = 6
pub fn weekday_index(weekday: Weekday) -> usize {
    weekday.num_days_from_sunday() as usize
}

/// Inverse of `weekday_index`
pub fn weekday_from_index(index: usize) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

pub fn weekday_short_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Parse a weekday given as a name ("mon", "Monday") or as its 0-6 index
pub fn parse_weekday(s: &str) -> Result<Weekday, InputError> {
    let trimmed = s.trim();
    if let Ok(index) = trimmed.parse::<usize>() {
        return weekday_from_index(index)
            .ok_or_else(|| InputError::InvalidWeekday(trimmed.to_string()));
    }
    trimmed
        .parse::<Weekday>()
        .map_err(|_| InputError::InvalidWeekday(trimmed.to_string()))
}

/// `YYYY-MM` key for a 0-based month
pub fn month_key(year: i32, month0: u32) -> String {
    format!("{:04}-{:02}", year, month0 + 1)
}

/// Parse a `YYYY-MM` key into (year, 0-based month)
pub fn parse_month_key(s: &str) -> Result<(i32, u32), InputError> {
    let s = s.trim();
    let invalid = || InputError::InvalidMonth(s.to_string());
    let (year, month) = s.split_once('-').ok_or_else(invalid)?;
    if year.len() != 4 || month.len() != 2 {
        return Err(invalid());
    }
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month - 1))
}

/// Display title of a month, e.g. "March 2024"
pub fn month_title(year: i32, month0: u32) -> String {
    let name = MONTH_NAMES.get(month0 as usize).copied().unwrap_or("?");
    format!("{} {}", name, year)
}

/// Previous month, wrapping January to December of the previous year
pub fn previous_month(year: i32, month0: u32) -> (i32, u32) {
    if month0 == 0 { (year - 1, 11) } else { (year, month0 - 1) }
}

/// Next month, wrapping December to January of the next year
pub fn next_month(year: i32, month0: u32) -> (i32, u32) {
    if month0 >= 11 { (year + 1, 0) } else { (year, month0 + 1) }
}

/// Today's date in the local calendar
pub fn today() -> DateKey {
    DateKey(chrono::Local::now().date_naive())
}
