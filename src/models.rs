use chrono::{DateTime, Utc, Weekday};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::calendar::{self, DateKey};

/// Errors raised when user supplied text cannot be accepted.
/// The previous valid value is always kept when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Invalid time '{0}', expected HH:MM")]
    InvalidTime(String),
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Invalid month '{0}', expected YYYY-MM")]
    InvalidMonth(String),
    #[error("Invalid weekday '{0}'")]
    InvalidWeekday(String),
    #[error("Invalid amount '{0}'")]
    InvalidAmount(String),
    #[error("Amount cannot be negative: {0}")]
    NegativeAmount(String),
}

/// Round to cents (or centi-hours), half away from zero
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Parse a non-negative decimal amount typed by the user.
/// Accepts a comma as decimal separator.
pub fn parse_amount(input: &str) -> Result<Decimal, InputError> {
    let trimmed = input.trim();
    let normalized = trimmed.replace(',', ".");
    let value = Decimal::from_str(&normalized)
        .map_err(|_| InputError::InvalidAmount(trimmed.to_string()))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(InputError::NegativeAmount(trimmed.to_string()));
    }
    Ok(value)
}

/// Parse an hourly rate. Rates are kept to cents so printed and priced
/// values agree.
pub fn parse_rate(input: &str) -> Result<Decimal, InputError> {
    parse_amount(input).map(round2)
}

/// Wall-clock time, `HH:MM` at the boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    /// Default opening time
    pub const DAY_START: TimeOfDay = TimeOfDay { hour: 8, minute: 30 };
    /// Default closing time
    pub const DAY_END: TimeOfDay = TimeOfDay { hour: 17, minute: 30 };

    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour <= 23 && minute <= 59 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || InputError::InvalidTime(trimmed.to_string());
        let (h, m) = trimmed.split_once(':').ok_or_else(invalid)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(invalid());
        }
        if !h.bytes().all(|b| b.is_ascii_digit()) || !m.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let hour: u8 = h.parse().map_err(|_| invalid())?;
        let minute: u8 = m.parse().map_err(|_| invalid())?;
        TimeOfDay::new(hour, minute).ok_or_else(invalid)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A start/end pair. Also used as the per-day override record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

pub type DayOverride = TimeSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub enabled: bool,
}

impl DaySchedule {
    fn default_times(enabled: bool) -> Self {
        Self {
            start: TimeOfDay::DAY_START,
            end: TimeOfDay::DAY_END,
            enabled,
        }
    }

    /// Slot used for weekdays missing from a stored schedule
    pub fn disabled() -> Self {
        Self::default_times(false)
    }

    pub fn slot(&self) -> TimeSlot {
        TimeSlot { start: self.start, end: self.end }
    }
}

/// One slot per weekday, indexed Sunday = 0 ... Saturday = 6.
/// Persisted as a map keyed "0".."6".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklySchedule([DaySchedule; 7]);

impl WeeklySchedule {
    pub fn new(days: [DaySchedule; 7]) -> Self {
        Self(days)
    }

    pub fn get(&self, weekday: Weekday) -> &DaySchedule {
        &self.0[calendar::weekday_index(weekday)]
    }

    pub fn set(&mut self, weekday: Weekday, schedule: DaySchedule) {
        self.0[calendar::weekday_index(weekday)] = schedule;
    }

    pub fn toggle(&mut self, weekday: Weekday) {
        let slot = &mut self.0[calendar::weekday_index(weekday)];
        slot.enabled = !slot.enabled;
    }
}

impl Default for WeeklySchedule {
    /// Monday to Friday 08:30-17:30, weekend disabled
    fn default() -> Self {
        let mut days = [DaySchedule::default_times(true); 7];
        days[calendar::weekday_index(Weekday::Sat)].enabled = false;
        days[calendar::weekday_index(Weekday::Sun)].enabled = false;
        Self(days)
    }
}

impl Serialize for WeeklySchedule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().enumerate().map(|(i, day)| (i.to_string(), day)))
    }
}

impl<'de> Deserialize<'de> for WeeklySchedule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, DaySchedule>::deserialize(deserializer)?;
        let mut days = [DaySchedule::disabled(); 7];
        for (index, day) in days.iter_mut().enumerate() {
            match raw.get(&index.to_string()) {
                Some(stored) => *day = *stored,
                None => tracing::warn!(weekday = index, "Stored schedule has no entry, treating as disabled"),
            }
        }
        Ok(Self(days))
    }
}

/// Days the child attended. Persisted as a map of date key to `true`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectedDays(BTreeSet<DateKey>);

impl SelectedDays {
    pub fn contains(&self, key: &DateKey) -> bool {
        self.0.contains(key)
    }

    pub fn select(&mut self, key: DateKey) {
        self.0.insert(key);
    }

    /// Flip the selection of a day, returning whether it is now selected
    pub fn toggle(&mut self, key: DateKey) -> bool {
        if self.0.remove(&key) {
            false
        } else {
            self.0.insert(key);
            true
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DateKey> {
        self.0.iter()
    }
}

impl FromIterator<DateKey> for SelectedDays {
    fn from_iter<I: IntoIterator<Item = DateKey>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for SelectedDays {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|key| (key.to_string(), true)))
    }
}

impl<'de> Deserialize<'de> for SelectedDays {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, bool>::deserialize(deserializer)?;
        let mut days = BTreeSet::new();
        for (key, selected) in raw {
            if !selected {
                continue;
            }
            match key.parse::<DateKey>() {
                Ok(date) => {
                    days.insert(date);
                }
                Err(e) => tracing::warn!(%e, "Skipping stored selection"),
            }
        }
        Ok(Self(days))
    }
}

/// Per-day replacements of the weekly default
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayOverrides(BTreeMap<DateKey, DayOverride>);

impl DayOverrides {
    pub fn get(&self, key: &DateKey) -> Option<&DayOverride> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: DateKey, slot: DayOverride) {
        self.0.insert(key, slot);
    }

    /// Remove an override, returning it if there was one
    pub fn clear(&mut self, key: &DateKey) -> Option<DayOverride> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Billing settings, stored alongside the rest of the tracking data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingConfig {
    pub hourly_rate: Decimal,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self { hourly_rate: Decimal::new(320, 2) }
    }
}

/// Derived totals for one month. Never persisted on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonthSummary {
    pub total_days: u32,
    pub total_hours: Decimal,
    pub total_amount: Decimal,
}

/// A committed month: the calculated snapshot next to what the daycare billed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthInvoice {
    pub key: String,
    pub year: i32,
    /// 0-based month
    pub month: u32,
    pub invoiced_amount: Decimal,
    pub calculated_days: u32,
    pub calculated_hours: Decimal,
    pub calculated_amount: Decimal,
    #[serde(default)]
    pub comment: String,
    pub saved_at: DateTime<Utc>,
}

impl MonthInvoice {
    /// Month index in range and key matching year and month
    pub fn is_consistent(&self) -> bool {
        self.month < 12 && self.key == calendar::month_key(self.year, self.month)
    }

    pub fn new(
        year: i32,
        month0: u32,
        summary: &MonthSummary,
        invoiced_amount: Decimal,
        comment: String,
        saved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key: calendar::month_key(year, month0),
            year,
            month: month0,
            invoiced_amount,
            calculated_days: summary.total_days,
            calculated_hours: summary.total_hours,
            calculated_amount: summary.total_amount,
            comment,
            saved_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn time_of_day_parses_and_formats() {
        let t: TimeOfDay = "08:30".parse().unwrap();
        assert_eq!((t.hour(), t.minute()), (8, 30));
        assert_eq!(t.to_string(), "08:30");
        assert_eq!("9:05".parse::<TimeOfDay>().unwrap().to_string(), "09:05");
        assert!("24:00".parse::<TimeOfDay>().is_err());
        assert!("12:60".parse::<TimeOfDay>().is_err());
        assert!("1230".parse::<TimeOfDay>().is_err());
        assert!("12:5".parse::<TimeOfDay>().is_err());
    }

    #[test]
    fn time_of_day_accepts_digits_only() {
        assert!("+8:+5".parse::<TimeOfDay>().is_err());
        assert!("+8:05".parse::<TimeOfDay>().is_err());
        assert!("08:+5".parse::<TimeOfDay>().is_err());
        assert!(" 8:05 ".parse::<TimeOfDay>().is_ok());
    }

    #[test]
    fn amounts_reject_garbage_and_negatives() {
        assert_eq!(parse_amount("30").unwrap(), dec!(30));
        assert_eq!(parse_amount(" 28,80 ").unwrap(), dec!(28.80));
        assert!(matches!(parse_amount("abc"), Err(InputError::InvalidAmount(_))));
        assert!(matches!(parse_amount("-1"), Err(InputError::NegativeAmount(_))));
        assert!(parse_amount("").is_err());
    }

    #[test]
    fn rates_are_kept_to_cents() {
        assert_eq!(parse_rate("3.125").unwrap(), dec!(3.13));
        assert_eq!(parse_rate("3,2").unwrap(), dec!(3.2));
        assert!(parse_rate("-0.5").is_err());
    }

    #[test]
    fn round2_is_half_away_from_zero() {
        assert_eq!(round2(dec!(1.005)), dec!(1.01));
        assert_eq!(round2(dec!(1.004)), dec!(1.00));
        assert_eq!(round2(dec!(-1.005)), dec!(-1.01));
    }

    #[test]
    fn default_schedule_is_weekdays_only() {
        let schedule = WeeklySchedule::default();
        assert!(schedule.get(Weekday::Mon).enabled);
        assert!(schedule.get(Weekday::Fri).enabled);
        assert!(!schedule.get(Weekday::Sat).enabled);
        assert!(!schedule.get(Weekday::Sun).enabled);
        assert_eq!(schedule.get(Weekday::Sat).start.to_string(), "08:30");
        assert_eq!(schedule.get(Weekday::Sun).end.to_string(), "17:30");
    }

    #[test]
    fn schedule_serializes_with_string_weekday_keys() {
        let json = serde_json::to_value(WeeklySchedule::default()).unwrap();
        assert_eq!(json["1"]["start"], "08:30");
        assert_eq!(json["1"]["enabled"], true);
        assert_eq!(json["0"]["enabled"], false);
    }

    #[test]
    fn schedule_missing_weekday_reads_as_disabled() {
        let json = r#"{"1": {"start": "07:00", "end": "12:00", "enabled": true}}"#;
        let schedule: WeeklySchedule = serde_json::from_str(json).unwrap();
        assert_eq!(schedule.get(Weekday::Mon).start.to_string(), "07:00");
        assert!(!schedule.get(Weekday::Tue).enabled);
        assert!(!schedule.get(Weekday::Sun).enabled);
    }

    #[test]
    fn selected_days_keep_only_true_entries() {
        let json = r#"{"2024-03-04": true, "2024-03-05": false, "garbage": true}"#;
        let days: SelectedDays = serde_json::from_str(json).unwrap();
        assert_eq!(days.len(), 1);
        assert!(days.contains(&"2024-03-04".parse().unwrap()));
        let back = serde_json::to_string(&days).unwrap();
        assert_eq!(back, r#"{"2024-03-04":true}"#);
    }

    #[test]
    fn toggling_a_day_twice_deselects_it() {
        let mut days = SelectedDays::default();
        let key: DateKey = "2024-03-04".parse().unwrap();
        assert!(days.toggle(key));
        assert!(days.contains(&key));
        assert!(!days.toggle(key));
        assert!(days.is_empty());
    }

    #[test]
    fn overrides_are_keyed_by_date() {
        let json = r#"{"2024-03-09": {"start": "09:00", "end": "13:00"}}"#;
        let overrides: DayOverrides = serde_json::from_str(json).unwrap();
        let slot = overrides.get(&"2024-03-09".parse().unwrap()).unwrap();
        assert_eq!(slot.end.to_string(), "13:00");
    }

    #[test]
    fn billing_config_uses_camel_case_and_numbers() {
        let config: BillingConfig = serde_json::from_str(r#"{"hourlyRate": 3.2}"#).unwrap();
        assert_eq!(config.hourly_rate, dec!(3.2));
        assert_eq!(BillingConfig::default().hourly_rate, dec!(3.20));
        let json = serde_json::to_value(config).unwrap();
        assert!(json["hourlyRate"].is_number());
    }

    #[test]
    fn invoice_reads_documents_written_by_older_versions() {
        let json = r#"{
            "key": "2024-03", "year": 2024, "month": 2,
            "invoicedAmount": 30, "calculatedDays": 1,
            "calculatedHours": 9, "calculatedAmount": 28.8,
            "comment": "", "savedAt": "2024-04-01T08:00:00.000Z"
        }"#;
        let invoice: MonthInvoice = serde_json::from_str(json).unwrap();
        assert_eq!(invoice.calculated_amount, dec!(28.8));
        assert_eq!(invoice.invoiced_amount, dec!(30));
        assert_eq!(invoice.month, 2);
    }
}
