//! Month calculation: resolving each attended day to a time slot and
//! summing the month into hours and an amount owed.

use rust_decimal::Decimal;

use crate::calendar::{self, DateKey};
use crate::models::{
    round2, DayOverrides, MonthSummary, SelectedDays, TimeOfDay, TimeSlot, WeeklySchedule,
};

/// `hour + minute / 60`, unrounded
pub fn time_to_decimal_hours(time: TimeOfDay) -> Decimal {
    Decimal::from(time.hour()) + Decimal::from(time.minute()) / Decimal::from(60)
}

/// Length of a slot in decimal hours. An end before the start yields zero.
pub fn duration_hours(slot: &TimeSlot) -> Decimal {
    let hours = time_to_decimal_hours(slot.end) - time_to_decimal_hours(slot.start);
    hours.max(Decimal::ZERO)
}

/// The slot worked on `date`: its override if any, else the weekday default
/// when enabled, else nothing.
pub fn effective_slot(
    date: &DateKey,
    schedule: &WeeklySchedule,
    overrides: &DayOverrides,
) -> Option<TimeSlot> {
    if let Some(slot) = overrides.get(date) {
        return Some(*slot);
    }
    let day = schedule.get(calendar::weekday_of(date));
    day.enabled.then(|| day.slot())
}

/// Hours contributed by one day, before any rounding
pub fn day_hours(date: &DateKey, schedule: &WeeklySchedule, overrides: &DayOverrides) -> Decimal {
    effective_slot(date, schedule, overrides)
        .map(|slot| duration_hours(&slot))
        .unwrap_or(Decimal::ZERO)
}

/// Totals for a 0-based month.
///
/// Every selected day counts towards `total_days`, even one that resolves to
/// zero hours. Hours are summed unrounded and rounded once to 2 decimals; the
/// amount is the rounded hours times the rate, rounded again.
pub fn calculate_month(
    year: i32,
    month0: u32,
    selected: &SelectedDays,
    schedule: &WeeklySchedule,
    hourly_rate: Decimal,
    overrides: &DayOverrides,
) -> MonthSummary {
    let mut total_days = 0;
    let mut hours = Decimal::ZERO;

    for day in 1..=calendar::days_in_month(year, month0) {
        let Some(key) = calendar::date_key(year, month0, day) else {
            continue;
        };
        if !selected.contains(&key) {
            continue;
        }
        total_days += 1;
        hours += day_hours(&key, schedule, overrides);
    }

    let total_hours = round2(hours);
    MonthSummary {
        total_days,
        total_hours,
        total_amount: round2(total_hours * hourly_rate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DaySchedule, DayOverride};
    use chrono::Weekday;
    use rust_decimal_macros::dec;

    fn key(s: &str) -> DateKey {
        s.parse().unwrap()
    }

    fn time(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    fn slot(start: &str, end: &str) -> TimeSlot {
        TimeSlot { start: time(start), end: time(end) }
    }

    fn selected(keys: &[&str]) -> SelectedDays {
        keys.iter().map(|k| key(k)).collect()
    }

    #[test]
    fn decimal_hours_keep_minutes_unrounded() {
        assert_eq!(time_to_decimal_hours(time("08:30")), dec!(8.5));
        assert_eq!(time_to_decimal_hours(time("00:00")), Decimal::ZERO);
        assert_eq!(round2(time_to_decimal_hours(time("10:20"))), dec!(10.33));
    }

    #[test]
    fn duration_is_never_negative() {
        assert_eq!(duration_hours(&slot("08:30", "17:30")), dec!(9));
        assert_eq!(duration_hours(&slot("17:30", "08:30")), Decimal::ZERO);
        assert_eq!(duration_hours(&slot("12:00", "12:00")), Decimal::ZERO);
    }

    #[test]
    fn override_wins_over_disabled_default() {
        let schedule = WeeklySchedule::default();
        let mut overrides = DayOverrides::default();
        overrides.set(key("2024-03-09"), slot("09:00", "13:00"));
        assert_eq!(
            effective_slot(&key("2024-03-09"), &schedule, &overrides),
            Some(slot("09:00", "13:00"))
        );
    }

    #[test]
    fn override_wins_over_enabled_default() {
        let schedule = WeeklySchedule::default();
        let mut overrides = DayOverrides::default();
        overrides.set(key("2024-03-04"), slot("10:00", "11:15"));
        assert_eq!(day_hours(&key("2024-03-04"), &schedule, &overrides), dec!(1.25));
    }

    #[test]
    fn disabled_day_without_override_has_no_slot() {
        let schedule = WeeklySchedule::default();
        let overrides = DayOverrides::default();
        assert_eq!(effective_slot(&key("2024-03-10"), &schedule, &overrides), None);
        assert_eq!(day_hours(&key("2024-03-10"), &schedule, &overrides), Decimal::ZERO);
    }

    #[test]
    fn empty_selection_is_all_zero() {
        let summary = calculate_month(
            2024,
            2,
            &SelectedDays::default(),
            &WeeklySchedule::default(),
            dec!(3.20),
            &DayOverrides::default(),
        );
        assert_eq!(summary, MonthSummary::default());
    }

    #[test]
    fn monday_and_disabled_saturday() {
        let summary = calculate_month(
            2024,
            2,
            &selected(&["2024-03-04", "2024-03-09"]),
            &WeeklySchedule::default(),
            dec!(3.20),
            &DayOverrides::default(),
        );
        // the selected Saturday still counts as a day, with zero hours
        assert_eq!(summary.total_days, 2);
        assert_eq!(summary.total_hours, dec!(9.00));
        assert_eq!(summary.total_amount, dec!(28.80));
    }

    #[test]
    fn only_monday_selected() {
        let summary = calculate_month(
            2024,
            2,
            &selected(&["2024-03-04"]),
            &WeeklySchedule::default(),
            dec!(3.20),
            &DayOverrides::default(),
        );
        assert_eq!(summary.total_days, 1);
        assert_eq!(summary.total_hours, dec!(9.00));
        assert_eq!(summary.total_amount, dec!(28.80));
    }

    #[test]
    fn saturday_with_override() {
        let mut overrides = DayOverrides::default();
        overrides.set(key("2024-03-09"), slot("09:00", "13:00"));
        let summary = calculate_month(
            2024,
            2,
            &selected(&["2024-03-09"]),
            &WeeklySchedule::default(),
            dec!(3.20),
            &overrides,
        );
        assert_eq!(summary.total_days, 1);
        assert_eq!(summary.total_hours, dec!(4.00));
        assert_eq!(summary.total_amount, dec!(12.80));
    }

    #[test]
    fn days_outside_the_month_are_ignored() {
        let summary = calculate_month(
            2024,
            2,
            &selected(&["2024-02-29", "2024-04-01", "2024-03-01"]),
            &WeeklySchedule::default(),
            dec!(1),
            &DayOverrides::default(),
        );
        assert_eq!(summary.total_days, 1);
        assert_eq!(summary.total_hours, dec!(9));
    }

    #[test]
    fn hours_are_rounded_once_after_summing() {
        // 20 minutes a day is 0.333... hours; three days make exactly one hour
        let mut schedule = WeeklySchedule::default();
        let twenty_minutes = DaySchedule { start: time("08:00"), end: time("08:20"), enabled: true };
        for weekday in [Weekday::Mon, Weekday::Tue, Weekday::Wed] {
            schedule.set(weekday, twenty_minutes);
        }
        let summary = calculate_month(
            2024,
            2,
            &selected(&["2024-03-04", "2024-03-05", "2024-03-06"]),
            &schedule,
            dec!(10),
            &DayOverrides::default(),
        );
        // rounding per day would give 0.99
        assert_eq!(summary.total_hours, dec!(1.00));
        assert_eq!(summary.total_amount, dec!(10.00));
    }

    #[test]
    fn amount_uses_rounded_hours() {
        // 10 minutes: 0.1666... hours, rounded to 0.17 before pricing
        let mut overrides = DayOverrides::default();
        let ten_minutes: DayOverride = slot("08:00", "08:10");
        overrides.set(key("2024-03-04"), ten_minutes);
        let summary = calculate_month(
            2024,
            2,
            &selected(&["2024-03-04"]),
            &WeeklySchedule::default(),
            dec!(100),
            &overrides,
        );
        assert_eq!(summary.total_hours, dec!(0.17));
        assert_eq!(summary.total_amount, dec!(17.00));
    }

    #[test]
    fn inverted_override_contributes_zero_but_counts_the_day() {
        let mut overrides = DayOverrides::default();
        overrides.set(key("2024-03-04"), slot("17:00", "09:00"));
        let summary = calculate_month(
            2024,
            2,
            &selected(&["2024-03-04", "2024-03-05"]),
            &WeeklySchedule::default(),
            dec!(3.20),
            &overrides,
        );
        assert_eq!(summary.total_days, 2);
        assert_eq!(summary.total_hours, dec!(9));
    }

    #[test]
    fn full_month_of_weekdays() {
        // March 2024 has 21 weekdays
        let days: SelectedDays = (1..=31)
            .filter_map(|d| calendar::date_key(2024, 2, d))
            .collect();
        let summary = calculate_month(
            2024,
            2,
            &days,
            &WeeklySchedule::default(),
            dec!(3.20),
            &DayOverrides::default(),
        );
        assert_eq!(summary.total_days, 31);
        assert_eq!(summary.total_hours, dec!(189));
        assert_eq!(summary.total_amount, dec!(604.80));
    }
}
