//! Printable monthly statement.
//!
//! Rows and totals come from the same resolver and month calculation as the
//! on-screen summary, so the two can never disagree.

use rust_decimal::Decimal;
use std::fmt::Write as _;
use std::path::Path;

use crate::calculation::{calculate_month, duration_hours, effective_slot};
use crate::calendar::{self, DateKey};
use crate::models::{DayOverrides, MonthSummary, SelectedDays, TimeSlot, WeeklySchedule};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementRow {
    pub date: DateKey,
    /// None when the day resolves to no slot (disabled weekday, no override)
    pub slot: Option<TimeSlot>,
    pub hours: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub year: i32,
    pub month0: u32,
    pub rows: Vec<StatementRow>,
    pub summary: MonthSummary,
    pub hourly_rate: Decimal,
}

/// Output flavour for `Statement::render`
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StatementFormat {
    Html,
    Text,
}

impl StatementFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            StatementFormat::Html => "html",
            StatementFormat::Text => "txt",
        }
    }
}

impl Statement {
    pub fn build(
        year: i32,
        month0: u32,
        selected: &SelectedDays,
        schedule: &WeeklySchedule,
        overrides: &DayOverrides,
        hourly_rate: Decimal,
    ) -> Self {
        let rows = (1..=calendar::days_in_month(year, month0))
            .filter_map(|day| calendar::date_key(year, month0, day))
            .filter(|key| selected.contains(key))
            .map(|date| {
                let slot = effective_slot(&date, schedule, overrides);
                let hours = slot.map(|s| duration_hours(&s)).unwrap_or(Decimal::ZERO);
                StatementRow { date, slot, hours }
            })
            .collect();

        Self {
            year,
            month0,
            rows,
            summary: calculate_month(year, month0, selected, schedule, hourly_rate, overrides),
            hourly_rate,
        }
    }

    pub fn title(&self) -> String {
        calendar::month_title(self.year, self.month0)
    }

    /// Suggested file name, e.g. `statement-2024-03.html`
    pub fn file_name(&self, format: StatementFormat) -> String {
        format!(
            "statement-{}.{}",
            calendar::month_key(self.year, self.month0),
            format.extension()
        )
    }

    /// Render into `path`, creating its directory if needed
    pub fn write_to(&self, format: StatementFormat, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.render(format))?;
        tracing::info!(path = %path.display(), "Statement exported");
        Ok(())
    }

    pub fn render(&self, format: StatementFormat) -> String {
        match format {
            StatementFormat::Html => self.render_html(),
            StatementFormat::Text => self.render_text(),
        }
    }

    fn day_count_label(&self) -> String {
        let n = self.summary.total_days;
        format!("{} day{}", n, if n > 1 { "s" } else { "" })
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Daycare hours statement - {}", self.title());
        let _ = writeln!(out, "{}", self.day_count_label());
        let _ = writeln!(out);
        let _ = writeln!(out, "{:<10}  {:<3}  {:>5}  {:>5}  {:>7}", "Date", "Day", "Start", "End", "Hours");
        let _ = writeln!(out, "{}", "-".repeat(38));
        for row in &self.rows {
            let (start, end) = slot_text(row.slot);
            let _ = writeln!(
                out,
                "{:<10}  {:<3}  {:>5}  {:>5}  {:>6.2}h",
                row.date.display_short(),
                calendar::weekday_short_name(calendar::weekday_of(&row.date)),
                start,
                end,
                row.hours
            );
        }
        let _ = writeln!(out, "{}", "-".repeat(38));
        let _ = writeln!(out, "{:<20}{:>18}", "Days attended", self.summary.total_days);
        let _ = writeln!(out, "{:<20}{:>17.2}h", "Total hours", self.summary.total_hours);
        let _ = writeln!(out, "{:<20}{:>16.2}/h", "Hourly rate", self.hourly_rate);
        let _ = writeln!(out, "{:<20}{:>18.2}", "Amount", self.summary.total_amount);
        out
    }

    pub fn render_html(&self) -> String {
        let title = self.title();
        let mut rows = String::new();
        for row in &self.rows {
            let (start, end) = slot_text(row.slot);
            let _ = write!(
                rows,
                "\n      <tr>\n        <td>{}</td>\n        <td>{}</td>\n        <td>{}</td>\n        <td>{}</td>\n        <td class=\"num\">{:.2}h</td>\n      </tr>",
                row.date.display_short(),
                calendar::weekday_short_name(calendar::weekday_of(&row.date)),
                start,
                end,
                row.hours
            );
        }

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>Daycare hours - {title}</title>
<style>
  * {{ margin: 0; padding: 0; box-sizing: border-box; }}
  body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; padding: 24px; color: #333; max-width: 600px; margin: 0 auto; }}
  h1 {{ font-size: 1.3rem; margin-bottom: 4px; }}
  .subtitle {{ color: #888; font-size: 0.85rem; margin-bottom: 16px; }}
  table {{ width: 100%; border-collapse: collapse; margin-bottom: 16px; font-size: 0.9rem; }}
  th {{ text-align: left; padding: 6px 8px; border-bottom: 2px solid #333; font-weight: 600; }}
  td {{ padding: 5px 8px; border-bottom: 1px solid #ddd; }}
  .num, th.num {{ text-align: right; }}
  .summary {{ border-top: 2px solid #333; padding-top: 12px; font-size: 0.95rem; }}
  .summary-row {{ display: flex; justify-content: space-between; padding: 4px 0; }}
  .summary-row.total {{ font-weight: 700; font-size: 1.1rem; border-top: 1px solid #ccc; margin-top: 4px; padding-top: 8px; }}
  @media print {{ body {{ padding: 0; }} @page {{ margin: 15mm; }} }}
</style>
</head>
<body>
  <h1>Daycare hours statement</h1>
  <div class="subtitle">{title} &mdash; {days}</div>

  <table>
    <thead>
      <tr>
        <th>Date</th>
        <th>Day</th>
        <th>Start</th>
        <th>End</th>
        <th class="num">Hours</th>
      </tr>
    </thead>
    <tbody>{rows}
    </tbody>
  </table>

  <div class="summary">
    <div class="summary-row"><span>Days attended</span><span>{total_days}</span></div>
    <div class="summary-row"><span>Total hours</span><span>{total_hours:.2}h</span></div>
    <div class="summary-row"><span>Hourly rate</span><span>{rate:.2}/h</span></div>
    <div class="summary-row total"><span>Amount</span><span>{amount:.2}</span></div>
  </div>
</body>
</html>
"#,
            title = title,
            days = self.day_count_label(),
            rows = rows,
            total_days = self.summary.total_days,
            total_hours = self.summary.total_hours,
            rate = self.hourly_rate,
            amount = self.summary.total_amount,
        )
    }
}

fn slot_text(slot: Option<TimeSlot>) -> (String, String) {
    match slot {
        Some(s) => (s.start.to_string(), s.end.to_string()),
        None => ("-".to_string(), "-".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeOfDay;
    use rust_decimal_macros::dec;

    fn key(s: &str) -> DateKey {
        s.parse().unwrap()
    }

    fn march_statement() -> Statement {
        let selected: SelectedDays = [key("2024-03-09"), key("2024-03-04"), key("2024-03-10")]
            .into_iter()
            .collect();
        let mut overrides = DayOverrides::default();
        overrides.set(
            key("2024-03-09"),
            TimeSlot {
                start: "09:00".parse::<TimeOfDay>().unwrap(),
                end: "13:00".parse::<TimeOfDay>().unwrap(),
            },
        );
        Statement::build(2024, 2, &selected, &WeeklySchedule::default(), &overrides, dec!(3.20))
    }

    #[test]
    fn rows_follow_calendar_order_and_resolution() {
        let statement = march_statement();
        let dates: Vec<_> = statement.rows.iter().map(|r| r.date.to_string()).collect();
        assert_eq!(dates, ["2024-03-04", "2024-03-09", "2024-03-10"]);
        assert_eq!(statement.rows[0].hours, dec!(9));
        assert_eq!(statement.rows[1].hours, dec!(4));
        // disabled Sunday without override
        assert_eq!(statement.rows[2].slot, None);
        assert_eq!(statement.rows[2].hours, Decimal::ZERO);
    }

    #[test]
    fn totals_match_month_calculation() {
        let statement = march_statement();
        assert_eq!(statement.summary.total_days, 3);
        assert_eq!(statement.summary.total_hours, dec!(13.00));
        assert_eq!(statement.summary.total_amount, dec!(41.60));
    }

    #[test]
    fn text_rendering_contains_rows_and_totals() {
        let text = march_statement().render_text();
        assert!(text.contains("Daycare hours statement - March 2024"));
        assert!(text.contains("04/03/2024  Mon  08:30  17:30"));
        assert!(text.contains("10/03/2024  Sun      -      -"));
        assert!(text.contains("41.60"));
        assert!(text.contains("3 days"));
    }

    #[test]
    fn html_rendering_is_a_full_document() {
        let html = march_statement().render(StatementFormat::Html);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Daycare hours - March 2024</title>"));
        assert!(html.contains("<td>09/03/2024</td>"));
        assert!(html.contains("<td class=\"num\">4.00h</td>"));
        assert!(html.contains("<span>13.00h</span>"));
        assert!(html.contains("<span>3.20/h</span>"));
        assert!(html.contains("<span>41.60</span>"));
    }

    #[test]
    fn empty_month_renders_zero_totals() {
        let statement = Statement::build(
            2024,
            1,
            &SelectedDays::default(),
            &WeeklySchedule::default(),
            &DayOverrides::default(),
            dec!(3.20),
        );
        assert!(statement.rows.is_empty());
        assert!(statement.render_text().contains("0 day\n"));
        assert_eq!(statement.file_name(StatementFormat::Html), "statement-2024-02.html");
    }
}
