use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;
use rust_decimal::Decimal;
use crate::calculation::duration_hours;
use crate::calendar;
use crate::models::DaySchedule;
use crate::tui::widgets::color::Palette;
use crate::tui::App;

/// Hours a weekday contributes when attended
fn day_default_hours(day: &DaySchedule) -> Decimal {
    if day.enabled { duration_hours(&day.slot()) } else { Decimal::ZERO }
}

pub fn render_schedule(f: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let base = Style::default().fg(palette.fg).bg(palette.bg);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(0)])
        .split(area);

    let items: Vec<ListItem> = app
        .schedule_rows()
        .map(|(weekday, day)| {
            let style = if day.enabled { base } else { base.fg(palette.muted_fg) };
            let mark = if day.enabled { "[x]" } else { "[ ]" };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} {:<10}", mark, calendar::weekday_name(weekday)), style),
                Span::styled(format!("{} - {}", day.start, day.end), style),
                Span::styled(format!("  {:>5.2} h", day_default_hours(day)), style),
            ]))
        })
        .collect();

    let list = List::new(items)
        .style(base)
        .block(Block::default().borders(Borders::ALL).title("Weekly hours").style(base))
        .highlight_style(
            Style::default()
                .fg(palette.highlight_fg)
                .bg(palette.highlight_bg)
                .add_modifier(Modifier::BOLD),
        );
    let mut state = ListState::default().with_selected(Some(app.ui.schedule_index));
    f.render_stateful_widget(list, chunks[0], &mut state);

    let weekly: Decimal = app.schedule_rows().map(|(_, day)| day_default_hours(day)).sum();
    let footer = Paragraph::new(vec![
        Line::from(Span::styled(format!("Full week: {:.2} h", weekly), base)),
        Line::from(Span::styled(
            format!(
                "{}: enable/disable • {}: edit hours",
                app.config.key_bindings.toggle_day, app.config.key_bindings.edit
            ),
            base.fg(palette.muted_fg),
        )),
    ])
    .style(base);
    f.render_widget(footer, chunks[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WeeklySchedule;
    use chrono::Weekday;
    use rust_decimal_macros::dec;

    #[test]
    fn disabled_days_count_zero() {
        let schedule = WeeklySchedule::default();
        assert_eq!(day_default_hours(schedule.get(Weekday::Mon)), dec!(9));
        assert_eq!(day_default_hours(schedule.get(Weekday::Sun)), Decimal::ZERO);
    }
}
