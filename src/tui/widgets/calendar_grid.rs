use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use crate::calendar::{self, DateKey, WEEKDAY_ORDER};
use crate::tui::App;
use crate::tui::widgets::color::Palette;

/// Columns per day cell
const CELL_WIDTH: usize = 5;

/// Display flags of one day cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayCell {
    pub day: u32,
    pub selected: bool,
    pub has_override: bool,
    /// Weekday has no default hours
    pub off_day: bool,
    pub is_today: bool,
    pub is_cursor: bool,
}

/// Monday-first weeks of the month; `None` pads before the 1st and after the last day
pub fn month_weeks(year: i32, month0: u32) -> Vec<[Option<u32>; 7]> {
    let days = calendar::days_in_month(year, month0);
    let Some(first) = calendar::date_key(year, month0, 1) else {
        return Vec::new();
    };
    let offset = calendar::weekday_of(&first).num_days_from_monday();

    let mut weeks = Vec::new();
    let mut week = [None; 7];
    for day in 1..=days {
        let column = ((offset + day - 1) % 7) as usize;
        week[column] = Some(day);
        if column == 6 {
            weeks.push(week);
            week = [None; 7];
        }
    }
    if week.iter().any(Option::is_some) {
        weeks.push(week);
    }
    weeks
}

fn day_cell(app: &App, key: &DateKey, today: &DateKey) -> DayCell {
    DayCell {
        day: key.day(),
        selected: app.selected_days.contains(key),
        has_override: app.overrides.get(key).is_some(),
        off_day: !app.schedule.get(calendar::weekday_of(key)).enabled,
        is_today: key == today,
        is_cursor: key.day() == app.ui.cursor_day,
    }
}

fn cell_spans(cell: DayCell, palette: &Palette) -> Vec<Span<'static>> {
    let mut style = Style::default().fg(palette.fg).bg(palette.bg);
    if cell.selected {
        style = style.fg(palette.selected_fg).bg(palette.selected_bg);
    } else if cell.off_day {
        style = style.fg(palette.muted_fg);
    }
    if cell.is_today {
        style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    }
    if cell.is_cursor {
        style = style.add_modifier(Modifier::REVERSED);
    }

    let marker = if cell.has_override { "*" } else { " " };
    vec![
        Span::styled(format!(" {:>2}", cell.day), style),
        Span::styled(marker, style.fg(palette.override_fg).add_modifier(Modifier::BOLD)),
        Span::styled(" ", style),
    ]
}

pub fn render_calendar(f: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let base = Style::default().fg(palette.fg).bg(palette.bg);
    let today = calendar::today();

    let header: String = WEEKDAY_ORDER
        .iter()
        .map(|&wd| format!("{:^width$}", &calendar::weekday_short_name(wd)[..2], width = CELL_WIDTH))
        .collect();

    let mut lines = vec![Line::from(Span::styled(header, base.add_modifier(Modifier::BOLD)))];
    for week in month_weeks(app.ui.year, app.ui.month0) {
        let mut spans = Vec::with_capacity(7 * 3);
        for slot in week {
            match slot.and_then(|day| calendar::date_key(app.ui.year, app.ui.month0, day)) {
                Some(key) => spans.extend(cell_spans(day_cell(app, &key, &today), palette)),
                None => spans.push(Span::styled(" ".repeat(CELL_WIDTH), base)),
            }
        }
        lines.push(Line::from(spans));
    }
    lines.push(Line::default());
    lines.push(Line::from(vec![
        Span::styled("  ", Style::default().bg(palette.selected_bg)),
        Span::styled(" attended  ", base),
        Span::styled("*", base.fg(palette.override_fg).add_modifier(Modifier::BOLD)),
        Span::styled(" custom hours", base),
    ]));

    let title = format!("◀ {} ▶", calendar::month_title(app.ui.year, app.ui.month0));
    let paragraph = Paragraph::new(lines).style(base).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_alignment(Alignment::Center)
            .style(base),
    );
    f.render_widget(paragraph, area);
}
