use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;
use crate::calculation::duration_hours;
use crate::calendar;
use crate::models::{TimeOfDay, TimeSlot};
use crate::tui::app::{DayEditorField, DayEditorState, ScheduleEditorState, ScheduleField};
use crate::tui::widgets::color::Palette;
use crate::tui::widgets::fixed_popup_area;
use crate::tui::widgets::input::LineInput;
use crate::tui::App;

fn focus_style(focused: bool, palette: &Palette) -> Style {
    let base = Style::default().fg(palette.fg).bg(palette.bg);
    if focused {
        base.fg(palette.highlight_fg).bg(palette.highlight_bg)
    } else {
        base
    }
}

fn checkbox_line(label: &str, checked: bool, focused: bool, palette: &Palette) -> Line<'static> {
    let mark = if checked { "[x]" } else { "[ ]" };
    Line::from(Span::styled(format!("{} {}", mark, label), focus_style(focused, palette)))
}

fn time_line(start: &LineInput, end: &LineInput, start_focused: bool, end_focused: bool, palette: &Palette) -> Line<'static> {
    let base = Style::default().fg(palette.fg).bg(palette.bg);
    let mut spans = vec![Span::styled("    ", base)];
    spans.extend(start.spans(start_focused, focus_style(start_focused, palette)));
    spans.push(Span::styled(" - ", base));
    spans.extend(end.spans(end_focused, focus_style(end_focused, palette)));

    // Live duration once both fields parse
    if let (Ok(s), Ok(e)) = (start.value().parse::<TimeOfDay>(), end.value().parse::<TimeOfDay>()) {
        let hours = duration_hours(&TimeSlot { start: s, end: e });
        spans.push(Span::styled(format!("  {:.2} h", hours), base.fg(palette.muted_fg)));
    }
    Line::from(spans)
}

fn render_popup(f: &mut Frame, area: Rect, title: String, lines: Vec<Line<'static>>, palette: &Palette) {
    let height = lines.len() as u16 + 2;
    let popup = fixed_popup_area(area, 44, height);
    f.render_widget(Clear, popup);

    let base = Style::default().fg(palette.fg).bg(palette.bg);
    let paragraph = Paragraph::new(lines).style(base).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_alignment(Alignment::Center)
            .style(base),
    );
    f.render_widget(paragraph, popup);
}

fn hint_line(text: &str, palette: &Palette) -> Line<'static> {
    Line::from(Span::styled(text.to_string(), Style::default().fg(palette.muted_fg).bg(palette.bg)))
}

pub fn render_day_editor(f: &mut Frame, area: Rect, app: &App, editor: &DayEditorState, palette: &Palette) {
    let base = Style::default().fg(palette.fg).bg(palette.bg);
    let weekday = calendar::weekday_of(&editor.date);
    let attended = app.selected_days.contains(&editor.date);

    let mut lines = vec![checkbox_line("Attended", attended, editor.field == DayEditorField::Attended, palette)];

    if attended {
        let default = app.schedule.get(weekday);
        lines.push(if default.enabled {
            Line::from(Span::styled(
                format!("    Default: {} - {}", default.start, default.end),
                base.fg(palette.muted_fg),
            ))
        } else {
            Line::from(Span::styled("    No default hours on this weekday", base.fg(palette.muted_fg)))
        });
        lines.push(checkbox_line(
            "Custom hours",
            editor.custom_hours,
            editor.field == DayEditorField::CustomHours,
            palette,
        ));
        if editor.custom_hours {
            lines.push(time_line(
                &editor.start,
                &editor.end,
                editor.field == DayEditorField::Start,
                editor.field == DayEditorField::End,
                palette,
            ));
        }
    }

    lines.push(Line::default());
    let clear_hint = if editor.had_override {
        format!(" • {}: clear", app.config.key_bindings.clear_override)
    } else {
        String::new()
    };
    lines.push(hint_line(&format!("Space: toggle • Enter: save{} • Esc", clear_hint), palette));

    let title = format!(
        "{} {}",
        calendar::weekday_name(weekday),
        editor.date.display_short()
    );
    render_popup(f, area, title, lines, palette);
}

pub fn render_schedule_editor(f: &mut Frame, area: Rect, editor: &ScheduleEditorState, palette: &Palette) {
    let lines = vec![
        checkbox_line("Enabled", editor.enabled, editor.field == ScheduleField::Enabled, palette),
        time_line(
            &editor.start,
            &editor.end,
            editor.field == ScheduleField::Start,
            editor.field == ScheduleField::End,
            palette,
        ),
        Line::default(),
        hint_line("Space: toggle • Tab: next • Enter: save • Esc", palette),
    ];
    render_popup(f, area, calendar::weekday_name(editor.weekday).to_string(), lines, palette);
}

pub fn render_rate_input(f: &mut Frame, area: Rect, input: &LineInput, palette: &Palette) {
    let base = Style::default().fg(palette.fg).bg(palette.bg);
    let mut value = vec![Span::styled("Per hour ", base.add_modifier(Modifier::BOLD))];
    value.extend(input.spans(true, base));
    let lines = vec![
        Line::from(value),
        Line::default(),
        hint_line("Enter: save • Esc: cancel", palette),
    ];
    render_popup(f, area, "Hourly rate".to_string(), lines, palette);
}
