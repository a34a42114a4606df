use ratatui::Frame;
use ratatui::widgets::{Block, Borders};
use ratatui::style::Style;
use ratatui::layout::Alignment;
use crate::tui::{App, Layout, Mode, Tab};
use crate::tui::widgets::{
    calendar_grid::render_calendar,
    color::Palette,
    forms::{render_day_editor, render_rate_input, render_schedule_editor},
    help::render_help,
    history_view::render_history,
    month_summary::render_side_panel,
    schedule_view::render_schedule,
    status_bar::render_status_bar,
    tabs::render_tabs,
};

pub fn render(f: &mut Frame, app: &App, layout: &Layout) {
    let palette = Palette::from_theme(&app.config.theme);

    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title("Creche")
        .title_alignment(Alignment::Center)
        .style(Style::default().fg(palette.fg).bg(palette.bg));
    f.render_widget(outer_block, f.area());

    render_tabs(f, layout.tabs_area, app.ui.current_tab, &palette);

    match app.ui.current_tab {
        Tab::Calendar => {
            render_calendar(f, layout.main_area, app, &palette);
            render_side_panel(f, layout.side_area, app, &palette);
        }
        Tab::Schedule => render_schedule(f, layout.content_area(), app, &palette),
        Tab::History => render_history(f, layout.content_area(), app, &palette),
    }

    // Overlays after normal content
    match app.ui.mode {
        Mode::Help => render_help(f, f.area(), &app.config.key_bindings, &palette),
        Mode::DayEditor => {
            if let Some(ref editor) = app.day_editor {
                render_day_editor(f, f.area(), app, editor, &palette);
            }
        }
        Mode::ScheduleEditor => {
            if let Some(ref editor) = app.schedule_editor {
                render_schedule_editor(f, f.area(), editor, &palette);
            }
        }
        Mode::RateInput => render_rate_input(f, f.area(), &app.rate_input, &palette),
        Mode::InvoiceForm | Mode::View => {}
    }

    let key_hints = get_key_hints(app);
    render_status_bar(f, layout.status_area, app.status.message.as_deref(), &key_hints, &palette);
}

fn get_key_hints(app: &App) -> Vec<String> {
    let b = &app.config.key_bindings;
    match app.ui.mode {
        Mode::Help => vec![format!("Esc or {}: Exit help", b.help)],
        Mode::DayEditor | Mode::ScheduleEditor => vec![
            "Tab/Shift+Tab: Field".to_string(),
            "Space: Toggle".to_string(),
            format!("Enter or {}: Save", b.save),
            "Esc: Cancel".to_string(),
        ],
        Mode::InvoiceForm => vec![
            "Tab: Amount/Comment".to_string(),
            format!("Enter or {}: Save month", b.save),
            "Esc: Cancel".to_string(),
        ],
        Mode::RateInput => vec!["Enter: Save".to_string(), "Esc: Cancel".to_string()],
        Mode::View => {
            let mut hints = vec![format!("{}: Quit", b.quit)];
            match app.ui.current_tab {
                Tab::Calendar => {
                    hints.push(format!("{}: Attended", b.toggle_day));
                    hints.push(format!("{}: Day", b.edit));
                    hints.push(format!("{}/{}: Month", b.prev_month, b.next_month));
                    hints.push(format!("{}: Invoice", b.invoice));
                    hints.push(format!("{}: Export", b.export));
                }
                Tab::Schedule => {
                    hints.push(format!("{}: Enable", b.toggle_day));
                    hints.push(format!("{}: Edit", b.edit));
                }
                Tab::History => hints.push("↑/↓: Scroll".to_string()),
            }
            hints.push(format!("{}: Rate", b.rate));
            hints.push(format!("{}: Help", b.help));
            hints
        }
    }
}
