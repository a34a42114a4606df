use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, size as terminal_size};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use std::io;
use std::time::Duration;
use crate::config::KeyBindings;
use crate::tui::app::{DayEditorField, Mode, ScheduleField, Tab};
use crate::tui::error::TuiError;
use crate::tui::layout::Layout;
use crate::tui::widgets::input::LineInput;
use crate::tui::App;
use crate::utils::{parse_key_binding, ParsedKeyBinding};

/// Guard that ensures terminal state is restored even on panic.
/// Leaving the terminal in raw mode or on the alternate screen makes the
/// user's shell unusable.
struct TerminalGuard {
    raw_mode_enabled: bool,
    alternate_screen_enabled: bool,
}

impl TerminalGuard {
    fn new() -> Result<Self, TuiError> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self {
            raw_mode_enabled: true,
            alternate_screen_enabled: true,
        })
    }

    /// Restore terminal state on normal exit; drop is a no-op afterwards
    fn restore(&mut self) -> Result<(), TuiError> {
        if self.raw_mode_enabled {
            disable_raw_mode()?;
            self.raw_mode_enabled = false;
        }
        if self.alternate_screen_enabled {
            execute!(io::stdout(), LeaveAlternateScreen)?;
            self.alternate_screen_enabled = false;
        }
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Errors are ignored, we are already cleaning up
        if self.raw_mode_enabled {
            let _ = disable_raw_mode();
        }
        if self.alternate_screen_enabled {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
    }
}

/// Key bindings from config, parsed once at startup
#[derive(Debug, Clone)]
pub struct KeyMap {
    pub quit: ParsedKeyBinding,
    pub help: ParsedKeyBinding,
    pub prev_tab: ParsedKeyBinding,
    pub next_tab: ParsedKeyBinding,
    pub tab_1: ParsedKeyBinding,
    pub tab_2: ParsedKeyBinding,
    pub tab_3: ParsedKeyBinding,
    pub prev_month: ParsedKeyBinding,
    pub next_month: ParsedKeyBinding,
    pub today: ParsedKeyBinding,
    pub toggle_day: ParsedKeyBinding,
    pub edit: ParsedKeyBinding,
    pub clear_override: ParsedKeyBinding,
    pub invoice: ParsedKeyBinding,
    pub rate: ParsedKeyBinding,
    pub export: ParsedKeyBinding,
    pub save: ParsedKeyBinding,
}

impl KeyMap {
    pub fn from_config(bindings: &KeyBindings) -> Result<Self, TuiError> {
        let parse = |name: &str, value: &str| {
            parse_key_binding(value).map_err(|e| TuiError::KeyBindingError(format!("{}: {}", name, e)))
        };
        Ok(Self {
            quit: parse("quit", &bindings.quit)?,
            help: parse("help", &bindings.help)?,
            prev_tab: parse("prev_tab", &bindings.prev_tab)?,
            next_tab: parse("next_tab", &bindings.next_tab)?,
            tab_1: parse("tab_1", &bindings.tab_1)?,
            tab_2: parse("tab_2", &bindings.tab_2)?,
            tab_3: parse("tab_3", &bindings.tab_3)?,
            prev_month: parse("prev_month", &bindings.prev_month)?,
            next_month: parse("next_month", &bindings.next_month)?,
            today: parse("today", &bindings.today)?,
            toggle_day: parse("toggle_day", &bindings.toggle_day)?,
            edit: parse("edit", &bindings.edit)?,
            clear_override: parse("clear_override", &bindings.clear_override)?,
            invoice: parse("invoice", &bindings.invoice)?,
            rate: parse("rate", &bindings.rate)?,
            export: parse("export", &bindings.export)?,
            save: parse("save", &bindings.save)?,
        })
    }
}

pub fn run_event_loop(mut app: App) -> Result<(), TuiError> {
    // Check size before entering the alternate screen so the error is readable
    let (width, height) = terminal_size()?;
    let min_width_with_border = Layout::MIN_WIDTH + 2;
    let min_height_with_border = Layout::MIN_HEIGHT + 2;
    if width < min_width_with_border || height < min_height_with_border {
        return Err(TuiError::RenderError(format!(
            "Terminal size too small. Current: {}x{}, Minimum required: {}x{}. Please resize your terminal window.",
            width, height, min_width_with_border, min_height_with_border
        )));
    }

    let mut guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    tracing::info!("TUI started");

    while !app.should_quit {
        app.check_status_message_timeout();

        let size = terminal.size()?;
        let terminal_rect = Rect::new(0, 0, size.width, size.height);
        terminal.draw(|f| {
            let layout = Layout::calculate(terminal_rect);
            crate::tui::render::render(f, &app, &layout);
        })?;

        // Only Press events, Windows also reports Release
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press {
                    handle_key_event(&mut app, key_event)?;
                }
            }
        }
    }

    guard.restore()?;
    tracing::info!("TUI stopped");
    Ok(())
}

/// Dispatch one key press according to the current mode
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Result<(), TuiError> {
    match app.ui.mode {
        Mode::Help => handle_help(app, key),
        Mode::DayEditor => handle_day_editor(app, key)?,
        Mode::InvoiceForm => handle_invoice_form(app, key)?,
        Mode::RateInput => handle_rate_input(app, key)?,
        Mode::ScheduleEditor => handle_schedule_editor(app, key)?,
        Mode::View => handle_view(app, key)?,
    }
    Ok(())
}

fn handle_help(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Esc || app.keys.help.matches(&key) || app.keys.quit.matches(&key) {
        app.exit_to_view();
    }
}

fn handle_view(app: &mut App, key: KeyEvent) -> Result<(), TuiError> {
    let keys = app.keys.clone();

    if keys.quit.matches(&key) {
        app.should_quit = true;
    } else if keys.help.matches(&key) {
        app.enter_help_mode();
    } else if keys.next_tab.matches(&key) {
        app.switch_tab(app.ui.current_tab.next());
    } else if keys.prev_tab.matches(&key) {
        app.switch_tab(app.ui.current_tab.previous());
    } else if keys.tab_1.matches(&key) {
        app.switch_tab(Tab::Calendar);
    } else if keys.tab_2.matches(&key) {
        app.switch_tab(Tab::Schedule);
    } else if keys.tab_3.matches(&key) {
        app.switch_tab(Tab::History);
    } else if keys.rate.matches(&key) {
        app.open_rate_input();
    } else if keys.export.matches(&key) {
        app.export_statement();
    } else {
        match app.ui.current_tab {
            Tab::Calendar => handle_calendar(app, &keys, key)?,
            Tab::Schedule => handle_schedule(app, &keys, key)?,
            Tab::History => handle_history(app, key),
        }
    }
    Ok(())
}

fn handle_calendar(app: &mut App, keys: &KeyMap, key: KeyEvent) -> Result<(), TuiError> {
    match key.code {
        KeyCode::Left => app.move_cursor(-1),
        KeyCode::Right => app.move_cursor(1),
        KeyCode::Up => app.move_cursor(-7),
        KeyCode::Down => app.move_cursor(7),
        KeyCode::PageUp => app.previous_month(),
        KeyCode::PageDown => app.next_month(),
        _ if keys.prev_month.matches(&key) => app.previous_month(),
        _ if keys.next_month.matches(&key) => app.next_month(),
        _ if keys.today.matches(&key) => app.go_to_today(),
        _ if keys.toggle_day.matches(&key) => app.toggle_cursor_day()?,
        _ if keys.edit.matches(&key) => app.open_day_editor()?,
        _ if keys.clear_override.matches(&key) => app.clear_cursor_override()?,
        _ if keys.invoice.matches(&key) => app.open_invoice_form(),
        _ => {}
    }
    Ok(())
}

fn handle_schedule(app: &mut App, keys: &KeyMap, key: KeyEvent) -> Result<(), TuiError> {
    match key.code {
        KeyCode::Up => app.move_schedule_selection(-1),
        KeyCode::Down => app.move_schedule_selection(1),
        _ if keys.toggle_day.matches(&key) => app.toggle_selected_weekday()?,
        _ if keys.edit.matches(&key) => app.open_schedule_editor(),
        _ => {}
    }
    Ok(())
}

fn handle_history(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Up => app.move_history_selection(-1),
        KeyCode::Down => app.move_history_selection(1),
        KeyCode::Home => app.ui.history_index = 0,
        _ => {}
    }
}

fn handle_day_editor(app: &mut App, key: KeyEvent) -> Result<(), TuiError> {
    let keys = app.keys.clone();
    let Some(editor) = app.day_editor.as_mut() else {
        app.exit_to_view();
        return Ok(());
    };

    // Time fields take digits and ':' before any binding is considered
    if let Some(input) = editor.active_input() {
        if edit_time_input(input, &key) {
            return Ok(());
        }
    }

    match key.code {
        KeyCode::Esc => app.exit_to_view(),
        KeyCode::Tab | KeyCode::Down => editor.next_field(),
        KeyCode::BackTab | KeyCode::Up => editor.previous_field(),
        _ if keys.save.matches(&key) || key.code == KeyCode::Enter => app.confirm_day_editor()?,
        KeyCode::Char(' ') => match editor.field {
            DayEditorField::Attended => app.day_editor_toggle_attended()?,
            DayEditorField::CustomHours => app.day_editor_toggle_custom(),
            _ => {}
        },
        _ if keys.clear_override.matches(&key) => app.day_editor_clear_override()?,
        _ => {}
    }
    Ok(())
}

fn handle_invoice_form(app: &mut App, key: KeyEvent) -> Result<(), TuiError> {
    let keys = app.keys.clone();
    match key.code {
        KeyCode::Esc => app.cancel_invoice_form(),
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => app.invoice_form.toggle_field(),
        _ if keys.save.matches(&key) || key.code == KeyCode::Enter => app.submit_invoice()?,
        _ => {
            edit_text_input(app.invoice_form.active_input(), &key);
        }
    }
    Ok(())
}

fn handle_rate_input(app: &mut App, key: KeyEvent) -> Result<(), TuiError> {
    let keys = app.keys.clone();
    match key.code {
        KeyCode::Esc => app.exit_to_view(),
        _ if keys.save.matches(&key) || key.code == KeyCode::Enter => app.submit_rate()?,
        _ => {
            edit_text_input(&mut app.rate_input, &key);
        }
    }
    Ok(())
}

fn handle_schedule_editor(app: &mut App, key: KeyEvent) -> Result<(), TuiError> {
    let keys = app.keys.clone();
    let Some(editor) = app.schedule_editor.as_mut() else {
        app.exit_to_view();
        return Ok(());
    };

    if let Some(input) = editor.active_input() {
        if edit_time_input(input, &key) {
            return Ok(());
        }
    }

    match key.code {
        KeyCode::Esc => app.exit_to_view(),
        KeyCode::Tab | KeyCode::Down => editor.next_field(),
        KeyCode::BackTab | KeyCode::Up => editor.previous_field(),
        _ if keys.save.matches(&key) || key.code == KeyCode::Enter => app.submit_schedule_editor()?,
        KeyCode::Char(' ') if editor.field == ScheduleField::Enabled => editor.enabled = !editor.enabled,
        _ => {}
    }
    Ok(())
}

/// Editing keys for an `HH:MM` field. Returns whether the key was consumed.
fn edit_time_input(input: &mut LineInput, key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Char(c) if c.is_ascii_digit() || c == ':' => {
            if input.len() < 5 {
                input.insert(c);
            }
            true
        }
        KeyCode::Backspace | KeyCode::Delete | KeyCode::Left | KeyCode::Right | KeyCode::Home | KeyCode::End => {
            edit_text_input(input, key)
        }
        _ => false,
    }
}

/// Generic single-line editing keys. Returns whether the key was consumed.
fn edit_text_input(input: &mut LineInput, key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => input.insert(c),
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => input.move_left(),
        KeyCode::Right => input.move_right(),
        KeyCode::Home => input.move_home(),
        KeyCode::End => input.move_end(),
        _ => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, Database};

    fn app() -> App {
        App::new(Config::default(), Database::open_in_memory().unwrap()).unwrap()
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE)).unwrap();
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn quit_and_tabs() {
        let mut app = app();
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.ui.current_tab, Tab::Schedule);
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.ui.current_tab, Tab::History);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.ui.current_tab, Tab::Schedule);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn help_opens_and_closes() {
        let mut app = app();
        press(&mut app, KeyCode::F(1));
        assert_eq!(app.ui.mode, Mode::Help);
        press(&mut app, KeyCode::Char('q'));
        assert_eq!(app.ui.mode, Mode::View);
        assert!(!app.should_quit);
    }

    #[test]
    fn space_toggles_cursor_day() {
        let mut app = app();
        let today = app.cursor_key().unwrap();
        press(&mut app, KeyCode::Char(' '));
        assert!(app.selected_days.contains(&today));
    }

    #[test]
    fn day_editor_typing_goes_to_time_fields() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.ui.mode, Mode::DayEditor);
        // Attended -> CustomHours, enable it, then into Start
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Tab);
        for _ in 0..5 {
            press(&mut app, KeyCode::Backspace);
        }
        type_str(&mut app, "07:45");
        let editor = app.day_editor.as_ref().unwrap();
        assert_eq!(editor.field, DayEditorField::Start);
        assert_eq!(editor.start.value(), "07:45");

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.ui.mode, Mode::View);
        let key = app.cursor_key().unwrap();
        assert_eq!(app.overrides.get(&key).unwrap().start.to_string(), "07:45");
    }

    #[test]
    fn time_field_caps_length() {
        let mut app = app();
        app.open_schedule_editor();
        press(&mut app, KeyCode::Tab);
        type_str(&mut app, "123");
        assert_eq!(app.schedule_editor.as_ref().unwrap().start.value(), "08:30");
    }

    #[test]
    fn invoice_form_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('i'));
        assert_eq!(app.ui.mode, Mode::InvoiceForm);
        type_str(&mut app, "12.5");
        press(&mut app, KeyCode::Tab);
        type_str(&mut app, "q1");
        assert_eq!(app.invoice_form.comment.value(), "q1");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.ui.mode, Mode::View);
        assert_eq!(app.invoice_form.amount.value(), "");
    }

    #[test]
    fn bad_binding_is_reported() {
        let mut bindings = KeyBindings::default();
        bindings.export = "Hyper+x".to_string();
        assert!(matches!(KeyMap::from_config(&bindings), Err(TuiError::KeyBindingError(_))));
    }
}
