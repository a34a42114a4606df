use crate::calculation::calculate_month;
use crate::calendar::{self, DateKey, WEEKDAY_ORDER};
use crate::database::{Database, DatabaseError};
use crate::invoices::{self, InvoiceStore, Variance};
use crate::models::{
    parse_rate, BillingConfig, DayOverrides, DaySchedule, MonthInvoice, MonthSummary,
    SelectedDays, TimeOfDay, TimeSlot, WeeklySchedule,
};
use crate::statement::{Statement, StatementFormat};
use crate::tui::events::KeyMap;
use crate::tui::error::TuiError;
use crate::tui::widgets::input::LineInput;
use crate::Config;
use chrono::{Utc, Weekday};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Calendar,
    Schedule,
    History,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Calendar, Tab::Schedule, Tab::History];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Calendar => "Calendar",
            Tab::Schedule => "Schedule",
            Tab::History => "History",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Tab::Calendar => 0,
            Tab::Schedule => 1,
            Tab::History => 2,
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    View,
    Help,
    DayEditor,
    InvoiceForm,
    RateInput,
    ScheduleEditor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayEditorField {
    Attended,
    CustomHours,
    Start,
    End,
}

/// Day detail popup: attendance, custom hours and their times
#[derive(Debug, Clone)]
pub struct DayEditorState {
    pub date: DateKey,
    pub custom_hours: bool,
    /// Whether the day had an override when the editor opened
    pub had_override: bool,
    pub start: LineInput,
    pub end: LineInput,
    pub field: DayEditorField,
}

impl DayEditorState {
    pub fn next_field(&mut self) {
        self.field = match self.field {
            DayEditorField::Attended => DayEditorField::CustomHours,
            DayEditorField::CustomHours if self.custom_hours => DayEditorField::Start,
            DayEditorField::CustomHours => DayEditorField::Attended,
            DayEditorField::Start => DayEditorField::End,
            DayEditorField::End => DayEditorField::Attended,
        };
    }

    pub fn previous_field(&mut self) {
        self.field = match self.field {
            DayEditorField::Attended if self.custom_hours => DayEditorField::End,
            DayEditorField::Attended => DayEditorField::CustomHours,
            DayEditorField::CustomHours => DayEditorField::Attended,
            DayEditorField::Start => DayEditorField::CustomHours,
            DayEditorField::End => DayEditorField::Start,
        };
    }

    pub fn active_input(&mut self) -> Option<&mut LineInput> {
        match self.field {
            DayEditorField::Start => Some(&mut self.start),
            DayEditorField::End => Some(&mut self.end),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceField {
    Amount,
    Comment,
}

/// Invoice entry for the displayed month. Lives across mode changes so the
/// side panel can always show what would be committed.
#[derive(Debug, Clone)]
pub struct InvoiceFormState {
    pub amount: LineInput,
    pub comment: LineInput,
    pub field: InvoiceField,
}

impl InvoiceFormState {
    fn prefilled(stored: Option<&MonthInvoice>) -> Self {
        let (amount, comment) = match stored {
            Some(invoice) => (format!("{:.2}", invoice.invoiced_amount), invoice.comment.clone()),
            None => (String::new(), String::new()),
        };
        Self {
            amount: LineInput::new(&amount),
            comment: LineInput::new(&comment),
            field: InvoiceField::Amount,
        }
    }

    pub fn toggle_field(&mut self) {
        self.field = match self.field {
            InvoiceField::Amount => InvoiceField::Comment,
            InvoiceField::Comment => InvoiceField::Amount,
        };
    }

    pub fn active_input(&mut self) -> &mut LineInput {
        match self.field {
            InvoiceField::Amount => &mut self.amount,
            InvoiceField::Comment => &mut self.comment,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleField {
    Enabled,
    Start,
    End,
}

#[derive(Debug, Clone)]
pub struct ScheduleEditorState {
    pub weekday: Weekday,
    pub enabled: bool,
    pub start: LineInput,
    pub end: LineInput,
    pub field: ScheduleField,
}

impl ScheduleEditorState {
    pub fn next_field(&mut self) {
        self.field = match self.field {
            ScheduleField::Enabled => ScheduleField::Start,
            ScheduleField::Start => ScheduleField::End,
            ScheduleField::End => ScheduleField::Enabled,
        };
    }

    pub fn previous_field(&mut self) {
        self.field = match self.field {
            ScheduleField::Enabled => ScheduleField::End,
            ScheduleField::Start => ScheduleField::Enabled,
            ScheduleField::End => ScheduleField::Start,
        };
    }

    pub fn active_input(&mut self) -> Option<&mut LineInput> {
        match self.field {
            ScheduleField::Start => Some(&mut self.start),
            ScheduleField::End => Some(&mut self.end),
            ScheduleField::Enabled => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UiState {
    pub current_tab: Tab,
    pub mode: Mode,
    pub year: i32,
    /// 0-based month on display
    pub month0: u32,
    /// Highlighted day of the displayed month
    pub cursor_day: u32,
    /// Row in the Monday-first schedule list
    pub schedule_index: usize,
    /// Row in the newest-first history list
    pub history_index: usize,
}

#[derive(Debug, Clone, Default)]
pub struct StatusState {
    pub message: Option<String>,
    pub message_time: Option<Instant>,
}

pub struct App {
    pub config: Config,
    pub database: Database,
    pub keys: KeyMap,

    pub billing: BillingConfig,
    pub schedule: WeeklySchedule,
    pub selected_days: SelectedDays,
    pub overrides: DayOverrides,
    pub invoices: InvoiceStore,

    pub ui: UiState,
    pub status: StatusState,
    pub day_editor: Option<DayEditorState>,
    pub invoice_form: InvoiceFormState,
    pub rate_input: LineInput,
    pub schedule_editor: Option<ScheduleEditorState>,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: Config, database: Database) -> Result<Self, TuiError> {
        let keys = KeyMap::from_config(&config.key_bindings)?;
        let today = calendar::today();

        let invoices = database.load_invoices()?;
        let invoice_form = InvoiceFormState::prefilled(invoices.find(&today.month_key()));

        let app = Self {
            billing: database.load_config()?,
            schedule: database.load_schedule()?,
            selected_days: database.load_selected_days()?,
            overrides: database.load_day_overrides()?,
            invoices,
            config,
            database,
            keys,
            ui: UiState {
                current_tab: Tab::Calendar,
                mode: Mode::View,
                year: today.year(),
                month0: today.month0(),
                cursor_day: today.day(),
                schedule_index: 0,
                history_index: 0,
            },
            status: StatusState::default(),
            day_editor: None,
            invoice_form,
            rate_input: LineInput::default(),
            schedule_editor: None,
            should_quit: false,
        };
        tracing::debug!(
            selected = app.selected_days.len(),
            overrides = app.overrides.len(),
            invoices = app.invoices.len(),
            "TUI state loaded"
        );
        Ok(app)
    }

    // ---- derived data ----

    /// Totals of the displayed month, recomputed from current state
    pub fn summary(&self) -> MonthSummary {
        calculate_month(
            self.ui.year,
            self.ui.month0,
            &self.selected_days,
            &self.schedule,
            self.billing.hourly_rate,
            &self.overrides,
        )
    }

    pub fn current_month_key(&self) -> String {
        calendar::month_key(self.ui.year, self.ui.month0)
    }

    pub fn stored_invoice(&self) -> Option<&MonthInvoice> {
        self.invoices.find(&self.current_month_key())
    }

    /// Live variance of the typed amount, only when it is worth showing
    pub fn invoice_preview(&self) -> Option<Variance> {
        invoices::preview_variance(self.invoice_form.amount.value(), &self.summary())
            .filter(Variance::is_meaningful)
    }

    pub fn cursor_key(&self) -> Option<DateKey> {
        calendar::date_key(self.ui.year, self.ui.month0, self.ui.cursor_day)
    }

    /// Weekdays in display order (Monday first)
    pub fn schedule_rows(&self) -> impl Iterator<Item = (Weekday, &DaySchedule)> {
        WEEKDAY_ORDER.iter().map(|&wd| (wd, self.schedule.get(wd)))
    }

    /// Stored invoices, newest month first
    pub fn history_rows(&self) -> impl Iterator<Item = &MonthInvoice> {
        self.invoices.list().iter().rev()
    }

    // ---- status ----

    pub fn set_status_message(&mut self, message: String) {
        self.status.message = Some(message);
        self.status.message_time = Some(Instant::now());
    }

    pub fn clear_status_message(&mut self) {
        self.status.message = None;
        self.status.message_time = None;
    }

    /// Check if status message should be auto-cleared (after 3 seconds)
    pub fn check_status_message_timeout(&mut self) {
        const STATUS_MESSAGE_TIMEOUT_SECS: u64 = 3;
        if let Some(time) = self.status.message_time {
            if time.elapsed().as_secs() >= STATUS_MESSAGE_TIMEOUT_SECS {
                self.clear_status_message();
            }
        }
    }

    // ---- tabs and modes ----

    pub fn switch_tab(&mut self, tab: Tab) {
        self.ui.current_tab = tab;
        self.ui.mode = Mode::View;
    }

    pub fn enter_help_mode(&mut self) {
        self.ui.mode = Mode::Help;
    }

    pub fn exit_to_view(&mut self) {
        self.ui.mode = Mode::View;
        self.day_editor = None;
        self.schedule_editor = None;
    }

    // ---- calendar navigation ----

    /// Move the cursor by `delta` days, staying inside the displayed month
    pub fn move_cursor(&mut self, delta: i64) {
        let last = calendar::days_in_month(self.ui.year, self.ui.month0) as i64;
        let day = (self.ui.cursor_day as i64 + delta).clamp(1, last.max(1));
        self.ui.cursor_day = day as u32;
    }

    pub fn previous_month(&mut self) {
        let (year, month0) = calendar::previous_month(self.ui.year, self.ui.month0);
        self.show_month(year, month0, self.ui.cursor_day);
    }

    pub fn next_month(&mut self) {
        let (year, month0) = calendar::next_month(self.ui.year, self.ui.month0);
        self.show_month(year, month0, self.ui.cursor_day);
    }

    pub fn go_to_today(&mut self) {
        let today = calendar::today();
        self.show_month(today.year(), today.month0(), today.day());
    }

    fn show_month(&mut self, year: i32, month0: u32, day: u32) {
        self.ui.year = year;
        self.ui.month0 = month0;
        self.ui.cursor_day = day.clamp(1, calendar::days_in_month(year, month0).max(1));
        self.invoice_form = InvoiceFormState::prefilled(self.stored_invoice());
    }

    // ---- attendance ----

    /// Flip attendance of the cursor day and persist
    pub fn toggle_cursor_day(&mut self) -> Result<(), DatabaseError> {
        let Some(key) = self.cursor_key() else {
            return Ok(());
        };
        let attended = self.selected_days.toggle(key);
        self.database.save_selected_days(&self.selected_days)?;
        tracing::debug!(date = %key, attended, "Day toggled");
        Ok(())
    }

    /// Remove the cursor day's custom hours, if any
    pub fn clear_cursor_override(&mut self) -> Result<(), DatabaseError> {
        let Some(key) = self.cursor_key() else {
            return Ok(());
        };
        if self.overrides.clear(&key).is_some() {
            self.database.save_day_overrides(&self.overrides)?;
            self.set_status_message(format!("Custom hours removed for {}", key.display_short()));
        }
        Ok(())
    }

    // ---- day editor ----

    /// Open the day popup on the cursor day. An unselected day is selected
    /// first; the time fields start from the existing override, else the
    /// weekday default, else 08:30-17:30.
    pub fn open_day_editor(&mut self) -> Result<(), DatabaseError> {
        let Some(key) = self.cursor_key() else {
            return Ok(());
        };
        if !self.selected_days.contains(&key) {
            self.selected_days.select(key);
            self.database.save_selected_days(&self.selected_days)?;
        }

        let existing = self.overrides.get(&key).copied();
        let seed = existing.unwrap_or_else(|| self.default_slot(&key));
        self.day_editor = Some(DayEditorState {
            date: key,
            custom_hours: existing.is_some(),
            had_override: existing.is_some(),
            start: LineInput::new(&seed.start.to_string()),
            end: LineInput::new(&seed.end.to_string()),
            field: DayEditorField::Attended,
        });
        self.ui.mode = Mode::DayEditor;
        Ok(())
    }

    fn default_slot(&self, key: &DateKey) -> TimeSlot {
        let day = self.schedule.get(calendar::weekday_of(key));
        if day.enabled {
            day.slot()
        } else {
            TimeSlot { start: TimeOfDay::DAY_START, end: TimeOfDay::DAY_END }
        }
    }

    /// Attendance checkbox in the popup; applied immediately
    pub fn day_editor_toggle_attended(&mut self) -> Result<(), DatabaseError> {
        let Some(date) = self.day_editor.as_ref().map(|e| e.date) else {
            return Ok(());
        };
        self.selected_days.toggle(date);
        self.database.save_selected_days(&self.selected_days)
    }

    /// Custom hours checkbox. Turning it on without a stored override
    /// reseeds the times from the weekday default.
    pub fn day_editor_toggle_custom(&mut self) {
        let Some(date) = self.day_editor.as_ref().map(|e| e.date) else {
            return;
        };
        let seed = self.default_slot(&date);
        if let Some(editor) = self.day_editor.as_mut() {
            editor.custom_hours = !editor.custom_hours;
            if editor.custom_hours && !editor.had_override {
                editor.start = LineInput::new(&seed.start.to_string());
                editor.end = LineInput::new(&seed.end.to_string());
            }
        }
    }

    /// Apply the popup: store the override when custom hours are on,
    /// otherwise drop an existing one. Invalid times keep the popup open.
    pub fn confirm_day_editor(&mut self) -> Result<(), DatabaseError> {
        let Some(editor) = self.day_editor.as_ref() else {
            return Ok(());
        };
        let date = editor.date;

        if editor.custom_hours {
            let slot = match parse_slot(&editor.start, &editor.end) {
                Ok(slot) => slot,
                Err(message) => {
                    self.set_status_message(message);
                    return Ok(());
                }
            };
            self.overrides.set(date, slot);
            self.database.save_day_overrides(&self.overrides)?;
            tracing::debug!(date = %date, start = %slot.start, end = %slot.end, "Override saved");
        } else if editor.had_override {
            self.overrides.clear(&date);
            self.database.save_day_overrides(&self.overrides)?;
        }

        self.exit_to_view();
        Ok(())
    }

    /// "Clear" button of the popup: remove the override and close
    pub fn day_editor_clear_override(&mut self) -> Result<(), DatabaseError> {
        let Some(date) = self.day_editor.as_ref().map(|e| e.date) else {
            return Ok(());
        };
        if self.overrides.clear(&date).is_some() {
            self.database.save_day_overrides(&self.overrides)?;
        }
        self.exit_to_view();
        Ok(())
    }

    // ---- invoice ----

    pub fn open_invoice_form(&mut self) {
        self.invoice_form.field = InvoiceField::Amount;
        self.ui.mode = Mode::InvoiceForm;
    }

    /// Discard edits and go back to what is stored for the month
    pub fn cancel_invoice_form(&mut self) {
        self.invoice_form = InvoiceFormState::prefilled(self.stored_invoice());
        self.ui.mode = Mode::View;
    }

    /// Commit the displayed month with the typed amount (blank means the
    /// calculated amount) and persist the invoice list.
    pub fn submit_invoice(&mut self) -> Result<(), DatabaseError> {
        let summary = self.summary();
        let invoice = match invoices::commit_month(
            self.ui.year,
            self.ui.month0,
            &summary,
            self.invoice_form.amount.value(),
            self.invoice_form.comment.value(),
            Utc::now(),
        ) {
            Ok(invoice) => invoice,
            Err(e) => {
                tracing::warn!(error = %e, "Invoiced amount rejected");
                self.set_status_message(e.to_string());
                return Ok(());
            }
        };

        let message = match invoices::classify(&invoice) {
            Variance::NoDifference => format!("{} saved", calendar::month_title(self.ui.year, self.ui.month0)),
            other => format!("{} saved, invoice {}", calendar::month_title(self.ui.year, self.ui.month0), other),
        };
        self.invoices.upsert(invoice);
        self.database.save_invoices(&self.invoices)?;
        self.invoice_form = InvoiceFormState::prefilled(self.stored_invoice());
        self.ui.mode = Mode::View;
        self.set_status_message(message);
        Ok(())
    }

    // ---- rate ----

    pub fn open_rate_input(&mut self) {
        self.rate_input = LineInput::new(&format!("{:.2}", self.billing.hourly_rate));
        self.ui.mode = Mode::RateInput;
    }

    /// Store the typed rate. Invalid input keeps the previous rate.
    pub fn submit_rate(&mut self) -> Result<(), DatabaseError> {
        match parse_rate(self.rate_input.value()) {
            Ok(rate) => {
                self.billing.hourly_rate = rate;
                self.database.save_config(&self.billing)?;
                self.set_status_message(format!("Hourly rate set to {:.2}", rate));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Hourly rate rejected");
                self.set_status_message(format!("{}, rate unchanged", e));
            }
        }
        self.ui.mode = Mode::View;
        Ok(())
    }

    // ---- schedule ----

    pub fn selected_weekday(&self) -> Weekday {
        WEEKDAY_ORDER[self.ui.schedule_index.min(WEEKDAY_ORDER.len() - 1)]
    }

    pub fn move_schedule_selection(&mut self, delta: isize) {
        let last = WEEKDAY_ORDER.len() as isize - 1;
        self.ui.schedule_index = (self.ui.schedule_index as isize + delta).clamp(0, last) as usize;
    }

    pub fn toggle_selected_weekday(&mut self) -> Result<(), DatabaseError> {
        let weekday = self.selected_weekday();
        self.schedule.toggle(weekday);
        self.database.save_schedule(&self.schedule)
    }

    pub fn open_schedule_editor(&mut self) {
        let weekday = self.selected_weekday();
        let day = self.schedule.get(weekday);
        self.schedule_editor = Some(ScheduleEditorState {
            weekday,
            enabled: day.enabled,
            start: LineInput::new(&day.start.to_string()),
            end: LineInput::new(&day.end.to_string()),
            field: ScheduleField::Enabled,
        });
        self.ui.mode = Mode::ScheduleEditor;
    }

    pub fn submit_schedule_editor(&mut self) -> Result<(), DatabaseError> {
        let Some(editor) = self.schedule_editor.as_ref() else {
            return Ok(());
        };
        let slot = match parse_slot(&editor.start, &editor.end) {
            Ok(slot) => slot,
            Err(message) => {
                self.set_status_message(message);
                return Ok(());
            }
        };
        let weekday = editor.weekday;
        self.schedule.set(
            weekday,
            DaySchedule { start: slot.start, end: slot.end, enabled: editor.enabled },
        );
        self.database.save_schedule(&self.schedule)?;
        self.set_status_message(format!("{} updated", calendar::weekday_name(weekday)));
        self.exit_to_view();
        Ok(())
    }

    // ---- history ----

    pub fn move_history_selection(&mut self, delta: isize) {
        let last = self.invoices.len().saturating_sub(1) as isize;
        self.ui.history_index = (self.ui.history_index as isize + delta).clamp(0, last) as usize;
    }

    // ---- export ----

    /// Write the displayed month's HTML statement into the export directory
    pub fn export_statement(&mut self) -> PathBuf {
        let statement = Statement::build(
            self.ui.year,
            self.ui.month0,
            &self.selected_days,
            &self.schedule,
            &self.overrides,
            self.billing.hourly_rate,
        );
        let path = self
            .config
            .get_export_dir()
            .join(statement.file_name(StatementFormat::Html));
        match statement.write_to(StatementFormat::Html, &path) {
            Ok(()) => self.set_status_message(format!("Statement written to {}", path.display())),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Statement export failed");
                self.set_status_message(format!("Export failed: {}", e));
            }
        }
        path
    }
}

fn parse_slot(start: &LineInput, end: &LineInput) -> Result<TimeSlot, String> {
    let start = start
        .value()
        .parse::<TimeOfDay>()
        .map_err(|e| format!("Start: {}", e))?;
    let end = end
        .value()
        .parse::<TimeOfDay>()
        .map_err(|e| format!("End: {}", e))?;
    Ok(TimeSlot { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn app() -> App {
        let mut app = App::new(Config::default(), Database::open_in_memory().unwrap()).unwrap();
        // March 2024: the 1st is a Friday, the 9th a Saturday
        app.show_month(2024, 2, 4);
        app
    }

    fn key(s: &str) -> DateKey {
        s.parse().unwrap()
    }

    fn type_text(input: &mut LineInput, text: &str) {
        input.clear();
        for c in text.chars() {
            input.insert(c);
        }
    }

    #[test]
    fn toggling_persists_selection() {
        let mut app = app();
        app.toggle_cursor_day().unwrap();
        assert!(app.selected_days.contains(&key("2024-03-04")));
        assert!(app.database.load_selected_days().unwrap().contains(&key("2024-03-04")));
        assert_eq!(app.summary().total_hours, dec!(9.00));

        app.toggle_cursor_day().unwrap();
        assert!(app.database.load_selected_days().unwrap().is_empty());
    }

    #[test]
    fn cursor_stays_inside_month() {
        let mut app = app();
        app.move_cursor(-10);
        assert_eq!(app.ui.cursor_day, 1);
        app.move_cursor(100);
        assert_eq!(app.ui.cursor_day, 31);
        app.next_month();
        // April has 30 days
        assert_eq!((app.ui.year, app.ui.month0, app.ui.cursor_day), (2024, 3, 30));
    }

    #[test]
    fn month_navigation_wraps_years() {
        let mut app = app();
        app.show_month(2024, 0, 1);
        app.previous_month();
        assert_eq!((app.ui.year, app.ui.month0), (2023, 11));
        app.next_month();
        app.next_month();
        assert_eq!((app.ui.year, app.ui.month0), (2024, 1));
    }

    #[test]
    fn day_editor_selects_and_seeds_defaults() {
        let mut app = app();
        app.move_cursor(5); // Saturday 9th, disabled by default
        app.open_day_editor().unwrap();
        assert!(app.selected_days.contains(&key("2024-03-09")));
        let editor = app.day_editor.as_ref().unwrap();
        assert!(!editor.custom_hours);
        assert_eq!(editor.start.value(), "08:30");
        assert_eq!(editor.end.value(), "17:30");
        assert_eq!(app.ui.mode, Mode::DayEditor);
    }

    #[test]
    fn day_editor_saves_and_clears_override() {
        let mut app = app();
        app.move_cursor(5);
        app.open_day_editor().unwrap();
        app.day_editor_toggle_custom();
        {
            let editor = app.day_editor.as_mut().unwrap();
            type_text(&mut editor.start, "09:00");
            type_text(&mut editor.end, "13:00");
        }
        app.confirm_day_editor().unwrap();
        assert_eq!(app.ui.mode, Mode::View);
        assert_eq!(app.summary().total_hours, dec!(4.00));
        assert_eq!(app.database.load_day_overrides().unwrap().len(), 1);

        // reopening seeds from the override; unchecking clears it
        app.open_day_editor().unwrap();
        assert_eq!(app.day_editor.as_ref().unwrap().start.value(), "09:00");
        app.day_editor_toggle_custom();
        app.confirm_day_editor().unwrap();
        assert!(app.overrides.is_empty());
        assert!(app.database.load_day_overrides().unwrap().is_empty());
    }

    #[test]
    fn invalid_override_time_keeps_editor_open() {
        let mut app = app();
        app.open_day_editor().unwrap();
        app.day_editor_toggle_custom();
        type_text(&mut app.day_editor.as_mut().unwrap().end, "25:00");
        app.confirm_day_editor().unwrap();
        assert_eq!(app.ui.mode, Mode::DayEditor);
        assert!(app.overrides.is_empty());
        assert!(app.status.message.is_some());
    }

    #[test]
    fn invoice_commit_and_prefill() {
        let mut app = app();
        app.toggle_cursor_day().unwrap();
        app.open_invoice_form();
        type_text(&mut app.invoice_form.amount, "30,00");
        assert_eq!(app.invoice_preview(), Some(Variance::OverInvoiced(dec!(1.20))));
        type_text(&mut app.invoice_form.comment, "  holiday  ");
        app.submit_invoice().unwrap();

        let stored = app.database.load_invoices().unwrap();
        let invoice = stored.find("2024-03").unwrap();
        assert_eq!(invoice.invoiced_amount, dec!(30.00));
        assert_eq!(invoice.calculated_amount, dec!(28.80));
        assert_eq!(invoice.comment, "holiday");

        app.next_month();
        assert_eq!(app.invoice_form.amount.value(), "");
        app.previous_month();
        assert_eq!(app.invoice_form.amount.value(), "30.00");
        assert_eq!(app.invoice_form.comment.value(), "holiday");
    }

    #[test]
    fn preview_hides_rounding_noise() {
        let mut app = app();
        app.toggle_cursor_day().unwrap();
        type_text(&mut app.invoice_form.amount, "28.81");
        assert_eq!(app.invoice_preview(), None);
        type_text(&mut app.invoice_form.amount, "abc");
        assert_eq!(app.invoice_preview(), None);
    }

    #[test]
    fn bad_invoice_amount_is_reported() {
        let mut app = app();
        app.open_invoice_form();
        type_text(&mut app.invoice_form.amount, "-3");
        app.submit_invoice().unwrap();
        assert!(app.invoices.is_empty());
        assert_eq!(app.ui.mode, Mode::InvoiceForm);
    }

    #[test]
    fn rate_rejects_bad_input() {
        let mut app = app();
        app.open_rate_input();
        type_text(&mut app.rate_input, "4,5");
        app.submit_rate().unwrap();
        assert_eq!(app.database.load_config().unwrap().hourly_rate, dec!(4.5));

        app.open_rate_input();
        type_text(&mut app.rate_input, "lots");
        app.submit_rate().unwrap();
        assert_eq!(app.billing.hourly_rate, dec!(4.5));
    }

    #[test]
    fn rate_is_stored_to_cents() {
        let mut app = app();
        app.open_rate_input();
        type_text(&mut app.rate_input, "3.125");
        app.submit_rate().unwrap();
        assert_eq!(app.billing.hourly_rate, dec!(3.13));
        assert_eq!(app.database.load_config().unwrap().hourly_rate, dec!(3.13));
    }

    #[test]
    fn schedule_edit_is_persisted() {
        let mut app = app();
        // Monday first
        assert_eq!(app.selected_weekday(), Weekday::Mon);
        app.move_schedule_selection(5);
        assert_eq!(app.selected_weekday(), Weekday::Sat);
        app.open_schedule_editor();
        {
            let editor = app.schedule_editor.as_mut().unwrap();
            editor.enabled = true;
            type_text(&mut editor.start, "09:00");
            type_text(&mut editor.end, "12:00");
        }
        app.submit_schedule_editor().unwrap();
        let saturday = *app.database.load_schedule().unwrap().get(Weekday::Sat);
        assert!(saturday.enabled);
        assert_eq!(saturday.start.to_string(), "09:00");

        app.toggle_selected_weekday().unwrap();
        assert!(!app.database.load_schedule().unwrap().get(Weekday::Sat).enabled);
    }

    #[test]
    fn export_writes_statement_file() {
        let dir = std::env::temp_dir().join(format!("creche-tui-export-{}", std::process::id()));
        let mut config = Config::default();
        config.export_dir = Some(dir.to_string_lossy().to_string());
        let mut app = App::new(config, Database::open_in_memory().unwrap()).unwrap();
        app.show_month(2024, 2, 4);
        app.toggle_cursor_day().unwrap();

        let path = app.export_statement();
        assert!(path.ends_with("statement-2024-03.html"));
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("28.80"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn history_is_newest_first() {
        let mut app = app();
        let summary = MonthSummary::default();
        let now = Utc::now();
        app.invoices.upsert(invoices::commit_month(2024, 0, &summary, "", "", now).unwrap());
        app.invoices.upsert(invoices::commit_month(2024, 2, &summary, "", "", now).unwrap());
        let keys: Vec<_> = app.history_rows().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, ["2024-03", "2024-01"]);
        app.move_history_selection(5);
        assert_eq!(app.ui.history_index, 1);
    }
}
