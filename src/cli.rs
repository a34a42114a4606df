use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thiserror::Error;

use crate::calculation::calculate_month;
use crate::calendar::{self, DateKey};
use crate::database::{Database, DatabaseError};
use crate::invoices::{self, Variance};
use crate::models::{parse_rate, BillingConfig, DaySchedule, InputError, MonthSummary, TimeOfDay, TimeSlot};
use crate::statement::{Statement, StatementFormat};
use crate::Config;

#[derive(Parser)]
#[command(name = "creche")]
#[command(about = "Daycare hours tracker - monthly hours, amount owed and invoice reconciliation")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch interactive TUI (default if no subcommand)
    Tui,
    /// Mark or unmark a day as attended
    Toggle {
        /// Day (YYYY-MM-DD)
        date: String,
    },
    /// Use custom hours for one day (also marks it attended)
    Override {
        /// Day (YYYY-MM-DD)
        date: String,
        /// Start time (HH:MM)
        start: String,
        /// End time (HH:MM)
        end: String,
    },
    /// Go back to the weekly hours for one day
    ClearOverride {
        /// Day (YYYY-MM-DD)
        date: String,
    },
    /// Show the hours and amount of a month
    Summary {
        /// Month (YYYY-MM), current month if omitted
        #[arg(long)]
        month: Option<String>,
    },
    /// Save a month together with the amount the daycare invoiced
    Commit {
        /// Month (YYYY-MM), current month if omitted
        #[arg(long)]
        month: Option<String>,
        /// Invoiced amount, the calculated amount if omitted
        #[arg(long)]
        amount: Option<String>,
        /// Free text note
        #[arg(long)]
        comment: Option<String>,
    },
    /// List saved months, newest first
    History,
    /// Write the printable statement of a month
    Export {
        /// Month (YYYY-MM), current month if omitted
        #[arg(long)]
        month: Option<String>,
        #[arg(long, value_enum, default_value = "html")]
        format: StatementFormat,
        /// Output file, defaults to statement-YYYY-MM.<ext> in the export directory
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Set the hourly rate
    SetRate {
        rate: String,
    },
    /// Show the weekly schedule
    Schedule,
    /// Change the weekly hours of one weekday
    SetSchedule {
        /// Weekday name (mon, tuesday, ...) or index (0 = Sunday)
        weekday: String,
        /// Start time (HH:MM)
        #[arg(long)]
        start: Option<String>,
        /// End time (HH:MM)
        #[arg(long)]
        end: Option<String>,
        #[arg(long, conflicts_with = "disable")]
        enable: bool,
        #[arg(long)]
        disable: bool,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
    #[error("{0}")]
    InputError(#[from] InputError),
    #[error("Failed to write {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Month given on the command line, or the current one
fn resolve_month(month: Option<&str>) -> Result<(i32, u32), CliError> {
    match month {
        Some(text) => Ok(calendar::parse_month_key(text)?),
        None => {
            let today = calendar::today();
            Ok((today.year(), today.month0()))
        }
    }
}

fn parse_slot(start: &str, end: &str) -> Result<TimeSlot, InputError> {
    Ok(TimeSlot {
        start: start.parse::<TimeOfDay>()?,
        end: end.parse::<TimeOfDay>()?,
    })
}

/// Current totals of a month from the stored state
pub fn month_summary(db: &Database, year: i32, month0: u32) -> Result<MonthSummary, CliError> {
    let config = db.load_config()?;
    Ok(calculate_month(
        year,
        month0,
        &db.load_selected_days()?,
        &db.load_schedule()?,
        config.hourly_rate,
        &db.load_day_overrides()?,
    ))
}

fn variance_line(variance: Variance) -> String {
    match variance {
        Variance::NoDifference => "Invoice matches the calculated amount".to_string(),
        other => format!("Invoice difference: {}", other),
    }
}

/// Handle the toggle command, returning whether the day is now selected
pub fn handle_toggle(date: &str, db: &Database) -> Result<bool, CliError> {
    let key: DateKey = date.parse()?;
    let mut selected = db.load_selected_days()?;
    let now_selected = selected.toggle(key);
    db.save_selected_days(&selected)?;
    println!("{} {}", key, if now_selected { "marked attended" } else { "unmarked" });
    Ok(now_selected)
}

pub fn handle_override(date: &str, start: &str, end: &str, db: &Database) -> Result<(), CliError> {
    let key: DateKey = date.parse()?;
    let slot = parse_slot(start, end)?;

    // custom hours imply the day was attended
    let mut selected = db.load_selected_days()?;
    if !selected.contains(&key) {
        selected.select(key);
        db.save_selected_days(&selected)?;
    }

    let mut overrides = db.load_day_overrides()?;
    overrides.set(key, slot);
    db.save_day_overrides(&overrides)?;
    println!("{}: custom hours {} - {}", key, slot.start, slot.end);
    Ok(())
}

pub fn handle_clear_override(date: &str, db: &Database) -> Result<(), CliError> {
    let key: DateKey = date.parse()?;
    let mut overrides = db.load_day_overrides()?;
    if overrides.clear(&key).is_some() {
        db.save_day_overrides(&overrides)?;
        println!("{}: back to weekly hours", key);
    } else {
        println!("{}: no custom hours", key);
    }
    Ok(())
}

pub fn handle_summary(month: Option<&str>, db: &Database) -> Result<MonthSummary, CliError> {
    let (year, month0) = resolve_month(month)?;
    let summary = month_summary(db, year, month0)?;
    let rate = db.load_config()?.hourly_rate;

    println!("{}", calendar::month_title(year, month0));
    println!("  Days attended: {}", summary.total_days);
    println!("  Total hours:   {:.2}h", summary.total_hours);
    println!("  Hourly rate:   {:.2}/h", rate);
    println!("  Amount:        {:.2}", summary.total_amount);

    let store = db.load_invoices()?;
    if let Some(invoice) = store.find(&calendar::month_key(year, month0)) {
        println!(
            "  Saved on {}: invoiced {:.2} for {:.2} calculated",
            invoice.saved_at.format("%Y-%m-%d"),
            invoice.invoiced_amount,
            invoice.calculated_amount
        );
        println!("  {}", variance_line(invoices::classify(invoice)));
    }
    Ok(summary)
}

pub fn handle_commit(
    month: Option<&str>,
    amount: Option<&str>,
    comment: Option<&str>,
    db: &Database,
) -> Result<(), CliError> {
    let (year, month0) = resolve_month(month)?;
    let summary = month_summary(db, year, month0)?;
    let invoice = invoices::commit_month(
        year,
        month0,
        &summary,
        amount.unwrap_or(""),
        comment.unwrap_or(""),
        chrono::Utc::now(),
    )?;

    let mut store = db.load_invoices()?;
    let variance = invoices::classify(&invoice);
    let key = invoice.key.clone();
    store.upsert(invoice);
    db.save_invoices(&store)?;
    tracing::info!(month = %key, "Month committed");

    println!("Saved {}", calendar::month_title(year, month0));
    println!("  {}", variance_line(variance));
    Ok(())
}

pub fn handle_history(db: &Database) -> Result<(), CliError> {
    let store = db.load_invoices()?;
    if store.is_empty() {
        println!("No saved months yet. Save one with `creche commit`.");
        return Ok(());
    }

    for invoice in store.list().iter().rev() {
        println!(
            "{:<16} {:>9.2}  {:>3} days  {:>6.1}h  invoiced {:>9.2}",
            calendar::month_title(invoice.year, invoice.month),
            invoice.calculated_amount,
            invoice.calculated_days,
            invoice.calculated_hours,
            invoice.invoiced_amount
        );
        let variance = invoices::classify(invoice);
        if variance.is_meaningful() {
            println!("  difference {}", variance);
        }
        if !invoice.comment.is_empty() {
            println!("  {}", invoice.comment);
        }
    }
    Ok(())
}

pub fn handle_export(
    month: Option<&str>,
    format: StatementFormat,
    output: Option<PathBuf>,
    config: &Config,
    db: &Database,
) -> Result<PathBuf, CliError> {
    let (year, month0) = resolve_month(month)?;
    let statement = Statement::build(
        year,
        month0,
        &db.load_selected_days()?,
        &db.load_schedule()?,
        &db.load_day_overrides()?,
        db.load_config()?.hourly_rate,
    );

    let path = output.unwrap_or_else(|| config.get_export_dir().join(statement.file_name(format)));
    statement
        .write_to(format, &path)
        .map_err(|source| CliError::WriteError { path: path.clone(), source })?;
    println!("Statement written to {}", path.display());
    Ok(path)
}

pub fn handle_set_rate(rate: &str, db: &Database) -> Result<(), CliError> {
    let hourly_rate = parse_rate(rate)?;
    db.save_config(&BillingConfig { hourly_rate })?;
    println!("Hourly rate set to {:.2}", hourly_rate);
    Ok(())
}

pub fn handle_schedule(db: &Database) -> Result<(), CliError> {
    let schedule = db.load_schedule()?;
    for weekday in calendar::WEEKDAY_ORDER {
        let day = schedule.get(weekday);
        println!(
            "{:<10} {} - {}{}",
            calendar::weekday_name(weekday),
            day.start,
            day.end,
            if day.enabled { "" } else { "  (off)" }
        );
    }
    Ok(())
}

pub fn handle_set_schedule(
    weekday: &str,
    start: Option<&str>,
    end: Option<&str>,
    enable: bool,
    disable: bool,
    db: &Database,
) -> Result<(), CliError> {
    let weekday = calendar::parse_weekday(weekday)?;
    let mut schedule = db.load_schedule()?;
    let current = *schedule.get(weekday);

    let updated = DaySchedule {
        start: start.map(str::parse::<TimeOfDay>).transpose()?.unwrap_or(current.start),
        end: end.map(str::parse::<TimeOfDay>).transpose()?.unwrap_or(current.end),
        enabled: if enable {
            true
        } else if disable {
            false
        } else {
            current.enabled
        },
    };
    schedule.set(weekday, updated);
    db.save_schedule(&schedule)?;
    println!(
        "{}: {} - {}{}",
        calendar::weekday_name(weekday),
        updated.start,
        updated.end,
        if updated.enabled { "" } else { "  (off)" }
    );
    Ok(())
}
