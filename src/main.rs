use clap::Parser;
use color_eyre::Result;
use creche::{Config, Database, Profile, cli::{self, Cli, Commands}};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Log to stderr for one-shot commands. The TUI owns the terminal, so it
/// logs to a file next to the database instead.
fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // --dev keeps config and database apart from the real ones
    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    let config = match cli.config {
        Some(ref path) => Config::load_from_path(Path::new(path))?,
        None => Config::load_with_profile(profile)?,
    };

    let db_path = config.get_database_path();
    let command = cli.command.unwrap_or(Commands::Tui);

    let log_file = matches!(command, Commands::Tui).then(|| db_path.with_file_name("creche.log"));
    init_logging(log_file.as_deref())?;

    let db = Database::new(
        db_path.to_str()
            .ok_or_else(|| color_eyre::eyre::eyre!("Database path contains invalid UTF-8"))?
    )?;

    match command {
        Commands::Tui => {
            let app = creche::tui::App::new(config, db)?;
            creche::tui::run_event_loop(app)?;
        }
        Commands::Toggle { date } => {
            cli::handle_toggle(&date, &db)?;
        }
        Commands::Override { date, start, end } => {
            cli::handle_override(&date, &start, &end, &db)?;
        }
        Commands::ClearOverride { date } => {
            cli::handle_clear_override(&date, &db)?;
        }
        Commands::Summary { month } => {
            cli::handle_summary(month.as_deref(), &db)?;
        }
        Commands::Commit { month, amount, comment } => {
            cli::handle_commit(month.as_deref(), amount.as_deref(), comment.as_deref(), &db)?;
        }
        Commands::History => {
            cli::handle_history(&db)?;
        }
        Commands::Export { month, format, output } => {
            cli::handle_export(month.as_deref(), format, output, &config, &db)?;
        }
        Commands::SetRate { rate } => {
            cli::handle_set_rate(&rate, &db)?;
        }
        Commands::Schedule => {
            cli::handle_schedule(&db)?;
        }
        Commands::SetSchedule { weekday, start, end, enable, disable } => {
            cli::handle_set_schedule(&weekday, start.as_deref(), end.as_deref(), enable, disable, &db)?;
        }
    }

    Ok(())
}
