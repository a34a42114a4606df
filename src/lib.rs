pub mod calculation;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod database;
pub mod invoices;
pub mod models;
pub mod statement;
pub mod tui;
pub mod utils;

pub use calculation::calculate_month;
pub use calendar::DateKey;
pub use config::Config;
pub use database::Database;
pub use invoices::{InvoiceStore, Variance};
pub use models::{MonthInvoice, MonthSummary, WeeklySchedule};
pub use utils::Profile;
