pub mod forget;
pub mod init;
pub mod rules;
pub mod status;
pub mod summary;
pub mod transactions;
pub mod upload;

use clap::{Parser, Subcommand};

use crate::error::{Result, SpendlensError};

/// Parse `YYYY-MM` into `(year, month)`.
pub(crate) fn parse_month(month: &str) -> Result<(i32, u32)> {
    let invalid = || SpendlensError::InvalidMonth(month.to_string());
    let (y, m) = month.trim().split_once('-').ok_or_else(invalid)?;
    let year: i32 = y.parse().map_err(|_| invalid())?;
    let month_num: u32 = m.parse().map_err(|_| invalid())?;
    if y.len() != 4 || !(1..=12).contains(&month_num) {
        return Err(invalid());
    }
    Ok((year, month_num))
}

#[derive(Parser)]
#[command(
    name = "spendlens",
    version,
    about = "Import bank and wallet statements, categorize spending, and summarize each month."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write settings and create the ledger database.
    Init {
        /// Directory for spendlens data (default: platform data dir)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// User id to act as when --user is omitted
        #[arg(long)]
        user: Option<String>,
        /// Currency symbol for summaries, e.g. '$'
        #[arg(long)]
        currency: Option<String>,
    },
    /// Import a statement, replacing the user's stored transactions.
    Upload {
        /// Path to a CSV or PDF statement
        file: String,
        #[arg(long)]
        user: Option<String>,
        /// Content kind: tabular-text, pdf-text, or a MIME type (default: from extension)
        #[arg(long)]
        kind: Option<String>,
    },
    /// List the most recent transactions.
    Transactions {
        #[arg(long)]
        user: Option<String>,
        #[arg(long, default_value_t = 200)]
        limit: usize,
    },
    /// Monthly totals, breakdowns and insights.
    Summary {
        /// Month: YYYY-MM
        #[arg(long)]
        month: String,
        #[arg(long)]
        user: Option<String>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage keyword categorization rules.
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
    /// Show the last upload and stored counts.
    Status {
        #[arg(long)]
        user: Option<String>,
    },
    /// Delete all of a user's transactions, rules and upload record.
    Forget {
        #[arg(long)]
        user: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// Add a rule: descriptions containing KEYWORD get CATEGORY.
    Add {
        /// Case-insensitive keyword matched anywhere in the description
        keyword: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        user: Option<String>,
    },
    /// List rules in evaluation order.
    List {
        #[arg(long)]
        user: Option<String>,
    },
    /// Delete a rule by ID.
    Delete {
        id: i64,
        #[arg(long)]
        user: Option<String>,
    },
}
