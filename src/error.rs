use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpendlensError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Upload failed: {0}")]
    Persistence(rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported content kind: {0} (only CSV or PDF statements are accepted)")]
    UnsupportedContentKind(String),

    #[error(
        "No valid transactions found. Try exporting a detailed statement \
         (with date, description, amount)."
    )]
    NoExtractableTransactions,

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Invalid month: {0} (expected YYYY-MM)")]
    InvalidMonth(String),

    #[error("No user given. Pass --user or run `spendlens init --user <id>`.")]
    MissingUser,

    #[error("No rule with ID {0}")]
    UnknownRule(i64),

    #[error("Settings error: {0}")]
    Settings(String),
}

pub type Result<T> = std::result::Result<T, SpendlensError>;
