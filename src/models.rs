use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::Serialize;

/// Positional cells from one physical line of a statement.
pub type RawRow = Vec<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxnType {
    Debit,
    Credit,
}

impl TxnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }

    /// Debit for negative amounts, credit otherwise.
    pub fn from_sign(amount: f64) -> Self {
        if amount < 0.0 {
            Self::Debit
        } else {
            Self::Credit
        }
    }

    /// Multiplier applied to an absolute amount to get net cash movement.
    pub fn sign(&self) -> f64 {
        match self {
            Self::Debit => -1.0,
            Self::Credit => 1.0,
        }
    }
}

impl ToSql for TxnType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TxnType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "debit" => Ok(Self::Debit),
            "credit" => Ok(Self::Credit),
            other => Err(FromSqlError::Other(
                format!("unknown transaction type: {other}").into(),
            )),
        }
    }
}

/// Unvalidated record emitted by a statement dialect, before normalization.
#[derive(Debug, Clone)]
pub struct ParsedCandidate {
    pub date_text: String,
    pub description: String,
    pub amount: f64,
    pub txn_type: TxnType,
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: Option<i64>,
    pub user_id: String,
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub txn_type: TxnType,
    pub category: String,
    pub merchant: Option<String>,
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRule {
    pub id: Option<i64>,
    pub keyword: String,
    pub category: String,
}

/// Metadata about the statement currently backing a user's transactions.
#[derive(Debug, Clone)]
pub struct UploadRecord {
    pub user_id: String,
    pub filename: String,
    pub content_kind: String,
    pub dialect: String,
    pub record_count: i64,
    pub date_range_start: Option<NaiveDate>,
    pub date_range_end: Option<NaiveDate>,
    pub checksum: String,
    pub uploaded_at: Option<String>,
}
