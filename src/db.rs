use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use crate::error::{Result, SpendlensError};
use crate::models::{CategoryRule, Transaction, UploadRecord};

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    user_id TEXT NOT NULL,
    date TEXT NOT NULL,
    description TEXT NOT NULL,
    amount REAL NOT NULL CHECK (amount > 0),
    txn_type TEXT NOT NULL CHECK (txn_type IN ('debit', 'credit')),
    category TEXT NOT NULL DEFAULT 'Uncategorized',
    merchant TEXT,
    raw TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_transactions_user_date ON transactions (user_id, date);

CREATE TABLE IF NOT EXISTS rules (
    id INTEGER PRIMARY KEY,
    user_id TEXT NOT NULL,
    keyword TEXT NOT NULL,
    category TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS uploads (
    user_id TEXT PRIMARY KEY,
    filename TEXT NOT NULL,
    content_kind TEXT NOT NULL,
    dialect TEXT NOT NULL,
    record_count INTEGER NOT NULL,
    date_range_start TEXT,
    date_range_end TEXT,
    checksum TEXT NOT NULL,
    uploaded_at TEXT DEFAULT (datetime('now'))
);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    conn.busy_timeout(Duration::from_secs(5))?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Open the ledger at `db_path`, creating its directory and schema if needed.
pub fn open_ledger(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = get_connection(db_path)?;
    init_db(&conn)?;
    Ok(conn)
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

const TXN_COLUMNS: &str =
    "id, user_id, date, description, amount, txn_type, category, merchant, raw";

fn row_to_transaction(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        date: row.get(2)?,
        description: row.get(3)?,
        amount: row.get(4)?,
        txn_type: row.get(5)?,
        category: row.get(6)?,
        merchant: row.get(7)?,
        raw: row
            .get::<_, Option<serde_json::Value>>(8)?
            .unwrap_or(serde_json::Value::Null),
    })
}

/// Replace every transaction owned by `user_id` with `txns` and record the
/// upload, all in one IMMEDIATE transaction. Any failure rolls back and the
/// previous set stays intact.
pub fn replace_all_for_user(
    conn: &mut Connection,
    user_id: &str,
    txns: &[Transaction],
    upload: &UploadRecord,
) -> Result<usize> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(SpendlensError::Persistence)?;
    let inserted = write_replacement(&tx, user_id, txns, upload).map_err(SpendlensError::Persistence)?;
    tx.commit().map_err(SpendlensError::Persistence)?;
    Ok(inserted)
}

fn write_replacement(
    tx: &rusqlite::Transaction<'_>,
    user_id: &str,
    txns: &[Transaction],
    upload: &UploadRecord,
) -> rusqlite::Result<usize> {
    tx.execute("DELETE FROM transactions WHERE user_id = ?1", [user_id])?;
    let mut inserted = 0usize;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO transactions (user_id, date, description, amount, txn_type, category, merchant, raw) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for t in txns {
            stmt.execute(params![
                user_id,
                t.date,
                t.description,
                t.amount,
                t.txn_type,
                t.category,
                t.merchant,
                t.raw,
            ])?;
            inserted += 1;
        }
    }
    tx.execute(
        "INSERT OR REPLACE INTO uploads \
         (user_id, filename, content_kind, dialect, record_count, date_range_start, date_range_end, checksum, uploaded_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, datetime('now'))",
        params![
            user_id,
            upload.filename,
            upload.content_kind,
            upload.dialect,
            upload.record_count,
            upload.date_range_start,
            upload.date_range_end,
            upload.checksum,
        ],
    )?;
    Ok(inserted)
}

/// Transactions for `user_id` dated within `[start, end]`, oldest first.
pub fn find_by_user_and_range(
    conn: &Connection,
    user_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Transaction>> {
    let sql = format!(
        "SELECT {TXN_COLUMNS} FROM transactions \
         WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3 ORDER BY date, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![user_id, start, end], row_to_transaction)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// The newest `limit` transactions for `user_id`, date descending.
pub fn find_recent_by_user(conn: &Connection, user_id: &str, limit: usize) -> Result<Vec<Transaction>> {
    let sql = format!(
        "SELECT {TXN_COLUMNS} FROM transactions \
         WHERE user_id = ?1 ORDER BY date DESC, id DESC LIMIT ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![user_id, limit as i64], row_to_transaction)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn count_transactions(conn: &Connection, user_id: &str) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT count(*) FROM transactions WHERE user_id = ?1",
        [user_id],
        |r| r.get(0),
    )?)
}

pub fn get_upload_record(conn: &Connection, user_id: &str) -> Result<Option<UploadRecord>> {
    let record = conn
        .query_row(
            "SELECT user_id, filename, content_kind, dialect, record_count, \
             date_range_start, date_range_end, checksum, uploaded_at \
             FROM uploads WHERE user_id = ?1",
            [user_id],
            |row| {
                Ok(UploadRecord {
                    user_id: row.get(0)?,
                    filename: row.get(1)?,
                    content_kind: row.get(2)?,
                    dialect: row.get(3)?,
                    record_count: row.get(4)?,
                    date_range_start: row.get(5)?,
                    date_range_end: row.get(6)?,
                    checksum: row.get(7)?,
                    uploaded_at: row.get(8)?,
                })
            },
        )
        .optional()?;
    Ok(record)
}

/// Remove everything stored for `user_id`.
pub fn forget_user(conn: &mut Connection, user_id: &str) -> Result<usize> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let removed = tx.execute("DELETE FROM transactions WHERE user_id = ?1", [user_id])?;
    tx.execute("DELETE FROM rules WHERE user_id = ?1", [user_id])?;
    tx.execute("DELETE FROM uploads WHERE user_id = ?1", [user_id])?;
    tx.commit()?;
    Ok(removed)
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// User rules in storage order, which is also their evaluation order.
pub fn load_rules_for_user(conn: &Connection, user_id: &str) -> Result<Vec<CategoryRule>> {
    let mut stmt =
        conn.prepare("SELECT id, keyword, category FROM rules WHERE user_id = ?1 ORDER BY id")?;
    let rules = stmt
        .query_map([user_id], |row| {
            Ok(CategoryRule {
                id: row.get(0)?,
                keyword: row.get(1)?,
                category: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rules)
}

pub fn add_rule(conn: &Connection, user_id: &str, keyword: &str, category: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO rules (user_id, keyword, category) VALUES (?1, ?2, ?3)",
        params![user_id, keyword.trim(), category.trim()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn delete_rule(conn: &Connection, user_id: &str, rule_id: i64) -> Result<CategoryRule> {
    let rule = conn
        .query_row(
            "SELECT id, keyword, category FROM rules WHERE id = ?1 AND user_id = ?2",
            params![rule_id, user_id],
            |row| {
                Ok(CategoryRule {
                    id: row.get(0)?,
                    keyword: row.get(1)?,
                    category: row.get(2)?,
                })
            },
        )
        .optional()?
        .ok_or(SpendlensError::UnknownRule(rule_id))?;
    conn.execute("DELETE FROM rules WHERE id = ?1", [rule_id])?;
    Ok(rule)
}
