use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use rusqlite::Connection;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::categorizer::Categorizer;
use crate::db::replace_all_for_user;
use crate::error::{Result, SpendlensError};
use crate::fields::{clean_amount, parse_flexible_date, Blank};
use crate::models::{ParsedCandidate, RawRow, Transaction, TxnType, UploadRecord};
use crate::normalizer::normalize;

// ---------------------------------------------------------------------------
// Content kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    TabularText,
    PdfText,
}

impl ContentKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::TabularText => "tabular-text",
            Self::PdfText => "pdf-text",
        }
    }

    /// Accepts our own keys, short names and the MIME types upload forms send.
    pub fn from_label(label: &str) -> Result<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "tabular-text" | "csv" | "text/csv" | "text/plain" | "application/vnd.ms-excel" => {
                Ok(Self::TabularText)
            }
            "pdf-text" | "pdf" | "application/pdf" => Ok(Self::PdfText),
            _ => Err(SpendlensError::UnsupportedContentKind(label.to_string())),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "txt" => Ok(Self::TabularText),
            "pdf" => Ok(Self::PdfText),
            "" => Err(SpendlensError::UnsupportedContentKind(
                path.display().to_string(),
            )),
            other => Err(SpendlensError::UnsupportedContentKind(format!(".{other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Dialects: enum dispatch over an ordered chain
// ---------------------------------------------------------------------------

/// Statement body as the dialects see it.
pub enum StatementBody {
    Rows(Vec<RawRow>),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Wallet,
    Ledger,
    Labeled,
    PdfLines,
}

impl Dialect {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Wallet => "wallet",
            Self::Ledger => "ledger",
            Self::Labeled => "labeled",
            Self::PdfLines => "pdf_lines",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Wallet => "Wallet export (Mon D, YYYY rows)",
            Self::Ledger => "Bank ledger (DD Mon YYYY, debit/credit columns)",
            Self::Labeled => "Labeled CSV columns",
            Self::PdfLines => "PDF statement lines",
        }
    }

    pub fn parse(&self, body: &StatementBody) -> Vec<ParsedCandidate> {
        match (self, body) {
            (Self::Wallet, StatementBody::Rows(rows)) => parse_wallet_rows(rows),
            (Self::Ledger, StatementBody::Rows(rows)) => parse_ledger_rows(rows),
            (Self::Labeled, StatementBody::Rows(rows)) => parse_labeled_rows(rows),
            (Self::PdfLines, StatementBody::Text(text)) => parse_pdf_lines(text),
            _ => Vec::new(),
        }
    }
}

// Strictest first; the first dialect that yields anything wins.
const TABULAR_CHAIN: &[Dialect] = &[Dialect::Wallet, Dialect::Ledger, Dialect::Labeled];
const PDF_CHAIN: &[Dialect] = &[Dialect::PdfLines];

pub fn run_chain(body: &StatementBody) -> Option<(Dialect, Vec<ParsedCandidate>)> {
    let chain = match body {
        StatementBody::Rows(_) => TABULAR_CHAIN,
        StatementBody::Text(_) => PDF_CHAIN,
    };
    for dialect in chain {
        let candidates = dialect.parse(body);
        if !candidates.is_empty() {
            return Some((*dialect, candidates));
        }
        debug!(dialect = dialect.key(), "no candidates, falling through");
    }
    None
}

/// Decode, split and run the dialect chain for one statement.
pub fn detect_and_parse(text: &str, kind: ContentKind) -> Result<Option<(Dialect, Vec<ParsedCandidate>)>> {
    let body = match kind {
        ContentKind::TabularText => StatementBody::Rows(read_rows(text)?),
        ContentKind::PdfText => StatementBody::Text(text.to_string()),
    };
    Ok(run_chain(&body))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Split tabular text into rows. A quoted cell may span several physical
/// lines; its record continues until the quotes balance. Blank lines outside
/// quotes are kept as empty rows because they end a ledger continuation block.
pub fn read_rows(text: &str) -> Result<Vec<RawRow>> {
    let mut rows = Vec::new();
    let mut pending = String::new();
    for line in text.lines() {
        if pending.is_empty() && line.trim().is_empty() {
            rows.push(Vec::new());
            continue;
        }
        if !pending.is_empty() {
            pending.push('\n');
        }
        pending.push_str(line);
        // odd quote count: still inside a quoted cell
        if pending.matches('"').count() % 2 == 1 {
            continue;
        }
        rows.push(parse_record(&pending)?);
        pending.clear();
    }
    if !pending.is_empty() {
        rows.push(parse_record(&pending)?);
    }
    Ok(rows)
}

fn parse_record(record_text: &str) -> Result<RawRow> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(record_text.as_bytes());
    match rdr.records().next() {
        Some(record) => Ok(record?.iter().map(str::to_string).collect()),
        None => Ok(Vec::new()),
    }
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(|s| s.trim()).unwrap_or("")
}

fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

fn wallet_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z]{3}\s\d{1,2},\s\d{4}$").expect("valid wallet date regex"))
}

fn ledger_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{2}\s[A-Za-z]{3}\s\d{4}$").expect("valid ledger date regex"))
}

fn plain_decimal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("valid decimal regex"))
}

fn decode_text(bytes: &[u8], kind: ContentKind) -> Result<String> {
    if kind == ContentKind::PdfText && bytes.starts_with(b"%PDF") {
        return extract_pdf_text(bytes);
    }
    let text = String::from_utf8_lossy(bytes);
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text.as_ref()).to_string())
}

#[cfg(feature = "pdf")]
fn extract_pdf_text(bytes: &[u8]) -> Result<String> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
        // pdf-extract already prefixes its messages
        let msg = e.to_string();
        SpendlensError::Pdf(msg.trim_start_matches("PDF error: ").to_string())
    })
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf_text(_bytes: &[u8]) -> Result<String> {
    Err(SpendlensError::UnsupportedContentKind(
        "application/pdf (built without PDF text extraction)".to_string(),
    ))
}

fn compute_checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct UploadResult {
    pub dialect: Dialect,
    pub candidates: usize,
    pub imported: usize,
    pub dropped: usize,
}

/// Parse, normalize and categorize one statement, then replace the user's
/// stored transactions with the result. Nothing is written when no row
/// survives.
pub fn import_bytes(
    conn: &mut Connection,
    user_id: &str,
    filename: &str,
    bytes: &[u8],
    kind: ContentKind,
) -> Result<UploadResult> {
    let text = decode_text(bytes, kind)?;
    let Some((dialect, candidates)) = detect_and_parse(&text, kind)? else {
        return Err(SpendlensError::NoExtractableTransactions);
    };
    let candidate_count = candidates.len();
    info!(dialect = dialect.key(), candidates = candidate_count, "statement detected");

    let categorizer = Categorizer::load(conn, user_id)?;
    let txns: Vec<Transaction> = candidates
        .into_iter()
        .filter_map(|c| normalize(c, user_id))
        .map(|mut t| {
            t.category = categorizer.categorize(&t.description);
            t
        })
        .collect();
    if txns.is_empty() {
        return Err(SpendlensError::NoExtractableTransactions);
    }

    let record = UploadRecord {
        user_id: user_id.to_string(),
        filename: filename.to_string(),
        content_kind: kind.key().to_string(),
        dialect: dialect.key().to_string(),
        record_count: txns.len() as i64,
        date_range_start: txns.iter().map(|t| t.date).min(),
        date_range_end: txns.iter().map(|t| t.date).max(),
        checksum: compute_checksum(bytes),
        uploaded_at: None,
    };
    let imported = replace_all_for_user(conn, user_id, &txns, &record).map_err(|e| {
        warn!(user = user_id, error = %e, "replace failed, previous transactions kept");
        e
    })?;
    info!(
        user = user_id,
        imported,
        rules = categorizer.rule_count(),
        "replaced transactions"
    );

    Ok(UploadResult {
        dialect,
        candidates: candidate_count,
        imported,
        dropped: candidate_count - imported,
    })
}

pub fn import_file(
    conn: &mut Connection,
    user_id: &str,
    file_path: &Path,
    kind: Option<ContentKind>,
) -> Result<UploadResult> {
    let kind = match kind {
        Some(k) => k,
        None => ContentKind::from_path(file_path)?,
    };
    let bytes = std::fs::read(file_path)?;
    let filename = file_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    import_bytes(conn, user_id, filename, &bytes, kind)
}

// ---------------------------------------------------------------------------
// Wallet rows: Date, Transaction Details, Type, Amount
// ---------------------------------------------------------------------------

fn parse_wallet_rows(rows: &[RawRow]) -> Vec<ParsedCandidate> {
    let mut out = Vec::new();
    for row in rows {
        let date = cell(row, 0);
        if date.is_empty() || date == "Date" || !wallet_date_re().is_match(date) {
            continue;
        }
        let amount_cell = cell(row, 3);
        if !amount_cell.chars().any(|c| c.is_ascii_digit()) {
            continue;
        }
        let Some(amount) = clean_amount(amount_cell, Blank::AsInvalid) else {
            continue;
        };
        let txn_type = if cell(row, 2).to_uppercase().contains("DEBIT") {
            TxnType::Debit
        } else {
            TxnType::Credit
        };
        out.push(ParsedCandidate {
            date_text: date.to_string(),
            description: cell(row, 1).to_string(),
            amount: amount.abs(),
            txn_type,
            raw: json!({ "row": row }),
        });
    }
    out
}

// ---------------------------------------------------------------------------
// Ledger rows: Date, Details, Ref No./Cheque, Debit, Credit, Balance
// ---------------------------------------------------------------------------

fn parse_ledger_rows(rows: &[RawRow]) -> Vec<ParsedCandidate> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < rows.len() {
        let row = &rows[i];
        let date = cell(row, 0);
        if is_blank_row(row) || (date == "Date" && cell(row, 1) == "Details") || !ledger_date_re().is_match(date) {
            i += 1;
            continue;
        }

        // Continuation lines: no date, text in the details column.
        let mut description = cell(row, 1).to_string();
        let mut j = i + 1;
        while j < rows.len() {
            let next = &rows[j];
            if is_blank_row(next) || !cell(next, 0).is_empty() || cell(next, 1).is_empty() {
                break;
            }
            description.push(' ');
            description.push_str(cell(next, 1));
            j += 1;
        }

        let debit = clean_amount(cell(row, 3), Blank::AsZero).unwrap_or(0.0);
        let credit = clean_amount(cell(row, 4), Blank::AsZero).unwrap_or(0.0);
        let raw = json!({ "rows": &rows[i..j] });

        // A line with both sides filled yields two transactions.
        for (amount, txn_type) in [(debit, TxnType::Debit), (credit, TxnType::Credit)] {
            if amount > 0.0 {
                out.push(ParsedCandidate {
                    date_text: date.to_string(),
                    description: description.clone(),
                    amount,
                    txn_type,
                    raw: raw.clone(),
                });
            }
        }
        i = j;
    }
    out
}

// ---------------------------------------------------------------------------
// Labeled columns: header row names the roles
// ---------------------------------------------------------------------------

const DESCRIPTION_HINTS: &[&str] = &["description", "narration", "details", "remarks", "merchant"];
const AMOUNT_HINTS: &[&str] = &["amount", "amt", "value"];
const DESCRIPTION_FALLBACKS: &[&str] = &["Description", "Narration", "Transaction Details", "Details"];
const AMOUNT_FALLBACKS: &[&str] = &["Amount", "Amount (INR)", "Debit", "Credit", "Amount (Dr.)", "Amount (Cr.)"];
const TYPE_HEADERS: &[&str] = &["Type", "Txn Type", "Transaction Type", "Dr/Cr"];

struct LabeledRecord<'a> {
    fields: Vec<(&'a str, &'a str)>,
}

impl<'a> LabeledRecord<'a> {
    fn new(headers: &'a [String], row: &'a [String]) -> Self {
        let fields = headers
            .iter()
            .zip(row.iter())
            .map(|(h, v)| (h.as_str(), v.trim()))
            .collect();
        Self { fields }
    }

    fn find_by_hint(&self, hints: &[&str]) -> Option<&'a str> {
        self.fields
            .iter()
            .find(|(h, _)| {
                let lower = h.to_lowercase();
                hints.iter().any(|hint| lower.contains(hint))
            })
            .map(|(_, v)| *v)
    }

    fn get(&self, header: &str) -> Option<&'a str> {
        self.fields
            .iter()
            .find(|(h, _)| h.eq_ignore_ascii_case(header))
            .map(|(_, v)| *v)
    }

    fn first_non_empty(&self, headers: &[&str]) -> Option<&'a str> {
        headers
            .iter()
            .filter_map(|h| self.get(h))
            .find(|v| !v.is_empty())
    }

    fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(h, v)| (h.to_string(), json!(v)))
            .collect();
        serde_json::Value::Object(map)
    }
}

fn parse_labeled_rows(rows: &[RawRow]) -> Vec<ParsedCandidate> {
    let mut records = rows.iter().filter(|r| !is_blank_row(r));
    let Some(headers) = records.next() else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for row in records {
        let record = LabeledRecord::new(headers, row);
        if let Some(candidate) = parse_labeled_record(&record) {
            out.push(candidate);
        }
    }
    out
}

fn parse_labeled_record(record: &LabeledRecord<'_>) -> Option<ParsedCandidate> {
    let date_text = record.find_by_hint(&["date"]).unwrap_or_default();

    let description = record
        .find_by_hint(DESCRIPTION_HINTS)
        .filter(|v| !v.is_empty())
        .or_else(|| record.first_non_empty(DESCRIPTION_FALLBACKS))
        .unwrap_or_default();

    let amount_raw = record
        .find_by_hint(AMOUNT_HINTS)
        .filter(|v| !v.is_empty())
        .or_else(|| record.first_non_empty(AMOUNT_FALLBACKS))
        .or_else(|| {
            record
                .fields
                .iter()
                .map(|(_, v)| *v)
                .find(|v| plain_decimal_re().is_match(v))
        });
    let Some(amount) = amount_raw.and_then(|raw| clean_amount(raw, Blank::AsInvalid)) else {
        debug!(row = %record.to_json(), "labeled row without an amount");
        return None;
    };

    let flag = record.first_non_empty(TYPE_HEADERS).unwrap_or_default().to_lowercase();
    let txn_type = if flag.contains("debit") || flag.contains("dr") {
        TxnType::Debit
    } else if flag.contains("credit") || flag.contains("cr") {
        TxnType::Credit
    } else {
        TxnType::from_sign(amount)
    };

    Some(ParsedCandidate {
        date_text: date_text.to_string(),
        description: description.to_string(),
        amount: amount.abs(),
        txn_type,
        raw: record.to_json(),
    })
}

// ---------------------------------------------------------------------------
// PDF text: "<date> <description...> <amount>" per line
// ---------------------------------------------------------------------------

fn parse_pdf_lines(text: &str) -> Vec<ParsedCandidate> {
    let mut out = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 3 {
            continue;
        }
        let first = tokens[0];
        let last = tokens[tokens.len() - 1];
        if parse_flexible_date(first).is_none() {
            continue;
        }
        let Some(amount) = clean_amount(last, Blank::AsInvalid) else {
            continue;
        };
        out.push(ParsedCandidate {
            date_text: first.to_string(),
            description: tokens[1..tokens.len() - 1].join(" "),
            amount: amount.abs(),
            txn_type: TxnType::from_sign(amount),
            raw: json!({ "line": line }),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{add_rule, find_recent_by_user, get_connection, get_upload_record, init_db};

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn rows(data: &[&[&str]]) -> Vec<RawRow> {
        data.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_content_kind_labels() {
        assert_eq!(ContentKind::from_label("text/csv").unwrap(), ContentKind::TabularText);
        assert_eq!(ContentKind::from_label("application/vnd.ms-excel").unwrap(), ContentKind::TabularText);
        assert_eq!(ContentKind::from_label("PDF-TEXT").unwrap(), ContentKind::PdfText);
        assert!(matches!(
            ContentKind::from_label("image/png"),
            Err(SpendlensError::UnsupportedContentKind(_))
        ));
    }

    #[test]
    fn test_content_kind_from_extension() {
        assert_eq!(ContentKind::from_path(Path::new("stmt.CSV")).unwrap(), ContentKind::TabularText);
        assert_eq!(ContentKind::from_path(Path::new("stmt.pdf")).unwrap(), ContentKind::PdfText);
        assert!(ContentKind::from_path(Path::new("stmt.xlsx")).is_err());
        assert!(ContentKind::from_path(Path::new("statement")).is_err());
    }

    #[test]
    fn test_read_rows_keeps_blank_lines() {
        let parsed = read_rows("04 Sep 2025,\"SWIGGY, ORDER\",,450.00\n\n,NOTE\n").unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0][1], "SWIGGY, ORDER");
        assert!(parsed[1].is_empty());
        assert_eq!(parsed[2], vec!["".to_string(), "NOTE".to_string()]);
    }

    #[test]
    fn test_read_rows_joins_quoted_cell_across_lines() {
        let text = "Date,Description,Amount\n2025-09-04,\"SWIGGY ORDER\nBANGALORE\",450\n\n2025-09-05,\"NOTE\n\nWITH GAP\",10\n";
        let parsed = read_rows(text).unwrap();
        assert_eq!(parsed.len(), 4);
        assert_eq!(parsed[1], vec!["2025-09-04", "SWIGGY ORDER\nBANGALORE", "450"]);
        assert!(parsed[2].is_empty());
        assert_eq!(parsed[3][1], "NOTE\n\nWITH GAP");
    }

    #[test]
    fn test_wallet_rows() {
        let input = rows(&[
            &["Date", "Transaction Details", "Type", "Amount"],
            &["Sep 4, 2025", "UBER TRIP", "DEBIT", "₹120"],
            &["Sep 5, 2025", "Received from Asha", "CREDIT", "₹1,500.50"],
            &["Sep 6, 2025", "No amount", "DEBIT", "-"],
        ]);
        let out = parse_wallet_rows(&input);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].description, "UBER TRIP");
        assert_eq!(out[0].txn_type, TxnType::Debit);
        assert_eq!(out[0].amount, 120.0);
        assert_eq!(out[1].txn_type, TxnType::Credit);
        assert_eq!(out[1].amount, 1500.5);
    }

    #[test]
    fn test_wallet_type_is_substring_match() {
        let input = rows(&[&["Sep 4, 2025", "X", "Paid (debit)", "10"]]);
        assert_eq!(parse_wallet_rows(&input)[0].txn_type, TxnType::Debit);
        let input = rows(&[&["Sep 4, 2025", "X", "", "10"]]);
        assert_eq!(parse_wallet_rows(&input)[0].txn_type, TxnType::Credit);
    }

    #[test]
    fn test_ledger_continuation_lines_are_joined_in_order() {
        let input = rows(&[
            &["Date", "Details", "Ref No./Cheque", "Debit", "Credit", "Balance"],
            &["04 Sep 2025", "UPI/DR/1234", "", "450.00", "", "1000"],
            &["", "SWIGGY", "", "", "", ""],
            &["", "BANGALORE", "", "", "", ""],
            &["05 Sep 2025", "NEFT SALARY", "", "-", "50,000.00", "51000"],
        ]);
        let out = parse_ledger_rows(&input);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].description, "UPI/DR/1234 SWIGGY BANGALORE");
        assert_eq!(out[0].txn_type, TxnType::Debit);
        assert_eq!(out[0].amount, 450.0);
        assert_eq!(out[0].raw["rows"].as_array().unwrap().len(), 3);
        assert_eq!(out[1].description, "NEFT SALARY");
        assert_eq!(out[1].txn_type, TxnType::Credit);
        assert_eq!(out[1].amount, 50000.0);
    }

    #[test]
    fn test_ledger_continuation_stops_at_blank_row_or_empty_details() {
        let input = rows(&[
            &["04 Sep 2025", "FIRST", "", "10", ""],
            &[],
            &["", "ORPHAN", "", "", ""],
            &["05 Sep 2025", "SECOND", "", "20", ""],
            &["", "", "", "", ""],
            &["", "LATE NOTE", "", "", ""],
        ]);
        let out = parse_ledger_rows(&input);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].description, "FIRST");
        assert_eq!(out[1].description, "SECOND");
    }

    // Known edge case: both sides filled on one line. Kept as two
    // transactions; it may be a fee plus reversal or an export artifact.
    #[test]
    fn test_ledger_row_with_debit_and_credit_yields_two_candidates() {
        let input = rows(&[&["06 Sep 2025", "CHARGE REVERSAL", "", "25.00", "25.00", "900"]]);
        let out = parse_ledger_rows(&input);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].txn_type, TxnType::Debit);
        assert_eq!(out[1].txn_type, TxnType::Credit);
        for c in &out {
            assert_eq!(c.date_text, "06 Sep 2025");
            assert_eq!(c.description, "CHARGE REVERSAL");
            assert_eq!(c.amount, 25.0);
        }
    }

    #[test]
    fn test_ledger_blank_and_dash_cells_are_zero() {
        let input = rows(&[&["07 Sep 2025", "NOTHING", "", "-", ""]]);
        assert!(parse_ledger_rows(&input).is_empty());
    }

    #[test]
    fn test_labeled_rows_resolve_columns() {
        let input = rows(&[
            &["Date", "Narration", "Amount", "Type"],
            &["2025-09-04", "SALARY CREDIT", "50000", "Credit"],
            &["2025-09-05", "GROCERIES", "1,200.00", "Dr"],
        ]);
        let out = parse_labeled_rows(&input);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].description, "SALARY CREDIT");
        assert_eq!(out[0].amount, 50000.0);
        assert_eq!(out[0].txn_type, TxnType::Credit);
        assert_eq!(out[0].raw["Narration"], "SALARY CREDIT");
        assert_eq!(out[1].txn_type, TxnType::Debit);
        assert_eq!(out[1].amount, 1200.0);
    }

    #[test]
    fn test_labeled_rows_sign_decides_without_type_column() {
        let input = rows(&[
            &["Txn Date", "Remarks", "Value"],
            &["2025-09-04", "REFUND", "300"],
            &["2025-09-05", "BILL", "-80.5"],
        ]);
        let out = parse_labeled_rows(&input);
        assert_eq!(out[0].txn_type, TxnType::Credit);
        assert_eq!(out[1].txn_type, TxnType::Debit);
        assert_eq!(out[1].amount, 80.5);
    }

    #[test]
    fn test_labeled_rows_fallback_headers() {
        let input = rows(&[
            &["Posted", "Info", "Debit", "Credit"],
            &["2025-09-04", "FEE", "", "15.00"],
        ]);
        let out = parse_labeled_rows(&input);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].amount, 15.0);
        // no date header, so the normalizer will drop it
        assert_eq!(out[0].date_text, "");
    }

    #[test]
    fn test_labeled_rows_last_resort_numeric_column() {
        let input = rows(&[
            &["Date", "Description", "Sum"],
            &["2025-09-04", "TEA", "-40"],
        ]);
        let out = parse_labeled_rows(&input);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].amount, 40.0);
        assert_eq!(out[0].txn_type, TxnType::Debit);
    }

    #[test]
    fn test_labeled_rows_drop_rows_without_amount() {
        let input = rows(&[
            &["Date", "Description", "Amount"],
            &["2025-09-04", "MYSTERY", ""],
            &["2025-09-05", "N/A ROW", "n/a"],
        ]);
        assert!(parse_labeled_rows(&input).is_empty());
    }

    #[test]
    fn test_pdf_lines() {
        let text = "Statement for September\n\n2025-09-04 ZOMATO DINNER -650.00\n09/05/2025 Salary credit 50,000\nTotal 50,650\n2025-09-06 ONLYTWO\n";
        let out = parse_pdf_lines(text);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].description, "ZOMATO DINNER");
        assert_eq!(out[0].txn_type, TxnType::Debit);
        assert_eq!(out[0].amount, 650.0);
        assert_eq!(out[1].description, "Salary credit");
        assert_eq!(out[1].txn_type, TxnType::Credit);
        assert_eq!(out[1].amount, 50000.0);
    }

    #[test]
    fn test_chain_prefers_wallet_over_labeled() {
        let text = "Date,Transaction Details,Type,Amount\nSep 4, 2025,UBER TRIP,DEBIT,120\n";
        // The wallet date contains a comma, so the CSV splits it; quote it like real exports do.
        let quoted = text.replace("Sep 4, 2025", "\"Sep 4, 2025\"");
        let (dialect, out) = detect_and_parse(&quoted, ContentKind::TabularText).unwrap().unwrap();
        assert_eq!(dialect, Dialect::Wallet);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_chain_falls_through_to_labeled() {
        let text = "Date,Narration,Amount,Type\n2025-09-04,SALARY CREDIT,50000,Credit\n";
        let (dialect, _) = detect_and_parse(text, ContentKind::TabularText).unwrap().unwrap();
        assert_eq!(dialect, Dialect::Labeled);
    }

    #[test]
    fn test_chain_returns_none_when_nothing_matches() {
        assert!(detect_and_parse("hello\nworld\n", ContentKind::TabularText).unwrap().is_none());
        assert!(detect_and_parse("", ContentKind::PdfText).unwrap().is_none());
    }

    #[test]
    fn test_import_ledger_end_to_end() {
        let (_dir, mut conn) = test_db();
        let csv = "04 Sep 2025,SWIGGY ORDER,,450.00,Bal\n,CONTINUED NOTE,,,\n";
        let result = import_bytes(&mut conn, "u1", "sbi.csv", csv.as_bytes(), ContentKind::TabularText).unwrap();
        assert_eq!(result.dialect, Dialect::Ledger);
        assert_eq!(result.imported, 1);

        let txns = find_recent_by_user(&conn, "u1", 200).unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].description, "SWIGGY ORDER CONTINUED NOTE");
        assert_eq!(txns[0].amount, 450.0);
        assert_eq!(txns[0].txn_type, TxnType::Debit);
        assert_eq!(txns[0].category, "Food");
        assert_eq!(txns[0].merchant.as_deref(), Some("SWIGGY"));
    }

    #[test]
    fn test_import_wallet_end_to_end() {
        let (_dir, mut conn) = test_db();
        let csv = "\"Sep 4, 2025\",UBER TRIP,DEBIT,120\n";
        let result = import_bytes(&mut conn, "u1", "phonepe.csv", csv.as_bytes(), ContentKind::TabularText).unwrap();
        assert_eq!(result.dialect, Dialect::Wallet);
        let txns = find_recent_by_user(&conn, "u1", 200).unwrap();
        assert_eq!(txns[0].amount, 120.0);
        assert_eq!(txns[0].txn_type, TxnType::Debit);
        assert_eq!(txns[0].category, "Travel");
    }

    #[test]
    fn test_import_labeled_end_to_end_uses_user_rules() {
        let (_dir, mut conn) = test_db();
        let csv = "Date,Narration,Amount,Type\n2025-09-04,SALARY CREDIT,50000,Credit\n";
        import_bytes(&mut conn, "u1", "bank.csv", csv.as_bytes(), ContentKind::TabularText).unwrap();
        let txns = find_recent_by_user(&conn, "u1", 200).unwrap();
        assert_eq!(txns[0].txn_type, TxnType::Credit);
        assert_eq!(txns[0].amount, 50000.0);
        assert_eq!(txns[0].category, "Uncategorized");

        add_rule(&conn, "u1", "salary", "Income").unwrap();
        import_bytes(&mut conn, "u1", "bank.csv", csv.as_bytes(), ContentKind::TabularText).unwrap();
        let txns = find_recent_by_user(&conn, "u1", 200).unwrap();
        assert_eq!(txns[0].category, "Income");
    }

    #[test]
    fn test_import_drops_malformed_rows_and_keeps_the_rest() {
        let (_dir, mut conn) = test_db();
        let csv = "Date,Description,Amount\n2025-09-04,GOOD,100\nnot a date,BAD,50\n2025-09-05,ZERO,0\n";
        let result = import_bytes(&mut conn, "u1", "bank.csv", csv.as_bytes(), ContentKind::TabularText).unwrap();
        assert_eq!(result.candidates, 3);
        assert_eq!(result.imported, 1);
        assert_eq!(result.dropped, 2);
    }

    #[test]
    fn test_import_rejects_statement_without_transactions() {
        let (_dir, mut conn) = test_db();
        let err = import_bytes(&mut conn, "u1", "empty.csv", b"just,some\nwords,here\n", ContentKind::TabularText).unwrap_err();
        assert!(matches!(err, SpendlensError::NoExtractableTransactions));
        assert!(get_upload_record(&conn, "u1").unwrap().is_none());
    }

    #[test]
    fn test_import_failure_keeps_previous_upload() {
        let (_dir, mut conn) = test_db();
        let good = "\"Sep 4, 2025\",UBER TRIP,DEBIT,120\n";
        import_bytes(&mut conn, "u1", "a.csv", good.as_bytes(), ContentKind::TabularText).unwrap();
        // every candidate fails normalization: unparseable date
        let bad = "Date,Description,Amount\nsoon,THING,10\n";
        assert!(import_bytes(&mut conn, "u1", "b.csv", bad.as_bytes(), ContentKind::TabularText).is_err());
        assert_eq!(find_recent_by_user(&conn, "u1", 200).unwrap().len(), 1);
    }

    #[test]
    fn test_second_upload_replaces_first() {
        let (_dir, mut conn) = test_db();
        let a = "\"Sep 4, 2025\",UBER TRIP,DEBIT,120\n\"Sep 5, 2025\",OLA RIDE,DEBIT,80\n";
        let b = "04 Sep 2025,NETFLIX,,499,\n";
        import_bytes(&mut conn, "u1", "a.csv", a.as_bytes(), ContentKind::TabularText).unwrap();
        import_bytes(&mut conn, "u1", "b.csv", b.as_bytes(), ContentKind::TabularText).unwrap();
        let txns = find_recent_by_user(&conn, "u1", 200).unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].description, "NETFLIX");
        let record = get_upload_record(&conn, "u1").unwrap().unwrap();
        assert_eq!(record.filename, "b.csv");
        assert_eq!(record.dialect, "ledger");
        assert_eq!(record.checksum.len(), 64);
    }

    #[test]
    fn test_import_plain_pdf_text() {
        let (_dir, mut conn) = test_db();
        let text = "2025-09-04 ATM WDL MG ROAD -2000\n";
        let result = import_bytes(&mut conn, "u1", "stmt.pdf", text.as_bytes(), ContentKind::PdfText).unwrap();
        assert_eq!(result.dialect, Dialect::PdfLines);
        let txns = find_recent_by_user(&conn, "u1", 200).unwrap();
        assert_eq!(txns[0].category, "Cash Withdrawal");
        assert_eq!(txns[0].txn_type, TxnType::Debit);
    }

    #[test]
    fn test_import_labeled_row_with_multiline_description() {
        let (_dir, mut conn) = test_db();
        let csv = "Date,Description,Amount,Type\n2025-09-04,\"SWIGGY ORDER\nBANGALORE\",450,Debit\n2025-09-05,SALARY,50000,Credit\n";
        let result = import_bytes(&mut conn, "u1", "bank.csv", csv.as_bytes(), ContentKind::TabularText).unwrap();
        assert_eq!(result.dialect, Dialect::Labeled);
        assert_eq!(result.imported, 2);

        let txns = find_recent_by_user(&conn, "u1", 200).unwrap();
        let swiggy = txns.iter().find(|t| t.txn_type == TxnType::Debit).unwrap();
        assert_eq!(swiggy.amount, 450.0);
        assert_eq!(swiggy.description, "SWIGGY ORDER\nBANGALORE");
        assert_eq!(swiggy.category, "Food");
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn test_import_malformed_pdf_is_a_pdf_error() {
        let (_dir, mut conn) = test_db();
        let bytes = b"%PDF-1.4\nthis is not a real pdf body\n%%EOF\n";
        let err = import_bytes(&mut conn, "u1", "stmt.pdf", bytes, ContentKind::PdfText).unwrap_err();
        assert!(matches!(err, SpendlensError::Pdf(_)));
        let msg = err.to_string();
        assert!(msg.starts_with("PDF error: "));
        assert!(!msg.contains("PDF error: PDF error"));
        assert!(get_upload_record(&conn, "u1").unwrap().is_none());
        assert!(find_recent_by_user(&conn, "u1", 200).unwrap().is_empty());
    }

    #[cfg(not(feature = "pdf"))]
    #[test]
    fn test_binary_pdf_without_extraction_is_unsupported() {
        let (_dir, mut conn) = test_db();
        let bytes = b"%PDF-1.4\nthis is not a real pdf body\n%%EOF\n";
        let err = import_bytes(&mut conn, "u1", "stmt.pdf", bytes, ContentKind::PdfText).unwrap_err();
        assert!(matches!(err, SpendlensError::UnsupportedContentKind(_)));
        assert!(get_upload_record(&conn, "u1").unwrap().is_none());
    }
}
