use std::collections::{BTreeMap, HashMap};

use chrono::{Months, NaiveDate};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::find_by_user_and_range;
use crate::error::{Result, SpendlensError};
use crate::insights::generate_insights;
use crate::models::{Transaction, TxnType};

const TOP_N: usize = 5;

// ---------------------------------------------------------------------------
// Month window
// ---------------------------------------------------------------------------

/// First and last calendar day of `year`-`month`, both inclusive.
pub fn month_window(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let invalid = || SpendlensError::InvalidMonth(format!("{year:04}-{month:02}"));
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let end = start
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
        .ok_or_else(invalid)?;
    Ok((start, end))
}

// ---------------------------------------------------------------------------
// Monthly summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelTotal {
    pub name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub total_debit: f64,
    pub total_credit: f64,
    pub net: f64,
    /// Debits only.
    pub by_category: BTreeMap<String, f64>,
    /// ISO day -> credits minus debits.
    pub by_date: BTreeMap<String, f64>,
    pub top_credit_sources: Vec<LabelTotal>,
    pub top_debit_destinations: Vec<LabelTotal>,
    pub tx_count: usize,
}

/// Per-label sums that remember the order labels were first seen.
#[derive(Default)]
struct LabelSums {
    index: HashMap<String, usize>,
    totals: Vec<LabelTotal>,
}

impl LabelSums {
    fn add(&mut self, label: &str, amount: f64) {
        match self.index.get(label) {
            Some(&i) => self.totals[i].amount += amount,
            None => {
                self.index.insert(label.to_string(), self.totals.len());
                self.totals.push(LabelTotal {
                    name: label.to_string(),
                    amount,
                });
            }
        }
    }

    fn top(mut self, n: usize) -> Vec<LabelTotal> {
        // stable: equal sums keep first-seen order
        self.totals.sort_by(|a, b| b.amount.total_cmp(&a.amount));
        self.totals.truncate(n);
        self.totals
    }
}

fn label_for(txn: &Transaction) -> &str {
    if !txn.description.is_empty() {
        return &txn.description;
    }
    match txn.merchant.as_deref() {
        Some(m) if !m.is_empty() => m,
        _ => "Unknown",
    }
}

/// Aggregate a month's transactions. Empty input gives a zeroed summary.
pub fn summarize(txns: &[Transaction]) -> MonthlySummary {
    let mut summary = MonthlySummary::default();
    let mut credit_sources = LabelSums::default();
    let mut debit_destinations = LabelSums::default();

    for t in txns {
        let label = label_for(t);
        match t.txn_type {
            TxnType::Debit => {
                summary.total_debit += t.amount;
                debit_destinations.add(label, t.amount);
                *summary.by_category.entry(t.category.clone()).or_insert(0.0) += t.amount;
            }
            TxnType::Credit => {
                summary.total_credit += t.amount;
                credit_sources.add(label, t.amount);
            }
        }
        let day = t.date.format("%Y-%m-%d").to_string();
        *summary.by_date.entry(day).or_insert(0.0) += t.txn_type.sign() * t.amount;
    }

    summary.net = summary.total_credit - summary.total_debit;
    summary.top_credit_sources = credit_sources.top(TOP_N);
    summary.top_debit_destinations = debit_destinations.top(TOP_N);
    summary.tx_count = txns.len();
    summary
}

pub fn monthly_summary(conn: &Connection, user_id: &str, year: i32, month: u32) -> Result<MonthlySummary> {
    let (start, end) = month_window(year, month)?;
    let txns = find_by_user_and_range(conn, user_id, start, end)?;
    Ok(summarize(&txns))
}

// ---------------------------------------------------------------------------
// Report = summary + insights
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyReport {
    pub summary: MonthlySummary,
    pub insights: Vec<String>,
}

pub fn monthly_report(
    conn: &Connection,
    user_id: &str,
    year: i32,
    month: u32,
    currency: &str,
) -> Result<MonthlyReport> {
    let summary = monthly_summary(conn, user_id, year, month)?;
    let insights = generate_insights(&summary, currency);
    Ok(MonthlyReport { summary, insights })
}
