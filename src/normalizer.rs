use tracing::debug;

use crate::categorizer::UNCATEGORIZED;
use crate::fields::parse_flexible_date;
use crate::models::{ParsedCandidate, Transaction};

/// Turn a dialect candidate into a storable transaction for `user_id`.
///
/// Rows with an unparseable date or a missing, non-finite or zero amount are
/// dropped (`None`) so that one bad line never sinks the rest of a statement.
/// The amount is stored unsigned; direction lives in `txn_type`. The caller
/// assigns the category.
pub fn normalize(candidate: ParsedCandidate, user_id: &str) -> Option<Transaction> {
    let Some(date) = parse_flexible_date(&candidate.date_text) else {
        debug!(date = %candidate.date_text, "dropping row with unparseable date");
        return None;
    };
    if !candidate.amount.is_finite() || candidate.amount == 0.0 {
        debug!(amount = candidate.amount, "dropping row without a usable amount");
        return None;
    }

    let description = candidate.description.trim().to_string();
    let merchant = description.split_whitespace().next().map(str::to_string);

    Some(Transaction {
        id: None,
        user_id: user_id.to_string(),
        date,
        description,
        amount: candidate.amount.abs(),
        txn_type: candidate.txn_type,
        category: UNCATEGORIZED.to_string(),
        merchant,
        raw: candidate.raw,
    })
}
