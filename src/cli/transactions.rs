use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::db::{find_recent_by_user, open_ledger};
use crate::error::Result;
use crate::fmt::money;
use crate::models::TxnType;
use crate::settings::{db_path, load_settings};

pub fn run(user: Option<String>, limit: usize) -> Result<()> {
    let settings = load_settings();
    let user_id = settings.resolve_user(user)?;
    let conn = open_ledger(&db_path())?;
    let txns = find_recent_by_user(&conn, &user_id, limit)?;

    if txns.is_empty() {
        println!("No transactions for {user_id}. Run `spendlens upload <file>` first.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Date", "Description", "Category", "Amount"]);
    for t in &txns {
        let amount = money(t.amount * t.txn_type.sign(), &settings.currency_symbol);
        let amount = match t.txn_type {
            TxnType::Credit => amount.green().to_string(),
            TxnType::Debit => amount.red().to_string(),
        };
        table.add_row(vec![
            Cell::new(t.date),
            Cell::new(&t.description),
            Cell::new(&t.category),
            Cell::new(amount),
        ]);
    }
    println!("Transactions ({})\n{table}", txns.len());
    Ok(())
}
