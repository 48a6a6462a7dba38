use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::parse_month;
use crate::db::open_ledger;
use crate::error::Result;
use crate::fmt::money;
use crate::reports::{monthly_report, LabelTotal};
use crate::settings::{db_path, load_settings};

fn label_table(title: &str, items: &[LabelTotal], symbol: &str) -> String {
    let mut table = Table::new();
    table.set_header(vec![title, "Amount"]);
    for item in items {
        table.add_row(vec![Cell::new(&item.name), Cell::new(money(item.amount, symbol))]);
    }
    table.to_string()
}

pub fn run(month: &str, user: Option<String>, json: bool) -> Result<()> {
    let settings = load_settings();
    let user_id = settings.resolve_user(user)?;
    let (year, month_num) = parse_month(month)?;
    let conn = open_ledger(&db_path())?;
    let report = monthly_report(&conn, &user_id, year, month_num, &settings.currency_symbol)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let sym = settings.currency_symbol.as_str();
    let s = &report.summary;

    let mut totals = Table::new();
    totals.set_header(vec!["", "Amount"]);
    totals.add_row(vec![Cell::new("Inflow"), Cell::new(money(s.total_credit, sym))]);
    totals.add_row(vec![Cell::new("Outflow"), Cell::new(money(s.total_debit, sym))]);
    let net_label = if s.net >= 0.0 {
        "NET".green().bold()
    } else {
        "NET".red().bold()
    };
    totals.add_row(vec![Cell::new(net_label), Cell::new(money(s.net, sym))]);
    println!("Summary for {user_id}, {year:04}-{month_num:02} ({} transactions)\n{totals}", s.tx_count);

    if !s.by_category.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Category", "Spent", "%"]);
        let mut categories: Vec<(&String, &f64)> = s.by_category.iter().collect();
        categories.sort_by(|a, b| b.1.total_cmp(a.1));
        for (name, amt) in categories {
            let pct = if s.total_debit > 0.0 { amt / s.total_debit * 100.0 } else { 0.0 };
            table.add_row(vec![
                Cell::new(name),
                Cell::new(money(*amt, sym)),
                Cell::new(format!("{pct:.1}%")),
            ]);
        }
        println!("\nSpending by category\n{table}");
    }
    if !s.top_credit_sources.is_empty() {
        println!("\n{}", label_table("Top credit sources", &s.top_credit_sources, sym));
    }
    if !s.top_debit_destinations.is_empty() {
        println!("\n{}", label_table("Top debit destinations", &s.top_debit_destinations, sym));
    }

    println!("\n{}", "Insights".bold());
    for line in &report.insights {
        println!("  - {line}");
    }
    Ok(())
}
