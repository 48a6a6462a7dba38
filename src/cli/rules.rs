use comfy_table::{Cell, Table};

use crate::db::{add_rule, delete_rule, load_rules_for_user, open_ledger};
use crate::error::Result;
use crate::settings::{db_path, load_settings};

pub fn add(keyword: &str, category: &str, user: Option<String>) -> Result<()> {
    let user_id = load_settings().resolve_user(user)?;
    let conn = open_ledger(&db_path())?;
    let id = add_rule(&conn, &user_id, keyword, category)?;
    println!("Added rule {id}: '{}' \u{2192} {}", keyword.trim(), category.trim());
    println!("Rules apply to the next upload.");
    Ok(())
}

pub fn list(user: Option<String>) -> Result<()> {
    let user_id = load_settings().resolve_user(user)?;
    let conn = open_ledger(&db_path())?;
    let rules = load_rules_for_user(&conn, &user_id)?;

    if rules.is_empty() {
        println!("No rules for {user_id}. Built-in keywords still apply.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Keyword", "Category"]);
    for rule in rules {
        table.add_row(vec![
            Cell::new(rule.id.unwrap_or_default()),
            Cell::new(rule.keyword),
            Cell::new(rule.category),
        ]);
    }
    println!("Rules for {user_id} (checked in this order)\n{table}");
    Ok(())
}

pub fn delete(id: i64, user: Option<String>) -> Result<()> {
    let user_id = load_settings().resolve_user(user)?;
    let conn = open_ledger(&db_path())?;
    let rule = delete_rule(&conn, &user_id, id)?;
    println!("Deleted rule {id}: '{}' \u{2192} {}", rule.keyword, rule.category);
    Ok(())
}
