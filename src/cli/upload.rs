use std::path::PathBuf;

use colored::Colorize;

use crate::db::open_ledger;
use crate::error::Result;
use crate::importer::{import_file, ContentKind};
use crate::settings::{db_path, load_settings};

pub fn run(file: &str, user: Option<String>, kind: Option<&str>) -> Result<()> {
    let user_id = load_settings().resolve_user(user)?;
    let kind = kind.map(ContentKind::from_label).transpose()?;
    let mut conn = open_ledger(&db_path())?;

    let result = import_file(&mut conn, &user_id, &PathBuf::from(file), kind)?;

    println!("Detected: {}", result.dialect.name());
    println!(
        "{} imported for {} ({} rows read, {} dropped)",
        result.imported.to_string().green().bold(),
        user_id,
        result.candidates,
        result.dropped
    );
    println!("Previous transactions for this user were replaced.");
    Ok(())
}
