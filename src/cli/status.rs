use crate::db::{count_transactions, get_connection, get_upload_record, load_rules_for_user};
use crate::error::Result;
use crate::fmt::format_bytes;
use crate::settings::{db_path, get_data_dir, load_settings};

pub fn run(user: Option<String>) -> Result<()> {
    let settings = load_settings();
    let db_path = db_path();

    println!("Data dir:   {}", get_data_dir().display());
    println!("Database:   {}", db_path.display());
    println!("Currency:   {}", settings.currency_symbol);

    if !db_path.exists() {
        println!();
        println!("Database not found. Run `spendlens init` to set up.");
        return Ok(());
    }
    println!("DB size:    {}", format_bytes(std::fs::metadata(&db_path)?.len()));

    let user_id = settings.resolve_user(user)?;
    let conn = get_connection(&db_path)?;
    let transactions = count_transactions(&conn, &user_id)?;
    let rules = load_rules_for_user(&conn, &user_id)?.len();

    println!();
    println!("User:          {user_id}");
    println!("Transactions:  {transactions}");
    println!("Rules:         {rules}");

    match get_upload_record(&conn, &user_id)? {
        Some(upload) => {
            println!();
            println!("Last upload:   {}", upload.filename);
            println!("Uploaded at:   {}", upload.uploaded_at.as_deref().unwrap_or("-"));
            println!("Format:        {} ({})", upload.dialect, upload.content_kind);
            println!("Records:       {}", upload.record_count);
            if let (Some(start), Some(end)) = (upload.date_range_start, upload.date_range_end) {
                println!("Date range:    {start} to {end}");
            }
            println!("Checksum:      {}", &upload.checksum[..upload.checksum.len().min(12)]);
        }
        None => {
            println!();
            println!("No statement uploaded yet.");
        }
    }
    Ok(())
}
