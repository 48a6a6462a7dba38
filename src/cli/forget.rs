use crate::db::{forget_user, open_ledger};
use crate::error::Result;
use crate::settings::{db_path, load_settings};

pub fn run(user: Option<String>) -> Result<()> {
    let user_id = load_settings().resolve_user(user)?;
    let mut conn = open_ledger(&db_path())?;
    let removed = forget_user(&mut conn, &user_id)?;
    println!("Removed {removed} transactions and all rules for {user_id}.");
    Ok(())
}
