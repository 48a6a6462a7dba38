use crate::db::open_ledger;
use crate::error::Result;
use crate::settings::{db_path, get_data_dir, load_settings, save_settings, shellexpand_path};

pub fn run(data_dir: Option<String>, user: Option<String>, currency: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    if let Some(user) = user.filter(|u| !u.trim().is_empty()) {
        settings.default_user = Some(user.trim().to_string());
    }
    if let Some(symbol) = currency {
        settings.currency_symbol = symbol;
    }
    save_settings(&settings)?;

    let resolved = get_data_dir();
    open_ledger(&db_path())?;

    println!("Initialized spendlens at {}", resolved.display());
    if let Some(user) = &settings.default_user {
        println!("Default user: {user}");
    }
    Ok(())
}
