fn group_thousands(int_part: &str) -> String {
    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    with_commas.chars().rev().collect()
}

/// Format a float as money with thousands separators: ₹1,234.56
pub fn money(val: f64, symbol: &str) -> String {
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((&cents, "00"));
    let sign = if val < 0.0 && cents != "0.00" { "-" } else { "" };
    format!("{sign}{symbol}{}.{dec_part}", group_thousands(int_part))
}

/// Whole units only: ₹1,235
pub fn money_whole(val: f64, symbol: &str) -> String {
    let rounded = val.abs().round();
    let sign = if val < 0.0 && rounded > 0.0 { "-" } else { "" };
    format!("{sign}{symbol}{}", group_thousands(&format!("{rounded:.0}")))
}

pub fn format_bytes(bytes: u64) -> String {
    match bytes {
        b if b < 1024 => format!("{b} B"),
        b if b < 1024 * 1024 => format!("{:.1} KB", b as f64 / 1024.0),
        b => format!("{:.1} MB", b as f64 / (1024.0 * 1024.0)),
    }
}
