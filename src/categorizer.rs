use rusqlite::Connection;

use crate::db::load_rules_for_user;
use crate::error::Result;
use crate::models::CategoryRule;

pub const UNCATEGORIZED: &str = "Uncategorized";

// Built-in merchant keywords, checked after the user's own rules.
const DEFAULT_KEYWORDS: &[(&str, &str)] = &[
    ("SWIGGY", "Food"),
    ("ZOMATO", "Food"),
    ("OLA", "Travel"),
    ("UBER", "Travel"),
    ("MIAMI", "Nightlife"),
    ("RENT", "Rent"),
    ("NETFLIX", "Subscriptions"),
    ("SPOTIFY", "Subscriptions"),
    ("AMAZON", "Shopping"),
];

fn matches(desc_upper: &str, keyword: &str) -> bool {
    let keyword = keyword.trim();
    !keyword.is_empty() && desc_upper.contains(&keyword.to_uppercase())
}

/// Keyword categorizer for one user. Build it once per upload so the rule
/// store is read a single time, then call [`Categorizer::categorize`] per row.
pub struct Categorizer {
    user_rules: Vec<CategoryRule>,
}

impl Categorizer {
    pub fn new(user_rules: Vec<CategoryRule>) -> Self {
        Self { user_rules }
    }

    pub fn load(conn: &Connection, user_id: &str) -> Result<Self> {
        Ok(Self::new(load_rules_for_user(conn, user_id)?))
    }

    pub fn rule_count(&self) -> usize {
        self.user_rules.len()
    }

    pub fn categorize(&self, description: &str) -> String {
        let desc = description.to_uppercase();

        let user = self
            .user_rules
            .iter()
            .map(|r| (r.keyword.as_str(), r.category.as_str()));
        let defaults = DEFAULT_KEYWORDS.iter().copied();
        if let Some((_, category)) = user.chain(defaults).find(|(kw, _)| matches(&desc, kw)) {
            return category.to_string();
        }

        if desc.contains("POS") || desc.contains("CARD") {
            return "Card Spend".to_string();
        }
        if desc.contains("ATM") {
            return "Cash Withdrawal".to_string();
        }
        UNCATEGORIZED.to_string()
    }
}
