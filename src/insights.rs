use crate::fmt::money_whole;
use crate::reports::MonthlySummary;

/// Plain-language observations about one month, in a fixed order:
/// headline, income, top category, top destination, then the savings or
/// overspend note. Empty months get a single line.
pub fn generate_insights(summary: &MonthlySummary, currency: &str) -> Vec<String> {
    let money = |v: f64| money_whole(v, currency);

    if summary.tx_count == 0 {
        return vec!["No transactions found for this month.".to_string()];
    }

    let mut lines = vec![format!(
        "You had {} transactions this month with total inflow of {} and total outflow of {}.",
        summary.tx_count,
        money(summary.total_credit),
        money(summary.total_debit),
    )];

    if let Some((top, rest)) = summary.top_credit_sources.split_first() {
        lines.push(format!(
            "Most of your money came from “{}” ({}).",
            top.name,
            money(top.amount)
        ));
        if !rest.is_empty() {
            let others: f64 = rest.iter().map(|s| s.amount).sum();
            lines.push(format!(
                "Other major income sources together contributed around {}.",
                money(others)
            ));
        }
    }

    if summary.total_debit > 0.0 {
        // first maximum wins on ties
        let top_category = summary
            .by_category
            .iter()
            .fold(None::<(&String, f64)>, |best, (name, &amt)| match best {
                Some((_, b)) if b >= amt => best,
                _ => Some((name, amt)),
            });
        if let Some((name, amt)) = top_category {
            let pct = amt / summary.total_debit * 100.0;
            lines.push(format!(
                "Your highest spend category is {name} ({}, {pct:.1}% of your total spending).",
                money(amt)
            ));
        }

        if let Some(top) = summary.top_debit_destinations.first() {
            lines.push(format!(
                "You spent the most money at “{}” ({}).",
                top.name,
                money(top.amount)
            ));
        }

        // compare at cent precision so float residue counts as break-even
        let net = (summary.net * 100.0).round() / 100.0;
        if net < 0.0 {
            lines.push(format!(
                "You overspent by {} this month (net cash flow negative). Try cutting 10-15% in your top categories.",
                money(net.abs())
            ));
        } else if net > 0.0 {
            lines.push(format!(
                "You saved around {} this month (net cash flow positive). Consider moving this into a savings/investment account.",
                money(net)
            ));
        }
    } else {
        lines.push(
            "You have only incoming transactions and almost no spends tracked this month.".to_string(),
        );
    }

    lines
}
