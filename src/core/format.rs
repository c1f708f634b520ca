use super::types::{Cents, GoalProjection};

/// `$1126.83`, always two decimals, with the sign after the currency symbol
/// (`$-0.05`). Formatted from the integer so no float rounding is involved.
pub fn format_currency(amount: Cents) -> String {
    let sign = if amount.0 < 0 { "-" } else { "" };
    let abs = amount.0.unsigned_abs();
    format!("${sign}{}.{:02}", abs / 100, abs % 100)
}

pub fn format_years(months: u32) -> String {
    format!("{:.2}", months as f64 / 12.0)
}

/// Text for the goal line, or `None` when the goal should not be shown.
pub fn describe_goal(goal: GoalProjection) -> Option<String> {
    match goal {
        GoalProjection::NotComputable => None,
        GoalProjection::Reached { months } => {
            Some(format!("{months} months ({} years)", format_years(months)))
        }
        GoalProjection::BeyondHorizon { limit } => Some(format!(
            "more than {limit} months ({} years)",
            format_years(limit)
        )),
    }
}
