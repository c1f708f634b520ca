mod book;
mod engine;
mod format;
mod types;

pub use book::AccountBook;
pub use engine::{
    accumulate_balance, accumulate_cents, grand_total, interest_earned, monthly_growth_factor,
    months_to_goal, project_account, seek_goal, total_contributions,
};
pub use format::{describe_goal, format_currency, format_years};
pub use types::{
    AccountId, AccountProjection, AccountSnapshot, BookProjection, Cents, GoalProjection,
    GrandTotal,
};
