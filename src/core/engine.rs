use super::types::{AccountProjection, AccountSnapshot, Cents, GoalProjection, GrandTotal};

/// Nominal convention: the annual percentage is split evenly over 12 months.
pub fn monthly_growth_factor(annual_rate_percent: f64) -> f64 {
    1.0 + annual_rate_percent / 1200.0
}

fn compound_step(balance: f64, growth: f64, contribution: f64) -> f64 {
    let mut next = balance * growth;
    next += contribution;
    next
}

/// Balance after `months` of monthly compounding followed by a contribution,
/// rounded to cents only once the loop is done.
pub fn accumulate_cents(
    initial_amount: f64,
    annual_rate_percent: f64,
    months: u32,
    monthly_contribution: f64,
) -> Cents {
    let growth = monthly_growth_factor(annual_rate_percent);
    let contribution = Cents::from_major(monthly_contribution).as_f64();

    let mut balance = Cents::from_major(initial_amount).as_f64();
    for _ in 0..months {
        balance = compound_step(balance, growth, contribution);
    }

    Cents::from_fractional(balance)
}

pub fn accumulate_balance(
    initial_amount: f64,
    annual_rate_percent: f64,
    months: u32,
    monthly_contribution: f64,
) -> f64 {
    accumulate_cents(
        initial_amount,
        annual_rate_percent,
        months,
        monthly_contribution,
    )
    .to_major()
}

/// Contributions paid over the period, rounded once on the product rather
/// than per month.
pub fn total_contributions(monthly_contribution: f64, months: u32) -> Cents {
    Cents::from_major(monthly_contribution * months as f64)
}

/// Growth attributable to interest alone.
pub fn interest_earned(snapshot: &AccountSnapshot) -> Cents {
    let ending = accumulate_cents(
        snapshot.initial_amount,
        snapshot.annual_rate,
        snapshot.months,
        snapshot.monthly_contribution,
    );
    ending
        - Cents::from_major(snapshot.initial_amount)
        - total_contributions(snapshot.monthly_contribution, snapshot.months)
}

// Zero and NaN count as absent, matching how the form treats blank fields.
fn is_set(value: f64) -> bool {
    value != 0.0 && !value.is_nan()
}

/// The goal in major units when goal seeking can terminate, otherwise `None`.
///
/// The balance only grows each month when there is both a starting balance and
/// a rate, or a contribution. Everything else never reaches a goal above the
/// initial amount, so the loop must not start.
fn seekable_goal(
    initial_amount: f64,
    goal_amount: Option<f64>,
    annual_rate_percent: f64,
    monthly_contribution: f64,
) -> Option<f64> {
    let goal = goal_amount.filter(|goal| is_set(*goal))?;
    if !(goal > initial_amount) {
        return None;
    }

    let grows = (is_set(initial_amount) && is_set(annual_rate_percent))
        || is_set(monthly_contribution);
    grows.then_some(goal)
}

/// Goal seeking with an optional cap on the number of months tried.
///
/// Inputs must be non-negative; the boundary clamps them before they get here.
pub fn seek_goal(
    initial_amount: f64,
    goal_amount: Option<f64>,
    annual_rate_percent: f64,
    monthly_contribution: f64,
    limit: Option<u32>,
) -> GoalProjection {
    let Some(goal) = seekable_goal(
        initial_amount,
        goal_amount,
        annual_rate_percent,
        monthly_contribution,
    ) else {
        return GoalProjection::NotComputable;
    };

    let growth = monthly_growth_factor(annual_rate_percent);
    let contribution = Cents::from_major(monthly_contribution).as_f64();
    let goal = Cents::from_major(goal).as_f64();

    let mut balance = Cents::from_major(initial_amount).as_f64();
    // Amounts below half a cent pass the guard but vanish once converted.
    if !(contribution > 0.0 || (balance > 0.0 && growth > 1.0)) {
        return GoalProjection::NotComputable;
    }

    let mut months = 0u32;
    while balance < goal {
        if let Some(limit) = limit {
            if months >= limit {
                return GoalProjection::BeyondHorizon { limit };
            }
        }
        balance = compound_step(balance, growth, contribution);
        months += 1;
    }

    // Goal and initial amount collapsed to the same cent value: nothing to
    // project, reported with the same sentinel as a missing goal.
    if months == 0 {
        return GoalProjection::NotComputable;
    }
    GoalProjection::Reached { months }
}

/// Whole months until the balance reaches `goal_amount`, or 0 when no goal
/// can be computed. 0 never means "already there".
pub fn months_to_goal(
    initial_amount: f64,
    goal_amount: Option<f64>,
    annual_rate_percent: f64,
    monthly_contribution: f64,
) -> u32 {
    seek_goal(
        initial_amount,
        goal_amount,
        annual_rate_percent,
        monthly_contribution,
        None,
    )
    .months()
    .unwrap_or(0)
}

pub fn project_account(snapshot: &AccountSnapshot, goal_limit: Option<u32>) -> AccountProjection {
    let ending_balance = accumulate_cents(
        snapshot.initial_amount,
        snapshot.annual_rate,
        snapshot.months,
        snapshot.monthly_contribution,
    );
    let initial_amount = Cents::from_major(snapshot.initial_amount);
    let total_contributions = total_contributions(snapshot.monthly_contribution, snapshot.months);

    AccountProjection {
        ending_balance,
        initial_amount,
        total_contributions,
        interest_earned: ending_balance - initial_amount - total_contributions,
        goal: seek_goal(
            snapshot.initial_amount,
            snapshot.goal_amount,
            snapshot.annual_rate,
            snapshot.monthly_contribution,
            goal_limit,
        ),
    }
}

/// Sums per-account results. Each account compounds at its own rate, so the
/// totals are never computed from pre-summed inputs.
pub fn grand_total<'a, I>(snapshots: I) -> GrandTotal
where
    I: IntoIterator<Item = &'a AccountSnapshot>,
{
    let mut total = GrandTotal::default();
    for snapshot in snapshots {
        total.ending_balance = total.ending_balance
            + accumulate_cents(
                snapshot.initial_amount,
                snapshot.annual_rate,
                snapshot.months,
                snapshot.monthly_contribution,
            );
        total.initial_amount = total.initial_amount + Cents::from_major(snapshot.initial_amount);
        total.total_contributions = total.total_contributions
            + total_contributions(snapshot.monthly_contribution, snapshot.months);
    }
    total.interest_earned = total.ending_balance - total.initial_amount - total.total_contributions;
    total
}
