use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// Integer minor units. All arithmetic that leaves the core goes through this
/// type so that major-unit floats only appear at the boundary.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Cents(pub i64);

impl Cents {
    pub const ZERO: Cents = Cents(0);

    /// Converts a major-unit amount, rounding half up. Inputs with more than two
    /// decimal places are corrected here.
    pub fn from_major(amount: f64) -> Self {
        Self::from_fractional(amount * 100.0)
    }

    /// Rounds an accumulated (possibly fractional) cents value.
    pub fn from_fractional(cents: f64) -> Self {
        Cents(round_half_up(cents) as i64)
    }

    pub fn to_major(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64
    }
}

impl Add for Cents {
    type Output = Cents;

    fn add(self, rhs: Cents) -> Cents {
        Cents(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Cents {
    type Output = Cents;

    fn sub(self, rhs: Cents) -> Cents {
        Cents(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Cents>>(iter: I) -> Cents {
        iter.fold(Cents::ZERO, Add::add)
    }
}

// Ties go toward positive infinity, so 0.5 -> 1 and -0.5 -> 0.
fn round_half_up(value: f64) -> f64 {
    let floor = value.floor();
    if value - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

/// Stable identity of an account. Ids are never reused within a book, so
/// deleting one account does not shift any other.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One account's inputs, already coerced to numbers. Currency fields are in
/// major units and `annual_rate` is a percentage (5.0 means 5%/year).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AccountSnapshot {
    pub initial_amount: f64,
    pub annual_rate: f64,
    pub months: u32,
    pub monthly_contribution: f64,
    pub goal_amount: Option<f64>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum GoalProjection {
    /// No goal, goal not above the initial amount, or a balance that cannot grow.
    NotComputable,
    Reached { months: u32 },
    /// Still short of the goal after `limit` months of compounding.
    BeyondHorizon { limit: u32 },
}

impl GoalProjection {
    pub fn months(self) -> Option<u32> {
        match self {
            GoalProjection::Reached { months } => Some(months),
            GoalProjection::NotComputable | GoalProjection::BeyondHorizon { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountProjection {
    pub ending_balance: Cents,
    pub initial_amount: Cents,
    pub total_contributions: Cents,
    pub interest_earned: Cents,
    pub goal: GoalProjection,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrandTotal {
    pub ending_balance: Cents,
    pub initial_amount: Cents,
    pub total_contributions: Cents,
    pub interest_earned: Cents,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookProjection {
    pub accounts: Vec<(AccountId, AccountProjection)>,
    pub total: GrandTotal,
}
