use serde::Deserialize;

use crate::core::{AccountId, AccountSnapshot};
use crate::error::InputError;

/// A numeric form field as the browser sends it: a number, the raw text of
/// the input box, or nothing at all.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    #[default]
    Missing,
}

impl FieldValue {
    pub fn from_text(text: Option<String>) -> Self {
        text.map_or(FieldValue::Missing, FieldValue::Text)
    }

    /// The finite number this field holds, if any. Blank and unparseable text
    /// count as absent.
    fn number(&self) -> Option<f64> {
        let value = match self {
            FieldValue::Number(value) => Some(*value),
            FieldValue::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    None
                } else {
                    text.parse::<f64>().ok()
                }
            }
            FieldValue::Missing => None,
        };
        value.filter(|value| value.is_finite())
    }
}

pub fn coerce_amount(value: &FieldValue) -> f64 {
    value.number().map_or(0.0, |value| value.max(0.0))
}

/// 100,000 years. Longer periods are clamped so one request stays cheap to
/// compute.
pub const MAX_PERIOD_MONTHS: u32 = 1_200_000;

/// Fractional periods count as a started month.
pub fn coerce_months(value: &FieldValue) -> u32 {
    match value.number() {
        Some(months) if months > 0.0 => months.ceil().min(MAX_PERIOD_MONTHS as f64) as u32,
        _ => 0,
    }
}

/// Keeps "no goal" apart from "goal of zero"; the engine treats both as unset.
pub fn coerce_goal(value: &FieldValue) -> Option<f64> {
    value.number().map(|goal| goal.max(0.0))
}

/// One account as it arrives from the browser or the command line, before
/// coercion.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawAccount {
    pub id: Option<AccountId>,
    pub initial_amount: FieldValue,
    pub annual_rate: FieldValue,
    pub months: FieldValue,
    pub monthly_contribution: FieldValue,
    pub goal_amount: FieldValue,
}

impl RawAccount {
    pub fn to_snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            initial_amount: coerce_amount(&self.initial_amount),
            annual_rate: coerce_amount(&self.annual_rate),
            months: coerce_months(&self.months),
            monthly_contribution: coerce_amount(&self.monthly_contribution),
            goal_amount: coerce_goal(&self.goal_amount),
        }
    }
}

/// Parses `initial=1000,rate=5,months=12,contribution=100,goal=5000`.
///
/// Keys may be omitted; values go through the same coercion as form fields, so
/// `rate=abc` is a zero rate rather than an error.
pub fn parse_account_spec(spec: &str) -> Result<RawAccount, InputError> {
    let mut account = RawAccount::default();
    let mut seen: Vec<&'static str> = Vec::new();

    for part in spec.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        let Some((key, value)) = part.split_once('=') else {
            return Err(InputError::MissingValue(part.to_string()));
        };
        let value = value.trim();

        let field = match key.trim().to_ascii_lowercase().as_str() {
            "id" => "id",
            "initial" | "initial_amount" | "initial-amount" => "initial",
            "rate" | "apr" | "annual_rate" | "annual-rate" => "rate",
            "months" | "period" => "months",
            "contribution" | "monthly_contribution" | "monthly-contribution" => "contribution",
            "goal" | "goal_amount" | "goal-amount" => "goal",
            _ => return Err(InputError::UnknownField(key.trim().to_string())),
        };
        if seen.contains(&field) {
            return Err(InputError::RepeatedField(field.to_string()));
        }
        seen.push(field);

        let text = FieldValue::Text(value.to_string());
        match field {
            "id" => {
                let id = value
                    .parse::<u64>()
                    .map_err(|_| InputError::InvalidId(value.to_string()))?;
                account.id = Some(AccountId(id));
            }
            "initial" => account.initial_amount = text,
            "rate" => account.annual_rate = text,
            "months" => account.months = text,
            "contribution" => account.monthly_contribution = text,
            _ => account.goal_amount = text,
        }
    }

    Ok(account)
}
