use std::fmt::Write as _;
use std::net::{IpAddr, SocketAddr};

use clap::{Args, Parser, Subcommand};

use super::coerce::{RawAccount, parse_account_spec};
use super::{CalculateResponse, DEFAULT_HORIZON_MONTHS, ServerConfig, calculate};
use crate::error::InputError;

#[derive(Parser, Debug)]
#[command(
    name = "savings",
    about = "Savings calculator: compound growth, interest earned and months to a goal"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the browser calculator and its JSON API
    Serve(ServeArgs),
    /// Compute projections for one or more accounts in the terminal
    Calc(CalcArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, env = "SAVINGS_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,
    #[arg(long, env = "SAVINGS_PORT", default_value_t = 8080)]
    pub port: u16,
    #[arg(
        long,
        default_value_t = DEFAULT_HORIZON_MONTHS,
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Furthest goal seeking will look, in months"
    )]
    pub horizon_months: u32,
}

impl From<&ServeArgs> for ServerConfig {
    fn from(args: &ServeArgs) -> Self {
        ServerConfig {
            addr: SocketAddr::new(args.host, args.port),
            horizon_months: args.horizon_months,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct CalcArgs {
    #[arg(
        long = "account",
        required = true,
        value_parser = parse_account_spec,
        help = "Account as key=value pairs, e.g. initial=1000,rate=5,months=12,contribution=100,goal=5000"
    )]
    pub accounts: Vec<RawAccount>,
    #[arg(long, help = "Print the same JSON the HTTP API returns")]
    pub json: bool,
    #[arg(
        long,
        default_value_t = DEFAULT_HORIZON_MONTHS,
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Furthest goal seeking will look, in months"
    )]
    pub horizon_months: u32,
}

pub fn run_calc(args: &CalcArgs) -> Result<String, InputError> {
    let response = calculate(&args.accounts, args.horizon_months)?;
    if args.json {
        return Ok(format!("{}\n", serde_json::to_string_pretty(&response)?));
    }
    Ok(render_text(&response))
}

pub fn render_text(response: &CalculateResponse) -> String {
    let mut out = String::new();
    for account in &response.accounts {
        let _ = writeln!(out, "Account {}", account.id);
        let _ = writeln!(
            out,
            "  New amount after {} months: {}",
            account.months, account.display.ending_balance
        );
        let _ = writeln!(out, "  Interest earned: {}", account.display.interest_earned);
        if let Some(goal) = &account.display.goal {
            let _ = writeln!(out, "  Time required to reach goal amount: {goal}");
        }
    }

    let total = &response.grand_total;
    let _ = writeln!(out, "Grand total");
    let _ = writeln!(out, "  New amount: {}", total.display.ending_balance);
    let _ = writeln!(out, "  Interest earned: {}", total.display.interest_earned);
    out
}
