use clap::Parser;
use tracing_subscriber::EnvFilter;

use savings::api::{Cli, Command, ServerConfig, run_calc, run_http_server};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "savings=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => {
            if let Err(e) = run_http_server(ServerConfig::from(&args)).await {
                tracing::error!(error = %e, "server error");
                std::process::exit(1);
            }
        }
        Command::Calc(args) => match run_calc(&args) {
            Ok(out) => print!("{out}"),
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(2);
            }
        },
    }
}
