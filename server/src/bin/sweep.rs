//! One-shot result sweep for an external scheduler.

use std::process::ExitCode;

use dotenvy::dotenv;

use raffle_server::config::Config;
use raffle_server::{build_state, connect};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let pool = match connect(&config).await {
        Ok(pool) => pool,
        Err(err) => {
            tracing::error!(error = %err, "Failed to connect to database");
            return ExitCode::FAILURE;
        }
    };

    let state = build_state(pool, &config);
    match state.lucky_draw.run_sweep().await {
        Ok(report) => {
            tracing::info!(
                resolved = report.resolved,
                no_entries = report.no_entries,
                already_resolved = report.already_resolved,
                failed = report.failed,
                "Sweep complete"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "Sweep could not list due raffles");
            ExitCode::FAILURE
        }
    }
}
