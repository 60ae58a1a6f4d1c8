//! Lornu AI Attack Path Engine
//!
//! Serves the serverless attack path over HTTP, or runs it once from the
//! command line.

use anyhow::Result;
use attack_path_engine::agents::attack_path::{
    AttackPathOrchestrator, AwsClientFactory, HttpLeakSource,
};
use attack_path_engine::config::{Cli, Command};
use attack_path_engine::server::{self, AppState};
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let orchestrator = Arc::new(AttackPathOrchestrator::new(
        Arc::new(HttpLeakSource::new()?),
        Arc::new(AwsClientFactory),
        config.leak_source_url(),
    ));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            info!("Starting Lornu AI Attack Path Engine");
            let state = AppState {
                orchestrator,
                config: Arc::new(config),
            };
            server::serve(state).await?;
        }
        Command::Run => {
            let report = orchestrator
                .run_attack_path(&config.region, config.trail_hint())
                .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
