mod cli;

use std::sync::Arc;

use clap::Parser;
use cli::{Cli, Commands};
use lottobox::client::{HttpTransport, ReliabilityClient, ReliabilitySettings, validate_user_numbers};
use lottobox::config::Config;
use lottobox::observability::init_tracing;

type AnyError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    init_tracing("info");

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Serve(args) => lottobox::api::run(config, args.address).await?,
        Commands::Predict(args) => predict(&config, &args.numbers).await?,
        Commands::Health => health(&config).await?,
    }

    Ok(())
}

fn build_client(config: &Config) -> Result<ReliabilityClient, AnyError> {
    let transport = HttpTransport::from_config(&config.client)?;
    Ok(ReliabilityClient::new(
        Arc::new(transport),
        ReliabilitySettings::from(&config.client),
    ))
}

async fn predict(config: &Config, numbers: &[u8]) -> Result<(), AnyError> {
    validate_user_numbers(numbers)?;

    let client = build_client(config)?;
    let prediction = client.predict(numbers).await?;

    println!("{}", serde_json::to_string_pretty(&prediction)?);
    tracing::info!(stats = ?client.stats(), "Prediction finished");
    Ok(())
}

async fn health(config: &Config) -> Result<(), AnyError> {
    let client = build_client(config)?;
    let status = client.health().await?;

    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
