//! `spf-harvest`: move SPFarms harvests through the post-harvest workflow

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spfarms_harvest_client::cli::{execute, failure_output, Cli};
use spfarms_harvest_client::{Config, HarvestController, HttpHarvestClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so command output stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spf_harvest=info,spfarms_harvest_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::load()?;

    tracing::debug!("Environment: {}", config.environment);
    tracing::debug!("Facility API: {}", config.api.base_url);

    let api = HttpHarvestClient::new(&config.api)?;
    let mut controller = HarvestController::from_config(api, &config);

    match execute(&cli, &mut controller).await {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(err) => {
            if let Some(page) = failure_output(&controller, cli.json) {
                println!("{}", page);
            }
            tracing::error!(harvest_id = ?cli.command.harvest_id(), "Command failed: {}", err);
            Err(anyhow::anyhow!("{}", err))
        }
    }
}
