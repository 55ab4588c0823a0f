use clap::Parser;
use meter_reconciler::{Config, MeterId, Reconciler};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Print a meter's energy counter, guarding against post-blackout resets.
#[derive(Parser)]
#[command(long_about = None)]
struct Cli {
    /// Meter number
    #[arg(value_name = "metnum")]
    metnum: MeterId,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // stdout carries the reading only
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cfg_path = std::env::var("APP_CONFIG").unwrap_or_else(|_| "config/config.yaml".into());
    let cfg = Config::load(&cfg_path)?;
    info!(path = %cfg_path, meters = cfg.meters.len(), "loaded config");

    let meter = cfg.meter(&cli.metnum)?;
    let reconciler = Reconciler::from_config(&cfg)?;
    let reading = reconciler.reconcile(meter).await?;

    println!("{reading}");
    Ok(())
}
