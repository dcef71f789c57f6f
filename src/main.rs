mod config;
mod display;
mod refresh;

use std::sync::Arc;

use clap::Parser;
use config::AppConfig;
use display::View;
use log::{info, warn};
use overhead_client::{OpenSkyClient, Pipeline, Trigger};
use tokio_util::sync::CancellationToken;

/// Show the aircraft flying near home, refreshed periodically.
#[derive(Debug, Parser)]
#[command(name = "flights-overhead", version, about)]
struct Cli {
    /// Home latitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Home longitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Radius around home in kilometres
    #[arg(long)]
    radius_km: Option<f64>,

    /// Seconds between scheduled refreshes
    #[arg(long, value_name = "SECS")]
    interval: Option<u64>,

    /// Run a single refresh and exit
    #[arg(long)]
    once: bool,

    /// Treat the first refresh as a forced refresh
    #[arg(long)]
    force: bool,

    /// Print snapshots as JSON
    #[arg(long)]
    json: bool,

    /// Write the command-line overrides back to the config file
    #[arg(long)]
    save: bool,

    /// Print the config file location and exit
    #[arg(long)]
    config_path: bool,
}

impl Cli {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(lat) = self.lat {
            config.home_latitude = lat;
        }
        if let Some(lon) = self.lon {
            config.home_longitude = lon;
        }
        if let Some(radius_km) = self.radius_km {
            config.radius_km = radius_km;
        }
        if let Some(interval) = self.interval {
            config.refresh_interval_secs = interval;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if cli.config_path {
        println!("{}", AppConfig::get_config_path()?.display());
        return Ok(());
    }

    let mut config = AppConfig::load()?;
    cli.apply(&mut config);
    if cli.save {
        config.save()?;
        info!("Configuration saved to {}", AppConfig::get_config_path()?.display());
    }

    let credentials = config.credentials();
    if credentials.is_none() {
        warn!("No OpenSky credentials configured, using anonymous access");
    }

    let client = OpenSkyClient::new(&config.api_base_url, credentials, config.request_timeout())?;
    let pipeline = Arc::new(Pipeline::new(config.pipeline_config(), Arc::new(client))?);
    let view = View { json: cli.json };

    info!(
        "Watching {:.1} km around ({:.5}, {:.5})",
        config.radius_km, config.home_latitude, config.home_longitude
    );

    let first_trigger = if cli.force { Trigger::Forced } else { Trigger::Scheduled };

    if cli.once {
        let snapshot = pipeline.run(first_trigger).await;
        view.render(&snapshot);
        return match snapshot.error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        };
    }

    if cli.force {
        view.render(&pipeline.run(first_trigger).await);
    }

    let cancel_token = CancellationToken::new();
    let ctrl_c_token = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, shutting down");
            ctrl_c_token.cancel();
        }
    });

    refresh::run_loop(pipeline, config.refresh_interval(), view, cancel_token).await;
    Ok(())
}
