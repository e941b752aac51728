use clap::arg;
use clap::command;
use clap::Parser;
use loop_agent::helpers::time::system_clock;
use loop_agent::sensors::Device;
use loop_agent::server;
use loop_agent::utils::config_loader;
use loop_agent::utils::logging;
use anyhow::Result;
use loop_agent::utils::logging::LogLevel;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "loop-agent.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL" , value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Read args, load YAML config
    // -------------------------------

    let args = Args::parse();
    let service_config = config_loader::run(&args.config).await?;
    logging::run(&service_config, args.log_level.to_owned()).await?;

    // -------------------------------
    // 2. Set up one polling client per device
    // -------------------------------

    let polling = &service_config.settings.polling;
    let scan_interval = Duration::from_secs(polling.scan_interval_seconds);
    let clock = system_clock();

    let mut devices = Vec::with_capacity(service_config.devices.len());
    for (unique_id, device_config) in &service_config.devices {
        let client = Device::client_from_config(unique_id, device_config, polling, clock.clone())?;
        devices.push(Device::setup(Arc::new(client), scan_interval).await);
    }

    // -------------------------------
    // 3. Start http server with metrics and sensor states
    // -------------------------------

    let entities = devices
        .iter()
        .flat_map(|device| device.entities().iter().cloned())
        .collect();
    let http_server = server::server::start(&service_config.settings, entities);

    info!("Service starting...");
    let outcome = tokio::select! {
        res = http_server => {
            res.inspect_err(|e| error!("http server stopped: {:#}", e))
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
            Ok(())
        }
    };

    // -------------------------------
    // 4. Stop polling
    // -------------------------------

    for device in devices {
        device.unload().await;
    }
    outcome
}
