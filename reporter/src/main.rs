use reporter::agent::Agent;
use reporter::battery::{BatterySource, FixedBattery, SystemBattery};
use reporter::config::Config;
use reporter::identity::DeviceInfo;
use reporter::notice;

use common_data::server::http::Http;

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();
    pretty_env_logger::init();

    let config = Config::parse();
    config.validate()?;

    let http = Http::new(&config.endpoint);

    if config.status {
        let locations = http.fetch_locations().await?;
        for location in locations {
            println!(
                "{}  {:.6}, {:.6}  battery={}%  model={}  last_updated={}",
                location.device_id,
                location.latitude,
                location.longitude,
                location.battery,
                location.model,
                location.last_updated
            );
        }
        return Ok(());
    }

    let (notice_tx, mut notice_rx) = mpsc::unbounded_channel();

    let notice_printer = tokio::spawn(async move {
        while let Some(n) = notice_rx.recv().await {
            notice::log_notice(&n);
        }
    });

    let device = DeviceInfo::resolve(
        config.device_id.as_deref(),
        &config.id_file,
        config.model.as_deref(),
        &notice_tx,
    );

    log::info!("Device ID: {}", device.device_id);
    log::info!("Model: {}", device.model);

    if let Some(action) = config.record_action() {
        let state = http.toggle_recording(&device.device_id, action).await?;
        println!("{} recording={}", state.device_id, state.recording);
        return Ok(());
    }

    let provider = config.location_provider().context("loading location provider")?;

    let battery: Box<dyn BatterySource> = match config.battery {
        Some(percent) => Box::new(FixedBattery::percent(percent)),
        None => Box::new(SystemBattery::new(Duration::from_secs(
            config.battery_poll_secs,
        ))),
    };

    let mut agent = Agent::new(
        provider,
        battery,
        http,
        config.location_request(),
        device,
        notice_tx,
    );

    log::info!("reporting to {}", config.endpoint);

    if let Err(e) = agent.start() {
        // Let the notice reach the log before exiting.
        drop(agent);
        let _ = notice_printer.await;
        return Err(e.into());
    }

    tokio::signal::ctrl_c()
        .await
        .context("waiting for ctrl-c")?;

    agent.stop();

    Ok(())
}
