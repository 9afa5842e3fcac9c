use crate::error::ConfigError;
use crate::location::replay::TrackError;
use crate::location::{
    Accuracy, LocationProvider, LocationRequest, Permission, ReplayProvider, SimulatedProvider,
};

use common_data::server::data::location::Fix;
use common_data::server::json::http::RecordingAction;

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::Parser;

/// `start` or `stop`, as given to `--record`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordCommand(pub RecordingAction);

impl FromStr for RecordCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(RecordCommand(RecordingAction::Start)),
            "stop" => Ok(RecordCommand(RecordingAction::Stop)),
            other => Err(format!("expected start or stop, got '{}'", other)),
        }
    }
}

/// Report this device's position and battery level to a collector.
#[derive(Parser, Debug, Clone)]
#[clap(name = "reporter", version)]
pub struct Config {
    /// Base URL of the collector
    #[clap(long, env = "REPORTER_ENDPOINT", default_value = "http://127.0.0.1:8000")]
    pub endpoint: String,

    #[clap(long, env = "REPORTER_INTERVAL_SECS", default_value_t = 10)]
    pub interval_secs: u64,

    #[clap(long, env = "REPORTER_FASTEST_INTERVAL_SECS", default_value_t = 5)]
    pub fastest_interval_secs: u64,

    /// One of high, balanced, low, passive
    #[clap(long, env = "REPORTER_ACCURACY", default_value = "high")]
    pub accuracy: Accuracy,

    /// Use this id instead of the persisted one
    #[clap(long, env = "REPORTER_DEVICE_ID")]
    pub device_id: Option<String>,

    #[clap(long, env = "REPORTER_ID_FILE", default_value = "./reporter-id")]
    pub id_file: PathBuf,

    #[clap(long, env = "REPORTER_MODEL")]
    pub model: Option<String>,

    /// Replay fixes from a `lat,lon` track file instead of simulating them
    #[clap(long, env = "REPORTER_TRACK")]
    pub track: Option<PathBuf>,

    #[clap(long, default_value_t = 35.7246, allow_hyphen_values = true)]
    pub origin_lat: f64,

    #[clap(long, default_value_t = 51.3876, allow_hyphen_values = true)]
    pub origin_lon: f64,

    /// Report a fixed battery percentage instead of reading the host battery
    #[clap(long, env = "REPORTER_BATTERY")]
    pub battery: Option<u8>,

    #[clap(long, default_value_t = 30)]
    pub battery_poll_secs: u64,

    /// Behave as if location permission was refused
    #[clap(long)]
    pub deny_permission: bool,

    /// Behave as if the location provider was switched off
    #[clap(long)]
    pub provider_disabled: bool,

    /// Print the devices known to the collector and exit
    #[clap(long)]
    pub status: bool,

    /// Start or stop path recording for this device and exit
    #[clap(long)]
    pub record: Option<RecordCommand>,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs == 0 || self.fastest_interval_secs == 0 {
            return Err(ConfigError::ZeroInterval);
        }

        if self.fastest_interval_secs > self.interval_secs {
            return Err(ConfigError::FastestExceedsInterval {
                fastest: Duration::from_secs(self.fastest_interval_secs),
                interval: Duration::from_secs(self.interval_secs),
            });
        }

        if self.battery.is_none() && self.battery_poll_secs == 0 {
            return Err(ConfigError::ZeroBatteryPoll);
        }

        Ok(())
    }

    pub fn location_request(&self) -> LocationRequest {
        LocationRequest {
            interval: Duration::from_secs(self.interval_secs),
            fastest_interval: Duration::from_secs(self.fastest_interval_secs),
            accuracy: self.accuracy,
        }
    }

    pub fn origin(&self) -> Fix {
        Fix::new(self.origin_lat, self.origin_lon)
    }

    pub fn record_action(&self) -> Option<RecordingAction> {
        self.record.map(|r| r.0)
    }

    pub fn permission(&self) -> Permission {
        match self.deny_permission {
            true => Permission::Denied,
            false => Permission::Granted,
        }
    }

    /// The replayed track when `--track` is set, a simulated walk otherwise.
    /// `--deny-permission` and `--provider-disabled` apply to both.
    pub fn location_provider(&self) -> Result<Box<dyn LocationProvider>, TrackError> {
        let enabled = !self.provider_disabled;

        match &self.track {
            Some(path) => {
                let replay = ReplayProvider::load(path)?
                    .with_permission(self.permission())
                    .with_enabled(enabled);
                log::info!("replaying {} fixes from {}", replay.fixes().len(), path.display());
                Ok(Box::new(replay))
            }
            None => Ok(Box::new(
                SimulatedProvider::new(self.origin())
                    .with_permission(self.permission())
                    .with_enabled(enabled),
            )),
        }
    }
}
