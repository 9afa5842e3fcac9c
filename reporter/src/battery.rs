use common_data::server::data::battery::BatteryStatus;

use std::time::Duration;

use tokio::sync::mpsc::{self, Receiver};

/// Source of battery notifications. Dropping the receiver stops watching.
pub trait BatterySource: Send + Sync + 'static {
    fn watch(&self) -> Receiver<BatteryStatus>;
}

impl<T: BatterySource + ?Sized> BatterySource for Box<T> {
    fn watch(&self) -> Receiver<BatteryStatus> {
        (**self).watch()
    }
}

/// Polls the host battery.
#[derive(Debug, Clone)]
pub struct SystemBattery {
    poll_interval: Duration,
}

impl SystemBattery {
    pub fn new(poll_interval: Duration) -> SystemBattery {
        return SystemBattery { poll_interval };
    }
}

/// Reads the first battery of the host, if there is one.
pub fn read_system_battery() -> Option<BatteryStatus> {
    let manager = match battery::Manager::new() {
        Ok(m) => m,
        Err(e) => {
            log::debug!("battery manager unavailable: {}", e);
            return None;
        }
    };

    let mut batteries = match manager.batteries() {
        Ok(b) => b,
        Err(e) => {
            log::debug!("could not list batteries: {}", e);
            return None;
        }
    };

    let battery = match batteries.next() {
        Some(Ok(b)) => b,
        _ => return None,
    };

    let level = (battery.state_of_charge().value * 100.0).round() as i32;

    Some(BatteryStatus::new(level, 100))
}

impl BatterySource for SystemBattery {
    fn watch(&self) -> Receiver<BatteryStatus> {
        let (tx, rx) = mpsc::channel(4);
        let poll_interval = self.poll_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);

            loop {
                ticker.tick().await;

                let reading = match tokio::task::spawn_blocking(read_system_battery).await {
                    Ok(r) => r,
                    Err(e) => {
                        log::error!("battery poll panicked: {}", e);
                        break;
                    }
                };

                let Some(status) = reading else { continue };

                if tx.send(status).await.is_err() {
                    break;
                }
            }
        });

        rx
    }
}

/// Reports a single fixed reading.
#[derive(Debug, Clone, Copy)]
pub struct FixedBattery {
    status: BatteryStatus,
}

impl FixedBattery {
    pub fn new(status: BatteryStatus) -> FixedBattery {
        return FixedBattery { status };
    }

    pub fn percent(percent: u8) -> FixedBattery {
        return FixedBattery::new(BatteryStatus::new(percent as i32, 100));
    }
}

impl BatterySource for FixedBattery {
    fn watch(&self) -> Receiver<BatteryStatus> {
        let (tx, rx) = mpsc::channel(1);
        let _ = tx.try_send(self.status);
        rx
    }
}
