use common_data::server::data::location::Fix;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tokio::sync::mpsc::Receiver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Accuracy {
    #[default]
    HighAccuracy,
    Balanced,
    LowPower,
    Passive,
}

impl FromStr for Accuracy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" | "high_accuracy" => Ok(Accuracy::HighAccuracy),
            "balanced" => Ok(Accuracy::Balanced),
            "low" | "low_power" => Ok(Accuracy::LowPower),
            "passive" => Ok(Accuracy::Passive),
            other => Err(format!(
                "unknown accuracy '{}', expected one of high, balanced, low, passive",
                other
            )),
        }
    }
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Accuracy::HighAccuracy => "high",
            Accuracy::Balanced => "balanced",
            Accuracy::LowPower => "low",
            Accuracy::Passive => "passive",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationRequest {
    pub interval: Duration,
    pub fastest_interval: Duration,
    pub accuracy: Accuracy,
}

impl Default for LocationRequest {
    fn default() -> Self {
        LocationRequest {
            interval: Duration::from_secs(10),
            fastest_interval: Duration::from_secs(5),
            accuracy: Accuracy::HighAccuracy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

/// Source of position fixes.
///
/// Each item on the returned channel is one delivery batch, which may hold
/// any number of fixes. Dropping the receiver unsubscribes.
pub trait LocationProvider: Send + Sync + 'static {
    fn permission(&self) -> Permission;

    fn is_enabled(&self) -> bool;

    fn request_updates(&self, request: LocationRequest) -> Receiver<Vec<Fix>>;
}

impl<T: LocationProvider + ?Sized> LocationProvider for Box<T> {
    fn permission(&self) -> Permission {
        (**self).permission()
    }

    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }

    fn request_updates(&self, request: LocationRequest) -> Receiver<Vec<Fix>> {
        (**self).request_updates(request)
    }
}
