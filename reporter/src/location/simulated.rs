use crate::location::base::{Accuracy, LocationProvider, LocationRequest, Permission};

use common_data::server::data::location::Fix;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tokio::sync::mpsc::{self, Receiver};

// Roughly 10 m of latitude.
const WALK_STEP_DEGREES: f64 = 0.0001;

/// Random-walk provider for hosts without a GPS receiver.
#[derive(Debug, Clone)]
pub struct SimulatedProvider {
    origin: Fix,
    permission: Permission,
    enabled: bool,
}

impl SimulatedProvider {
    pub fn new(origin: Fix) -> SimulatedProvider {
        return SimulatedProvider {
            origin,
            permission: Permission::Granted,
            enabled: true,
        };
    }

    pub fn with_permission(mut self, permission: Permission) -> SimulatedProvider {
        self.permission = permission;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> SimulatedProvider {
        self.enabled = enabled;
        self
    }
}

fn noise_degrees(accuracy: Accuracy) -> f64 {
    match accuracy {
        Accuracy::HighAccuracy => 0.00001,
        Accuracy::Balanced => 0.0001,
        Accuracy::LowPower | Accuracy::Passive => 0.001,
    }
}

/// Moves `from` by at most one walk step plus the accuracy noise on each axis.
pub fn step<R: Rng>(rng: &mut R, from: Fix, accuracy: Accuracy) -> Fix {
    let reach = WALK_STEP_DEGREES + noise_degrees(accuracy);

    let latitude = (from.latitude + rng.gen_range(-reach..=reach)).clamp(-90.0, 90.0);

    let mut longitude = from.longitude + rng.gen_range(-reach..=reach);
    if longitude > 180.0 {
        longitude -= 360.0;
    } else if longitude < -180.0 {
        longitude += 360.0;
    }

    Fix::new(latitude, longitude)
}

impl LocationProvider for SimulatedProvider {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn request_updates(&self, request: LocationRequest) -> Receiver<Vec<Fix>> {
        let (tx, rx) = mpsc::channel(16);
        let period = request.interval.max(request.fastest_interval);
        let mut position = self.origin;

        tokio::spawn(async move {
            let mut rng = StdRng::from_entropy();
            let mut ticker = tokio::time::interval(period);

            loop {
                ticker.tick().await;

                position = step(&mut rng, position, request.accuracy);

                if tx.send(vec![position]).await.is_err() {
                    log::debug!("simulated location stream closed");
                    break;
                }
            }
        });

        rx
    }
}
