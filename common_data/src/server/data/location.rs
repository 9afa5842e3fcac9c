use serde::{Deserialize, Serialize};

/// One latitude/longitude observation delivered by a location provider.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
}

impl Fix {
    pub fn new(latitude: f64, longitude: f64) -> Fix {
        return Fix {
            latitude,
            longitude,
        };
    }
}

/// The record submitted to the collector for every fix.
///
/// Built fresh per fix and never stored. The serialized keys are the wire
/// format of `POST /api/location/`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LocationReport {
    pub device_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub battery: u8,
    pub model: String,
}

impl LocationReport {
    pub fn new(device_id: &str, fix: Fix, battery: u8, model: &str) -> LocationReport {
        return LocationReport {
            device_id: device_id.to_string(),
            latitude: fix.latitude,
            longitude: fix.longitude,
            battery,
            model: model.to_string(),
        };
    }
}
