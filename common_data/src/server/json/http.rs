use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StatusResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
}

impl StatusResponse {
    pub fn success() -> StatusResponse {
        return StatusResponse {
            status: "success".to_string(),
            message: None,
        };
    }

    pub fn error(message: impl Into<String>) -> StatusResponse {
        return StatusResponse {
            status: "error".to_string(),
            message: Some(message.into()),
        };
    }
}

/// Latest known position of one device, as listed by `GET /api/locations/`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DeviceLocation {
    pub device_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub battery: i64,
    pub model: String,
    pub last_updated: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecordingAction {
    Start,
    Stop,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ToggleRecording {
    pub device_id: String,
    pub action: RecordingAction,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RecordingState {
    pub status: String,
    pub device_id: String,
    pub recording: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PathPointJson {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PathResponse {
    pub points: Vec<PathPointJson>,
    pub speed_kmh: Option<f64>,
}
