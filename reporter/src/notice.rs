use std::fmt;

use tokio::sync::mpsc::UnboundedSender;

pub type NoticeSender = UnboundedSender<Notice>;

/// Ephemeral, user-facing outcome of something the agent did.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    DeviceIdUnavailable,
    PermissionDenied,
    /// The location provider is off; the user has to enable it in the
    /// system settings and start the agent again.
    EnableProvider,
    NoLocationData,
    LocationUpdated { latitude: f64, longitude: f64 },
    BatteryUpdated(u8),
    LocationSent { response: String },
    ServerError { code: u16, body: String },
    SendFailed { reason: String },
    EncodeFailed { reason: String },
}

impl Notice {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Notice::DeviceIdUnavailable
                | Notice::PermissionDenied
                | Notice::EnableProvider
                | Notice::ServerError { .. }
                | Notice::SendFailed { .. }
                | Notice::EncodeFailed { .. }
        )
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::DeviceIdUnavailable => write!(f, "Failed to retrieve device ID"),
            Notice::PermissionDenied => write!(f, "Location permission denied"),
            Notice::EnableProvider => write!(f, "Please enable GPS"),
            Notice::NoLocationData => write!(f, "No location data available"),
            Notice::LocationUpdated {
                latitude,
                longitude,
            } => write!(f, "Location: {}, {}", latitude, longitude),
            Notice::BatteryUpdated(percent) => write!(f, "Battery: {}%", percent),
            Notice::LocationSent { .. } => write!(f, "Location sent"),
            Notice::ServerError { code, body } => write!(f, "Server error: {} - {}", code, body),
            Notice::SendFailed { reason } => write!(f, "Failed to send location: {}", reason),
            Notice::EncodeFailed { reason } => write!(f, "JSON error: {}", reason),
        }
    }
}

/// Surface a notice through the log.
pub fn log_notice(notice: &Notice) {
    match notice {
        Notice::LocationSent { response } => {
            log::info!("{}", notice);
            log::debug!("response: {}", response);
        }
        n if n.is_failure() => log::warn!("{}", n),
        Notice::LocationUpdated { .. } | Notice::BatteryUpdated(_) => log::debug!("{}", notice),
        n => log::info!("{}", n),
    }
}
