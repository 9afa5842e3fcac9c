use common_data::server::http::HttpErrors;

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location provider is disabled")]
    ProviderUnavailable,
    #[error("submission failed: {0}")]
    SubmissionFailed(#[from] HttpErrors),
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("update intervals must be non-zero")]
    ZeroInterval,
    #[error("fastest interval ({fastest:?}) is longer than the interval ({interval:?})")]
    FastestExceedsInterval {
        fastest: Duration,
        interval: Duration,
    },
    #[error("battery poll interval must be non-zero")]
    ZeroBatteryPoll,
}
