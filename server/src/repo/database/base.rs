use common_data::server::json::http::{DeviceLocation, PathPointJson};

use chrono::prelude::*;

use async_trait::async_trait;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("could not connect to database: {0}")]
    ConnectionError(String),
    #[error("migration failed: {0}")]
    MigrationError(String),
    #[error("query failed: {0}")]
    QueryError(String),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(e: sqlx::Error) -> Self {
        DatabaseError::QueryError(e.to_string())
    }
}

#[async_trait]
pub trait DataBase: Send + Sync {
    /// Insert or replace the latest location of `location.device_id`.
    async fn put_location(&self, location: &DeviceLocation) -> Result<(), DatabaseError>;
    /// Every known device, most recently updated first.
    async fn fetch_locations(&self) -> Result<Vec<DeviceLocation>, DatabaseError>;
    async fn put_path_point(&self, device_id: &str, point: &PathPointJson)
        -> Result<(), DatabaseError>;
    /// Path of a device in timestamp order.
    async fn fetch_path(&self, device_id: &str) -> Result<Vec<PathPointJson>, DatabaseError>;
    async fn set_recording(&self, device_id: &str, recording: bool) -> Result<(), DatabaseError>;
    async fn is_recording(&self, device_id: &str) -> Result<bool, DatabaseError>;
    /// Devices whose last update is older than `cutoff`.
    async fn fetch_stale_devices(&self, cutoff: DateTime<Utc>)
        -> Result<Vec<String>, DatabaseError>;
    /// Drop the location and path of a device.
    async fn delete_device(&self, device_id: &str) -> Result<(), DatabaseError>;
}

pub fn to_micros(time: DateTime<Utc>) -> i64 {
    time.timestamp_micros()
}

pub fn from_micros(micros: i64) -> DateTime<Utc> {
    let secs = micros.div_euclid(1_000_000);
    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;

    DateTime::from_timestamp(secs, nanos).unwrap_or_default()
}
