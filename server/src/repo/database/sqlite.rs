use crate::repo::database::base::{from_micros, to_micros, DataBase, DatabaseError};

use common_data::server::json::http::{DeviceLocation, PathPointJson};

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::Pool;
use sqlx::Sqlite;

use chrono::prelude::*;

use async_trait::async_trait;

#[derive(Clone)]
pub struct SqliteDatabase {
    recording: Arc<Mutex<HashSet<String>>>,
    pool: Pool<Sqlite>,
}

impl SqliteDatabase {
    pub async fn connect(connection_url: &str) -> Result<SqliteDatabase, DatabaseError> {
        let options = match SqliteConnectOptions::from_str(connection_url) {
            Ok(o) => o.create_if_missing(true),
            Err(e) => return Err(DatabaseError::ConnectionError(e.to_string())),
        };

        // Every connection to an in-memory database sees its own empty
        // database, so it has to be a single connection that never expires.
        let in_memory = connection_url.contains(":memory:");
        let pool_options = match in_memory {
            true => SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None),
            false => SqlitePoolOptions::new().max_connections(5),
        };

        let pool = match pool_options.connect_with(options).await {
            Ok(p) => p,
            Err(e) => return Err(DatabaseError::ConnectionError(e.to_string())),
        };

        if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
            return Err(DatabaseError::MigrationError(e.to_string()));
        }

        return Ok(SqliteDatabase {
            recording: Arc::new(Mutex::new(HashSet::new())),
            pool,
        });
    }
}

type LocationRow = (String, f64, f64, i64, String, i64);

fn location_from_row(row: LocationRow) -> DeviceLocation {
    let (device_id, latitude, longitude, battery, model, last_updated) = row;

    DeviceLocation {
        device_id,
        latitude,
        longitude,
        battery,
        model,
        last_updated: from_micros(last_updated),
    }
}

#[async_trait]
impl DataBase for SqliteDatabase {
    async fn put_location(&self, location: &DeviceLocation) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO locations (device_id, latitude, longitude, battery, model, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(device_id) DO UPDATE SET
                latitude = excluded.latitude,
                longitude = excluded.longitude,
                battery = excluded.battery,
                model = excluded.model,
                last_updated = excluded.last_updated",
        )
        .bind(&location.device_id)
        .bind(location.latitude)
        .bind(location.longitude)
        .bind(location.battery)
        .bind(&location.model)
        .bind(to_micros(location.last_updated))
        .execute(&self.pool)
        .await?;

        return Ok(());
    }

    async fn fetch_locations(&self) -> Result<Vec<DeviceLocation>, DatabaseError> {
        let rows = sqlx::query_as::<_, LocationRow>(
            "SELECT device_id, latitude, longitude, battery, model, last_updated
             FROM locations ORDER BY last_updated DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        return Ok(rows.into_iter().map(location_from_row).collect());
    }

    async fn put_path_point(
        &self,
        device_id: &str,
        point: &PathPointJson,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO path_points (device_id, latitude, longitude, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(device_id)
        .bind(point.latitude)
        .bind(point.longitude)
        .bind(to_micros(point.timestamp))
        .execute(&self.pool)
        .await?;

        return Ok(());
    }

    async fn fetch_path(&self, device_id: &str) -> Result<Vec<PathPointJson>, DatabaseError> {
        let rows = sqlx::query_as::<_, (f64, f64, i64)>(
            "SELECT latitude, longitude, timestamp FROM path_points
             WHERE device_id = ?1 ORDER BY timestamp, id",
        )
        .bind(device_id)
        .fetch_all(&self.pool)
        .await?;

        let points = rows
            .into_iter()
            .map(|(latitude, longitude, timestamp)| PathPointJson {
                latitude,
                longitude,
                timestamp: from_micros(timestamp),
            })
            .collect();

        return Ok(points);
    }

    async fn set_recording(&self, device_id: &str, recording: bool) -> Result<(), DatabaseError> {
        let mut recording_lock = self.recording.lock().unwrap_or_else(PoisonError::into_inner);

        if recording {
            recording_lock.insert(device_id.to_string());
        } else {
            recording_lock.remove(device_id);
        }

        return Ok(());
    }

    async fn is_recording(&self, device_id: &str) -> Result<bool, DatabaseError> {
        let recording_lock = self.recording.lock().unwrap_or_else(PoisonError::into_inner);

        return Ok(recording_lock.contains(device_id));
    }

    async fn fetch_stale_devices(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<String>, DatabaseError> {
        let rows = sqlx::query_as::<_, (String,)>(
            "SELECT device_id FROM locations WHERE last_updated < ?1",
        )
        .bind(to_micros(cutoff))
        .fetch_all(&self.pool)
        .await?;

        return Ok(rows.into_iter().map(|(id,)| id).collect());
    }

    async fn delete_device(&self, device_id: &str) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM locations WHERE device_id = ?1")
            .bind(device_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM path_points WHERE device_id = ?1")
            .bind(device_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        return Ok(());
    }
}
