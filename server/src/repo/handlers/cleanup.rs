use crate::repo::database::base::{DataBase, DatabaseError};

use std::sync::Arc;
use std::time::Duration;

use chrono::prelude::*;
use chrono::TimeDelta;

use tokio::task::JoinHandle;

pub const STALE_AFTER: Duration = Duration::from_secs(30);
pub const CLEANUP_EVERY: Duration = Duration::from_secs(5);

/// Forget every device not heard from since `now - stale_after`.
pub async fn remove_stale(
    database: &dyn DataBase,
    now: DateTime<Utc>,
    stale_after: Duration,
) -> Result<Vec<String>, DatabaseError> {
    let offset = match TimeDelta::from_std(stale_after) {
        Ok(o) => o,
        Err(_) => TimeDelta::max_value(),
    };
    let cutoff = now.checked_sub_signed(offset).unwrap_or(DateTime::<Utc>::MIN_UTC);

    let stale = database.fetch_stale_devices(cutoff).await?;

    for device_id in stale.iter() {
        database.delete_device(device_id).await?;
        log::info!("cleaned up stale data for device: {}", device_id);
    }

    Ok(stale)
}

pub fn spawn_cleanup(
    database: Arc<dyn DataBase>,
    every: Duration,
    stale_after: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);

        loop {
            ticker.tick().await;

            if let Err(e) = remove_stale(database.as_ref(), Utc::now(), stale_after).await {
                log::error!("stale device cleanup failed: {}", e);
            }
        }
    })
}
