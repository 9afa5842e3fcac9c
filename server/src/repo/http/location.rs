use crate::data::state::HttpState;

use common_data::server::json::http::{DeviceLocation, PathPointJson, StatusResponse};

use actix_web::get;
use actix_web::web::{Bytes, Data};
use actix_web::HttpResponse;
use actix_web::Responder;

use serde_json::Value;

use chrono::prelude::*;

const REQUIRED_FIELDS: [&str; 5] = ["device_id", "latitude", "longitude", "battery", "model"];

/// A location update that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingLocation {
    pub device_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub battery: i64,
    pub model: String,
}

pub(super) fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// Numbers may arrive as JSON numbers or numeric strings.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/*
 * Validate a location update body. Missing fields are listed by name; the
 * coordinates must be within the valid latitude/longitude ranges.
 */
pub fn parse_location(body: &[u8]) -> Result<IncomingLocation, String> {
    let data: Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(e) => return Err(format!("Invalid JSON: {}", e)),
    };

    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|f| data.get(*f).map_or(true, Value::is_null))
        .collect();

    if !missing.is_empty() {
        let quoted: Vec<String> = missing.iter().map(|f| format!("'{}'", f)).collect();
        return Err(format!("Missing fields: [{}]", quoted.join(", ")));
    }

    let latitude = as_number(&data["latitude"]);
    let longitude = as_number(&data["longitude"]);
    let battery = as_number(&data["battery"]);

    let (latitude, longitude, battery) = match (latitude, longitude, battery) {
        (Some(lat), Some(lon), Some(bat)) if bat.is_finite() => (lat, lon, bat.trunc() as i64),
        _ => {
            return Err(
                "Failed to convert latitude, longitude, or battery to correct types".to_string(),
            )
        }
    };

    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err("Latitude or longitude out of valid range".to_string());
    }

    Ok(IncomingLocation {
        device_id: as_text(&data["device_id"]),
        latitude,
        longitude,
        battery,
        model: as_text(&data["model"]),
    })
}

pub async fn update(state: Data<HttpState>, body: Bytes) -> impl Responder {
    let incoming = match parse_location(&body) {
        Ok(l) => l,
        Err(message) => {
            log::debug!("rejected location update: {}", message);
            return HttpResponse::BadRequest().json(StatusResponse::error(message));
        }
    };

    log::debug!("received location: {:?}", incoming);

    let now = Utc::now();

    let location = DeviceLocation {
        device_id: incoming.device_id.clone(),
        latitude: incoming.latitude,
        longitude: incoming.longitude,
        battery: incoming.battery,
        model: incoming.model,
        last_updated: now,
    };

    if let Err(e) = state.database.put_location(&location).await {
        log::error!("could not store location: {}", e);
        return HttpResponse::ServiceUnavailable().json(StatusResponse::error("Server Error"));
    }

    let recording = match state.database.is_recording(&incoming.device_id).await {
        Ok(r) => r,
        Err(e) => {
            log::error!("could not read recording state: {}", e);
            return HttpResponse::ServiceUnavailable().json(StatusResponse::error("Server Error"));
        }
    };

    if recording {
        let point = PathPointJson {
            latitude: incoming.latitude,
            longitude: incoming.longitude,
            timestamp: now,
        };

        if let Err(e) = state.database.put_path_point(&incoming.device_id, &point).await {
            log::error!("could not store path point: {}", e);
            return HttpResponse::ServiceUnavailable().json(StatusResponse::error("Server Error"));
        }
    }

    HttpResponse::Ok().json(StatusResponse::success())
}

#[get("/api/locations/")]
pub async fn list(state: Data<HttpState>) -> impl Responder {
    match state.database.fetch_locations().await {
        Ok(locations) => HttpResponse::Ok().json(locations),
        Err(e) => {
            log::error!("could not list locations: {}", e);
            HttpResponse::ServiceUnavailable().json(StatusResponse::error("Server Error"))
        }
    }
}
