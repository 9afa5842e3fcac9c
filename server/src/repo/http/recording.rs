use crate::data::state::HttpState;
use crate::geo;
use crate::repo::http::location::as_text;

use common_data::server::json::http::{
    PathResponse, RecordingAction, RecordingState, StatusResponse, ToggleRecording,
};

use actix_web::get;
use actix_web::web::{Bytes, Data, Path};
use actix_web::HttpResponse;
use actix_web::Responder;

use serde_json::Value;

// Any present, non-empty and non-zero value names a device.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Read `{device_id, action}`; the id may be any truthy JSON value and is
/// keyed by its text form.
pub fn parse_toggle(body: &[u8]) -> Option<ToggleRecording> {
    let data: Value = serde_json::from_slice(body).ok()?;

    let device_id = data.get("device_id").filter(|v| is_truthy(v))?;
    let action: RecordingAction = serde_json::from_value(data.get("action")?.clone()).ok()?;

    Some(ToggleRecording {
        device_id: as_text(device_id),
        action,
    })
}

pub async fn toggle(state: Data<HttpState>, body: Bytes) -> impl Responder {
    let toggle = match parse_toggle(&body) {
        Some(t) => t,
        None => return HttpResponse::BadRequest().json(StatusResponse::error("Invalid request")),
    };

    let recording = toggle.action == RecordingAction::Start;

    if let Err(e) = state.database.set_recording(&toggle.device_id, recording).await {
        log::error!("could not change recording state: {}", e);
        return HttpResponse::ServiceUnavailable().json(StatusResponse::error("Server Error"));
    }

    log::info!(
        "recording {} for device {}",
        if recording { "started" } else { "stopped" },
        toggle.device_id
    );

    HttpResponse::Ok().json(RecordingState {
        status: "success".to_string(),
        device_id: toggle.device_id,
        recording,
    })
}

#[get("/api/path/{device_id}/")]
pub async fn path(state: Data<HttpState>, path: Path<(String,)>) -> impl Responder {
    let device_id = path.into_inner().0;

    let points = match state.database.fetch_path(&device_id).await {
        Ok(p) => p,
        Err(e) => {
            log::error!("could not read path of {}: {}", device_id, e);
            return HttpResponse::ServiceUnavailable().json(StatusResponse::error("Server Error"));
        }
    };

    let speed_kmh = geo::speed_kmh(&points);

    log::debug!(
        "path for {}: {} points, speed {:?} km/h",
        device_id,
        points.len(),
        speed_kmh
    );

    HttpResponse::Ok().json(PathResponse { points, speed_kmh })
}
