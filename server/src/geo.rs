use common_data::server::json::http::PathPointJson;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in metres between two latitude/longitude pairs.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Speed between the last two points of a path, in km/h rounded to two
/// decimals. `None` with fewer than two points or no elapsed time.
pub fn speed_kmh(points: &[PathPointJson]) -> Option<f64> {
    let [.., first, second] = points else {
        return None;
    };

    let distance = haversine_m(
        first.latitude,
        first.longitude,
        second.latitude,
        second.longitude,
    );

    let elapsed = (second.timestamp - first.timestamp).num_microseconds()? as f64 / 1_000_000.0;
    if elapsed <= 0.0 {
        return None;
    }

    let kmh = distance / elapsed * 3.6;

    Some((kmh * 100.0).round() / 100.0)
}
