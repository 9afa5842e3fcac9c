pub mod location;
pub mod recording;

use common_data::server::json::http::StatusResponse;

use actix_web::web;
use actix_web::HttpResponse;

/// Register every collector route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/location/")
            .route(web::post().to(location::update))
            .default_service(web::to(method_not_allowed)),
    )
    .service(location::list)
    .service(
        web::resource("/api/toggle_recording/")
            .route(web::post().to(recording::toggle))
            .default_service(web::to(method_not_allowed)),
    )
    .service(recording::path);
}

async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed().json(StatusResponse::error("Invalid method"))
}
