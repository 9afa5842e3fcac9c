use crate::server::data::location::LocationReport;
use crate::server::json::http::{
    DeviceLocation, RecordingAction, RecordingState, ToggleRecording,
};

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;

use thiserror::Error;

/// Connect, read and write limit for every collector call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client side of the collector API.
///
/// Every call is a single attempt: nothing is retried, queued or buffered.
#[derive(Clone, Debug)]
pub struct Http {
    server_address: String,
    client: reqwest::Client,
}

#[derive(Error, Debug)]
pub enum HttpErrors {
    #[error("could not encode request: {0}")]
    Encode(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server error: {code} - {body}")]
    Status { code: u16, body: String },
    #[error("could not read server response")]
    ServerError,
}

impl HttpErrors {
    fn from_status(code: StatusCode, body: String) -> HttpErrors {
        return HttpErrors::Status {
            code: code.as_u16(),
            body,
        };
    }
}

impl Http {
    pub fn new(server_address: &str) -> Http {
        Http::with_timeout(server_address, REQUEST_TIMEOUT)
    }

    /// A client whose calls fail with `HttpErrors::Transport` once `timeout`
    /// passes without the collector answering.
    pub fn with_timeout(server_address: &str, timeout: Duration) -> Http {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build();

        let client = match client {
            Ok(c) => c,
            Err(e) => {
                log::warn!("could not build http client, using defaults: {}", e);
                reqwest::Client::new()
            }
        };

        return Http {
            server_address: server_address.trim_end_matches('/').to_string(),
            client,
        };
    }

    pub fn server_address(&self) -> &str {
        &self.server_address
    }

    pub fn location_url(&self) -> String {
        self.server_address.clone() + "/api/location/"
    }

    /// POST one report; returns the response body on any 2xx status.
    pub async fn submit_location(&self, report: &LocationReport) -> Result<String, HttpErrors> {
        let body = match serde_json::to_string(report) {
            Ok(b) => b,
            Err(e) => return Err(HttpErrors::Encode(e.to_string())),
        };

        log::debug!("sending location json: {}", body);

        let response = self
            .client
            .post(self.location_url())
            .header(CONTENT_TYPE, "application/json; charset=utf-8")
            .body(body)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => return Err(HttpErrors::Transport(e.to_string())),
        };

        let status = response.status();

        let text = match response.text().await {
            Ok(t) => t,
            Err(e) if e.is_timeout() => return Err(HttpErrors::Transport(e.to_string())),
            Err(_) => return Err(HttpErrors::ServerError),
        };

        if !status.is_success() {
            return Err(HttpErrors::from_status(status, text));
        }

        Ok(text)
    }

    pub async fn fetch_locations(&self) -> Result<Vec<DeviceLocation>, HttpErrors> {
        let request_url = self.server_address.clone() + "/api/locations/";

        let response = match self.client.get(request_url).send().await {
            Ok(r) => r,
            Err(e) => return Err(HttpErrors::Transport(e.to_string())),
        };

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HttpErrors::from_status(status, body));
        }

        match response.json::<Vec<DeviceLocation>>().await {
            Ok(l) => Ok(l),
            Err(_) => Err(HttpErrors::ServerError),
        }
    }

    pub async fn toggle_recording(
        &self,
        device_id: &str,
        action: RecordingAction,
    ) -> Result<RecordingState, HttpErrors> {
        let request_url = self.server_address.clone() + "/api/toggle_recording/";

        let toggle = ToggleRecording {
            device_id: device_id.to_string(),
            action,
        };

        let response = match self.client.post(request_url).json(&toggle).send().await {
            Ok(r) => r,
            Err(e) => return Err(HttpErrors::Transport(e.to_string())),
        };

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HttpErrors::from_status(status, body));
        }

        match response.json::<RecordingState>().await {
            Ok(s) => Ok(s),
            Err(_) => Err(HttpErrors::ServerError),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::data::location::Fix;
    use httptest::{matchers::*, responders::*, Expectation, Server};

    fn report() -> LocationReport {
        LocationReport::new("device-1", Fix::new(35.7246, 51.3876), 50, "Pixel 7")
    }

    #[test]
    fn trailing_slash_is_ignored() {
        let http = Http::new("http://example.com:8000/");
        assert_eq!(http.location_url(), "http://example.com:8000/api/location/");
    }

    #[tokio::test]
    async fn test_submit_location_posts_json() {
        let server = Server::run();
        let m = all_of![
            request::method_path("POST", "/api/location/"),
            request::headers(contains(("content-type", "application/json; charset=utf-8"))),
            request::body(json_decoded(eq(serde_json::json!({
                "device_id": "device-1",
                "latitude": 35.7246,
                "longitude": 51.3876,
                "battery": 50,
                "model": "Pixel 7",
            })))),
        ];
        server.expect(
            Expectation::matching(m)
                .times(1)
                .respond_with(status_code(200).body(r#"{"status": "success"}"#)),
        );

        let http = Http::new(&server.url_str(""));
        let body = http.submit_location(&report()).await.unwrap();

        assert_eq!(body, r#"{"status": "success"}"#);
    }

    #[tokio::test]
    async fn test_submit_location_accepts_any_2xx() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/api/location/"))
                .respond_with(status_code(201)),
        );

        let http = Http::new(&server.url_str(""));
        assert!(http.submit_location(&report()).await.is_ok());
    }

    #[tokio::test]
    async fn test_submit_location_non_2xx() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/api/location/"))
                .times(1)
                .respond_with(status_code(400).body("Missing fields")),
        );

        let http = Http::new(&server.url_str(""));
        let err = http.submit_location(&report()).await.unwrap_err();

        match err {
            HttpErrors::Status { code, body } => {
                assert_eq!(code, 400);
                assert_eq!(body, "Missing fields");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_submit_location_transport_failure() {
        // Nothing listens on port 9 of the loopback interface.
        let http = Http::new("http://127.0.0.1:9");
        let err = http.submit_location(&report()).await.unwrap_err();

        assert!(matches!(err, HttpErrors::Transport(_)));
    }

    #[tokio::test]
    async fn test_submit_location_silent_server_times_out() {
        // Accepts connections and never writes a response.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let http = Http::with_timeout(&format!("http://{}", addr), Duration::from_millis(300));
        let result =
            tokio::time::timeout(Duration::from_secs(5), http.submit_location(&report())).await;

        match result {
            Ok(Err(HttpErrors::Transport(_))) => {}
            other => panic!("expected a transport timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_locations() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/api/locations/")).respond_with(
                json_encoded(serde_json::json!([{
                    "device_id": "device-1",
                    "latitude": 1.5,
                    "longitude": 2.5,
                    "battery": 90,
                    "model": "Pixel 7",
                    "last_updated": "2024-03-01T10:00:00Z",
                }])),
            ),
        );

        let http = Http::new(&server.url_str(""));
        let locations = http.fetch_locations().await.unwrap();

        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].device_id, "device-1");
        assert_eq!(locations[0].battery, 90);
    }

    #[tokio::test]
    async fn test_toggle_recording() {
        let server = Server::run();
        let m = all_of![
            request::method_path("POST", "/api/toggle_recording/"),
            request::body(json_decoded(eq(serde_json::json!({
                "device_id": "device-1",
                "action": "start",
            })))),
        ];
        server.expect(Expectation::matching(m).respond_with(json_encoded(
            serde_json::json!({"status": "success", "device_id": "device-1", "recording": true}),
        )));

        let http = Http::new(&server.url_str(""));
        let state = http
            .toggle_recording("device-1", RecordingAction::Start)
            .await
            .unwrap();

        assert!(state.recording);
    }
}
