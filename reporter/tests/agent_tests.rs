use reporter::agent::{Agent, AgentState};
use reporter::battery::FixedBattery;
use reporter::error::ReportError;
use reporter::identity::DeviceInfo;
use reporter::location::{LocationProvider, LocationRequest, Permission};
use reporter::notice::Notice;

use common_data::server::data::battery::BatteryStatus;
use common_data::server::data::location::{Fix, LocationReport};
use common_data::server::http::Http;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use httptest::{matchers::*, responders::*, Expectation, ExpectationBuilder, Server};
use serde_json::json;
use tokio::sync::mpsc::{self, Receiver, Sender, UnboundedReceiver};

/*
 * Provider driven by the test: fixes pushed into the returned sender are
 * delivered to whoever requested updates.
 */
struct ChannelProvider {
    permission: Permission,
    enabled: Arc<AtomicBool>,
    requests: Arc<AtomicUsize>,
    updates: Mutex<Option<Receiver<Vec<Fix>>>>,
}

struct Handles {
    fixes: Sender<Vec<Fix>>,
    enabled: Arc<AtomicBool>,
    requests: Arc<AtomicUsize>,
}

fn channel_provider(permission: Permission, enabled: bool) -> (ChannelProvider, Handles) {
    let (tx, rx) = mpsc::channel(16);
    let enabled = Arc::new(AtomicBool::new(enabled));
    let requests = Arc::new(AtomicUsize::new(0));

    let provider = ChannelProvider {
        permission,
        enabled: Arc::clone(&enabled),
        requests: Arc::clone(&requests),
        updates: Mutex::new(Some(rx)),
    };

    (
        provider,
        Handles {
            fixes: tx,
            enabled,
            requests,
        },
    )
}

impl LocationProvider for ChannelProvider {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn request_updates(&self, _request: LocationRequest) -> Receiver<Vec<Fix>> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        match self.updates.lock().unwrap().take() {
            Some(rx) => rx,
            // A second subscription gets a stream that never delivers.
            None => mpsc::channel(1).1,
        }
    }
}

fn device() -> DeviceInfo {
    DeviceInfo {
        device_id: "device-1".to_string(),
        model: "Pixel 7".to_string(),
    }
}

fn agent(
    provider: ChannelProvider,
    battery: FixedBattery,
    endpoint: &str,
) -> (Agent<ChannelProvider, FixedBattery>, UnboundedReceiver<Notice>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let agent = Agent::new(
        provider,
        battery,
        Http::new(endpoint),
        LocationRequest::default(),
        device(),
        tx,
    );
    (agent, rx)
}

async fn wait_for<F>(notices: &mut UnboundedReceiver<Notice>, mut matches: F) -> Notice
where
    F: FnMut(&Notice) -> bool,
{
    let found = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(notice) = notices.recv().await {
            if matches(&notice) {
                return Some(notice);
            }
        }
        None
    })
    .await;

    match found {
        Ok(Some(n)) => n,
        Ok(None) => panic!("notice channel closed"),
        Err(_) => panic!("timed out waiting for notice"),
    }
}

fn location_post(latitude: f64, longitude: f64, battery: u8) -> ExpectationBuilder {
    Expectation::matching(all_of![
        request::method_path("POST", "/api/location/"),
        request::body(json_decoded(eq(json!({
            "device_id": "device-1",
            "latitude": latitude,
            "longitude": longitude,
            "battery": battery,
            "model": "Pixel 7",
        })))),
    ])
}

#[tokio::test]
async fn test_each_fix_is_submitted_once_with_latest_battery() {
    let server = Server::run();
    for (lat, lon) in [(1.0, 2.0), (3.0, 4.0), (5.0, 6.0)] {
        server.expect(
            location_post(lat, lon, 64)
                .times(1)
                .respond_with(status_code(200).body(r#"{"status": "success"}"#)),
        );
    }

    let (provider, handles) = channel_provider(Permission::Granted, true);
    let (mut agent, mut notices) = agent(provider, FixedBattery::percent(64), &server.url_str(""));

    agent.start().unwrap();
    assert_eq!(agent.state(), AgentState::Subscribed);

    wait_for(&mut notices, |n| *n == Notice::BatteryUpdated(64)).await;
    assert_eq!(agent.battery_percent(), 64);

    handles
        .fixes
        .send(vec![Fix::new(1.0, 2.0), Fix::new(3.0, 4.0)])
        .await
        .unwrap();
    handles.fixes.send(vec![Fix::new(5.0, 6.0)]).await.unwrap();

    let mut updated = Vec::new();
    let mut sent = 0;
    while sent < 3 {
        match wait_for(&mut notices, |_| true).await {
            Notice::LocationUpdated {
                latitude,
                longitude,
            } => updated.push((latitude, longitude)),
            Notice::LocationSent { .. } => sent += 1,
            other => panic!("unexpected notice {:?}", other),
        }
    }

    assert_eq!(updated, vec![(1.0, 2.0), (3.0, 4.0), (5.0, 6.0)]);
}

#[tokio::test]
async fn test_permission_denied_never_subscribes() {
    // No expectations: any request fails the test.
    let server = Server::run();

    let (provider, handles) = channel_provider(Permission::Denied, true);
    let (mut agent, mut notices) = agent(provider, FixedBattery::percent(50), &server.url_str(""));

    let err = agent.start().unwrap_err();

    assert!(matches!(err, ReportError::PermissionDenied));
    assert_eq!(agent.state(), AgentState::Unsubscribed);
    assert_eq!(handles.requests.load(Ordering::SeqCst), 0);
    assert_eq!(notices.recv().await, Some(Notice::PermissionDenied));

    // Fixes pushed anyway go nowhere.
    let _ = handles.fixes.send(vec![Fix::new(1.0, 1.0)]).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(notices.try_recv().is_err());
}

#[tokio::test]
async fn test_disabled_provider_prompts_until_started_again() {
    let server = Server::run();
    server.expect(
        location_post(7.0, 8.0, 50)
            .times(1)
            .respond_with(status_code(200)),
    );

    let (provider, handles) = channel_provider(Permission::Granted, false);
    let (mut agent, mut notices) = agent(provider, FixedBattery::percent(50), &server.url_str(""));

    let err = agent.start().unwrap_err();

    assert!(matches!(err, ReportError::ProviderUnavailable));
    assert_eq!(notices.recv().await, Some(Notice::EnableProvider));
    assert_eq!(agent.state(), AgentState::Unsubscribed);
    assert_eq!(handles.requests.load(Ordering::SeqCst), 0);

    handles.enabled.store(true, Ordering::SeqCst);
    agent.start().unwrap();

    assert_eq!(agent.state(), AgentState::Subscribed);
    wait_for(&mut notices, |n| *n == Notice::BatteryUpdated(50)).await;

    handles.fixes.send(vec![Fix::new(7.0, 8.0)]).await.unwrap();
    wait_for(&mut notices, |n| matches!(n, Notice::LocationSent { .. })).await;
}

#[tokio::test]
async fn test_start_twice_keeps_one_stream() {
    let server = Server::run();

    let (provider, handles) = channel_provider(Permission::Granted, true);
    let (mut agent, _notices) = agent(provider, FixedBattery::percent(50), &server.url_str(""));

    agent.start().unwrap();
    agent.start().unwrap();

    assert_eq!(handles.requests.load(Ordering::SeqCst), 1);
    assert_eq!(agent.state(), AgentState::Subscribed);
}

#[tokio::test]
async fn test_server_error_is_reported_and_not_retried() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("POST", "/api/location/"))
            .times(1)
            .respond_with(status_code(500).body("boom")),
    );

    let (provider, handles) = channel_provider(Permission::Granted, true);
    let (mut agent, mut notices) = agent(provider, FixedBattery::percent(50), &server.url_str(""));

    agent.start().unwrap();
    handles.fixes.send(vec![Fix::new(1.0, 1.0)]).await.unwrap();

    let notice = wait_for(&mut notices, |n| n.is_failure()).await;
    assert_eq!(
        notice,
        Notice::ServerError {
            code: 500,
            body: "boom".to_string()
        }
    );

    // Give a retry, if there were one, the chance to hit the server.
    tokio::time::sleep(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_transport_failure_is_reported() {
    let (provider, handles) = channel_provider(Permission::Granted, true);
    let (mut agent, mut notices) = agent(provider, FixedBattery::percent(50), "http://127.0.0.1:9");

    agent.start().unwrap();
    handles.fixes.send(vec![Fix::new(1.0, 1.0)]).await.unwrap();

    let notice = wait_for(&mut notices, |n| n.is_failure()).await;
    assert!(matches!(notice, Notice::SendFailed { .. }));
}

#[tokio::test]
async fn test_empty_batch_reports_no_location() {
    let server = Server::run();

    let (provider, handles) = channel_provider(Permission::Granted, true);
    let (mut agent, mut notices) = agent(provider, FixedBattery::percent(50), &server.url_str(""));

    agent.start().unwrap();
    handles.fixes.send(Vec::new()).await.unwrap();

    wait_for(&mut notices, |n| *n == Notice::NoLocationData).await;
}

#[tokio::test]
async fn test_unknown_battery_reading_keeps_last_value() {
    let server = Server::run();
    server.expect(
        location_post(1.0, 1.0, 0)
            .times(1)
            .respond_with(status_code(200)),
    );

    let (provider, handles) = channel_provider(Permission::Granted, true);
    let battery = FixedBattery::new(BatteryStatus::new(-1, -1));
    let (mut agent, mut notices) = agent(provider, battery, &server.url_str(""));

    agent.start().unwrap();
    handles.fixes.send(vec![Fix::new(1.0, 1.0)]).await.unwrap();

    wait_for(&mut notices, |n| matches!(n, Notice::LocationSent { .. })).await;
    assert_eq!(agent.battery_percent(), 0);
}

#[tokio::test]
async fn test_stop_unsubscribes() {
    let server = Server::run();

    let (provider, handles) = channel_provider(Permission::Granted, true);
    let (mut agent, _notices) = agent(provider, FixedBattery::percent(50), &server.url_str(""));

    agent.start().unwrap();
    agent.stop();

    assert_eq!(agent.state(), AgentState::Unsubscribed);

    tokio::time::timeout(Duration::from_secs(5), handles.fixes.closed())
        .await
        .expect("update stream was not released");

    // Stopping twice is harmless.
    agent.stop();
}

#[tokio::test]
async fn test_stop_leaves_submissions_in_flight() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("POST", "/api/location/"))
            .times(1)
            .respond_with(delay_and_then(
                Duration::from_millis(300),
                status_code(200).body("late"),
            )),
    );

    let (provider, _handles) = channel_provider(Permission::Granted, true);
    let (mut agent, mut notices) = agent(provider, FixedBattery::percent(50), &server.url_str(""));

    agent.start().unwrap();
    let submissions = agent.on_position(vec![Fix::new(7.0, 8.0)]);
    agent.stop();

    assert_eq!(agent.state(), AgentState::Unsubscribed);

    for submission in submissions {
        assert_eq!(submission.await.unwrap().unwrap(), "late");
    }

    let sent = wait_for(&mut notices, |n| matches!(n, Notice::LocationSent { .. })).await;
    assert_eq!(
        sent,
        Notice::LocationSent {
            response: "late".to_string()
        }
    );
}

#[tokio::test]
async fn test_submit_returns_response_body() {
    let server = Server::run();
    server.expect(
        location_post(9.5, -9.5, 12)
            .times(1)
            .respond_with(status_code(200).body("ok")),
    );

    let (provider, _handles) = channel_provider(Permission::Granted, true);
    let (agent, _notices) = agent(provider, FixedBattery::percent(50), &server.url_str(""));

    let report = LocationReport::new("device-1", Fix::new(9.5, -9.5), 12, "Pixel 7");
    let body = agent.submit(report).await.unwrap().unwrap();

    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_on_position_without_subscription() {
    let server = Server::run();
    server.expect(
        location_post(4.0, 4.0, 0)
            .times(1)
            .respond_with(status_code(404).body("not here")),
    );

    let (provider, _handles) = channel_provider(Permission::Granted, true);
    let (agent, _notices) = agent(provider, FixedBattery::percent(50), &server.url_str(""));

    let submissions = agent.on_position(vec![Fix::new(4.0, 4.0)]);
    assert_eq!(submissions.len(), 1);

    for submission in submissions {
        let result = submission.await.unwrap();
        assert!(matches!(result, Err(ReportError::SubmissionFailed(_))));
    }
}
