use crate::battery::BatterySource;
use crate::error::ReportError;
use crate::identity::DeviceInfo;
use crate::location::{LocationProvider, LocationRequest, Permission};
use crate::notice::{Notice, NoticeSender};

use common_data::server::data::location::{Fix, LocationReport};
use common_data::server::http::{Http, HttpErrors};

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Unsubscribed,
    Subscribed,
}

pub type Submission = JoinHandle<Result<String, ReportError>>;

/*
 * Everything a fix needs to become a submission. Cloned into the update
 * pump so reports can be built without touching the agent.
 */
#[derive(Clone)]
struct Submitter {
    http: Http,
    device_id: Arc<str>,
    model: Arc<str>,
    battery: Arc<AtomicU8>,
    notices: NoticeSender,
}

impl Submitter {
    fn on_position(&self, fixes: Vec<Fix>) -> Vec<Submission> {
        if fixes.is_empty() {
            let _ = self.notices.send(Notice::NoLocationData);
            return Vec::new();
        }

        let mut submissions = Vec::with_capacity(fixes.len());

        for fix in fixes {
            let _ = self.notices.send(Notice::LocationUpdated {
                latitude: fix.latitude,
                longitude: fix.longitude,
            });

            let battery = self.battery.load(Ordering::Relaxed);
            let report = LocationReport::new(&self.device_id, fix, battery, &self.model);

            submissions.push(self.submit(report));
        }

        submissions
    }

    fn submit(&self, report: LocationReport) -> Submission {
        let http = self.http.clone();
        let notices = self.notices.clone();

        tokio::spawn(async move {
            match http.submit_location(&report).await {
                Ok(response) => {
                    let _ = notices.send(Notice::LocationSent {
                        response: response.clone(),
                    });
                    Ok(response)
                }
                Err(e) => {
                    let notice = match &e {
                        HttpErrors::Status { code, body } => Notice::ServerError {
                            code: *code,
                            body: body.clone(),
                        },
                        HttpErrors::Encode(reason) => Notice::EncodeFailed {
                            reason: reason.clone(),
                        },
                        other => Notice::SendFailed {
                            reason: other.to_string(),
                        },
                    };
                    let _ = notices.send(notice);

                    Err(ReportError::SubmissionFailed(e))
                }
            }
        })
    }
}

struct Subscription {
    updates: JoinHandle<()>,
    battery: JoinHandle<()>,
}

impl Subscription {
    fn cancel(self) {
        self.updates.abort();
        self.battery.abort();
    }
}

/// Turns a stream of position fixes into collector submissions.
///
/// Submissions run as independent tasks. Nothing is retried and `stop`
/// neither cancels nor waits for submissions already in flight.
pub struct Agent<P, B>
where
    P: LocationProvider,
    B: BatterySource,
{
    provider: P,
    battery_source: B,
    request: LocationRequest,
    submitter: Submitter,
    subscription: Option<Subscription>,
}

impl<P, B> Agent<P, B>
where
    P: LocationProvider,
    B: BatterySource,
{
    pub fn new(
        provider: P,
        battery_source: B,
        http: Http,
        request: LocationRequest,
        device: DeviceInfo,
        notices: NoticeSender,
    ) -> Agent<P, B> {
        let submitter = Submitter {
            http,
            device_id: Arc::from(device.device_id),
            model: Arc::from(device.model),
            battery: Arc::new(AtomicU8::new(0)),
            notices,
        };

        return Agent {
            provider,
            battery_source,
            request,
            submitter,
            subscription: None,
        };
    }

    pub fn state(&self) -> AgentState {
        match self.subscription {
            Some(_) => AgentState::Subscribed,
            None => AgentState::Unsubscribed,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.submitter.device_id
    }

    pub fn model(&self) -> &str {
        &self.submitter.model
    }

    /// Last battery percentage observed, 0 until the first reading.
    pub fn battery_percent(&self) -> u8 {
        self.submitter.battery.load(Ordering::Relaxed)
    }

    /*
     * Subscribe to location updates. Refused permission or a disabled
     * provider leave the agent unsubscribed; calling start again once the
     * provider is enabled is the only way to recover. Starting an agent
     * that is already subscribed does nothing.
     */
    pub fn start(&mut self) -> Result<(), ReportError> {
        if self.subscription.is_some() {
            log::debug!("location updates already requested");
            return Ok(());
        }

        if self.provider.permission() == Permission::Denied {
            let _ = self.submitter.notices.send(Notice::PermissionDenied);
            return Err(ReportError::PermissionDenied);
        }

        if !self.provider.is_enabled() {
            let _ = self.submitter.notices.send(Notice::EnableProvider);
            return Err(ReportError::ProviderUnavailable);
        }

        let battery = self.watch_battery();

        let mut updates_rx = self.provider.request_updates(self.request);
        let submitter = self.submitter.clone();

        let updates = tokio::spawn(async move {
            while let Some(fixes) = updates_rx.recv().await {
                submitter.on_position(fixes);
            }
            log::debug!("location stream ended");
        });

        log::info!(
            "requested location updates (interval={:?}, fastest={:?}, accuracy={})",
            self.request.interval,
            self.request.fastest_interval,
            self.request.accuracy
        );

        self.subscription = Some(Subscription { updates, battery });

        Ok(())
    }

    fn watch_battery(&self) -> JoinHandle<()> {
        let mut battery_rx = self.battery_source.watch();
        let battery = Arc::clone(&self.submitter.battery);
        let notices = self.submitter.notices.clone();

        tokio::spawn(async move {
            while let Some(status) = battery_rx.recv().await {
                let Some(percent) = status.percent() else {
                    log::debug!("ignoring battery reading {:?}", status);
                    continue;
                };

                battery.store(percent, Ordering::Relaxed);
                let _ = notices.send(Notice::BatteryUpdated(percent));
            }
        })
    }

    /// Unsubscribe from location and battery updates.
    pub fn stop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
            log::info!("removed location updates");
        }
    }

    /// Build and submit one report per fix, in delivery order.
    pub fn on_position(&self, fixes: Vec<Fix>) -> Vec<Submission> {
        self.submitter.on_position(fixes)
    }

    pub fn submit(&self, report: LocationReport) -> Submission {
        self.submitter.submit(report)
    }
}

impl<P, B> Drop for Agent<P, B>
where
    P: LocationProvider,
    B: BatterySource,
{
    fn drop(&mut self) {
        self.stop();
    }
}
