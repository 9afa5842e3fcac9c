use crate::location::base::{LocationProvider, LocationRequest, Permission};

use common_data::server::data::location::Fix;

use std::path::Path;

use thiserror::Error;

use tokio::sync::mpsc::{self, Receiver};

#[derive(Error, Debug)]
pub enum TrackError {
    #[error("could not read track file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed fix on line {line}: '{content}'")]
    Malformed { line: usize, content: String },
    #[error("track contains no fixes")]
    Empty,
}

/// Replays a recorded track, one fix per interval, looping at the end.
///
/// The track format is one `latitude,longitude` pair per line. Blank lines
/// and lines starting with `#` are skipped.
#[derive(Debug, Clone)]
pub struct ReplayProvider {
    fixes: Vec<Fix>,
    permission: Permission,
    enabled: bool,
}

impl ReplayProvider {
    pub fn load(path: &Path) -> Result<ReplayProvider, TrackError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<ReplayProvider, TrackError> {
        let mut fixes = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let malformed = || TrackError::Malformed {
                line: idx + 1,
                content: line.to_string(),
            };

            let (lat, lon) = line.split_once(',').ok_or_else(|| malformed())?;
            let latitude: f64 = lat.trim().parse().map_err(|_| malformed())?;
            let longitude: f64 = lon.trim().parse().map_err(|_| malformed())?;

            fixes.push(Fix::new(latitude, longitude));
        }

        if fixes.is_empty() {
            return Err(TrackError::Empty);
        }

        Ok(ReplayProvider {
            fixes,
            permission: Permission::Granted,
            enabled: true,
        })
    }

    pub fn fixes(&self) -> &[Fix] {
        &self.fixes
    }

    pub fn with_permission(mut self, permission: Permission) -> ReplayProvider {
        self.permission = permission;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> ReplayProvider {
        self.enabled = enabled;
        self
    }
}

impl LocationProvider for ReplayProvider {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn request_updates(&self, request: LocationRequest) -> Receiver<Vec<Fix>> {
        let (tx, rx) = mpsc::channel(16);
        let fixes = self.fixes.clone();
        let period = request.interval.max(request.fastest_interval);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);

            for fix in fixes.iter().cycle() {
                ticker.tick().await;

                if tx.send(vec![*fix]).await.is_err() {
                    log::debug!("replay location stream closed");
                    break;
                }
            }
        });

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn parse_track() {
        let track = "# morning run\n35.7246, 51.3876\n\n35.7250,51.3880\n";
        let provider = ReplayProvider::parse(track).unwrap();

        assert_eq!(
            provider.fixes(),
            &[Fix::new(35.7246, 51.3876), Fix::new(35.7250, 51.3880)]
        );
    }

    #[test]
    fn malformed_line_is_reported() {
        let err = ReplayProvider::parse("1.0,2.0\n1.0;2.0\n").unwrap_err();

        match err {
            TrackError::Malformed { line, content } => {
                assert_eq!(line, 2);
                assert_eq!(content, "1.0;2.0");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn empty_track() {
        assert!(matches!(
            ReplayProvider::parse("# nothing\n").unwrap_err(),
            TrackError::Empty
        ));
    }

    #[test]
    fn permission_and_provider_state_are_configurable() {
        let provider = ReplayProvider::parse("1,1\n").unwrap();
        assert_eq!(provider.permission(), Permission::Granted);
        assert!(provider.is_enabled());

        let provider = provider
            .with_permission(Permission::Denied)
            .with_enabled(false);
        assert_eq!(provider.permission(), Permission::Denied);
        assert!(!provider.is_enabled());
    }

    #[tokio::test]
    async fn replay_loops() {
        let provider = ReplayProvider::parse("1,1\n2,2\n").unwrap();
        let request = LocationRequest {
            interval: Duration::from_millis(5),
            fastest_interval: Duration::from_millis(1),
            ..LocationRequest::default()
        };

        let mut rx = provider.request_updates(request);
        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(rx.recv().await.unwrap()[0]);
        }

        assert_eq!(seen, vec![Fix::new(1.0, 1.0), Fix::new(2.0, 2.0), Fix::new(1.0, 1.0)]);
    }
}
