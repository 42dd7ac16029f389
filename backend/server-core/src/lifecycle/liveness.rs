//! Readiness check for a freshly started server.

use crate::PING_ENDPOINT;
use crate::error::liveness::LivenessError;

use common::{ErrorLocation, HttpStatusCode};
use models::ServerEndpoint;

use std::panic::Location;
use std::time::Duration;

use backoff::{ExponentialBackoff, backoff::Backoff};
use log::{debug, trace};
use reqwest::Client;
use tokio::time::sleep as TokioSleep;

/// Time the server gets to bind its port before the first probe.
pub const STARTUP_DELAY: Duration = Duration::from_millis(500);

/// Upper bound for a single `/ping` round-trip.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

const RETRY_INITIAL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessConfig {
    pub startup_delay: Duration,
    pub probe_timeout: Duration,
    /// Extra time spent re-probing after the first failure. Zero means a single probe.
    pub retry_budget: Duration,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            startup_delay: STARTUP_DELAY,
            probe_timeout: PROBE_TIMEOUT,
            retry_budget: Duration::ZERO,
        }
    }
}

/// HTTP GET against `/ping`; any 2xx answer means the server accepts requests.
pub struct LivenessProbe {
    client: Client,
    url: String,
    config: LivenessConfig,
}

impl LivenessProbe {
    #[track_caller]
    pub fn new(endpoint: &ServerEndpoint, config: LivenessConfig) -> Result<Self, LivenessError> {
        let client = Client::builder()
            .build()
            .map_err(|e| LivenessError::Client {
                message: format!("Failed to build HTTP client: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(Self {
            client,
            url: endpoint.url_for(PING_ENDPOINT),
            config,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn config(&self) -> &LivenessConfig {
        &self.config
    }

    /// A single bounded probe.
    pub async fn check(&self) -> Result<(), LivenessError> {
        match self
            .client
            .get(&self.url)
            .timeout(self.config.probe_timeout)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => {
                debug!("Liveness probe succeeded for {}", self.url);
                Ok(())
            }
            Ok(resp) => Err(LivenessError::Status {
                url: self.url.clone(),
                status: HttpStatusCode(resp.status().as_u16()),
                location: ErrorLocation::from(Location::caller()),
            }),
            Err(e) => Err(LivenessError::Request {
                url: self.url.clone(),
                message: e.to_string(),
                is_timeout: e.is_timeout(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// Wait the fixed startup delay, then probe until ready or out of budget.
    ///
    /// Total wait is bounded by `startup_delay + retry_budget` plus one probe timeout.
    pub async fn wait_until_ready(&self) -> Result<(), LivenessError> {
        TokioSleep(self.config.startup_delay).await;

        if self.config.retry_budget.is_zero() {
            return self.check().await;
        }

        let mut backoff = ExponentialBackoff {
            initial_interval: RETRY_INITIAL_INTERVAL,
            current_interval: RETRY_INITIAL_INTERVAL,
            max_interval: self.config.retry_budget,
            max_elapsed_time: Some(self.config.retry_budget),
            ..Default::default()
        };
        backoff.reset();

        loop {
            let err = match self.check().await {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };

            match backoff.next_backoff() {
                Some(duration) => {
                    trace!("Server not ready ({err}), retrying after {duration:?}");
                    TokioSleep(duration).await;
                }
                None => return Err(err),
            }
        }
    }
}
