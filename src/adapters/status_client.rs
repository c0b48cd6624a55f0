//! Status-service client.
//!
//! Two calls, both JSON over HTTP and both bounded by the client timeout:
//!
//! | Call | Request |
//! |------|---------|
//! | [`StatusClient::send_report`] | `POST {base}/api/device-report` |
//! | [`StatusClient::fetch_power`] | `GET  {base}/api/status/{device}` |
//!
//! [`Reporter`] wraps the client for the sensing contexts: every report is
//! spawned onto the tokio runtime and its result only logged, so a slow or
//! absent status service never delays a scheduler slot.

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;

use crate::app::ports::SignalProbe;
use crate::error::{CommsError, Error, Result};

/// Body of `POST /api/device-report`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceReport {
    pub device: String,
    pub message: String,
    pub distance: Option<f32>,
    pub signal_strength: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_url: Option<String>,
}

/// The slice of `GET /api/status/{device}` we read.
#[derive(Debug, Deserialize)]
struct StatusBody {
    power: Option<bool>,
}

fn classify(e: &reqwest::Error) -> CommsError {
    if e.is_timeout() {
        CommsError::Timeout
    } else if e.is_connect() {
        CommsError::Connect
    } else if e.is_decode() {
        CommsError::Decode
    } else {
        CommsError::Request
    }
}

// ───────────────────────────────────────────────────────────────
// StatusClient
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct StatusClient {
    http: reqwest::Client,
    base_url: String,
}

impl StatusClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|_| Error::Init("HTTP client"))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Push one report.  Any non-2xx answer is an error.
    pub async fn send_report(&self, report: &DeviceReport) -> Result<()> {
        let resp = self
            .http
            .post(format!("{}/api/device-report", self.base_url))
            .json(report)
            .send()
            .await
            .map_err(|e| classify(&e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CommsError::Status(status.as_u16()).into());
        }
        Ok(())
    }

    /// Read the remote power flag.  `Ok(None)` if the body has no `power`.
    pub async fn fetch_power(&self, device: &str) -> Result<Option<bool>> {
        let resp = self
            .http
            .get(format!("{}/api/status/{}", self.base_url, device))
            .send()
            .await
            .map_err(|e| classify(&e))?;
        let status = resp.status().as_u16();
        if status != 200 {
            return Err(CommsError::Status(status).into());
        }
        let body: StatusBody = resp.json().await.map_err(|_| CommsError::Decode)?;
        Ok(body.power)
    }

    /// Desired power state, or `default` on any failure.
    pub async fn poll_power_flag(&self, device: &str, default: bool) -> bool {
        match self.fetch_power(device).await {
            Ok(Some(power)) => power,
            Ok(None) => default,
            Err(e) => {
                debug!("POWER | poll failed: {e}");
                default
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Reporter
// ───────────────────────────────────────────────────────────────

/// Fire-and-forget report sender bound to one device.
#[derive(Clone)]
pub struct Reporter {
    client: Arc<StatusClient>,
    handle: Handle,
    device: Arc<str>,
    control_url: Option<Arc<str>>,
    probe: Option<Arc<dyn SignalProbe + Send + Sync>>,
}

impl Reporter {
    pub fn new(
        client: StatusClient,
        handle: Handle,
        device: &str,
        control_url: Option<&str>,
    ) -> Self {
        Self {
            client: Arc::new(client),
            handle,
            device: device.into(),
            control_url: control_url.map(Into::into),
            probe: None,
        }
    }

    /// Attach a link-quality probe sampled for every report.
    pub fn with_probe(mut self, probe: impl SignalProbe + Send + Sync + 'static) -> Self {
        self.probe = Some(Arc::new(probe));
        self
    }

    pub fn client(&self) -> &Arc<StatusClient> {
        &self.client
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Spawn a report and return immediately.  Failures are logged at
    /// debug and otherwise dropped.
    pub fn report(&self, message: String, distance: Option<f32>) {
        let this = self.clone();
        self.handle.spawn(async move {
            if let Err(e) = this.report_now(message, distance).await {
                debug!("report dropped: {e}");
            }
        });
    }

    /// Send a report and wait for the answer (bounded by the client
    /// timeout).
    pub async fn report_now(&self, message: String, distance: Option<f32>) -> Result<()> {
        let signal_strength = match &self.probe {
            Some(probe) => {
                let probe = Arc::clone(probe);
                tokio::task::spawn_blocking(move || probe.signal_strength())
                    .await
                    .ok()
                    .flatten()
            }
            None => None,
        };
        let report = DeviceReport {
            device: self.device.to_string(),
            message,
            distance,
            signal_strength,
            control_url: self.control_url.as_deref().map(str::to_owned),
        };
        self.client.send_report(&report).await
    }
}
