//! Remote power flag.
//!
//! The status service holds a per-device `power` flag.  [`PowerPoller`]
//! fetches it at most once per interval in a detached task and hands the
//! answer back to the main loop over a channel; the loop never waits on
//! the network.
//!
//! A remote value is applied to `system_active` the first time it is seen
//! and whenever it changes afterwards.  An unchanged remote value does not
//! overwrite a local `/sleep` or `/wake`.

use std::sync::Arc;

use log::{debug, info};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::adapters::status_client::StatusClient;
use crate::app::events::AgentEvent;
use crate::app::ports::EventSink;
use crate::app::shared::SharedContext;
use crate::error::Result;

/// Edge detector over successive remote power values.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PowerEdge {
    last_remote: Option<bool>,
}

impl PowerEdge {
    /// Record `remote`; `true` if it should be applied locally.
    pub fn observe(&mut self, remote: bool) -> bool {
        let apply = self.last_remote != Some(remote);
        self.last_remote = Some(remote);
        apply
    }

    pub fn last_remote(&self) -> Option<bool> {
        self.last_remote
    }
}

pub struct PowerPoller {
    client: Arc<StatusClient>,
    handle: Handle,
    device: Arc<str>,
    interval_ms: u64,
    last_poll_ms: Option<u64>,
    in_flight: bool,
    edge: PowerEdge,
    tx: UnboundedSender<Result<Option<bool>>>,
    rx: UnboundedReceiver<Result<Option<bool>>>,
}

impl PowerPoller {
    pub fn new(client: Arc<StatusClient>, handle: Handle, device: &str, interval_ms: u64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            client,
            handle,
            device: device.into(),
            interval_ms,
            last_poll_ms: None,
            in_flight: false,
            edge: PowerEdge::default(),
            tx,
            rx,
        }
    }

    /// Absorb any finished fetch, then start a new one if due.
    pub fn tick(&mut self, now_ms: u64, shared: &SharedContext, sink: &mut impl EventSink) {
        while let Ok(result) = self.rx.try_recv() {
            self.in_flight = false;
            match result {
                Ok(Some(remote)) => self.absorb(remote, shared, sink),
                Ok(None) => debug!("POWER | status has no power field"),
                Err(e) => debug!("POWER | poll failed: {e}"),
            }
        }

        let due = self
            .last_poll_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= self.interval_ms);
        if self.in_flight || !due {
            return;
        }
        self.last_poll_ms = Some(now_ms);
        self.in_flight = true;

        let client = Arc::clone(&self.client);
        let device = Arc::clone(&self.device);
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            let result = client.fetch_power(&device).await;
            let _ = tx.send(result);
        });
    }

    /// Apply a remote value subject to edge detection.
    pub fn absorb(&mut self, remote: bool, shared: &SharedContext, sink: &mut impl EventSink) {
        if !self.edge.observe(remote) {
            return;
        }
        if shared.set_active(remote) {
            info!("POWER | remote flag -> {}", remote);
            sink.emit(&AgentEvent::PowerChanged { active: remote });
        }
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }
}
