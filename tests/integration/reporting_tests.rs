//! Integration tests for the status-service client, the rate-gated
//! reporting sink, and the remote power poller.
//!
//! Each test runs a throw-away axum server on an ephemeral loopback port
//! that records report bodies and serves a fixed power flag.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::runtime::Handle;

use crate::mock_hw::{RecordingSink, Rig};

use occupancy::adapters::report_sink::ReportingSink;
use occupancy::adapters::status_client::{Reporter, StatusClient};
use occupancy::app::commands::ControlCommand;
use occupancy::app::events::AgentEvent;
use occupancy::app::ports::EventSink;
use occupancy::config::{PresenceConfig, RearmPolicy};
use occupancy::error::{CommsError, Error, RangeFault};
use occupancy::power::PowerPoller;

#[derive(Clone, Default)]
struct FakeService {
    reports: Arc<Mutex<Vec<Value>>>,
    power: Arc<AtomicBool>,
    broken: Arc<AtomicBool>,
}

impl FakeService {
    fn reports(&self) -> Vec<Value> {
        self.reports.lock().unwrap().clone()
    }
}

async fn device_report(State(svc): State<FakeService>, Json(body): Json<Value>) -> Json<Value> {
    svc.reports.lock().unwrap().push(body);
    Json(serde_json::json!({ "received": true }))
}

async fn device_status(
    State(svc): State<FakeService>,
    Path(device): Path<String>,
) -> impl IntoResponse {
    if svc.broken.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(Value::Null));
    }
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "name": device,
            "status": "running",
            "power": svc.power.load(Ordering::SeqCst),
        })),
    )
}

async fn start_service() -> (FakeService, SocketAddr) {
    let svc = FakeService::default();
    let app = Router::new()
        .route("/api/device-report", post(device_report))
        .route("/api/status/:device", get(device_status))
        .with_state(svc.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (svc, addr)
}

fn client(addr: SocketAddr) -> StatusClient {
    StatusClient::new(&format!("http://{addr}"), Duration::from_millis(2500)).unwrap()
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(300)).await;
}

// ── StatusClient / Reporter ───────────────────────────────────

#[tokio::test]
async fn report_body_matches_wire_format() {
    let (svc, addr) = start_service().await;
    let reporter = Reporter::new(
        client(addr),
        Handle::current(),
        "chair1",
        Some("http://10.0.0.7:8088"),
    );

    reporter
        .report_now("person detected, indicator on".into(), Some(80.0))
        .await
        .unwrap();

    let reports = svc.reports();
    assert_eq!(reports.len(), 1);
    let r = &reports[0];
    assert_eq!(r["device"], "chair1");
    assert_eq!(r["message"], "person detected, indicator on");
    assert_eq!(r["distance"], 80.0);
    assert!(r["signal_strength"].is_null());
    assert_eq!(r["control_url"], "http://10.0.0.7:8088");
}

#[tokio::test]
async fn power_flag_is_read_from_status() {
    let (svc, addr) = start_service().await;
    let c = client(addr);

    svc.power.store(false, Ordering::SeqCst);
    assert_eq!(c.fetch_power("chair1").await.unwrap(), Some(false));
    assert!(!c.poll_power_flag("chair1", true).await);

    svc.power.store(true, Ordering::SeqCst);
    assert!(c.poll_power_flag("chair1", false).await);
}

#[tokio::test]
async fn non_200_status_falls_back_to_default() {
    let (svc, addr) = start_service().await;
    svc.broken.store(true, Ordering::SeqCst);
    let c = client(addr);

    assert_eq!(
        c.fetch_power("chair1").await,
        Err(Error::Comms(CommsError::Status(500)))
    );
    assert!(c.poll_power_flag("chair1", true).await);
}

// ── ReportingSink gating ──────────────────────────────────────

#[tokio::test]
async fn same_category_is_rate_limited() {
    let (svc, addr) = start_service().await;
    let reporter = Reporter::new(client(addr), Handle::current(), "chair1", None);
    let mut sink = ReportingSink::new(reporter, RearmPolicy::Cooldown, 1);

    sink.emit(&AgentEvent::Triggered { distance_cm: 80.0 });
    sink.emit(&AgentEvent::Triggered { distance_cm: 75.0 });
    sink.emit(&AgentEvent::RangeFault(RangeFault::EchoLowTimeout));
    sink.emit(&AgentEvent::RangeFault(RangeFault::EchoHighTimeout));
    settle().await;

    let messages: Vec<String> = svc
        .reports()
        .iter()
        .map(|r| r["message"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(messages.len(), 2);
    assert!(messages.contains(&"person detected, indicator on".to_owned()));
    assert!(messages.iter().any(|m| m.starts_with("no ultrasonic echo")));
}

#[tokio::test]
async fn internal_events_are_not_reported() {
    let (svc, addr) = start_service().await;
    let reporter = Reporter::new(client(addr), Handle::current(), "chair1", None);
    let mut sink = ReportingSink::new(reporter, RearmPolicy::Edge, 1);

    sink.emit(&AgentEvent::MotionDetected);
    sink.emit(&AgentEvent::TrackingStarted);
    sink.emit(&AgentEvent::IndicatorChanged { on: true });
    sink.emit(&AgentEvent::Started);
    settle().await;

    let reports = svc.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["message"], "agent started (rearm=edge)");
}

#[tokio::test]
async fn unreachable_service_is_swallowed() {
    let reporter = Reporter::new(
        StatusClient::new("http://127.0.0.1:9", Duration::from_millis(300)).unwrap(),
        Handle::current(),
        "chair1",
        None,
    );
    let mut sink = ReportingSink::new(reporter, RearmPolicy::Cooldown, 1);
    sink.emit(&AgentEvent::MotionCleared);
    settle().await;
}

// ── PowerPoller ───────────────────────────────────────────────

#[tokio::test]
async fn remote_power_is_edge_applied() {
    let (svc, addr) = start_service().await;
    svc.power.store(false, Ordering::SeqCst);
    let shared = Rig::new(PresenceConfig::default()).shared();
    let mut poller = PowerPoller::new(Arc::new(client(addr)), Handle::current(), "chair1", 0);
    let mut sink = RecordingSink::default();

    poller.tick(0, &shared, &mut sink);
    assert!(poller.in_flight());
    settle().await;
    poller.tick(1, &shared, &mut sink);
    assert!(!shared.is_active());
    assert_eq!(sink.events, vec![AgentEvent::PowerChanged { active: false }]);

    // A local wake survives an unchanged remote flag.
    shared.apply_command(ControlCommand::Wake);
    settle().await;
    poller.tick(2, &shared, &mut sink);
    assert!(shared.is_active());
    assert_eq!(sink.events.len(), 1);

    // A remote change is applied again.
    svc.power.store(true, Ordering::SeqCst);
    shared.apply_command(ControlCommand::Sleep);
    settle().await;
    poller.tick(3, &shared, &mut sink);
    settle().await;
    poller.tick(4, &shared, &mut sink);
    assert!(shared.is_active());
}

#[tokio::test]
async fn failed_poll_keeps_last_value() {
    let (svc, addr) = start_service().await;
    svc.broken.store(true, Ordering::SeqCst);
    let shared = Rig::new(PresenceConfig::default()).shared();
    shared.apply_command(ControlCommand::Sleep);
    let mut poller = PowerPoller::new(Arc::new(client(addr)), Handle::current(), "chair1", 0);
    let mut sink = RecordingSink::default();

    poller.tick(0, &shared, &mut sink);
    settle().await;
    poller.tick(1, &shared, &mut sink);
    assert!(!shared.is_active());
    assert!(sink.events.is_empty());
}
