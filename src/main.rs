//! Occupancy agent entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  rpi::Board       LogEventSink    ReportingSink   MonotonicClock│
//! │  (GPIO pins)      (EventSink)     (EventSink)     (Clock)       │
//! │  control_server   StatusClient    PowerPoller                  │
//! │  (axum)           (reqwest)       (remote power flag)          │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │       AgentService + SharedContext (pure logic)        │    │
//! │  │  Presence FSM · Debounce · ActuatorLatch               │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  MainLoop (slot grid) · range-tracker thread · tokio runtime   │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, error, info, warn};

use occupancy::adapters::control_server;
use occupancy::adapters::log_sink::LogEventSink;
use occupancy::adapters::report_sink::{report_message, ReportingSink};
use occupancy::adapters::rpi::Board;
use occupancy::adapters::status_client::{Reporter, StatusClient};
use occupancy::adapters::time::{MonotonicClock, SpinDelay};
use occupancy::app::events::AgentEvent;
use occupancy::app::ports::{Clock, EventSink, MotionSensor};
use occupancy::app::service::{AgentService, ServiceTuning};
use occupancy::app::shared::SharedContext;
use occupancy::cli::Args;
use occupancy::config::{AgentConfig, TrackingMode};
use occupancy::control::latch::ActuatorLatch;
use occupancy::drivers::IndicatorBank;
use occupancy::fsm::PresenceMachine;
use occupancy::power::PowerPoller;
use occupancy::runtime::{spawn_tracker, MainLoop};
use occupancy::scheduler::FrameScheduler;
use occupancy::sensors::{PirSensor, RangeFinder, WirelessProbe};

/// Poll interval for the control server's shutdown watch.
const SHUTDOWN_WATCH_MS: u64 = 100;

fn main() -> Result<()> {
    // ── 1. Parameters + logging ───────────────────────────────
    let config = Args::parse().into_config();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    config.validate().context("invalid configuration")?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Occupancy Agent v{}              ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");
    info!(
        "device={} server={} rearm={} tracking={:?}",
        config.device_id,
        config.server_base(),
        config.presence.rearm.as_str(),
        config.tracking_mode
    );

    // ── 2. Async runtime (control endpoint, reports, power) ───
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    // ── 3. Hardware ───────────────────────────────────────────
    let board = Board::open(&config.pins, config.buzzer_pwm_hz).context("GPIO setup")?;
    let clock = Arc::new(MonotonicClock::new());
    let clock_dyn: Arc<dyn Clock> = clock.clone();

    let mut pir = PirSensor::new(board.pir, config.pull_mode).context("PIR setup")?;
    let range = RangeFinder::new(
        board.trigger,
        board.echo,
        SpinDelay,
        *clock,
        config.echo_timeout_us,
    )
    .with_window(config.presence.dist_min_cm, config.presence.dist_max_cm);
    let indicators = IndicatorBank::new(board.leds, board.buzzer, config.buzzer_duty_percent);

    // ── 4. Shared state ───────────────────────────────────────
    let shared = SharedContext::new(
        PresenceMachine::new(config.presence, false),
        ActuatorLatch::new(config.min_on_ms, config.min_off_ms),
        Box::new(indicators),
    );

    // ── 5. Control endpoint (bind failure is fatal) ───────────
    let listener = rt
        .block_on(tokio::net::TcpListener::bind(("0.0.0.0", config.control_port)))
        .with_context(|| format!("binding control port {}", config.control_port))?;
    let watch = shared.clone();
    let server = rt.spawn(control_server::serve(
        listener,
        control_server::router(shared.clone()),
        async move {
            while !watch.shutdown_requested() {
                tokio::time::sleep(Duration::from_millis(SHUTDOWN_WATCH_MS)).await;
            }
        },
    ));

    // ── 6. Signals → shutdown_requested ───────────────────────
    let on_signal = shared.clone();
    rt.spawn(async move {
        wait_for_signal().await;
        info!("signal received, shutting down");
        on_signal.request_shutdown();
    });

    // ── 7. Reporting ──────────────────────────────────────────
    let client = StatusClient::new(
        config.server_base(),
        Duration::from_millis(config.http_timeout_ms),
    )
    .context("building HTTP client")?;
    let reporter = Reporter::new(
        client,
        rt.handle().clone(),
        &config.device_id,
        config.control_url.as_deref(),
    )
    .with_probe(WirelessProbe::default());
    let new_sink = || {
        (
            LogEventSink::new(),
            ReportingSink::new(
                reporter.clone(),
                config.presence.rearm,
                config.report_rate_per_sec,
            ),
        )
    };

    // ── 8. PIR calibration + warm-up ──────────────────────────
    let mut delay = SpinDelay;
    pir.calibrate(config.pull_mode, clock.as_ref(), &mut delay)
        .context("PIR pull calibration")?;
    let ready = pir.warm_up(config.pir_warmup_secs, clock.as_ref(), &mut delay, || {
        shared.shutdown_requested()
    });
    if ready {
        let level = pir.is_motion();
        shared.with(|s| s.presence.seed_pir(level));
    }

    // ── 9. Sensing contexts ───────────────────────────────────
    if ready {
        let mut sink = new_sink();
        sink.emit(&AgentEvent::Started);

        let tuning = ServiceTuning::from(&config);
        let scheduler = FrameScheduler::main_frame(
            config.slot_ms,
            config.num_slots,
            config.tracking_mode,
            clock.now_ms(),
        );
        let power = PowerPoller::new(
            Arc::clone(reporter.client()),
            rt.handle().clone(),
            &config.device_id,
            config.power_poll_interval_ms,
        );
        let mut main_loop = MainLoop::new(
            AgentService::new(shared.clone(), clock_dyn.clone(), tuning),
            scheduler,
            clock_dyn.clone(),
            pir,
            sink,
        )
        .with_power(power);

        let tracker = match config.tracking_mode {
            TrackingMode::Background => Some(
                spawn_tracker(
                    AgentService::new(shared.clone(), clock_dyn.clone(), tuning),
                    range,
                    new_sink(),
                    clock_dyn.clone(),
                    config.track_period_ms,
                )
                .context("spawning range tracker")?,
            ),
            TrackingMode::Slotted => {
                main_loop = main_loop.with_range(Box::new(range));
                None
            }
        };

        main_loop.run();
        if let Some(tracker) = tracker {
            if tracker.join().is_err() {
                error!("range tracker panicked");
            }
        }
    }

    // ── 10. Shutdown ──────────────────────────────────────────
    shared.request_shutdown();
    shared.with(|s| s.force_off(clock.now_ms()));
    stop_report(&rt, &reporter, &config);

    match rt.block_on(server) {
        Ok(Err(e)) => warn!("control endpoint: {e}"),
        Err(e) => warn!("control endpoint task: {e}"),
        Ok(Ok(())) => {}
    }
    rt.shutdown_timeout(Duration::from_secs(1));
    Ok(())
}

/// Log and send the stop report, waiting at most the HTTP timeout.
fn stop_report(rt: &tokio::runtime::Runtime, reporter: &Reporter, config: &AgentConfig) {
    LogEventSink::new().emit(&AgentEvent::Stopped);
    let Some((message, distance)) = report_message(&AgentEvent::Stopped, config.presence.rearm)
    else {
        return;
    };
    if let Err(e) = rt.block_on(reporter.report_now(message, distance)) {
        debug!("stop report dropped: {e}");
    }
}

async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            warn!("SIGTERM handler unavailable: {e}");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}
